use glam::{Mat4, Vec2, Vec3};
use scenetouch_core::Element;
use std::sync::Arc;

/// Which plane a planar behavior (sliding, value-slider) projects touches
/// onto before computing 2D deltas (§4.7).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaneSelector {
    /// A plane through the element's world position, facing the camera.
    ViewAligned,
    /// The element's own world transform.
    OwnPlane,
    /// The parent's world transform, falling back to `ViewAligned` when the
    /// element has no parent.
    ParentPlane,
}

impl Default for PlaneSelector {
    fn default() -> Self {
        PlaneSelector::ViewAligned
    }
}

pub fn plane_matrix(element: &Arc<Element>, selector: PlaneSelector, view: Mat4) -> Mat4 {
    match selector {
        PlaneSelector::OwnPlane => element.world_matrix(),
        PlaneSelector::ParentPlane => element
            .parent()
            .map(|parent| parent.world_matrix())
            .unwrap_or_else(|| view_aligned_plane(element, view)),
        PlaneSelector::ViewAligned => view_aligned_plane(element, view),
    }
}

fn view_aligned_plane(element: &Arc<Element>, view: Mat4) -> Mat4 {
    let world_pos = element.world_matrix().transform_point3(Vec3::ZERO);
    let (_, rotation, _) = view.inverse().to_scale_rotation_translation();
    Mat4::from_rotation_translation(rotation, world_pos)
}

/// Projects a world ray onto `plane`'s local z=0 plane, returning the
/// intersection in the plane's own XY. `None` when the ray runs parallel to
/// the plane.
pub fn project_to_plane(plane: Mat4, origin: Vec3, dir: Vec3) -> Option<Vec2> {
    let inv = plane.inverse();
    let local_origin = inv.transform_point3(origin);
    let local_dir = inv.transform_vector3(dir);
    if local_dir.z.abs() < 1e-8 {
        return None;
    }
    let t = -local_origin.z / local_dir.z;
    let point = local_origin + local_dir * t;
    Some(point.truncate())
}
