mod box_shape;
mod circle;
mod plane;
mod polygon;
mod rectangle;
mod segment;
mod sphere;

pub use box_shape::BoxShape;
pub use circle::Circle;
pub use plane::InfinitePlane;
pub use polygon::Polygon;
pub use rectangle::Rectangle;
pub use segment::Segment;
pub use sphere::Sphere;

use glam::{Mat4, Vec2, Vec3};

/// A shape/element-local ray-hit: the point and surface parameterization in
/// the element's own coordinate frame. [`crate::element::Element`] promotes
/// this to a full [`crate::intersection::IntersectionPoint`] by composing
/// the element's world matrix.
#[derive(Debug, Clone, Copy)]
pub struct LocalHit {
    pub element_space: Vec3,
    pub surface_space: Vec2,
    pub element_tangent_frame: Mat4,
    /// Distance along the local-space ray; used to compare against other
    /// elements hit by the same ray when a shape wants the nearest root.
    pub local_distance: f32,
}

/// Per-shape hit-test contract (§4.2). Implementors receive the touch's ray
/// already transformed into the element's local space.
///
/// The `persistent` return is the shape's best-effort intersection even when
/// the touch has slid outside the shape's finite bounds (e.g. off the edge
/// of a rectangle while still gliding across its infinite supporting
/// plane); planar shapes provide one, solid shapes (box, sphere) do not.
pub trait ShapeAdapter: Send + Sync + std::fmt::Debug {
    fn pure_hit_test(&self, ray_origin: Vec3, ray_dir: Vec3) -> (Option<LocalHit>, Option<LocalHit>);
}

/// Builds the tangent frame for a shape living on the local z=0 plane: X and
/// Y axes are the plane's own axes, Z is the plane normal, translation is
/// the hit point.
pub(crate) fn planar_tangent_frame(point: Vec3) -> Mat4 {
    Mat4::from_cols(
        Vec3::X.extend(0.0),
        Vec3::Y.extend(0.0),
        Vec3::Z.extend(0.0),
        point.extend(1.0),
    )
}

/// Ray/z=0-plane intersection in local space. Returns `None` when the ray
/// runs parallel to the plane or points away from it.
pub(crate) fn intersect_local_z_plane(origin: Vec3, dir: Vec3) -> Option<(Vec3, f32)> {
    if dir.z.abs() < 1e-8 {
        return None;
    }
    let t = -origin.z / dir.z;
    if t < 0.0 {
        return None;
    }
    Some((origin + dir * t, t))
}
