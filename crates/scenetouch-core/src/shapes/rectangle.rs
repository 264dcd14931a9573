use super::{intersect_local_z_plane, planar_tangent_frame, LocalHit, ShapeAdapter};
use glam::{Vec2, Vec3};

/// Unit rectangle on the z=0 plane, gated to `|x| <= 0.5 && |y| <= 0.5`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Rectangle;

impl ShapeAdapter for Rectangle {
    fn pure_hit_test(&self, ray_origin: Vec3, ray_dir: Vec3) -> (Option<LocalHit>, Option<LocalHit>) {
        let Some((point, t)) = intersect_local_z_plane(ray_origin, ray_dir) else {
            return (None, None);
        };
        let persistent = LocalHit {
            element_space: point,
            surface_space: Vec2::new(point.x + 0.5, point.y + 0.5),
            element_tangent_frame: planar_tangent_frame(point),
            local_distance: t,
        };
        let in_bounds = point.x.abs() <= 0.5 && point.y.abs() <= 0.5;
        (in_bounds.then_some(persistent), Some(persistent))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hits_within_bounds() {
        let shape = Rectangle;
        let (hit, _) = shape.pure_hit_test(Vec3::new(0.25, -0.25, 2.0), Vec3::new(0.0, 0.0, -1.0));
        assert!(hit.is_some());
    }

    #[test]
    fn slide_off_keeps_persistent_but_not_hit() {
        let shape = Rectangle;
        let (hit, persistent) = shape.pure_hit_test(Vec3::new(2.0, 0.0, 2.0), Vec3::new(0.0, 0.0, -1.0));
        assert!(hit.is_none());
        assert!(persistent.is_some());
    }
}
