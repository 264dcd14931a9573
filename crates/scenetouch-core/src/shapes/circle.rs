use super::{intersect_local_z_plane, planar_tangent_frame, LocalHit, ShapeAdapter};
use glam::{Vec2, Vec3};

/// Unit-diameter circle on the z=0 plane, gated to `‖xy‖ < 0.5`. Surface
/// space is polar: `(radius / 0.5, angle / 2π)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Circle;

impl ShapeAdapter for Circle {
    fn pure_hit_test(&self, ray_origin: Vec3, ray_dir: Vec3) -> (Option<LocalHit>, Option<LocalHit>) {
        let Some((point, t)) = intersect_local_z_plane(ray_origin, ray_dir) else {
            return (None, None);
        };
        let radius = point.truncate().length();
        let angle = point.y.atan2(point.x);
        let persistent = LocalHit {
            element_space: point,
            surface_space: Vec2::new(radius / 0.5, angle / std::f32::consts::TAU),
            element_tangent_frame: planar_tangent_frame(point),
            local_distance: t,
        };
        (
            (radius < 0.5).then_some(persistent),
            Some(persistent),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn center_hits() {
        let shape = Circle;
        let (hit, _) = shape.pure_hit_test(Vec3::new(0.0, 0.0, 1.0), Vec3::new(0.0, 0.0, -1.0));
        assert!(hit.is_some());
    }

    #[test]
    fn outside_radius_misses() {
        let shape = Circle;
        let (hit, persistent) = shape.pure_hit_test(Vec3::new(0.6, 0.0, 1.0), Vec3::new(0.0, 0.0, -1.0));
        assert!(hit.is_none());
        assert!(persistent.is_some());
    }
}
