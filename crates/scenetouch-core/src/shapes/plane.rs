use super::{intersect_local_z_plane, planar_tangent_frame, LocalHit, ShapeAdapter};
use glam::{Vec2, Vec3};

/// Always hits the z=0 plane defined by the element's display transform.
/// Surface-space is element-space scaled by 2 (§4.2).
#[derive(Debug, Clone, Copy, Default)]
pub struct InfinitePlane;

impl ShapeAdapter for InfinitePlane {
    fn pure_hit_test(&self, ray_origin: Vec3, ray_dir: Vec3) -> (Option<LocalHit>, Option<LocalHit>) {
        let Some((point, t)) = intersect_local_z_plane(ray_origin, ray_dir) else {
            return (None, None);
        };
        let hit = LocalHit {
            element_space: point,
            surface_space: Vec2::new(point.x, point.y) * 2.0,
            element_tangent_frame: planar_tangent_frame(point),
            local_distance: t,
        };
        (Some(hit), Some(hit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hits_straight_down_ray() {
        let shape = InfinitePlane;
        let (hit, persistent) = shape.pure_hit_test(Vec3::new(0.5, 0.5, 5.0), Vec3::new(0.0, 0.0, -1.0));
        let hit = hit.unwrap();
        assert_eq!(hit.element_space, Vec3::new(0.5, 0.5, 0.0));
        assert!(persistent.is_some());
    }

    #[test]
    fn misses_parallel_ray() {
        let shape = InfinitePlane;
        let (hit, _) = shape.pure_hit_test(Vec3::new(0.0, 0.0, 1.0), Vec3::new(1.0, 0.0, 0.0));
        assert!(hit.is_none());
    }
}
