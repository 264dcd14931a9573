use super::{intersect_local_z_plane, planar_tangent_frame, LocalHit, ShapeAdapter};
use glam::{Vec2, Vec3};

/// Annular sector on the z=0 plane: the ring between `hole_radius` and 0.5,
/// swept from `phase` across a fraction `|cycles|` of the full circle.
/// `cycles`'s sign selects sweep direction; its magnitude is clamped to 1 by
/// construction (see [`crate::prototype::ShapeKind::Segment`]).
#[derive(Debug, Clone, Copy)]
pub struct Segment {
    pub hole_radius: f32,
    pub cycles: f32,
    pub phase: f32,
}

impl ShapeAdapter for Segment {
    fn pure_hit_test(&self, ray_origin: Vec3, ray_dir: Vec3) -> (Option<LocalHit>, Option<LocalHit>) {
        let Some((point, t)) = intersect_local_z_plane(ray_origin, ray_dir) else {
            return (None, None);
        };
        let radius = point.truncate().length();
        let theta = point.y.atan2(point.x);
        let tau = std::f32::consts::TAU;
        let relative = ((theta - self.phase).rem_euclid(tau)) / tau;
        let sweep = self.cycles.abs().min(1.0);
        let in_sweep = if self.cycles >= 0.0 {
            relative <= sweep
        } else {
            relative >= 1.0 - sweep
        };
        let persistent = LocalHit {
            element_space: point,
            surface_space: Vec2::new(
                (radius - self.hole_radius) / (0.5 - self.hole_radius).max(1e-6),
                relative,
            ),
            element_tangent_frame: planar_tangent_frame(point),
            local_distance: t,
        };
        let in_ring = radius >= self.hole_radius && radius < 0.5;
        ((in_ring && in_sweep).then_some(persistent), Some(persistent))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_circle_behaves_like_ring() {
        let shape = Segment {
            hole_radius: 0.1,
            cycles: 1.0,
            phase: 0.0,
        };
        let (hit, _) = shape.pure_hit_test(Vec3::new(0.3, 0.0, 1.0), Vec3::new(0.0, 0.0, -1.0));
        assert!(hit.is_some());
    }

    #[test]
    fn inside_hole_misses() {
        let shape = Segment {
            hole_radius: 0.2,
            cycles: 1.0,
            phase: 0.0,
        };
        let (hit, _) = shape.pure_hit_test(Vec3::new(0.05, 0.0, 1.0), Vec3::new(0.0, 0.0, -1.0));
        assert!(hit.is_none());
    }

    #[test]
    fn half_sweep_excludes_opposite_side() {
        let shape = Segment {
            hole_radius: 0.0,
            cycles: 0.4,
            phase: 0.0,
        };
        let front = (0.3f32, 0.0f32);
        let back_angle = std::f32::consts::PI + 0.2;
        let back = (0.3 * back_angle.cos(), 0.3 * back_angle.sin());
        let (hit_front, _) = shape.pure_hit_test(Vec3::new(front.0, front.1, 1.0), Vec3::new(0.0, 0.0, -1.0));
        let (hit_back, _) = shape.pure_hit_test(Vec3::new(back.0, back.1, 1.0), Vec3::new(0.0, 0.0, -1.0));
        assert!(hit_front.is_some());
        assert!(hit_back.is_none());
    }
}
