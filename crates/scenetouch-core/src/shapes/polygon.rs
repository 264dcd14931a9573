use super::{intersect_local_z_plane, planar_tangent_frame, LocalHit, ShapeAdapter};
use glam::{Vec2, Vec3};

/// Arbitrary polygon on the z=0 plane, tested with the even-odd rule.
/// Short-circuits (never hits) with fewer than 3 vertices.
#[derive(Debug, Clone)]
pub struct Polygon {
    pub vertices: Vec<Vec2>,
}

impl Polygon {
    fn contains(&self, p: Vec2) -> bool {
        if self.vertices.len() < 3 {
            return false;
        }
        let mut inside = false;
        let n = self.vertices.len();
        let mut j = n - 1;
        for i in 0..n {
            let vi = self.vertices[i];
            let vj = self.vertices[j];
            if (vi.y > p.y) != (vj.y > p.y) {
                let x_intersect = (vj.x - vi.x) * (p.y - vi.y) / (vj.y - vi.y) + vi.x;
                if p.x < x_intersect {
                    inside = !inside;
                }
            }
            j = i;
        }
        inside
    }
}

impl ShapeAdapter for Polygon {
    fn pure_hit_test(&self, ray_origin: Vec3, ray_dir: Vec3) -> (Option<LocalHit>, Option<LocalHit>) {
        if self.vertices.len() < 3 {
            return (None, None);
        }
        let Some((point, t)) = intersect_local_z_plane(ray_origin, ray_dir) else {
            return (None, None);
        };
        let persistent = LocalHit {
            element_space: point,
            surface_space: point.truncate(),
            element_tangent_frame: planar_tangent_frame(point),
            local_distance: t,
        };
        (
            self.contains(point.truncate()).then_some(persistent),
            Some(persistent),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> Polygon {
        Polygon {
            vertices: vec![
                Vec2::new(-0.5, -0.5),
                Vec2::new(0.5, -0.5),
                Vec2::new(0.0, 0.5),
            ],
        }
    }

    #[test]
    fn hits_inside_triangle() {
        let shape = triangle();
        let (hit, _) = shape.pure_hit_test(Vec3::new(0.0, 0.0, 1.0), Vec3::new(0.0, 0.0, -1.0));
        assert!(hit.is_some());
    }

    #[test]
    fn misses_outside_triangle() {
        let shape = triangle();
        let (hit, _) = shape.pure_hit_test(Vec3::new(0.49, 0.49, 1.0), Vec3::new(0.0, 0.0, -1.0));
        assert!(hit.is_none());
    }

    #[test]
    fn fewer_than_three_vertices_never_hits() {
        let shape = Polygon {
            vertices: vec![Vec2::ZERO, Vec2::X],
        };
        let (hit, persistent) = shape.pure_hit_test(Vec3::new(0.0, 0.0, 1.0), Vec3::new(0.0, 0.0, -1.0));
        assert!(hit.is_none());
        assert!(persistent.is_none());
    }
}
