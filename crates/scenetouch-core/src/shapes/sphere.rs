use super::{LocalHit, ShapeAdapter};
use glam::{Mat4, Vec2, Vec3};

/// Unit sphere in element space, solved via the standard ray/sphere
/// quadratic: `(d·d)t² + 2(d·o)t + (o·o - 1) = 0`, keeping the nearest
/// non-negative root.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sphere;

impl ShapeAdapter for Sphere {
    fn pure_hit_test(&self, ray_origin: Vec3, ray_dir: Vec3) -> (Option<LocalHit>, Option<LocalHit>) {
        let a = ray_dir.dot(ray_dir);
        let b = 2.0 * ray_dir.dot(ray_origin);
        let c = ray_origin.dot(ray_origin) - 1.0;
        let discriminant = b * b - 4.0 * a * c;
        if discriminant < 0.0 || a.abs() < 1e-8 {
            return (None, None);
        }
        let sqrt_d = discriminant.sqrt();
        let t0 = (-b - sqrt_d) / (2.0 * a);
        let t1 = (-b + sqrt_d) / (2.0 * a);
        let t = if t0 >= 0.0 {
            t0
        } else if t1 >= 0.0 {
            t1
        } else {
            return (None, None);
        };
        let point = ray_origin + ray_dir * t;
        let normal = point.normalize_or_zero();
        let tangent = if normal.x.abs() < 0.9 { Vec3::X } else { Vec3::Y };
        let bitangent = normal.cross(tangent).normalize_or_zero();
        let tangent = bitangent.cross(normal);
        let hit = LocalHit {
            element_space: point,
            surface_space: Vec2::new(
                (normal.x.atan2(normal.z) / std::f32::consts::TAU) + 0.5,
                (normal.y.asin() / std::f32::consts::PI) + 0.5,
            ),
            element_tangent_frame: Mat4::from_cols(
                tangent.extend(0.0),
                bitangent.extend(0.0),
                normal.extend(0.0),
                point.extend(1.0),
            ),
            local_distance: t,
        };
        (Some(hit), None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hits_front_of_sphere() {
        let shape = Sphere;
        let (hit, _) = shape.pure_hit_test(Vec3::new(0.0, 0.0, 5.0), Vec3::new(0.0, 0.0, -1.0));
        let hit = hit.unwrap();
        assert!((hit.element_space.z - 1.0).abs() < 1e-5);
    }

    #[test]
    fn misses_outside_radius() {
        let shape = Sphere;
        let (hit, _) = shape.pure_hit_test(Vec3::new(2.0, 2.0, 5.0), Vec3::new(0.0, 0.0, -1.0));
        assert!(hit.is_none());
    }

    #[test]
    fn ray_from_inside_picks_forward_root() {
        let shape = Sphere;
        let (hit, _) = shape.pure_hit_test(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0));
        let hit = hit.unwrap();
        assert!(hit.local_distance >= 0.0);
    }
}
