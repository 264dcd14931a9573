use super::{LocalHit, ShapeAdapter};
use glam::{Mat4, Vec2, Vec3};

/// Axis-aligned box in element space, scaled by `size` (full extents, not
/// half-extents). Iterates the six faces and keeps the nearest one the ray
/// enters from the outside. Has no planar "persistent" fallback.
#[derive(Debug, Clone, Copy)]
pub struct BoxShape {
    pub size: Vec3,
}

struct Face {
    axis: usize,
    sign: f32,
    normal: Vec3,
    tangent: Vec3,
    bitangent: Vec3,
}

fn faces() -> [Face; 6] {
    [
        Face { axis: 0, sign: 1.0, normal: Vec3::X, tangent: Vec3::Y, bitangent: Vec3::Z },
        Face { axis: 0, sign: -1.0, normal: Vec3::NEG_X, tangent: Vec3::Y, bitangent: Vec3::Z },
        Face { axis: 1, sign: 1.0, normal: Vec3::Y, tangent: Vec3::X, bitangent: Vec3::Z },
        Face { axis: 1, sign: -1.0, normal: Vec3::NEG_Y, tangent: Vec3::X, bitangent: Vec3::Z },
        Face { axis: 2, sign: 1.0, normal: Vec3::Z, tangent: Vec3::X, bitangent: Vec3::Y },
        Face { axis: 2, sign: -1.0, normal: Vec3::NEG_Z, tangent: Vec3::X, bitangent: Vec3::Y },
    ]
}

impl ShapeAdapter for BoxShape {
    fn pure_hit_test(&self, ray_origin: Vec3, ray_dir: Vec3) -> (Option<LocalHit>, Option<LocalHit>) {
        let half = self.size * 0.5;
        let mut best: Option<LocalHit> = None;

        for face in faces() {
            let h = half[face.axis] * face.sign;
            let dir_axis = ray_dir[face.axis];
            if dir_axis.abs() < 1e-8 {
                continue;
            }
            // The ray enters from the outside when it approaches the face
            // against its outward normal (diff points from origin to the
            // face plane, dot(diff, ray_dir) > 0 means we're heading toward
            // it from the outer side).
            let diff = h - ray_origin[face.axis];
            if diff * dir_axis <= 0.0 {
                continue;
            }
            let t = diff / dir_axis;
            if t < 0.0 {
                continue;
            }
            let point = ray_origin + ray_dir * t;
            let other_axes: [usize; 2] = match face.axis {
                0 => [1, 2],
                1 => [0, 2],
                _ => [0, 1],
            };
            if point[other_axes[0]].abs() > half[other_axes[0]]
                || point[other_axes[1]].abs() > half[other_axes[1]]
            {
                continue;
            }
            let is_nearest = match &best {
                Some(b) => t < b.local_distance,
                None => true,
            };
            if is_nearest {
                let u = point.dot(face.tangent) / half[other_axes[0]].max(1e-6) * 0.5 + 0.5;
                let v = point.dot(face.bitangent) / half[other_axes[1]].max(1e-6) * 0.5 + 0.5;
                best = Some(LocalHit {
                    element_space: point,
                    surface_space: Vec2::new(u, v),
                    element_tangent_frame: Mat4::from_cols(
                        face.tangent.extend(0.0),
                        face.bitangent.extend(0.0),
                        face.normal.extend(0.0),
                        point.extend(1.0),
                    ),
                    local_distance: t,
                });
            }
        }

        (best, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hits_nearest_face() {
        let shape = BoxShape { size: Vec3::ONE };
        let (hit, persistent) = shape.pure_hit_test(Vec3::new(0.0, 0.0, 5.0), Vec3::new(0.0, 0.0, -1.0));
        let hit = hit.unwrap();
        assert!((hit.element_space.z - 0.5).abs() < 1e-5);
        assert!(persistent.is_none());
    }

    #[test]
    fn misses_when_ray_passes_outside() {
        let shape = BoxShape { size: Vec3::ONE };
        let (hit, _) = shape.pure_hit_test(Vec3::new(2.0, 2.0, 5.0), Vec3::new(0.0, 0.0, -1.0));
        assert!(hit.is_none());
    }
}
