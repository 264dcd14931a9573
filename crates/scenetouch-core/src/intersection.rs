use crate::ids::{ElementId, TouchId};
use glam::{Mat4, Vec2, Vec3};

/// A touch/element intersection recorded in world, element-local, and
/// surface (UV-like) space, plus the tangent frames needed to project
/// subsequent motion back onto the surface.
///
/// Equality and hashing are defined over `(element_id, touch_id)` only, per
/// spec §3 — two intersections for the same pair are interchangeable as map
/// keys regardless of how the geometry moved between frames.
#[derive(Debug, Clone, Copy)]
pub struct IntersectionPoint {
    pub element_id: ElementId,
    pub touch_id: TouchId,
    pub world_space: Vec3,
    pub element_space: Vec3,
    pub surface_space: Vec2,
    pub world_tangent_frame: Mat4,
    pub element_tangent_frame: Mat4,
    /// Screen-space depth (z/w after view*projection), used for occlusion
    /// sorting. `None` until computed by the hit-test phase.
    pub depth: f32,
}

impl PartialEq for IntersectionPoint {
    fn eq(&self, other: &Self) -> bool {
        self.element_id == other.element_id && self.touch_id == other.touch_id
    }
}
impl Eq for IntersectionPoint {}

impl std::hash::Hash for IntersectionPoint {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.element_id.hash(state);
        self.touch_id.hash(state);
    }
}
