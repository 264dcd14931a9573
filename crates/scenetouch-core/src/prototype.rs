use crate::aux::AttachedValues;
use crate::behavior::Behavior;
use crate::ids::{next_prototype_id, PrototypeId};
use crate::shapes::{BoxShape, Circle, InfinitePlane, Polygon, Rectangle, Segment, Sphere, ShapeAdapter};
use crate::transform::{ApplyTransformMode, Transform};
use std::collections::HashMap;
use std::sync::Arc;

/// Discriminant identifying which [`ShapeAdapter`] a prototype binds to,
/// carried separately from the adapter instance so error messages and
/// logging can name the kind without downcasting a trait object.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ShapeKindTag {
    Rectangle,
    Circle,
    Segment,
    Polygon,
    Box,
    Sphere,
    InfinitePlane,
}

/// Tagged-variant shape descriptor (§9 Design Notes): replaces a
/// reflection-driven constructor lookup with plain data plus a per-variant
/// hit-test function, so instantiating a shape never needs runtime type
/// introspection.
#[derive(Debug, Clone)]
pub enum ShapeKind {
    Rectangle,
    Circle,
    Segment { hole_radius: f32, cycles: f32, phase: f32 },
    Polygon { vertices: Vec<glam::Vec2> },
    Box { size: glam::Vec3 },
    Sphere,
    InfinitePlane,
}

impl ShapeKind {
    pub fn tag(&self) -> ShapeKindTag {
        match self {
            ShapeKind::Rectangle => ShapeKindTag::Rectangle,
            ShapeKind::Circle => ShapeKindTag::Circle,
            ShapeKind::Segment { .. } => ShapeKindTag::Segment,
            ShapeKind::Polygon { .. } => ShapeKindTag::Polygon,
            ShapeKind::Box { .. } => ShapeKindTag::Box,
            ShapeKind::Sphere => ShapeKindTag::Sphere,
            ShapeKind::InfinitePlane => ShapeKindTag::InfinitePlane,
        }
    }

    /// Builds the concrete adapter for this variant. Infallible: every
    /// variant of this closed enum has exactly one adapter, so
    /// `UnknownShapeKind` (§7) can only arise for a host-constructed variant
    /// outside this enum's closed set, which this implementation cannot
    /// produce.
    pub fn build_adapter(&self) -> Box<dyn ShapeAdapter> {
        match self.clone() {
            ShapeKind::Rectangle => Box::new(Rectangle),
            ShapeKind::Circle => Box::new(Circle),
            ShapeKind::Segment { hole_radius, cycles, phase } => {
                Box::new(Segment { hole_radius, cycles: cycles.clamp(-1.0, 1.0), phase })
            }
            ShapeKind::Polygon { vertices } => Box::new(Polygon { vertices }),
            ShapeKind::Box { size } => Box::new(BoxShape { size }),
            ShapeKind::Sphere => Box::new(Sphere),
            ShapeKind::InfinitePlane => Box::new(InfinitePlane),
        }
    }
}

/// Stateless, user-owned description of an element. The host is the source
/// of truth; [`crate::element::Element`] instances are reconciled against a
/// tree of these every frame via [`crate::context::Context::add_or_update_elements`].
#[derive(Clone)]
pub struct Prototype {
    pub id: PrototypeId,
    pub name: String,
    pub active: bool,
    pub transparent: bool,
    pub fade_in_time: f32,
    pub fade_in_delay: f32,
    pub fade_out_time: f32,
    pub fade_out_delay: f32,
    pub transformation_follow_time: f32,
    pub display_transform: Transform,
    pub behaviors: Vec<Arc<dyn Behavior>>,
    pub attached_values: Option<AttachedValues>,
    pub only_hit_if_parent_is_hit: bool,
    pub transform_application: ApplyTransformMode,
    pub sub_context_options: Option<crate::subcontext::SubContextOptions>,
    pub shape: ShapeKind,
    pub children: HashMap<PrototypeId, Prototype>,
    pub parent: Option<PrototypeId>,
}

impl Prototype {
    pub fn new(name: impl Into<String>, shape: ShapeKind) -> Self {
        Self {
            id: next_prototype_id(),
            name: name.into(),
            active: true,
            transparent: false,
            fade_in_time: 0.0,
            fade_in_delay: 0.0,
            fade_out_time: 0.0,
            fade_out_delay: 0.0,
            transformation_follow_time: 0.0,
            display_transform: Transform::default(),
            behaviors: Vec::new(),
            attached_values: None,
            only_hit_if_parent_is_hit: false,
            transform_application: ApplyTransformMode::ALL,
            sub_context_options: None,
            shape,
            children: HashMap::new(),
            parent: None,
        }
    }

    /// Inserts `child` under this prototype, wiring its parent id. Rejects a
    /// child whose id equals its new parent's (§4.5, §7 structural errors)
    /// or a duplicate id at this level; both are reported to the caller
    /// rather than silently applied, so `Context`/`Element` can log and
    /// continue per §7.
    pub fn add_child(&mut self, mut child: Prototype) -> Result<(), crate::error::ScenetouchError> {
        if child.id == self.id {
            return Err(crate::error::ScenetouchError::StructuralCycle {
                parent: self.id.into(),
                child: child.id.into(),
            });
        }
        if self.children.contains_key(&child.id) {
            return Err(crate::error::ScenetouchError::StructuralDuplicate(child.id.into()));
        }
        child.parent = Some(self.id);
        self.children.insert(child.id, child);
        Ok(())
    }
}

impl std::fmt::Debug for Prototype {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Prototype")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("shape", &self.shape.tag())
            .field("children", &self.children.len())
            .finish()
    }
}
