use crate::element::Element;
use crate::ids::TouchId;
use crate::touch::Touch;
use glam::Mat4;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// Per-frame context handed to a behavior: everything it needs besides the
/// element it's attached to and that element's own tree (parent/children),
/// which it reaches directly through `Element`. `touches` resolves the
/// `TouchId`s keying `element.touching`/`hitting`/`hovering` back to the
/// live [`Touch`] (screen point, velocity, force) a behavior needs to
/// compute planar deltas.
#[derive(Debug, Clone, Copy)]
pub struct BehaviorFrame<'a> {
    pub dt: f32,
    pub view: Mat4,
    pub touches: &'a HashMap<TouchId, Arc<Touch>>,
}

impl<'a> BehaviorFrame<'a> {
    pub fn touch(&self, id: TouchId) -> Option<&Arc<Touch>> {
        self.touches.get(&id)
    }
}

/// Stateless per-frame mutator attached to an element (§4.7). A behavior
/// carries no per-element state itself; it reads and writes its state
/// through `element.attached_values_mut().behavior_state(id)`, keyed by its
/// own stable GUID.
pub trait Behavior: Send + Sync + std::fmt::Debug {
    fn id(&self) -> Uuid;

    fn behave(&self, element: &Arc<Element>, frame: &BehaviorFrame<'_>);

    /// Behaviors that rewrite sibling state (move-to-top) must run in the
    /// serialized post-pass rather than the parallel per-element phase
    /// (§5, §9 Design Notes).
    fn writes_siblings(&self) -> bool {
        false
    }
}
