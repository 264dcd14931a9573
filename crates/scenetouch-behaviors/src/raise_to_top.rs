use glam::Vec3;
use scenetouch_core::aux::Cloned;
use scenetouch_core::behavior::{Behavior, BehaviorFrame};
use scenetouch_core::Element;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Default)]
struct RaiseState {
    was_active: bool,
}

/// On any touch-begin of this element or a descendant, reassigns z depths
/// among siblings so the touched element sits at `top_z` and the rest
/// descend in `distance` increments (§4.7). Writes sibling state, so it must
/// run in the serialized post-pass rather than the parallel element phase
/// (`writes_siblings() == true`).
#[derive(Debug, Clone)]
pub struct MoveToTopOnTouch {
    id: Uuid,
    pub top_z: f32,
    pub distance: f32,
}

impl Default for MoveToTopOnTouch {
    fn default() -> Self {
        Self { id: Uuid::new_v4(), top_z: 0.0, distance: 0.01 }
    }
}

impl MoveToTopOnTouch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_id(id: Uuid) -> Self {
        Self { id, ..Self::default() }
    }

    fn raise(&self, element: &Arc<Element>) {
        let Some(parent) = element.parent() else { return };
        let mut z = self.top_z;
        let mut t = element.display_transform();
        let pos = t.position();
        t.set_position(Vec3::new(pos.x, pos.y, z));
        element.set_display_transform(t);

        z -= self.distance;
        for sibling in parent.children() {
            if Arc::ptr_eq(&sibling, element) {
                continue;
            }
            let mut st = sibling.display_transform();
            let spos = st.position();
            st.set_position(Vec3::new(spos.x, spos.y, z));
            sibling.set_display_transform(st);
            z -= self.distance;
        }
    }
}

fn subtree_touched(element: &Arc<Element>) -> bool {
    element.is_touched() || element.children().iter().any(subtree_touched)
}

impl Behavior for MoveToTopOnTouch {
    fn id(&self) -> Uuid {
        self.id
    }

    fn writes_siblings(&self) -> bool {
        true
    }

    fn behave(&self, element: &Arc<Element>, _frame: &BehaviorFrame<'_>) {
        let key = self.id.to_string();
        let mut state = {
            let values = element.attached_values();
            values
                .behavior_state(&key)
                .and_then(|s| s.as_any().downcast_ref::<Cloned<RaiseState>>())
                .map(|c| c.0)
                .unwrap_or_default()
        };

        let active_now = subtree_touched(element);
        if active_now && !state.was_active {
            self.raise(element);
        }
        state.was_active = active_now;

        element.attached_values().set_behavior_state(&key, Box::new(Cloned(state)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scenetouch_core::{Prototype, ShapeKind};

    #[test]
    fn raises_touched_sibling_above_others() {
        let mut root = Prototype::new("root", ShapeKind::Rectangle);
        root.add_child(Prototype::new("a", ShapeKind::Rectangle)).unwrap();
        root.add_child(Prototype::new("b", ShapeKind::Rectangle)).unwrap();
        let element = Element::instantiate(&root);
        let a = element.children().into_iter().find(|c| c.name() == "a").unwrap();
        let b = element.children().into_iter().find(|c| c.name() == "b").unwrap();

        let behavior = MoveToTopOnTouch { top_z: 1.0, distance: 0.1, ..MoveToTopOnTouch::new() };
        // Simulate `b` having an active touching set.
        let touch_id = scenetouch_core::TouchId(1);
        b.touching.insert(touch_id, None);

        let touches = std::collections::HashMap::new();
        let frame = BehaviorFrame { dt: 1.0 / 60.0, view: glam::Mat4::IDENTITY, touches: &touches };
        behavior.behave(&b, &frame);

        assert_eq!(b.display_transform().position().z, 1.0);
        assert_eq!(a.display_transform().position().z, 0.9);
    }
}
