use crate::plane::{plane_matrix, PlaneSelector};
use glam::{Vec2, Vec3};
use scenetouch_core::aux::Cloned;
use scenetouch_core::behavior::{Behavior, BehaviorFrame};
use scenetouch_core::Element;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Default)]
struct WheelState {
    velocity: Vec2,
}

/// Scrolls an element using an attached mouse's wheel accumulators, with
/// flick-style decay once the wheel stops moving (§4.7).
#[derive(Debug, Clone)]
pub struct MouseWheelScroll {
    id: Uuid,
    pub coefficients: Vec2,
    pub flick_time: f32,
    pub plane: PlaneSelector,
    pub translation_limits: Option<(Vec3, Vec3)>,
}

impl Default for MouseWheelScroll {
    fn default() -> Self {
        Self {
            id: Uuid::new_v4(),
            coefficients: Vec2::ONE,
            flick_time: 0.2,
            plane: PlaneSelector::ViewAligned,
            translation_limits: None,
        }
    }
}

impl MouseWheelScroll {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_id(id: Uuid) -> Self {
        Self { id, ..Self::default() }
    }
}

impl Behavior for MouseWheelScroll {
    fn id(&self) -> Uuid {
        self.id
    }

    fn behave(&self, element: &Arc<Element>, frame: &BehaviorFrame<'_>) {
        let key = self.id.to_string();
        let mut state = {
            let values = element.attached_values();
            values
                .behavior_state(&key)
                .and_then(|s| s.as_any().downcast_ref::<Cloned<WheelState>>())
                .map(|c| c.0)
                .unwrap_or_default()
        };

        let mut raw = Vec2::ZERO;
        for entry in element.hitting.iter() {
            if let Some(touch) = frame.touch(*entry.key()) {
                if let Some(pointer) = touch.attached_pointer {
                    raw += Vec2::new(pointer.scroll_horizontal, pointer.scroll_vertical);
                }
            }
        }

        if raw != Vec2::ZERO {
            state.velocity = raw * self.coefficients;
        } else if self.flick_time > 0.0 {
            let decay = (-frame.dt / self.flick_time).exp();
            state.velocity *= decay;
        } else {
            state.velocity = Vec2::ZERO;
        }

        if state.velocity.length_squared() > 1e-10 {
            let plane = plane_matrix(element, self.plane, frame.view);
            let (_, rotation, _) = plane.to_scale_rotation_translation();
            let delta_world = rotation * (state.velocity * frame.dt).extend(0.0);
            let mut transform = element.display_transform();
            let mut new_pos = transform.position() + delta_world;
            if let Some((min, max)) = self.translation_limits {
                new_pos = new_pos.clamp(min, max);
            }
            transform.set_position(new_pos);
            element.set_display_transform(transform);
        }

        element.attached_values().set_behavior_state(&key, Box::new(Cloned(state)));
    }
}
