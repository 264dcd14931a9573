use crate::plane::{plane_matrix, project_to_plane, PlaneSelector};
use glam::Vec2;
use scenetouch_core::behavior::{Behavior, BehaviorFrame};
use scenetouch_core::Element;
use std::cmp::Ordering;
use std::sync::Arc;
use uuid::Uuid;

/// Writes the fastest touching touch's planar velocity into
/// `element.value.values[index_x]`/`[index_y]`, optionally clamped (§4.7).
/// Typical use: a 2D slider/joystick widget that exposes its position as
/// plain floats for the host to read, with no transform mutation of its own.
#[derive(Debug, Clone)]
pub struct ValueSlider2D {
    id: Uuid,
    pub index_x: usize,
    pub index_y: usize,
    pub coefficients: Vec2,
    pub clamp: Option<(Vec2, Vec2)>,
    pub plane: PlaneSelector,
}

impl Default for ValueSlider2D {
    fn default() -> Self {
        Self {
            id: Uuid::new_v4(),
            index_x: 0,
            index_y: 1,
            coefficients: Vec2::ONE,
            clamp: None,
            plane: PlaneSelector::ViewAligned,
        }
    }
}

impl ValueSlider2D {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_id(id: Uuid) -> Self {
        Self { id, ..Self::default() }
    }
}

impl Behavior for ValueSlider2D {
    fn id(&self) -> Uuid {
        self.id
    }

    fn behave(&self, element: &Arc<Element>, frame: &BehaviorFrame<'_>) {
        let fastest = element
            .touching
            .iter()
            .filter_map(|entry| frame.touch(*entry.key()).cloned())
            .max_by(|a, b| {
                a.velocity.length_squared().partial_cmp(&b.velocity.length_squared()).unwrap_or(Ordering::Equal)
            });
        let Some(fastest) = fastest else { return };

        let plane = plane_matrix(element, self.plane, frame.view);
        let Some(curr) = project_to_plane(plane, fastest.origin, fastest.view_dir) else { return };
        let Some(prev) = project_to_plane(plane, fastest.prev_origin, fastest.prev_view_dir) else { return };
        let delta = (curr - prev) * self.coefficients;

        let mut values = element.attached_values();
        let needed = self.index_x.max(self.index_y) + 1;
        if values.values.len() < needed {
            values.values.resize(needed, 0.0);
        }
        values.values[self.index_x] += delta.x;
        values.values[self.index_y] += delta.y;
        if let Some((min, max)) = self.clamp {
            values.values[self.index_x] = values.values[self.index_x].clamp(min.x, max.x);
            values.values[self.index_y] = values.values[self.index_y].clamp(min.y, max.y);
        }
    }
}
