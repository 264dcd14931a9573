use crate::plane::{plane_matrix, project_to_plane, PlaneSelector};
use glam::{Quat, Vec2, Vec3};
use scenetouch_core::aux::Cloned;
use scenetouch_core::behavior::{Behavior, BehaviorFrame};
use scenetouch_core::{Element, Touch};
use std::collections::VecDeque;
use std::sync::Arc;
use uuid::Uuid;

/// Fixed one-pole smoothing factor applied to every raw per-frame delta
/// before it's used to move the element, so a single frame's pointer jitter
/// doesn't snap the element the full distance (an element reaches half of a
/// step change's distance after one frame, a quarter after two, and so on).
const SMOOTHING: f32 = 0.5;
/// How far back the delayed-delta ring buffer keeps samples, for flick
/// velocity lookup (§4.7).
const HISTORY_WINDOW_SECS: f32 = 1.0;

#[derive(Debug, Clone, Copy)]
struct HistorySample {
    age: f32,
    delta_pos: Vec2,
    delta_angle: f32,
    delta_size: f32,
}

#[derive(Debug, Clone, Default)]
struct SlidingState {
    delta_pos: Vec2,
    delta_angle: f32,
    delta_size: f32,
    total_angle: f32,
    flicking: bool,
    history: VecDeque<HistorySample>,
}

/// The canonical multi-touch sliding/scrolling behavior (§4.7 reference
/// behavior): drags, pinch-rotates and pinch-scales an element from its
/// `touching` set, with flick-on-release inertia.
#[derive(Debug, Clone)]
pub struct SlidingBehavior {
    id: Uuid,
    pub draggable: bool,
    pub scalable: bool,
    pub pivotable: bool,
    pub translate_coefficients: Vec2,
    pub rotate_coefficient: f32,
    pub scale_coefficient: f32,
    pub minimum_touches: usize,
    pub rotation_limits: Option<(f32, f32)>,
    pub translation_limits: Option<(Vec3, Vec3)>,
    pub scale_min_max: Option<(f32, f32)>,
    pub flick_time: f32,
    pub flick_velocity_delay: f32,
    pub plane: PlaneSelector,
    pub include_child_touches: bool,
}

impl Default for SlidingBehavior {
    fn default() -> Self {
        Self {
            id: Uuid::new_v4(),
            draggable: true,
            scalable: false,
            pivotable: false,
            translate_coefficients: Vec2::ONE,
            rotate_coefficient: 1.0,
            scale_coefficient: 1.0,
            minimum_touches: 1,
            rotation_limits: None,
            translation_limits: None,
            scale_min_max: None,
            flick_time: 0.3,
            flick_velocity_delay: 0.1,
            plane: PlaneSelector::ViewAligned,
            include_child_touches: false,
        }
    }
}

impl SlidingBehavior {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_id(id: Uuid) -> Self {
        Self { id, ..Self::default() }
    }

    fn state_key(&self) -> String {
        self.id.to_string()
    }

    fn gather_touches(&self, element: &Arc<Element>, frame: &BehaviorFrame<'_>) -> Vec<Arc<Touch>> {
        let mut ids: Vec<_> = element.touching.iter().map(|e| *e.key()).collect();
        if self.include_child_touches {
            for child in element.children() {
                ids.extend(child.touching.iter().map(|e| *e.key()));
            }
        }
        ids.sort_by_key(|id| id.0);
        ids.dedup();
        ids.into_iter().filter_map(|id| frame.touch(id).cloned()).collect()
    }

    fn apply(&self, element: &Arc<Element>, state: &mut SlidingState, frame: &BehaviorFrame<'_>) {
        if state.delta_pos == Vec2::ZERO && state.delta_angle == 0.0 && state.delta_size == 0.0 {
            return;
        }
        let plane = plane_matrix(element, self.plane, frame.view);
        let (_, plane_rotation, _) = plane.to_scale_rotation_translation();
        let mut transform = element.display_transform();

        if self.draggable && state.delta_pos != Vec2::ZERO {
            let planar = state.delta_pos * self.translate_coefficients;
            let delta_world = plane_rotation * planar.extend(0.0);
            let mut new_pos = transform.position() + delta_world;
            if let Some((min, max)) = self.translation_limits {
                new_pos = new_pos.clamp(min, max);
            }
            transform.set_position(new_pos);
        }

        if self.pivotable && state.delta_angle != 0.0 {
            let mut desired_total = state.total_angle + state.delta_angle * self.rotate_coefficient;
            if let Some((min, max)) = self.rotation_limits {
                desired_total = desired_total.clamp(min, max);
            }
            let effective_delta = desired_total - state.total_angle;
            state.total_angle = desired_total;

            let world_axis = plane_rotation * Vec3::Z;
            let delta_quat = Quat::from_axis_angle(world_axis, effective_delta);
            let new_rotation = match element.parent() {
                Some(parent) => {
                    let (_, parent_rotation, _) = parent.world_matrix().to_scale_rotation_translation();
                    let local_axis_quat = parent_rotation.inverse() * delta_quat * parent_rotation;
                    local_axis_quat * transform.rotation()
                }
                None => delta_quat * transform.rotation(),
            };
            transform.set_rotation(new_rotation.normalize());
        }

        if self.scalable && state.delta_size != 0.0 {
            let factor = 1.0 + state.delta_size * self.scale_coefficient;
            let mut new_scale = transform.scale() * factor;
            if let Some((min, max)) = self.scale_min_max {
                new_scale = new_scale.clamp(Vec3::splat(min), Vec3::splat(max));
            }
            transform.set_scale(new_scale);
        }

        element.set_display_transform(transform);
    }
}

impl Behavior for SlidingBehavior {
    fn id(&self) -> Uuid {
        self.id
    }

    fn behave(&self, element: &Arc<Element>, frame: &BehaviorFrame<'_>) {
        let key = self.state_key();
        let mut state = {
            let values = element.attached_values();
            values
                .behavior_state(&key)
                .and_then(|s| s.as_any().downcast_ref::<Cloned<SlidingState>>())
                .map(|c| c.0.clone())
                .unwrap_or_default()
        };

        let touches = self.gather_touches(element, frame);
        let plane = plane_matrix(element, self.plane, frame.view);
        let gesture = self.compute_gesture(&touches, plane);

        match gesture {
            Some((raw_pos, raw_angle, raw_size)) => {
                state.flicking = false;
                state.delta_pos = state.delta_pos.lerp(raw_pos, SMOOTHING);
                state.delta_angle = lerp_f32(state.delta_angle, raw_angle, SMOOTHING);
                state.delta_size = lerp_f32(state.delta_size, raw_size, SMOOTHING);

                let age = element.age();
                state.history.push_back(HistorySample {
                    age,
                    delta_pos: state.delta_pos,
                    delta_angle: state.delta_angle,
                    delta_size: state.delta_size,
                });
                let cutoff = age - HISTORY_WINDOW_SECS;
                while matches!(state.history.front(), Some(s) if s.age < cutoff) {
                    state.history.pop_front();
                }
            }
            None if !state.flicking
                && (state.delta_pos != Vec2::ZERO || state.delta_angle != 0.0 || state.delta_size != 0.0) =>
            {
                state.flicking = true;
                let target_age = element.age() - self.flick_velocity_delay;
                if let Some(sample) = state
                    .history
                    .iter()
                    .min_by(|a, b| (a.age - target_age).abs().total_cmp(&(b.age - target_age).abs()))
                {
                    state.delta_pos = sample.delta_pos;
                    state.delta_angle = sample.delta_angle;
                    state.delta_size = sample.delta_size;
                }
                state.history.clear();
            }
            None if state.flicking => {
                let decay = if self.flick_time > 0.0 { (-frame.dt / self.flick_time).exp() } else { 0.0 };
                state.delta_pos *= decay;
                state.delta_angle *= decay;
                state.delta_size *= decay;
            }
            None => {}
        }

        self.apply(element, &mut state, frame);

        let mut values = element.attached_values();
        values.set_behavior_state(&key, Box::new(Cloned(state)));
    }
}

impl SlidingBehavior {
    /// Returns the raw (unsmoothed) `(delta_pos, delta_angle, delta_size)`
    /// this frame's touches produce, or `None` when fewer than
    /// `minimum_touches` are active.
    fn compute_gesture(&self, touches: &[Arc<Touch>], plane: glam::Mat4) -> Option<(Vec2, f32, f32)> {
        if touches.len() < self.minimum_touches || touches.is_empty() {
            return None;
        }
        if touches.len() == 1 {
            let touch = &touches[0];
            let curr = project_to_plane(plane, touch.origin, touch.view_dir)?;
            let prev = project_to_plane(plane, touch.prev_origin, touch.prev_view_dir)?;
            if self.draggable {
                return Some((curr - prev, 0.0, 0.0));
            }
            if self.scalable || self.pivotable {
                // A single touch's rotate/scale gesture is derived against
                // its mirror through the plane origin, treated as a
                // synthetic second point (§4.7).
                let (angle, size) = two_point_gesture(prev, -prev, curr, -curr);
                return Some((Vec2::ZERO, angle, size));
            }
            return Some((Vec2::ZERO, 0.0, 0.0));
        }

        let mut sorted: Vec<&Arc<Touch>> = touches.iter().collect();
        sorted.sort_by(|a, b| {
            b.velocity.length_squared().partial_cmp(&a.velocity.length_squared()).unwrap_or(std::cmp::Ordering::Equal)
        });
        let t0 = sorted[0];
        let t1 = sorted[1];
        let c0 = project_to_plane(plane, t0.origin, t0.view_dir)?;
        let c1 = project_to_plane(plane, t1.origin, t1.view_dir)?;
        let p0 = project_to_plane(plane, t0.prev_origin, t0.prev_view_dir)?;
        let p1 = project_to_plane(plane, t1.prev_origin, t1.prev_view_dir)?;

        let delta_pos = if self.draggable { (c0 + c1) * 0.5 - (p0 + p1) * 0.5 } else { Vec2::ZERO };
        let (angle, size) = two_point_gesture(p0, p1, c0, c1);
        Some((delta_pos, if self.pivotable { angle } else { 0.0 }, if self.scalable { size } else { 0.0 }))
    }
}

fn lerp_f32(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Derives a rotation delta and a fractional scale delta from two points
/// observed a frame apart, treated as the endpoints of a pinch gesture.
fn two_point_gesture(prev_a: Vec2, prev_b: Vec2, curr_a: Vec2, curr_b: Vec2) -> (f32, f32) {
    let prev_vec = prev_b - prev_a;
    let curr_vec = curr_b - curr_a;
    let prev_len = prev_vec.length();
    let curr_len = curr_vec.length();
    let angle = if prev_len > 1e-6 && curr_len > 1e-6 {
        wrap_angle(curr_vec.y.atan2(curr_vec.x) - prev_vec.y.atan2(prev_vec.x))
    } else {
        0.0
    };
    let size = if prev_len > 1e-6 { curr_len / prev_len - 1.0 } else { 0.0 };
    (angle, size)
}

fn wrap_angle(angle: f32) -> f32 {
    let tau = std::f32::consts::TAU;
    let mut a = angle % tau;
    if a > std::f32::consts::PI {
        a -= tau;
    }
    if a < -std::f32::consts::PI {
        a += tau;
    }
    a
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_behavior_is_draggable_single_touch() {
        let behavior = SlidingBehavior::default();
        assert!(behavior.draggable);
        assert_eq!(behavior.minimum_touches, 1);
    }

    #[test]
    fn two_point_gesture_detects_pure_rotation() {
        let prev_a = Vec2::new(1.0, 0.0);
        let prev_b = Vec2::new(-1.0, 0.0);
        let curr_a = Vec2::new(0.0, 1.0);
        let curr_b = Vec2::new(0.0, -1.0);
        let (angle, size) = two_point_gesture(prev_a, prev_b, curr_a, curr_b);
        assert!((angle - std::f32::consts::FRAC_PI_2).abs() < 1e-4);
        assert!(size.abs() < 1e-4);
    }

    #[test]
    fn two_point_gesture_detects_pure_scale() {
        let prev_a = Vec2::new(1.0, 0.0);
        let prev_b = Vec2::new(-1.0, 0.0);
        let curr_a = Vec2::new(2.0, 0.0);
        let curr_b = Vec2::new(-2.0, 0.0);
        let (angle, size) = two_point_gesture(prev_a, prev_b, curr_a, curr_b);
        assert!(angle.abs() < 1e-4);
        assert!((size - 1.0).abs() < 1e-4);
    }
}
