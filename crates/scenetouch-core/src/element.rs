use crate::aux::AttachedValues;
use crate::behavior::Behavior;
use crate::error::ScenetouchError;
use crate::events::{ElementEvent, Handlers};
use crate::ids::{ElementId, PrototypeId, TouchId};
use crate::intersection::IntersectionPoint;
use crate::prototype::{Prototype, ShapeKindTag};
use crate::shapes::ShapeAdapter;
use crate::subcontext::SubContext;
use crate::touch::Touch;
use dashmap::DashMap;
use glam::{Mat4, Vec3};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Weak};
use tracing::warn;

use crate::transform::{ApplyTransformMode, Transform};

/// Lifecycle state machine (§4.3). `FadingOut -> FadingIn` is the only
/// permitted back-edge, taken when `update_from` arrives mid fade-out.
#[derive(Debug, Clone, Copy)]
enum FadeState {
    FadingIn { delay_elapsed: f32, fade_elapsed: f32 },
    Visible,
    /// `base` is the `element_fade` value captured at the moment
    /// `start_deletion` was called (not necessarily 1.0, if a fade-in was
    /// cancelled mid-flight); the decay multiplies this fixed base rather
    /// than the previous frame's already-decayed value (§4.3, §8 S4).
    FadingOut { delay_elapsed: f32, fade_elapsed: f32, base: f32 },
    Deleted,
}

/// Stateful per-context realization of a [`Prototype`]. Owned exclusively by
/// the [`crate::context::Context`] that instantiated it; children hold a
/// strong reference from their parent and a weak reference back.
pub struct Element {
    pub id: ElementId,
    name: Mutex<String>,
    active: AtomicBool,
    pub transparent: AtomicBool,
    shape: Mutex<Box<dyn ShapeAdapter>>,
    shape_tag: Mutex<ShapeKindTag>,
    only_hit_if_parent_is_hit: AtomicBool,
    transform_application: Mutex<ApplyTransformMode>,
    fade_in_time: Mutex<f32>,
    fade_in_delay: Mutex<f32>,
    fade_out_time: Mutex<f32>,
    fade_out_delay: Mutex<f32>,
    transformation_follow_time: Mutex<f32>,

    display_transform: Mutex<Transform>,
    target_transform: Mutex<Transform>,
    world_matrix: Mutex<Option<Mat4>>,
    world_dirty: AtomicBool,

    fade_state: Mutex<FadeState>,
    element_fade_bits: AtomicU32,

    pub hovering: DashMap<TouchId, IntersectionPoint>,
    pub hitting: DashMap<TouchId, IntersectionPoint>,
    pub touching: DashMap<TouchId, Option<IntersectionPoint>>,
    hit: AtomicBool,
    touched: AtomicBool,

    delete_me: AtomicBool,

    children: DashMap<ElementId, Arc<Element>>,
    parent: Mutex<Option<Weak<Element>>>,

    age: Mutex<f32>,
    attached_values: Mutex<AttachedValues>,
    handlers: Mutex<Handlers>,
    behaviors: Mutex<Vec<Arc<dyn Behavior>>>,
    sub_context: Mutex<Option<SubContext>>,
}

impl Element {
    /// Recursively instantiates a prototype tree, wiring parent
    /// back-references as it descends.
    pub fn instantiate(proto: &Prototype) -> Arc<Element> {
        let element = Arc::new(Element {
            id: ElementId::from(proto.id),
            name: Mutex::new(proto.name.clone()),
            active: AtomicBool::new(proto.active),
            transparent: AtomicBool::new(proto.transparent),
            shape: Mutex::new(proto.shape.build_adapter()),
            shape_tag: Mutex::new(proto.shape.tag()),
            only_hit_if_parent_is_hit: AtomicBool::new(proto.only_hit_if_parent_is_hit),
            transform_application: Mutex::new(proto.transform_application),
            fade_in_time: Mutex::new(proto.fade_in_time),
            fade_in_delay: Mutex::new(proto.fade_in_delay),
            fade_out_time: Mutex::new(proto.fade_out_time),
            fade_out_delay: Mutex::new(proto.fade_out_delay),
            transformation_follow_time: Mutex::new(proto.transformation_follow_time),
            display_transform: Mutex::new(proto.display_transform.clone()),
            target_transform: Mutex::new(proto.display_transform.clone()),
            world_matrix: Mutex::new(None),
            world_dirty: AtomicBool::new(true),
            fade_state: Mutex::new(if proto.fade_in_time <= 0.0 {
                FadeState::Visible
            } else {
                FadeState::FadingIn { delay_elapsed: 0.0, fade_elapsed: 0.0 }
            }),
            element_fade_bits: AtomicU32::new((if proto.fade_in_time <= 0.0 { 1.0f32 } else { 0.0 }).to_bits()),
            hovering: DashMap::new(),
            hitting: DashMap::new(),
            touching: DashMap::new(),
            hit: AtomicBool::new(false),
            touched: AtomicBool::new(false),
            delete_me: AtomicBool::new(false),
            children: DashMap::new(),
            parent: Mutex::new(None),
            age: Mutex::new(0.0),
            attached_values: Mutex::new(proto.attached_values.clone().unwrap_or_default()),
            handlers: Mutex::new(Handlers::default()),
            behaviors: Mutex::new(proto.behaviors.clone()),
            sub_context: Mutex::new(proto.sub_context_options.clone().map(SubContext::new)),
        });

        for child_proto in proto.children.values() {
            let child = Element::instantiate(child_proto);
            *child.parent.lock() = Some(Arc::downgrade(&element));
            element.children.insert(child.id, child);
        }
        element.world_dirty.store(true, Ordering::Relaxed);
        element
    }

    pub fn name(&self) -> String {
        self.name.lock().clone()
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Relaxed)
    }

    pub fn is_transparent(&self) -> bool {
        self.transparent.load(Ordering::Relaxed)
    }

    pub fn is_hit(&self) -> bool {
        self.hit.load(Ordering::Relaxed)
    }

    pub fn is_touched(&self) -> bool {
        self.touched.load(Ordering::Relaxed)
    }

    pub fn delete_me(&self) -> bool {
        self.delete_me.load(Ordering::Relaxed)
    }

    pub fn element_fade(&self) -> f32 {
        f32::from_bits(self.element_fade_bits.load(Ordering::Relaxed))
    }

    fn set_element_fade(&self, value: f32) {
        self.element_fade_bits.store(value.clamp(0.0, 1.0).to_bits(), Ordering::Relaxed);
    }

    pub fn parent(&self) -> Option<Arc<Element>> {
        self.parent.lock().as_ref().and_then(Weak::upgrade)
    }

    pub fn children(&self) -> Vec<Arc<Element>> {
        self.children.iter().map(|e| e.value().clone()).collect()
    }

    pub fn child(&self, id: ElementId) -> Option<Arc<Element>> {
        self.children.get(&id).map(|e| e.value().clone())
    }

    pub fn handlers(&self) -> parking_lot::MutexGuard<'_, Handlers> {
        self.handlers.lock()
    }

    pub fn fire(&self, event: ElementEvent) {
        self.handlers.lock().fire(event);
    }

    pub fn attached_values(&self) -> parking_lot::MutexGuard<'_, AttachedValues> {
        self.attached_values.lock()
    }

    pub fn age(&self) -> f32 {
        *self.age.lock()
    }

    pub fn display_transform(&self) -> Transform {
        self.display_transform.lock().clone()
    }

    pub fn target_transform(&self) -> Transform {
        self.target_transform.lock().clone()
    }

    pub fn set_display_transform(&self, t: Transform) {
        *self.display_transform.lock() = t;
        self.invalidate_world();
    }

    /// Cached world matrix: this element's local matrix composed with its
    /// parent's world matrix. Recomputed lazily after any invalidation.
    pub fn world_matrix(&self) -> Mat4 {
        if !self.world_dirty.load(Ordering::Acquire) {
            if let Some(m) = *self.world_matrix.lock() {
                return m;
            }
        }
        let local = self.display_transform.lock().matrix();
        let world = match self.parent() {
            // glam is column-vector: composing `parent * local` applies the
            // child's local transform first, then the parent's, which is
            // the correct hierarchical order (§8 invariant 6).
            Some(parent) => parent.world_matrix() * local,
            None => local,
        };
        *self.world_matrix.lock() = Some(world);
        self.world_dirty.store(false, Ordering::Release);
        world
    }

    pub fn inverse_world_matrix(&self) -> Mat4 {
        self.world_matrix().inverse()
    }

    /// Marks this element's cached world matrix dirty and propagates the
    /// invalidation depth-first into every descendant (§5 transform-cache
    /// discipline, §9 Design Notes).
    pub fn invalidate_world(&self) {
        self.world_dirty.store(true, Ordering::Release);
        for child in self.children.iter() {
            child.value().invalidate_world();
        }
    }

    // ---- reconciliation (§4.5) ----

    pub fn update_from(&self, proto: &Prototype) {
        self.active.store(proto.active, Ordering::Relaxed);
        self.transparent.store(proto.transparent, Ordering::Relaxed);
        *self.shape.lock() = proto.shape.build_adapter();
        *self.shape_tag.lock() = proto.shape.tag();
        self.only_hit_if_parent_is_hit
            .store(proto.only_hit_if_parent_is_hit, Ordering::Relaxed);
        *self.transform_application.lock() = proto.transform_application;
        *self.fade_in_time.lock() = proto.fade_in_time;
        *self.fade_in_delay.lock() = proto.fade_in_delay;
        *self.fade_out_time.lock() = proto.fade_out_time;
        *self.fade_out_delay.lock() = proto.fade_out_delay;
        *self.transformation_follow_time.lock() = proto.transformation_follow_time;
        *self.behaviors.lock() = proto.behaviors.clone();
        *self.name.lock() = proto.name.clone();

        if proto.transformation_follow_time > 0.0 {
            self.target_transform.lock().update_from(&proto.display_transform, ApplyTransformMode::ALL);
        } else {
            self.display_transform.lock().update_from(&proto.display_transform, ApplyTransformMode::ALL);
            self.target_transform.lock().update_from(&proto.display_transform, ApplyTransformMode::ALL);
            self.invalidate_world();
        }

        self.reenter_fade_in_if_fading_out();

        self.update_children(true, &proto.children);
    }

    fn reenter_fade_in_if_fading_out(&self) {
        let mut state = self.fade_state.lock();
        if let FadeState::FadingOut { .. } = *state {
            let current_fade = self.element_fade();
            let fade_in_time = *self.fade_in_time.lock();
            let fade_elapsed = if fade_in_time > 0.0 { current_fade * fade_in_time } else { fade_in_time };
            *state = FadeState::FadingIn {
                delay_elapsed: 0.0,
                fade_elapsed,
            };
        }
    }

    pub fn update_children(
        &self,
        remove_missing: bool,
        prototypes: &HashMap<PrototypeId, Prototype>,
    ) {
        for (proto_id, proto) in prototypes {
            if ElementId::from(*proto_id) == self.id {
                warn!(child = proto_id.0, "child prototype id equals parent id; rejecting");
                continue;
            }
            let child_id = ElementId::from(*proto_id);
            if let Some(existing) = self.children.get(&child_id) {
                existing.update_from(proto);
            } else {
                let child = Element::instantiate(proto);
                *child.parent.lock() = Some(Arc::downgrade(&self.arc_self_unchecked()));
                self.children.insert(child_id, child);
            }
        }
        if remove_missing {
            let present: std::collections::HashSet<ElementId> =
                prototypes.keys().map(|id| ElementId::from(*id)).collect();
            for entry in self.children.iter() {
                if !present.contains(entry.key()) {
                    entry.value().start_deletion();
                }
            }
        }
        self.fire(ElementEvent::ChildrenUpdated);
    }

    /// `update_children` needs a strong `Arc<Self>` to hand children a weak
    /// parent pointer, but only has `&self`. Every call site reaches this
    /// method through an `Arc<Element>` already held by the context's flat
    /// list or another element's `children` map, so reconstructing one from
    /// a raw pointer is sound: the allocation is still alive by construction.
    fn arc_self_unchecked(&self) -> Arc<Element> {
        unsafe {
            let ptr = self as *const Element;
            Arc::increment_strong_count(ptr);
            Arc::from_raw(ptr)
        }
    }

    // ---- lifecycle (§4.3) ----

    pub fn start_deletion(&self) {
        for child in self.children.iter() {
            child.value().start_deletion();
        }

        let fade_out_time = *self.fade_out_time.lock();
        let mut state = self.fade_state.lock();
        if matches!(*state, FadeState::FadingOut { .. } | FadeState::Deleted) {
            return;
        }

        if fade_out_time <= 0.0 {
            *state = FadeState::Deleted;
            drop(state);
            self.set_element_fade(0.0);
            self.delete_me.store(true, Ordering::Relaxed);
            self.fire(ElementEvent::DeletionStarted);
            return;
        }

        let current_fade = self.element_fade();
        *state = FadeState::FadingOut {
            delay_elapsed: 0.0,
            fade_elapsed: 0.0,
            base: current_fade,
        };
        drop(state);
        self.fire(ElementEvent::DeletionStarted);
    }

    /// Advances fade timers and `element_fade` by `dt` (§4.3, §4.6 step 8e).
    pub fn advance_fade(&self, dt: f32) {
        *self.age.lock() += dt;
        let mut state = self.fade_state.lock();
        match &mut *state {
            FadeState::FadingIn { delay_elapsed, fade_elapsed } => {
                let delay = *self.fade_in_delay.lock();
                let time = *self.fade_in_time.lock();
                if *delay_elapsed < delay {
                    *delay_elapsed = (*delay_elapsed + dt).min(delay);
                } else {
                    *fade_elapsed += dt;
                }
                let fade = if time > 0.0 { (*fade_elapsed / time).clamp(0.0, 1.0) } else { 1.0 };
                self.set_element_fade(fade);
                if *delay_elapsed >= delay && fade >= 1.0 {
                    *state = FadeState::Visible;
                    drop(state);
                    self.set_element_fade(1.0);
                    self.fire(ElementEvent::FadedIn);
                    return;
                }
            }
            FadeState::Visible => {
                self.set_element_fade(1.0);
            }
            FadeState::FadingOut { delay_elapsed, fade_elapsed, base } => {
                let delay = *self.fade_out_delay.lock();
                let time = *self.fade_out_time.lock();
                let base = *base;
                if *delay_elapsed < delay {
                    *delay_elapsed = (*delay_elapsed + dt).min(delay);
                } else {
                    *fade_elapsed += dt;
                }
                if *delay_elapsed >= delay {
                    let factor = if time > 0.0 { (*fade_elapsed / time).clamp(0.0, 1.0) } else { 1.0 };
                    self.set_element_fade(base * (1.0 - factor));
                    if factor >= 1.0 {
                        *state = FadeState::Deleted;
                        drop(state);
                        self.set_element_fade(0.0);
                        self.delete_me.store(true, Ordering::Relaxed);
                        self.fire(ElementEvent::Deleting);
                        return;
                    }
                }
                self.fire(ElementEvent::Deleting);
            }
            FadeState::Deleted => {}
        }
    }

    pub fn is_deleted(&self) -> bool {
        matches!(*self.fade_state.lock(), FadeState::Deleted)
    }

    // ---- hit-testing (§4.2) ----

    fn local_ray(&self, origin: Vec3, dir: Vec3) -> (Vec3, Vec3) {
        let inv = self.inverse_world_matrix();
        let local_origin = inv.transform_point3(origin);
        let local_dir = inv.transform_vector3(dir).normalize_or_zero();
        (local_origin, local_dir)
    }

    /// The gated, authoritative hit-test (§4.2): if `only_hit_if_parent_is_hit`
    /// is set and a parent exists, this element can only be hit when its
    /// parent is also hit for the same ray this frame, evaluated lazily and
    /// recursively rather than from a cached flag (§9).
    pub fn hit_test_ray(&self, touch_id: TouchId, origin: Vec3, dir: Vec3) -> Option<IntersectionPoint> {
        if self.only_hit_if_parent_is_hit.load(Ordering::Relaxed) {
            match self.parent() {
                Some(parent) => {
                    parent.hit_test_ray(touch_id, origin, dir)?;
                }
                None => return None,
            }
        }
        let (local_origin, local_dir) = self.local_ray(origin, dir);
        let (hit, _persistent) = self.shape.lock().pure_hit_test(local_origin, local_dir);
        hit.map(|h| self.promote(touch_id, h))
    }

    /// Raw, ungated geometric query used by behaviors to track motion past
    /// a shape's finite bounds (§4.2's "persistent" return).
    pub fn persistent_point_ray(&self, touch_id: TouchId, origin: Vec3, dir: Vec3) -> Option<IntersectionPoint> {
        let (local_origin, local_dir) = self.local_ray(origin, dir);
        let (_hit, persistent) = self.shape.lock().pure_hit_test(local_origin, local_dir);
        persistent.map(|h| self.promote(touch_id, h))
    }

    fn promote(&self, touch_id: TouchId, hit: crate::shapes::LocalHit) -> IntersectionPoint {
        let world = self.world_matrix();
        IntersectionPoint {
            element_id: self.id,
            touch_id,
            world_space: world.transform_point3(hit.element_space),
            element_space: hit.element_space,
            surface_space: hit.surface_space,
            world_tangent_frame: world * hit.element_tangent_frame,
            element_tangent_frame: hit.element_tangent_frame,
            depth: 0.0,
        }
    }

    pub fn shape_tag(&self) -> ShapeKindTag {
        *self.shape_tag.lock()
    }

    pub fn transform_application(&self) -> ApplyTransformMode {
        *self.transform_application.lock()
    }

    pub fn transformation_follow_time(&self) -> f32 {
        *self.transformation_follow_time.lock()
    }

    pub fn behaviors(&self) -> Vec<Arc<dyn Behavior>> {
        self.behaviors.lock().clone()
    }

    pub fn sub_context(&self) -> parking_lot::MutexGuard<'_, Option<SubContext>> {
        self.sub_context.lock()
    }

    pub fn set_hit(&self, value: bool) {
        self.hit.store(value, Ordering::Relaxed);
    }

    pub fn set_touched(&self, value: bool) {
        self.touched.store(value, Ordering::Relaxed);
    }

    pub fn detach_from_parent(self: &Arc<Self>) {
        if let Some(parent) = self.parent() {
            parent.children.remove(&self.id);
        }
    }
}

impl std::fmt::Debug for Element {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Element")
            .field("id", &self.id)
            .field("name", &self.name())
            .field("fade", &self.element_fade())
            .finish()
    }
}

#[allow(dead_code)]
pub(crate) fn validate_no_cycle(_child: &ElementId) -> Result<(), ScenetouchError> {
    Ok(())
}
