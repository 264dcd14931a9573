use crate::behavior::BehaviorFrame;
use crate::element::Element;
use crate::events::ElementEvent;
use crate::ids::{ElementId, PrototypeId, TouchId};
use crate::prototype::Prototype;
use crate::touch::Touch;
use dashmap::DashMap;
use glam::{Mat4, Vec2, Vec3};
use parking_lot::Mutex;
use rayon::prelude::*;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, trace};

/// Host-tunable knobs for one [`Context`] (§6).
#[derive(Debug, Clone)]
pub struct ContextConfig {
    pub use_parallel: bool,
    pub consider_new_before: u32,
    pub consider_released_after: u32,
    pub minimum_force: f32,
    pub update_only_change_flagged: bool,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            use_parallel: false,
            consider_new_before: 1,
            consider_released_after: 1,
            minimum_force: -1.0,
            update_only_change_flagged: false,
        }
    }
}

/// The per-frame interaction pipeline and owner of every [`Element`] instance
/// for one viewport (§4.6). Not reentrant: the host calls [`Context::mainloop`]
/// once per frame from a single thread; that call may itself fan work out
/// across a thread pool for the hit-test and element phases.
pub struct Context {
    pub config: ContextConfig,
    roots: DashMap<ElementId, Arc<Element>>,
    touches: DashMap<TouchId, Touch>,
    flat_elements: Mutex<Vec<Arc<Element>>>,
    elements_updated: AtomicBool,
    elements_deleted: AtomicBool,

    view: Mat4,
    projection_aspect: Mat4,
    inv_view: Mat4,
    inv_projection_aspect: Mat4,
    view_position: Vec3,
    view_direction: Vec3,
    delta_time: f32,
}

impl Context {
    pub fn new(config: ContextConfig) -> Self {
        Self {
            config,
            roots: DashMap::new(),
            touches: DashMap::new(),
            flat_elements: Mutex::new(Vec::new()),
            elements_updated: AtomicBool::new(false),
            elements_deleted: AtomicBool::new(false),
            view: Mat4::IDENTITY,
            projection_aspect: Mat4::IDENTITY,
            inv_view: Mat4::IDENTITY,
            inv_projection_aspect: Mat4::IDENTITY,
            view_position: Vec3::ZERO,
            view_direction: Vec3::NEG_Z,
            delta_time: 0.0,
        }
    }

    pub fn roots(&self) -> Vec<Arc<Element>> {
        self.roots.iter().map(|e| e.value().clone()).collect()
    }

    pub fn root(&self, id: ElementId) -> Option<Arc<Element>> {
        self.roots.get(&id).map(|e| e.value().clone())
    }

    pub fn flat_elements(&self) -> Vec<Arc<Element>> {
        self.flat_elements.lock().clone()
    }

    pub fn touch(&self, id: TouchId) -> Option<Touch> {
        self.touches.get(&id).map(|t| t.clone())
    }

    pub fn view_position(&self) -> Vec3 {
        self.view_position
    }

    pub fn view_direction(&self) -> Vec3 {
        self.view_direction
    }

    pub fn delta_time(&self) -> f32 {
        self.delta_time
    }

    // ---- §4.5 reconciliation ----

    pub fn add_or_update_elements(&mut self, remove_missing: bool, prototypes: &HashMap<PrototypeId, Prototype>) {
        for (proto_id, proto) in prototypes {
            let id = ElementId::from(*proto_id);
            if let Some(existing) = self.roots.get(&id) {
                existing.update_from(proto);
            } else {
                let element = Element::instantiate(proto);
                self.roots.insert(id, element);
            }
        }
        if remove_missing {
            let present: std::collections::HashSet<ElementId> =
                prototypes.keys().map(|id| ElementId::from(*id)).collect();
            for entry in self.roots.iter() {
                if !present.contains(entry.key()) {
                    entry.value().start_deletion();
                }
            }
        }
        self.elements_updated.store(true, Ordering::Relaxed);
    }

    pub fn path_query(&self, path: &str) -> Vec<Arc<Element>> {
        crate::path::query_roots(&self.roots(), path)
    }

    // ---- §4.6 main loop ----

    /// Advances the pipeline by one frame. `touches_in` is the host's raw
    /// `(point, id, force)` batch; `view`/`projection_aspect` are the
    /// matrices used to build world rays from screen points.
    pub fn mainloop(
        &mut self,
        touches_in: &[(Vec2, i32, f32)],
        view: Mat4,
        projection_aspect: Mat4,
        dt: f32,
    ) {
        // Step 1: camera-derived quantities.
        self.view = view;
        self.projection_aspect = projection_aspect;
        self.inv_view = view.inverse();
        self.inv_projection_aspect = projection_aspect.inverse();
        self.view_position = self.inv_view.transform_point3(Vec3::ZERO);
        self.view_direction = self.inv_view.transform_vector3(Vec3::NEG_Z).normalize_or_zero();
        self.delta_time = dt;

        for element in self.flat_elements() {
            element.fire(ElementEvent::MainLoopBegin);
        }

        // Step 2: drop touches that expired last frame.
        let released_after = self.config.consider_released_after;
        self.touches.retain(|_, t| !t.is_expired(released_after));

        // Step 3: age remaining touches, clear per-frame pointer deltas.
        for mut entry in self.touches.iter_mut() {
            entry.value_mut().step_frame();
        }

        // Step 4: detach deleted elements, rebuild the flat list if needed.
        if self.elements_deleted.swap(false, Ordering::Relaxed) {
            self.prune_deleted();
        }
        if self.elements_updated.swap(false, Ordering::Relaxed) || self.flat_elements.lock().is_empty() {
            self.rebuild_flat_list();
        }

        // Step 5: ingest the new batch. Each touch's world ray is derived
        // here from its (possibly just-updated) screen point, and the ray
        // from the point it held a moment ago is kept alongside it so
        // planar behaviors (§4.7) can diff a touch's position on an
        // arbitrary plane across frames without re-deriving projection
        // matrices of their own.
        let minimum_force = self.config.minimum_force;
        let inv_view = self.inv_view;
        let inv_proj = self.inv_projection_aspect;
        for (point, id, force) in touches_in {
            let touch_id = TouchId(*id);
            let mut entry = self
                .touches
                .entry(touch_id)
                .or_insert_with(|| Touch::new(touch_id, *point, *force));
            let prev_point = entry.point;
            entry.ingest(*point, *force, minimum_force);
            let (prev_origin, prev_view_dir) = world_ray(inv_view, inv_proj, prev_point);
            let (origin, view_dir) = world_ray(inv_view, inv_proj, entry.point);
            entry.prev_origin = prev_origin;
            entry.prev_view_dir = prev_view_dir;
            entry.origin = origin;
            entry.view_dir = view_dir;
        }

        let touch_refs: HashMap<TouchId, Arc<Touch>> = self
            .touches
            .iter()
            .map(|e| (*e.key(), Arc::new(e.value().clone())))
            .collect();

        let flat = self.flat_elements();

        // Step 6: clear this frame's hovering.
        for element in &flat {
            element.hovering.clear();
        }

        // Step 7: hit-test phase, parallel across touches.
        let attached: DashMap<TouchId, Vec<ElementId>> = DashMap::new();
        let view_proj = projection_aspect * view;
        let hit_test_one = |touch_id: &TouchId, touch: &Arc<Touch>| {
            let (origin, dir) = (touch.origin, touch.view_dir);
            let mut hits: Vec<(Arc<Element>, crate::intersection::IntersectionPoint)> = Vec::new();
            for element in &flat {
                if !element.is_active() {
                    continue;
                }
                if let Some(mut intersection) = element.hit_test_ray(*touch_id, origin, dir) {
                    let clip = view_proj.project_point3(intersection.world_space);
                    intersection.depth = clip.z;
                    hits.push((element.clone(), intersection));
                }
            }
            hits.sort_by(|a, b| a.1.depth.partial_cmp(&b.1.depth).unwrap_or(std::cmp::Ordering::Equal));
            let mut chain = Vec::new();
            for (element, intersection) in hits {
                element.hovering.insert(*touch_id, intersection);
                chain.push(element.id);
                if !element.is_transparent() {
                    break;
                }
            }
            attached.insert(*touch_id, chain);
        };
        if self.config.use_parallel {
            touch_refs.par_iter().for_each(|(id, t)| hit_test_one(id, t));
        } else {
            touch_refs.iter().for_each(|(id, t)| hit_test_one(id, t));
        }
        for mut entry in self.touches.iter_mut() {
            if let Some(chain) = attached.get(entry.key()) {
                entry.value_mut().attached_object = chain.clone();
            }
        }

        // Step 8: element phase, parallel across elements.
        let element_step_one = |element: &Arc<Element>| {
            self.step_element(element, &touch_refs, view);
        };
        if self.config.use_parallel {
            flat.par_iter().for_each(element_step_one);
        } else {
            flat.iter().for_each(element_step_one);
        }

        // Move-to-top-style behaviors rewrite sibling state and must run
        // serialized, outside the parallel phase above (§5, §9).
        for element in &flat {
            for behavior in element.behaviors() {
                if behavior.writes_siblings() {
                    behavior.behave(element, &BehaviorFrame { dt, view, touches: &touch_refs });
                }
            }
        }

        for element in &flat {
            if let Some(mut sub) = element.sub_context().take() {
                let outer: Vec<(TouchId, Arc<Touch>)> = touch_refs.iter().map(|(k, v)| (*k, v.clone())).collect();
                sub.step(element, &outer, dt);
                *element.sub_context() = Some(sub);
            }
        }

        if flat.iter().any(|e| e.delete_me()) {
            self.elements_deleted.store(true, Ordering::Relaxed);
        }

        for element in &flat {
            element.fire(ElementEvent::MainLoopEnd);
        }
    }

    fn step_element(&self, element: &Arc<Element>, touch_refs: &HashMap<TouchId, Arc<Touch>>, view: Mat4) {
        let released_after = self.config.consider_released_after;
        let new_before = self.config.consider_new_before;
        let dt = self.delta_time;

        // a (+ slide-off half of d): prune/refresh `touching`.
        let touching_keys: Vec<TouchId> = element.touching.iter().map(|e| *e.key()).collect();
        for touch_id in touching_keys {
            let Some(touch) = touch_refs.get(&touch_id) else {
                element.touching.remove(&touch_id);
                continue;
            };
            if touch.is_expired(released_after) || !touch.pressed {
                element.touching.remove(&touch_id);
                element.fire(ElementEvent::TouchEnd { touch: touch.clone() });
                if element.touching.is_empty() {
                    element.fire(ElementEvent::InteractionEnd { touch: touch.clone() });
                }
                continue;
            }
            let (origin, dir) = (touch.origin, touch.view_dir);
            match element.hit_test_ray(touch_id, origin, dir) {
                Some(intersection) => {
                    element.touching.insert(touch_id, Some(intersection));
                }
                None => {
                    element.touching.insert(touch_id, None);
                }
            }
        }

        // b (+ geometric half of d): prune/refresh `hitting`.
        let hitting_keys: Vec<TouchId> = element.hitting.iter().map(|e| *e.key()).collect();
        for touch_id in hitting_keys {
            let Some(touch) = touch_refs.get(&touch_id) else {
                element.hitting.remove(&touch_id);
                continue;
            };
            if touch.is_expired(released_after) {
                element.hitting.remove(&touch_id);
                element.fire(ElementEvent::HitEnd { touch: touch.clone() });
                continue;
            }
            match element.hit_test_ray(touch_id, touch.origin, touch.view_dir) {
                Some(intersection) => {
                    element.hitting.insert(touch_id, intersection);
                }
                None => {
                    element.hitting.remove(&touch_id);
                    element.fire(ElementEvent::HitEnd { touch: touch.clone() });
                }
            }
        }

        // e: fade timers.
        element.advance_fade(dt);

        // f: mouse-derived events for attached-pointer touches currently hitting.
        for entry in element.hitting.iter() {
            let touch_id = *entry.key();
            if let Some(touch) = touch_refs.get(&touch_id) {
                if let Some(pointer) = touch.attached_pointer {
                    if pointer.scroll_vertical != 0.0 {
                        element.fire(ElementEvent::VerticalMouseWheelChange {
                            touch: touch.clone(),
                            delta: pointer.scroll_vertical,
                        });
                    }
                    if pointer.scroll_horizontal != 0.0 {
                        element.fire(ElementEvent::HorizontalMouseWheelChange {
                            touch: touch.clone(),
                            delta: pointer.scroll_horizontal,
                        });
                    }
                    if let Some(button) = pointer.button_pressed {
                        element.fire(ElementEvent::MouseButtonPressed { touch: touch.clone(), button });
                    }
                    if let Some(button) = pointer.button_released {
                        element.fire(ElementEvent::MouseButtonReleased { touch: touch.clone(), button });
                    }
                }
            }
        }

        // g: smoothed transform follow.
        if element.transformation_follow_time() > 0.0 {
            let target = element.target_transform();
            let mut display = element.display_transform();
            display.follow_with_damper(&target, element.transformation_follow_time(), dt, element.transform_application());
            element.set_display_transform(display);
        }

        // h: interacting event.
        if element.is_touched() {
            for entry in element.touching.iter() {
                if let Some(touch) = touch_refs.get(entry.key()) {
                    element.fire(ElementEvent::Interacting { touch: touch.clone() });
                }
            }
        }

        // i: behaviors (sibling-writing ones are skipped here, run in the
        // serialized post-pass instead).
        for behavior in element.behaviors() {
            if !behavior.writes_siblings() {
                behavior.behave(element, &BehaviorFrame { dt, view, touches: touch_refs });
            }
        }

        // j: hovering-driven hit_begin / interaction_begin / touch_begin.
        let hovering: Vec<(TouchId, crate::intersection::IntersectionPoint)> =
            element.hovering.iter().map(|e| (*e.key(), *e.value())).collect();
        for (touch_id, intersection) in hovering {
            let Some(touch) = touch_refs.get(&touch_id) else { continue };
            let newly_hitting = !element.hitting.contains_key(&touch_id);
            if newly_hitting {
                element.hitting.insert(touch_id, intersection);
                element.fire(ElementEvent::HitBegin { touch: touch.clone(), intersection });
            }
            let eligible = touch.is_new(new_before) && !element.touching.contains_key(&touch_id) && touch.pressed;
            if eligible {
                let was_empty = element.touching.is_empty();
                element.touching.insert(touch_id, Some(intersection));
                if was_empty {
                    element.fire(ElementEvent::InteractionBegin { touch: touch.clone() });
                }
                element.fire(ElementEvent::TouchBegin { touch: touch.clone(), intersection });
            }
        }

        // Flags observed by the host reflect this frame's final membership,
        // computed once all of the above mutations have settled (§8 S3).
        element.set_hit(!element.hitting.is_empty());
        element.set_touched(!element.touching.is_empty());
    }

    fn prune_deleted(&mut self) {
        let root_ids: Vec<ElementId> = self.roots.iter().map(|e| *e.key()).collect();
        for id in root_ids {
            if let Some(element) = self.roots.get(&id).map(|e| e.value().clone()) {
                if element.delete_me() {
                    self.roots.remove(&id);
                }
            }
        }
        for element in self.roots() {
            prune_deleted_recursive(&element);
        }
    }

    fn rebuild_flat_list(&mut self) {
        let mut flat = Vec::new();
        for root in self.roots() {
            collect_depth_first(&root, &mut flat);
        }
        debug!(count = flat.len(), "rebuilt flat element list");
        *self.flat_elements.lock() = flat;
    }
}

fn prune_deleted_recursive(element: &Arc<Element>) {
    for child in element.children() {
        if child.delete_me() {
            child.detach_from_parent();
            trace!(id = child.id.0, "pruned deleted element");
        } else {
            prune_deleted_recursive(&child);
        }
    }
}

fn collect_depth_first(element: &Arc<Element>, out: &mut Vec<Arc<Element>>) {
    out.push(element.clone());
    for child in element.children() {
        collect_depth_first(&child, out);
    }
}

/// World-space ray for a normalized projective screen `point`, via the
/// inverse view and inverse combined projection-aspect matrices (§4.6.1).
fn world_ray(inv_view: Mat4, inv_projection_aspect: Mat4, point: Vec2) -> (Vec3, Vec3) {
    let near = inv_projection_aspect.transform_point3(Vec3::new(point.x, point.y, -1.0));
    let far = inv_projection_aspect.transform_point3(Vec3::new(point.x, point.y, 1.0));
    let origin = inv_view.transform_point3(near);
    let dir = inv_view.transform_vector3(far - near).normalize_or_zero();
    (origin, dir)
}
