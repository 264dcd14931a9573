//! End-to-end scenarios from the spec's testable-properties section,
//! exercised through `Context::mainloop` with identity view/projection/
//! aspect (a plane at z=0 is hit by a ray straight down its z axis).

use float_eq::assert_float_eq;
use glam::{Mat4, Vec2};
use scenetouch_core::{Context, ContextConfig, ElementEvent, ElementId, Prototype, PrototypeId, ShapeKind};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn single(proto: Prototype) -> (PrototypeId, HashMap<PrototypeId, Prototype>) {
    let id = proto.id;
    let mut map = HashMap::new();
    map.insert(id, proto);
    (id, map)
}

fn run_frames(ctx: &mut Context, touches: &[(Vec2, i32, f32)], n: u32, dt: f32) {
    for _ in 0..n {
        ctx.mainloop(touches, Mat4::IDENTITY, Mat4::IDENTITY, dt);
    }
}

#[test]
fn s1_hit_begin_fires_hit_and_touch_begin() {
    let (id, map) = single(Prototype::new("rect", ShapeKind::Rectangle));
    let mut ctx = Context::new(ContextConfig::default());
    ctx.add_or_update_elements(true, &map);
    let element = ctx.root(ElementId::from(id)).unwrap();

    let hit_begin = Arc::new(AtomicUsize::new(0));
    let touch_begin = Arc::new(AtomicUsize::new(0));
    let (hb, tb) = (hit_begin.clone(), touch_begin.clone());
    element.handlers().on(move |event| match event {
        ElementEvent::HitBegin { .. } => {
            hb.fetch_add(1, Ordering::SeqCst);
        }
        ElementEvent::TouchBegin { .. } => {
            tb.fetch_add(1, Ordering::SeqCst);
        }
        _ => {}
    });

    ctx.mainloop(&[(Vec2::ZERO, 7, 1.0)], Mat4::IDENTITY, Mat4::IDENTITY, 1.0 / 60.0);

    assert_eq!(hit_begin.load(Ordering::SeqCst), 1);
    assert_eq!(touch_begin.load(Ordering::SeqCst), 1);
    assert_eq!(element.touching.len(), 1);
}

#[test]
fn s2_transparent_element_does_not_occlude_but_opaque_does() {
    let mut transparent = Prototype::new("glass", ShapeKind::Rectangle);
    transparent.transparent = true;
    transparent.display_transform.set_position(glam::Vec3::new(0.0, 0.0, 0.5));
    let transparent_id = transparent.id;

    let mut opaque_near = Prototype::new("opaque_near", ShapeKind::Rectangle);
    opaque_near.display_transform.set_position(glam::Vec3::new(0.0, 0.0, 1.0));
    let opaque_near_id = opaque_near.id;

    let mut opaque_far = Prototype::new("opaque_far", ShapeKind::Rectangle);
    opaque_far.display_transform.set_position(glam::Vec3::new(0.0, 0.0, 2.0));
    let opaque_far_id = opaque_far.id;

    let mut map = HashMap::new();
    map.insert(transparent_id, transparent);
    map.insert(opaque_near_id, opaque_near);
    map.insert(opaque_far_id, opaque_far);

    let mut ctx = Context::new(ContextConfig::default());
    ctx.add_or_update_elements(true, &map);
    ctx.mainloop(&[(Vec2::ZERO, 1, 1.0)], Mat4::IDENTITY, Mat4::IDENTITY, 1.0 / 60.0);

    let touch_id = scenetouch_core::TouchId(1);
    assert!(ctx.root(ElementId::from(transparent_id)).unwrap().hovering.contains_key(&touch_id));
    assert!(ctx.root(ElementId::from(opaque_near_id)).unwrap().hovering.contains_key(&touch_id));
    assert!(!ctx.root(ElementId::from(opaque_far_id)).unwrap().hovering.contains_key(&touch_id));
}

#[test]
fn s3_slide_off_keeps_touching_but_drops_hitting() {
    let (id, map) = single(Prototype::new("rect", ShapeKind::Rectangle));
    let mut ctx = Context::new(ContextConfig::default());
    ctx.add_or_update_elements(true, &map);
    let element = ctx.root(ElementId::from(id)).unwrap();

    ctx.mainloop(&[(Vec2::ZERO, 7, 1.0)], Mat4::IDENTITY, Mat4::IDENTITY, 1.0 / 60.0);
    assert!(element.is_hit());
    assert!(element.is_touched());

    ctx.mainloop(&[(Vec2::new(2.0, 0.0), 7, 1.0)], Mat4::IDENTITY, Mat4::IDENTITY, 1.0 / 60.0);

    let touch_id = scenetouch_core::TouchId(7);
    assert_eq!(element.touching.len(), 1);
    assert_eq!(*element.touching.get(&touch_id).unwrap().value(), None);
    assert!(!element.is_hit());
    assert!(element.is_touched());
}

#[test]
fn s4_fade_out_cascades_with_child_delay() {
    let mut parent = Prototype::new("parent", ShapeKind::Rectangle);
    parent.fade_out_time = 1.0;
    parent.fade_out_delay = 0.0;

    let mut child = Prototype::new("child", ShapeKind::Rectangle);
    child.fade_out_time = 1.0;
    child.fade_out_delay = 0.5;
    let child_id = child.id;
    parent.add_child(child).unwrap();
    let parent_id = parent.id;

    let mut map = HashMap::new();
    map.insert(parent_id, parent);
    let mut ctx = Context::new(ContextConfig::default());
    ctx.add_or_update_elements(true, &map);

    let parent_element = ctx.root(ElementId::from(parent_id)).unwrap();
    let child_element = parent_element.child(ElementId::from(child_id)).unwrap();

    parent_element.start_deletion();
    run_frames(&mut ctx, &[], 10, 0.1);

    assert!(parent_element.delete_me());
    assert_float_eq!(child_element.element_fade(), 0.5, abs <= 0.02);
}

#[test]
fn s5_deletion_reversed_mid_fade_out_re_fades_in() {
    let mut proto = Prototype::new("el", ShapeKind::Rectangle);
    proto.fade_in_time = 1.0;
    proto.fade_in_delay = 0.0;
    proto.fade_out_time = 1.0;
    proto.fade_out_delay = 0.0;
    let (id, map) = single(proto.clone());

    let mut ctx = Context::new(ContextConfig::default());
    ctx.add_or_update_elements(true, &map);
    let element = ctx.root(ElementId::from(id)).unwrap();

    let faded_in = Arc::new(AtomicUsize::new(0));
    let counted = faded_in.clone();
    element.handlers().on(move |event| {
        if matches!(event, ElementEvent::FadedIn) {
            counted.fetch_add(1, Ordering::SeqCst);
        }
    });

    // Let the initial fade-in finish (needs 1.0s; run with margin).
    run_frames(&mut ctx, &[], 15, 0.1);
    assert_eq!(faded_in.load(Ordering::SeqCst), 1);
    assert_float_eq!(element.element_fade(), 1.0, abs <= 1e-6);

    element.start_deletion();
    run_frames(&mut ctx, &[], 5, 0.1); // 0.5s of fade-out
    assert_float_eq!(element.element_fade(), 0.5, abs <= 0.05);

    element.update_from(&proto); // reversal arrives mid fade-out
    run_frames(&mut ctx, &[], 8, 0.1); // needs another 0.5s to complete

    assert_eq!(faded_in.load(Ordering::SeqCst), 2);
    assert_float_eq!(element.element_fade(), 1.0, abs <= 1e-6);
    assert!(!element.is_deleted());
}

#[test]
fn s_boundary_zero_fade_in_time_is_visible_immediately() {
    let (id, map) = single(Prototype::new("el", ShapeKind::Rectangle));
    let mut ctx = Context::new(ContextConfig::default());
    ctx.add_or_update_elements(true, &map);
    let element = ctx.root(ElementId::from(id)).unwrap();

    ctx.mainloop(&[], Mat4::IDENTITY, Mat4::IDENTITY, 1.0 / 60.0);
    assert_float_eq!(element.element_fade(), 1.0, abs <= 1e-6);
}

#[test]
fn s_boundary_zero_fade_out_time_deletes_same_frame() {
    let (id, map) = single(Prototype::new("el", ShapeKind::Rectangle));
    let mut ctx = Context::new(ContextConfig::default());
    ctx.add_or_update_elements(true, &map);
    let element = ctx.root(ElementId::from(id)).unwrap();

    element.start_deletion();
    assert!(element.delete_me());
}

#[test]
fn s_boundary_unpressed_touch_hits_without_touch_begin() {
    let (id, map) = single(Prototype::new("rect", ShapeKind::Rectangle));
    let mut ctx = Context::new(ContextConfig { minimum_force: 0.5, ..ContextConfig::default() });
    ctx.add_or_update_elements(true, &map);
    let element = ctx.root(ElementId::from(id)).unwrap();

    let touch_begin = Arc::new(AtomicUsize::new(0));
    let counted = touch_begin.clone();
    element.handlers().on(move |event| {
        if matches!(event, ElementEvent::TouchBegin { .. }) {
            counted.fetch_add(1, Ordering::SeqCst);
        }
    });

    ctx.mainloop(&[(Vec2::ZERO, 3, 0.1)], Mat4::IDENTITY, Mat4::IDENTITY, 1.0 / 60.0);

    assert!(element.is_hit());
    assert_eq!(touch_begin.load(Ordering::SeqCst), 0);
    assert!(element.touching.is_empty());
}
