//! §8 scenario S6: a draggable element's display transform follows a single
//! touch at half gain (the sliding behavior's fixed smoothing factor).

use float_eq::assert_float_eq;
use glam::{Mat4, Vec2};
use scenetouch_behaviors::SlidingBehavior;
use scenetouch_core::{Context, ContextConfig, ElementId, Prototype, ShapeKind};
use std::collections::HashMap;
use std::sync::Arc;

#[test]
fn s6_single_touch_drag_moves_at_half_gain() {
    let mut proto = Prototype::new("rect", ShapeKind::Rectangle);
    proto.behaviors = vec![Arc::new(SlidingBehavior::default())];
    let id = proto.id;
    let mut map = HashMap::new();
    map.insert(id, proto);

    let mut ctx = Context::new(ContextConfig::default());
    ctx.add_or_update_elements(true, &map);
    let element = ctx.root(ElementId::from(id)).unwrap();

    let dt = 1.0 / 60.0;
    ctx.mainloop(&[(Vec2::ZERO, 1, 1.0)], Mat4::IDENTITY, Mat4::IDENTITY, dt);
    assert_float_eq!(element.display_transform().position().x, 0.0, abs <= 1e-6);

    ctx.mainloop(&[(Vec2::new(0.1, 0.0), 1, 1.0)], Mat4::IDENTITY, Mat4::IDENTITY, dt);
    assert_float_eq!(element.display_transform().position().x, 0.05, abs <= 1e-4);
}

#[test]
fn sliding_respects_minimum_touches() {
    let mut proto = Prototype::new("rect", ShapeKind::Rectangle);
    proto.behaviors = vec![Arc::new(SlidingBehavior {
        minimum_touches: 2,
        ..SlidingBehavior::default()
    })];
    let id = proto.id;
    let mut map = HashMap::new();
    map.insert(id, proto);

    let mut ctx = Context::new(ContextConfig::default());
    ctx.add_or_update_elements(true, &map);
    let element = ctx.root(ElementId::from(id)).unwrap();

    let dt = 1.0 / 60.0;
    ctx.mainloop(&[(Vec2::ZERO, 1, 1.0)], Mat4::IDENTITY, Mat4::IDENTITY, dt);
    ctx.mainloop(&[(Vec2::new(0.2, 0.0), 1, 1.0)], Mat4::IDENTITY, Mat4::IDENTITY, dt);

    // Only one touch is present; the gesture never reaches `minimum_touches`.
    assert_float_eq!(element.display_transform().position().x, 0.0, abs <= 1e-6);
}
