use crate::context::{Context, ContextConfig};
use crate::element::Element;
use crate::touch::Touch;
use glam::Mat4;

/// Configuration for an element's nested [`SubContext`] (§4.8). `use_touching`
/// selects whether the inner context is fed from the host's `touching` map
/// (keeps driving touches through slide-off) or its `hitting` map (drops a
/// touch the instant it leaves the host's bounds).
#[derive(Debug, Clone)]
pub struct SubContextOptions {
    pub use_touching: bool,
    pub config: ContextConfig,
}

impl Default for SubContextOptions {
    fn default() -> Self {
        Self { use_touching: false, config: ContextConfig::default() }
    }
}

/// A nested [`Context`] fed from a host element's surface intersections
/// instead of a host-supplied touch batch. Not traversed by the outer
/// context's hit-testing or path queries (§4.8).
pub struct SubContext {
    pub context: Box<Context>,
    options: SubContextOptions,
}

impl SubContext {
    pub fn new(options: SubContextOptions) -> Self {
        Self { context: Box::new(Context::new(options.config.clone())), options }
    }

    /// Derives a touch batch from the host element's surface intersections
    /// (§4.8): each intersection's `surface_space` becomes the inner touch's
    /// 2D point, tagged with the original touch's id and force so the inner
    /// context's press/release latching behaves the same as the outer one.
    pub fn step(&mut self, host: &Element, outer_touches: &[(crate::ids::TouchId, std::sync::Arc<Touch>)], dt: f32) {
        let mut inner_batch = Vec::new();
        for (touch_id, touch) in outer_touches {
            let intersection = if self.options.use_touching {
                host.touching.get(touch_id).and_then(|e| *e)
            } else {
                host.hitting.get(touch_id).map(|e| *e)
            };
            let Some(intersection) = intersection else { continue };
            inner_batch.push((intersection.surface_space, touch_id.0, touch.force));
        }
        // The inner context operates directly in the host's surface space:
        // an identity view/projection treats `surface_space` as the screen
        // point, matching the plane-at-origin convention `world_ray` uses.
        self.context.mainloop(&inner_batch, Mat4::IDENTITY, Mat4::IDENTITY, dt);
    }
}
