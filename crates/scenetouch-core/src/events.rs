use crate::intersection::IntersectionPoint;
use crate::touch::Touch;
use std::sync::Arc;

/// The event name/payload pairs an element can fire, per spec §6. Every
/// variant carries the triggering touch and, where applicable, the current
/// intersection.
#[derive(Debug, Clone)]
pub enum ElementEvent {
    InteractionBegin { touch: Arc<Touch> },
    InteractionEnd { touch: Arc<Touch> },
    TouchBegin { touch: Arc<Touch>, intersection: IntersectionPoint },
    TouchEnd { touch: Arc<Touch> },
    HitBegin { touch: Arc<Touch>, intersection: IntersectionPoint },
    HitEnd { touch: Arc<Touch> },
    Interacting { touch: Arc<Touch> },
    ChildrenUpdated,
    DeletionStarted,
    Deleting,
    FadedIn,
    MainLoopBegin,
    MainLoopEnd,
    VerticalMouseWheelChange { touch: Arc<Touch>, delta: f32 },
    HorizontalMouseWheelChange { touch: Arc<Touch>, delta: f32 },
    MouseButtonPressed { touch: Arc<Touch>, button: u8 },
    MouseButtonReleased { touch: Arc<Touch>, button: u8 },
}

type Handler = Box<dyn Fn(&ElementEvent) + Send + Sync>;

/// Per-element callback registry. Handlers may be invoked from worker
/// threads during the parallel hit-test/element phases (§5(iv)); callers
/// registering a handler are responsible for its thread-safety.
#[derive(Default)]
pub struct Handlers {
    handlers: Vec<Handler>,
}

impl std::fmt::Debug for Handlers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Handlers")
            .field("count", &self.handlers.len())
            .finish()
    }
}

impl Clone for Handlers {
    fn clone(&self) -> Self {
        // Handlers are host-registered callbacks, not cloneable state; a
        // cloned element starts with an empty registry and the host
        // re-subscribes as needed.
        Self::default()
    }
}

impl Handlers {
    pub fn on(&mut self, handler: impl Fn(&ElementEvent) + Send + Sync + 'static) {
        self.handlers.push(Box::new(handler));
    }

    pub fn fire(&self, event: ElementEvent) {
        for handler in &self.handlers {
            handler(&event);
        }
    }
}
