//! Renderless 3D interaction pipeline: touch ingestion, world-ray
//! construction, parallel hit-testing, hover/hit/touch state classification,
//! event dispatch, and element fade lifecycle. Draws nothing; consumers read
//! transforms, fades, and events to drive their own renderer.

pub mod aux;
pub mod behavior;
pub mod context;
pub mod element;
pub mod error;
pub mod events;
pub mod ids;
pub mod intersection;
pub mod path;
pub mod prototype;
pub mod shapes;
pub mod subcontext;
pub mod touch;
pub mod transform;

pub use aux::{AttachedValues, AuxiliaryObject};
pub use context::{Context, ContextConfig};
pub use element::Element;
pub use error::{Result, ScenetouchError};
pub use events::ElementEvent;
pub use ids::{ElementId, PrototypeId, TouchId};
pub use intersection::IntersectionPoint;
pub use prototype::{Prototype, ShapeKind};
pub use subcontext::{SubContext, SubContextOptions};
pub use touch::Touch;
pub use transform::{ApplyTransformMode, Transform};
