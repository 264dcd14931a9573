use crate::ids::ElementId;
use thiserror::Error;

/// Errors that can surface from the interaction pipeline.
///
/// Structural and per-element errors are captured and logged rather than
/// aborting the frame; only [`ScenetouchError::Fatal`] is meant to propagate
/// out of [`crate::context::Context::mainloop`].
#[derive(Debug, Error)]
pub enum ScenetouchError {
    #[error("prototype [{child}] has the same id as its parent [{parent}]; ignoring it")]
    StructuralCycle { parent: ElementId, child: ElementId },

    #[error("duplicate prototype id [{0}] at the same tree level; ignoring the later one")]
    StructuralDuplicate(ElementId),

    #[error("no shape constructor is registered for shape kind {0:?}")]
    UnknownShapeKind(crate::prototype::ShapeKindTag),

    #[error("concurrency violation: {0}")]
    ConcurrencyViolation(&'static str),

    #[error("fatal pipeline error: {0}")]
    Fatal(String),
}

pub type Result<T> = std::result::Result<T, ScenetouchError>;
