use std::sync::atomic::{AtomicU64, Ordering};

/// Identity of a prototype, shared representation with the [`ElementId`] of
/// the instance it produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PrototypeId(pub u64);

/// Identity of an [`crate::element::Element`] instance. Equal to the id of
/// the prototype it was instantiated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(pub u64);

impl From<PrototypeId> for ElementId {
    fn from(id: PrototypeId) -> Self {
        ElementId(id.0)
    }
}

impl From<ElementId> for PrototypeId {
    fn from(id: ElementId) -> Self {
        PrototypeId(id.0)
    }
}

/// Identity of a [`crate::touch::Touch`]. Stable across frames as long as the
/// same id keeps appearing in the input batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TouchId(pub i32);

static NEXT_PROTOTYPE_ID: AtomicU64 = AtomicU64::new(1);

/// Mints a fresh id for hosts that don't supply their own. Ids are unique
/// within a process, never reused.
pub fn next_prototype_id() -> PrototypeId {
    PrototypeId(NEXT_PROTOTYPE_ID.fetch_add(1, Ordering::Relaxed))
}
