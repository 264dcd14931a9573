use std::any::Any;
use std::collections::HashMap;
use std::fmt::Debug;

/// An opaque, per-element auxiliary object. Behaviors store whatever state
/// they need under their own key; the bag never downcasts on their behalf,
/// so `copy`/`update_from` are the only operations the bag itself relies on.
pub trait AuxiliaryObject: Any + Debug + Send + Sync {
    fn copy(&self) -> Box<dyn AuxiliaryObject>;
    fn update_from(&mut self, other: &dyn AuxiliaryObject);
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Blanket impl for any `Clone + Debug` state type, matching how most
/// behaviors in this crate store a small `Clone` struct under their key.
#[derive(Debug, Clone, Default)]
pub struct Cloned<T: Clone + Debug + Send + Sync + 'static>(pub T);

impl<T: Clone + Debug + Send + Sync + 'static> AuxiliaryObject for Cloned<T> {
    fn copy(&self) -> Box<dyn AuxiliaryObject> {
        Box::new(self.clone())
    }

    fn update_from(&mut self, other: &dyn AuxiliaryObject) {
        if let Some(other) = other.as_any().downcast_ref::<Cloned<T>>() {
            self.0 = other.0.clone();
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// A bag of N floats, N strings, and opaque auxiliary objects keyed by
/// string. Behaviors store their per-element state under a reserved
/// `"Internal.Behavior:"`-prefixed key; hosts use any other key.
#[derive(Debug, Default)]
pub struct AttachedValues {
    pub values: Vec<f32>,
    pub strings: Vec<String>,
    auxiliary: HashMap<String, Box<dyn AuxiliaryObject>>,
}

pub const BEHAVIOR_KEY_PREFIX: &str = "Internal.Behavior:";

impl Clone for AttachedValues {
    fn clone(&self) -> Self {
        self.copy()
    }
}

impl AttachedValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn auxiliary(&self, key: &str) -> Option<&dyn AuxiliaryObject> {
        self.auxiliary.get(key).map(|b| b.as_ref())
    }

    pub fn auxiliary_mut(&mut self, key: &str) -> Option<&mut Box<dyn AuxiliaryObject>> {
        self.auxiliary.get_mut(key)
    }

    pub fn set_auxiliary(&mut self, key: impl Into<String>, value: Box<dyn AuxiliaryObject>) {
        self.auxiliary.insert(key.into(), value);
    }

    pub fn behavior_state(&self, behavior_id: &str) -> Option<&dyn AuxiliaryObject> {
        self.auxiliary(&format!("{BEHAVIOR_KEY_PREFIX}{behavior_id}"))
    }

    pub fn set_behavior_state(&mut self, behavior_id: &str, value: Box<dyn AuxiliaryObject>) {
        self.set_auxiliary(format!("{BEHAVIOR_KEY_PREFIX}{behavior_id}"), value);
    }

    /// Resizes `self.values` to `target_len`, zero-filling any newly added
    /// slots, then copies `min(self.values.len(), other.len())` entries from
    /// `other` — the mandated semantics for mismatched-length fills (§9).
    pub fn fill_values(&mut self, other: &[f32], target_len: usize) {
        self.values.resize(target_len, 0.0);
        let n = self.values.len().min(other.len());
        self.values[..n].copy_from_slice(&other[..n]);
    }

    pub fn copy(&self) -> Self {
        Self {
            values: self.values.clone(),
            strings: self.strings.clone(),
            auxiliary: self
                .auxiliary
                .iter()
                .map(|(k, v)| (k.clone(), v.copy()))
                .collect(),
        }
    }

    pub fn update_from(&mut self, other: &Self) {
        self.values.clone_from(&other.values);
        self.strings.clone_from(&other.strings);
        for (k, v) in &other.auxiliary {
            match self.auxiliary.get_mut(k) {
                Some(existing) => existing.update_from(v.as_ref()),
                None => {
                    self.auxiliary.insert(k.clone(), v.copy());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fill_values_zero_fills_excess_then_copies_min_len() {
        let mut values = AttachedValues::new();
        values.fill_values(&[1.0, 2.0], 4);
        assert_eq!(values.values, vec![1.0, 2.0, 0.0, 0.0]);
    }

    #[test]
    fn fill_values_truncates_when_target_shorter() {
        let mut values = AttachedValues::new();
        values.fill_values(&[1.0, 2.0, 3.0], 2);
        assert_eq!(values.values, vec![1.0, 2.0]);
    }

    #[test]
    fn auxiliary_round_trips_through_copy() {
        let mut values = AttachedValues::new();
        values.set_auxiliary("k", Box::new(Cloned(42u32)));
        let copied = values.copy();
        let stored = copied.auxiliary("k").unwrap().as_any().downcast_ref::<Cloned<u32>>();
        assert_eq!(stored.unwrap().0, 42);
    }
}
