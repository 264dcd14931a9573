use glam::{Mat4, Quat, Vec3};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// Selects which components of a [`Transform`] a copy or follow operation
/// applies to. Bits match spec: Translation=1, Rotation=2, Scale=4, All=7.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApplyTransformMode(pub u8);

impl ApplyTransformMode {
    pub const TRANSLATION: Self = Self(1);
    pub const ROTATION: Self = Self(2);
    pub const SCALE: Self = Self(4);
    pub const ALL: Self = Self(7);

    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl std::ops::BitOr for ApplyTransformMode {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl Default for ApplyTransformMode {
    fn default() -> Self {
        Self::ALL
    }
}

type Subscriber = Box<dyn Fn() + Send + Sync>;

/// Position/rotation/scale triple with a cached world matrix and a
/// change-subscription map. Setters invalidate the cache and fire every
/// subscriber synchronously, letting the owning element chase its own cache
/// invalidation without polling.
#[derive(Clone)]
pub struct Transform {
    position: Vec3,
    rotation: Quat,
    scale: Vec3,
    matrix: Arc<Mutex<Option<Mat4>>>,
    subscribers: Arc<Mutex<HashMap<String, Subscriber>>>,
}

impl std::fmt::Debug for Transform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transform")
            .field("position", &self.position)
            .field("rotation", &self.rotation)
            .field("scale", &self.scale)
            .field("cached", &self.cached())
            .finish()
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
            matrix: Arc::new(Mutex::new(None)),
            subscribers: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

impl Transform {
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn rotation(&self) -> Quat {
        self.rotation
    }

    pub fn scale(&self) -> Vec3 {
        self.scale
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
        self.invalidate();
    }

    pub fn set_rotation(&mut self, rotation: Quat) {
        self.rotation = rotation;
        self.invalidate();
    }

    pub fn set_scale(&mut self, scale: Vec3) {
        self.scale = scale;
        self.invalidate();
    }

    /// True while the cached matrix still reflects the current components.
    pub fn cached(&self) -> bool {
        self.matrix.lock().is_some()
    }

    /// scale * rotation * translation, composed in that order to match the
    /// column-vector convention downstream consumers use.
    pub fn matrix(&self) -> Mat4 {
        let mut guard = self.matrix.lock();
        if let Some(m) = *guard {
            return m;
        }
        let m = Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position);
        *guard = Some(m);
        m
    }

    fn invalidate(&self) {
        *self.matrix.lock() = None;
        let subs = self.subscribers.lock();
        for f in subs.values() {
            f();
        }
    }

    /// Registers a callback fired synchronously on every mutation. Returns
    /// the previous subscriber under the same id, if any.
    pub fn subscribe(&self, id: impl Into<String>, f: impl Fn() + Send + Sync + 'static) {
        self.subscribers.lock().insert(id.into(), Box::new(f));
    }

    pub fn unsubscribe(&self, id: &str) {
        self.subscribers.lock().remove(id);
    }

    /// Applies the components selected by `mask` from `other` onto `self`.
    pub fn update_from(&mut self, other: &Transform, mask: ApplyTransformMode) {
        if mask.contains(ApplyTransformMode::TRANSLATION) {
            self.position = other.position;
        }
        if mask.contains(ApplyTransformMode::ROTATION) {
            self.rotation = other.rotation;
        }
        if mask.contains(ApplyTransformMode::SCALE) {
            self.scale = other.scale;
        }
        self.invalidate();
    }

    /// Critically-damped exponential filter toward `target`, applied only to
    /// the components selected by `mask`. `time` is the smoothing time
    /// constant in seconds; `time <= 0` snaps immediately.
    pub fn follow_with_damper(
        &mut self,
        target: &Transform,
        time: f32,
        dt: f32,
        mask: ApplyTransformMode,
    ) {
        if time <= 0.0 {
            self.update_from(target, mask);
            return;
        }
        let alpha = 1.0 - (-dt / time).exp();
        if mask.contains(ApplyTransformMode::TRANSLATION) {
            self.position = self.position.lerp(target.position, alpha);
        }
        if mask.contains(ApplyTransformMode::ROTATION) {
            self.rotation = self.rotation.slerp(target.rotation, alpha);
        }
        if mask.contains(ApplyTransformMode::SCALE) {
            self.scale = self.scale.lerp(target.scale, alpha);
        }
        self.invalidate();
    }

    /// Composes this transform's matrix with a view matrix, for consumers
    /// that want a view-space representation without walking the element
    /// hierarchy themselves.
    pub fn get_view_matrix(&self, view: Mat4) -> Mat4 {
        view * self.matrix()
    }

    pub fn get_view_position(&self, view: Mat4) -> Vec3 {
        self.get_view_matrix(view).transform_point3(Vec3::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_eq::assert_float_eq;

    #[test]
    fn matrix_caches_until_mutated() {
        let mut t = Transform::from_position(Vec3::new(1.0, 2.0, 3.0));
        let m1 = t.matrix();
        assert!(t.cached());
        t.set_position(Vec3::new(4.0, 5.0, 6.0));
        assert!(!t.cached());
        let m2 = t.matrix();
        assert_ne!(m1.to_cols_array(), m2.to_cols_array());
        assert!(t.cached());
    }

    #[test]
    fn subscriber_fires_on_mutation() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        let count = Arc::new(AtomicUsize::new(0));
        let mut t = Transform::default();
        let counted = count.clone();
        t.subscribe("owner", move || {
            counted.fetch_add(1, Ordering::SeqCst);
        });
        t.set_scale(Vec3::splat(2.0));
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn damper_moves_half_gain_in_one_time_constant() {
        let mut t = Transform::default();
        let target = Transform::from_position(Vec3::new(1.0, 0.0, 0.0));
        t.follow_with_damper(&target, 1.0, 1.0, ApplyTransformMode::ALL);
        // alpha = 1 - e^-1 ~= 0.632
        assert_float_eq!(t.position().x, 0.632_12, abs <= 1e-4);
    }

    #[test]
    fn zero_time_snaps_immediately() {
        let mut t = Transform::default();
        let target = Transform::from_position(Vec3::new(5.0, 0.0, 0.0));
        t.follow_with_damper(&target, 0.0, 1.0 / 60.0, ApplyTransformMode::ALL);
        assert_eq!(t.position(), target.position());
    }
}
