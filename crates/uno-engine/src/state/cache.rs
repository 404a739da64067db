use std::collections::HashMap;

use crate::backend::{Backend, ResourceId, TextureTarget};

/// A piece of device state tracked by [`StateCache`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum StateSlot {
    /// Currently active texture unit.
    ActiveUnit,
    /// Texture bound to `target` on `unit`.
    Texture { unit: u32, target: TextureTarget },
}

/// Last-written device state, used to skip redundant state changes.
///
/// The cache only knows what went through it. Anything that changes device
/// state behind its back (a new render pass, foreign code) must be followed by
/// [`StateCache::invalidate`] or a forced write.
#[derive(Debug, Default)]
pub struct StateCache {
    values: HashMap<StateSlot, u32>,
    emitted: u64,
    skipped: u64,
}

impl StateCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes `value` to `slot`, calling `apply` only when the value changes.
    ///
    /// With `force`, `apply` runs regardless of the cached value. The cache
    /// holds `value` afterwards in every case. Returns whether `apply` ran.
    pub fn set(
        &mut self,
        slot: StateSlot,
        value: u32,
        force: bool,
        apply: impl FnOnce(u32),
    ) -> bool {
        let changed = force || self.values.get(&slot) != Some(&value);
        if changed {
            apply(value);
            self.emitted += 1;
        } else {
            self.skipped += 1;
        }
        self.values.insert(slot, value);
        changed
    }

    /// Activates `unit` and binds `id` to `target` on it.
    pub fn bind_texture<B: Backend + ?Sized>(
        &mut self,
        backend: &mut B,
        unit: u32,
        target: TextureTarget,
        id: ResourceId,
        force: bool,
    ) {
        self.set(StateSlot::ActiveUnit, unit, force, |u| backend.set_active_unit(u));
        self.set(StateSlot::Texture { unit, target }, id, force, |id| {
            backend.bind_texture(unit, target, id)
        });
    }

    /// Cached value of `slot`, if known.
    #[inline]
    pub fn get(&self, slot: StateSlot) -> Option<u32> {
        self.values.get(&slot).copied()
    }

    /// Forgets all cached state; the next write to every slot is emitted.
    pub fn invalidate(&mut self) {
        self.values.clear();
    }

    pub fn forget(&mut self, slot: StateSlot) {
        self.values.remove(&slot);
    }

    /// State changes passed through to the device since the last counter reset.
    #[inline]
    pub fn emitted(&self) -> u64 {
        self.emitted
    }

    /// State changes elided since the last counter reset.
    #[inline]
    pub fn skipped(&self) -> u64 {
        self.skipped
    }

    pub fn reset_counters(&mut self) {
        self.emitted = 0;
        self.skipped = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{BackendCall, RecordingBackend};

    const TEX0: StateSlot = StateSlot::Texture { unit: 0, target: TextureTarget::D2 };

    #[test]
    fn repeated_value_is_emitted_once() {
        let mut cache = StateCache::new();
        let mut calls = Vec::new();

        assert!(cache.set(TEX0, 7, false, |v| calls.push(v)));
        assert!(!cache.set(TEX0, 7, false, |v| calls.push(v)));

        assert_eq!(calls, vec![7]);
        assert_eq!((cache.emitted(), cache.skipped()), (1, 1));
    }

    #[test]
    fn force_always_emits() {
        let mut cache = StateCache::new();
        let mut calls = 0;
        for _ in 0..3 {
            cache.set(TEX0, 7, true, |_| calls += 1);
        }
        assert_eq!(calls, 3);
    }

    #[test]
    fn changed_value_is_emitted() {
        let mut cache = StateCache::new();
        let mut calls = Vec::new();
        cache.set(TEX0, 1, false, |v| calls.push(v));
        cache.set(TEX0, 2, false, |v| calls.push(v));
        cache.set(TEX0, 1, false, |v| calls.push(v));
        assert_eq!(calls, vec![1, 2, 1]);
        assert_eq!(cache.get(TEX0), Some(1));
    }

    #[test]
    fn slots_are_independent() {
        let mut cache = StateCache::new();
        let array = StateSlot::Texture { unit: 0, target: TextureTarget::D2Array };
        let unit1 = StateSlot::Texture { unit: 1, target: TextureTarget::D2 };

        assert!(cache.set(TEX0, 5, false, |_| {}));
        assert!(cache.set(array, 5, false, |_| {}));
        assert!(cache.set(unit1, 5, false, |_| {}));
    }

    #[test]
    fn invalidate_forces_next_write() {
        let mut cache = StateCache::new();
        cache.set(TEX0, 3, false, |_| {});
        cache.invalidate();
        assert_eq!(cache.get(TEX0), None);
        assert!(cache.set(TEX0, 3, false, |_| {}));
    }

    #[test]
    fn forget_drops_only_that_slot() {
        let mut cache = StateCache::new();
        cache.set(StateSlot::ActiveUnit, 0, false, |_| {});
        cache.set(TEX0, 3, false, |_| {});

        cache.forget(TEX0);
        assert_eq!(cache.get(TEX0), None);
        assert_eq!(cache.get(StateSlot::ActiveUnit), Some(0));
        assert!(cache.set(TEX0, 3, false, |_| {}));
        assert!(!cache.set(StateSlot::ActiveUnit, 0, false, |_| {}));
    }

    #[test]
    fn bind_texture_elides_duplicate_device_calls() {
        let mut backend = RecordingBackend::default();
        let mut cache = StateCache::new();

        cache.bind_texture(&mut backend, 0, TextureTarget::D2, 9, false);
        cache.bind_texture(&mut backend, 0, TextureTarget::D2, 9, false);

        assert_eq!(
            backend.calls(),
            &[
                BackendCall::SetActiveUnit(0),
                BackendCall::BindTexture { unit: 0, target: TextureTarget::D2, id: 9 },
            ]
        );

        cache.bind_texture(&mut backend, 0, TextureTarget::D2, 9, true);
        assert_eq!(backend.calls().len(), 4);
    }
}
