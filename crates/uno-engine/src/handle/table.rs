use crate::backend::{Backend, NO_RESOURCE, ResourceId, TextureDesc};
use crate::error::RenderError;

use super::{Handle, HandleRegistry};

/// Client-facing texture handle: registry slot + slot generation.
///
/// The generation is bumped every time the slot is freed, so a handle kept past
/// its destruction is rejected instead of silently naming the next resource
/// that reuses the slot.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct TextureHandle {
    slot: Handle,
    generation: u32,
}

impl TextureHandle {
    /// "No texture". Resolves to [`NO_RESOURCE`]; destroying it is a no-op.
    pub const NONE: Self = Self { slot: Handle::INVALID, generation: 0 };

    #[inline]
    pub const fn slot(self) -> Handle {
        self.slot
    }

    #[inline]
    pub const fn generation(self) -> u32 {
        self.generation
    }

    #[inline]
    pub const fn is_none(self) -> bool {
        !self.slot.is_valid()
    }
}

impl Default for TextureHandle {
    fn default() -> Self {
        Self::NONE
    }
}

/// Owned copy of a texture's source, kept only to recreate the texture.
#[derive(Debug, Clone, PartialEq)]
pub struct TextureSource {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl TextureSource {
    fn from_desc(desc: &TextureDesc<'_>) -> Self {
        Self { width: desc.width, height: desc.height, pixels: desc.pixels.to_vec() }
    }

    pub fn desc(&self) -> TextureDesc<'_> {
        TextureDesc::rgba8(self.width, self.height, &self.pixels)
    }
}

#[derive(Debug)]
struct Entry {
    id: ResourceId,
    source: Option<TextureSource>,
    pending_release: bool,
}

#[derive(Debug, Default)]
struct Slot {
    generation: u32,
    entry: Option<Entry>,
}

/// Maps texture handles to backend resource ids.
///
/// Owns the [`HandleRegistry`]; slot `h` of the table belongs to registry
/// handle `h`. An entry is destroyed exactly when its slot is freed.
#[derive(Debug)]
pub struct ResourceTable {
    registry: HandleRegistry,
    slots: Vec<Slot>,
}

impl ResourceTable {
    pub fn new(max_handles: u8) -> Self {
        let registry = HandleRegistry::new(max_handles);
        let slots = (0..registry.capacity()).map(|_| Slot::default()).collect();
        Self { registry, slots }
    }

    /// Allocates a slot and creates the backend texture for it.
    ///
    /// On backend failure the slot is returned to the registry before the
    /// error is propagated.
    pub fn create<B: Backend + ?Sized>(
        &mut self,
        backend: &mut B,
        desc: &TextureDesc<'_>,
        retain_source: bool,
    ) -> Result<TextureHandle, RenderError> {
        let slot = self.registry.allocate();
        if !slot.is_valid() {
            return Err(RenderError::OutOfCapacity { capacity: self.registry.capacity() });
        }

        let id = match backend.create_texture(desc) {
            Ok(id) => id,
            Err(err) => {
                self.registry.release(slot);
                return Err(RenderError::BackendResourceCreationFailed(err));
            }
        };

        let entry = &mut self.slots[slot.index()];
        entry.entry = Some(Entry {
            id,
            source: retain_source.then(|| TextureSource::from_desc(desc)),
            pending_release: false,
        });

        Ok(TextureHandle { slot, generation: entry.generation })
    }

    /// Returns the backend id for `handle`.
    ///
    /// [`TextureHandle::NONE`] resolves to [`NO_RESOURCE`]. Handles that are
    /// stale or waiting for deferred release are rejected.
    #[inline]
    pub fn resolve(&self, handle: TextureHandle) -> Result<ResourceId, RenderError> {
        if handle.is_none() {
            return Ok(NO_RESOURCE);
        }
        self.live_entry(handle).map(|e| e.id)
    }

    /// Returns true if `handle` names a live, non-pending texture.
    pub fn is_live(&self, handle: TextureHandle) -> bool {
        !handle.is_none() && self.live_entry(handle).is_ok()
    }

    /// Retained source of a live texture, if it was created with one.
    pub fn source(&self, handle: TextureHandle) -> Option<&TextureSource> {
        self.live_entry(handle).ok()?.source.as_ref()
    }

    /// Destroys `handle` immediately.
    ///
    /// Only safe when no recorded command still references the texture.
    pub fn destroy_now<B: Backend + ?Sized>(
        &mut self,
        backend: &mut B,
        handle: TextureHandle,
    ) -> Result<(), RenderError> {
        if handle.is_none() {
            return Ok(());
        }
        self.live_entry(handle)?;
        self.free_slot(backend, handle.slot);
        Ok(())
    }

    /// Flags `handle` for deferred release.
    ///
    /// The slot stays allocated (and cannot be reissued) until
    /// [`ResourceTable::release_pending`] runs for it.
    pub fn mark_pending(&mut self, handle: TextureHandle) -> Result<(), RenderError> {
        self.live_entry(handle)?;
        if let Some(entry) = self.slots[handle.slot.index()].entry.as_mut() {
            entry.pending_release = true;
        }
        Ok(())
    }

    /// Frees a handle previously passed to [`ResourceTable::mark_pending`].
    pub fn release_pending<B: Backend + ?Sized>(&mut self, backend: &mut B, handle: TextureHandle) {
        let Some(slot) = self.slots.get(handle.slot.index()) else {
            return;
        };
        let pending = slot.generation == handle.generation
            && slot.entry.as_ref().is_some_and(|e| e.pending_release);
        if !pending {
            log::warn!("ResourceTable: {handle:?} is not pending release; skipped");
            return;
        }
        self.free_slot(backend, handle.slot);
    }

    /// Recreates every texture that retained its source, e.g. after the device
    /// was lost. Returns the number of textures recreated.
    ///
    /// Stops at the first backend failure. Every handle still names a live
    /// texture afterwards: either its replacement or the untouched original.
    pub fn recreate_all<B: Backend + ?Sized>(
        &mut self,
        backend: &mut B,
    ) -> Result<usize, RenderError> {
        let mut recreated = 0;
        let mut skipped = 0;

        for handle in self.registry.iter() {
            let Some(entry) = self.slots[handle.index()].entry.as_mut() else {
                continue;
            };
            let Some(source) = entry.source.as_ref() else {
                skipped += 1;
                continue;
            };

            // The old texture stays bound to the handle until its replacement exists.
            let id = backend
                .create_texture(&source.desc())
                .map_err(RenderError::BackendResourceCreationFailed)?;
            backend.destroy_texture(entry.id);
            entry.id = id;
            recreated += 1;
        }

        if skipped > 0 {
            log::warn!("ResourceTable: {skipped} texture(s) kept no source and were not recreated");
        }
        Ok(recreated)
    }

    /// Destroys every live texture and empties the registry.
    pub fn clear<B: Backend + ?Sized>(&mut self, backend: &mut B) {
        for handle in self.registry.iter() {
            let slot = &mut self.slots[handle.index()];
            if let Some(entry) = slot.entry.take() {
                backend.destroy_texture(entry.id);
            }
            slot.generation = slot.generation.wrapping_add(1);
        }
        self.registry.reset();
    }

    /// Live slots, including those pending release.
    #[inline]
    pub fn len(&self) -> usize {
        self.registry.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.registry.capacity()
    }

    pub fn registry(&self) -> &HandleRegistry {
        &self.registry
    }

    fn live_entry(&self, handle: TextureHandle) -> Result<&Entry, RenderError> {
        let invalid = RenderError::InvalidHandle(handle);
        if !self.registry.contains(handle.slot) {
            return Err(invalid);
        }
        let slot = &self.slots[handle.slot.index()];
        if slot.generation != handle.generation {
            return Err(invalid);
        }
        match slot.entry.as_ref() {
            Some(entry) if !entry.pending_release => Ok(entry),
            _ => Err(invalid),
        }
    }

    fn free_slot<B: Backend + ?Sized>(&mut self, backend: &mut B, slot: Handle) {
        let entry_slot = &mut self.slots[slot.index()];
        if let Some(entry) = entry_slot.entry.take() {
            backend.destroy_texture(entry.id);
        }
        entry_slot.generation = entry_slot.generation.wrapping_add(1);
        self.registry.release(slot);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{BackendCall, RecordingBackend};

    const PIXEL: [u8; 4] = [255, 255, 255, 255];

    fn desc() -> TextureDesc<'static> {
        TextureDesc::rgba8(1, 1, &PIXEL)
    }

    // ── create / resolve ──────────────────────────────────────────────────

    #[test]
    fn create_then_resolve() {
        let mut backend = RecordingBackend::default();
        let mut table = ResourceTable::new(8);

        let h = table.create(&mut backend, &desc(), false).unwrap();
        let id = table.resolve(h).unwrap();
        assert_ne!(id, NO_RESOURCE);
        assert!(backend.is_live(id));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn none_resolves_to_no_resource() {
        let table = ResourceTable::new(4);
        assert_eq!(table.resolve(TextureHandle::NONE), Ok(NO_RESOURCE));
    }

    #[test]
    fn out_of_capacity_is_reported() {
        let mut backend = RecordingBackend::default();
        let mut table = ResourceTable::new(2);
        table.create(&mut backend, &desc(), false).unwrap();
        table.create(&mut backend, &desc(), false).unwrap();

        let err = table.create(&mut backend, &desc(), false).unwrap_err();
        assert_eq!(err, RenderError::OutOfCapacity { capacity: 2 });
        assert_eq!(backend.count(|c| matches!(c, BackendCall::CreateTexture { .. })), 2);
    }

    #[test]
    fn backend_failure_rolls_back_slot() {
        let mut backend = RecordingBackend::default();
        let mut table = ResourceTable::new(1);

        backend.fail_next_texture();
        let err = table.create(&mut backend, &desc(), false).unwrap_err();
        assert!(matches!(err, RenderError::BackendResourceCreationFailed(_)));
        assert!(table.is_empty());

        // The only slot is free again.
        assert!(table.create(&mut backend, &desc(), false).is_ok());
    }

    // ── destroy ───────────────────────────────────────────────────────────

    #[test]
    fn destroy_now_frees_slot_and_texture() {
        let mut backend = RecordingBackend::default();
        let mut table = ResourceTable::new(4);

        let h = table.create(&mut backend, &desc(), false).unwrap();
        let id = table.resolve(h).unwrap();
        table.destroy_now(&mut backend, h).unwrap();

        assert!(!backend.is_live(id));
        assert!(table.is_empty());
        assert_eq!(table.resolve(h), Err(RenderError::InvalidHandle(h)));
    }

    #[test]
    fn stale_handle_is_rejected_after_slot_reuse() {
        let mut backend = RecordingBackend::default();
        let mut table = ResourceTable::new(4);

        let old = table.create(&mut backend, &desc(), false).unwrap();
        table.destroy_now(&mut backend, old).unwrap();
        let new = table.create(&mut backend, &desc(), false).unwrap();

        assert_eq!(old.slot(), new.slot());
        assert_ne!(old.generation(), new.generation());
        assert!(table.resolve(old).is_err());
        assert!(table.destroy_now(&mut backend, old).is_err());
        assert!(table.is_live(new));
    }

    #[test]
    fn destroying_none_is_noop() {
        let mut backend = RecordingBackend::default();
        let mut table = ResourceTable::new(4);
        table.destroy_now(&mut backend, TextureHandle::NONE).unwrap();
        assert!(backend.calls().is_empty());
    }

    #[test]
    fn pending_handle_keeps_slot_until_released() {
        let mut backend = RecordingBackend::default();
        let mut table = ResourceTable::new(1);

        let h = table.create(&mut backend, &desc(), false).unwrap();
        let id = table.resolve(h).unwrap();
        table.mark_pending(h).unwrap();

        assert!(table.resolve(h).is_err());
        assert!(table.mark_pending(h).is_err());
        assert!(backend.is_live(id));
        assert!(matches!(
            table.create(&mut backend, &desc(), false),
            Err(RenderError::OutOfCapacity { .. })
        ));

        table.release_pending(&mut backend, h);
        assert!(!backend.is_live(id));
        assert!(table.is_empty());
    }

    #[test]
    fn release_pending_ignores_live_handle() {
        let mut backend = RecordingBackend::default();
        let mut table = ResourceTable::new(2);
        let h = table.create(&mut backend, &desc(), false).unwrap();
        table.release_pending(&mut backend, h);
        assert!(table.is_live(h));
    }

    // ── recreate / clear ──────────────────────────────────────────────────

    #[test]
    fn recreate_all_rebuilds_retained_textures() {
        let mut backend = RecordingBackend::default();
        let mut table = ResourceTable::new(4);

        let kept = table.create(&mut backend, &desc(), true).unwrap();
        let dropped = table.create(&mut backend, &desc(), false).unwrap();
        let kept_id = table.resolve(kept).unwrap();
        let dropped_id = table.resolve(dropped).unwrap();

        assert_eq!(table.recreate_all(&mut backend).unwrap(), 1);

        let new_id = table.resolve(kept).unwrap();
        assert_ne!(new_id, kept_id);
        assert!(backend.is_live(new_id));
        assert_eq!(table.resolve(dropped).unwrap(), dropped_id);
        assert_eq!(table.source(kept).map(|s| s.pixels.as_slice()), Some(&PIXEL[..]));
    }

    #[test]
    fn failed_recreate_keeps_the_original_texture() {
        let mut backend = RecordingBackend::default();
        let mut table = ResourceTable::new(4);

        let h = table.create(&mut backend, &desc(), true).unwrap();
        let id = table.resolve(h).unwrap();

        backend.fail_next_texture();
        assert!(matches!(
            table.recreate_all(&mut backend),
            Err(RenderError::BackendResourceCreationFailed(_))
        ));

        assert_eq!(table.resolve(h), Ok(id));
        assert!(backend.is_live(id));
        assert_eq!(backend.count(|c| *c == BackendCall::DestroyTexture(id)), 0);

        table.destroy_now(&mut backend, h).unwrap();
        assert_eq!(backend.count(|c| *c == BackendCall::DestroyTexture(id)), 1);
    }

    #[test]
    fn registry_tracks_live_slots() {
        let mut backend = RecordingBackend::default();
        let mut table = ResourceTable::new(4);

        let a = table.create(&mut backend, &desc(), false).unwrap();
        let b = table.create(&mut backend, &desc(), false).unwrap();
        table.destroy_now(&mut backend, a).unwrap();

        let registry = table.registry();
        assert!(!registry.contains(a.slot()));
        assert!(registry.contains(b.slot()));
        assert_eq!(registry.len(), table.len());
    }

    #[test]
    fn clear_destroys_everything() {
        let mut backend = RecordingBackend::default();
        let mut table = ResourceTable::new(4);
        let a = table.create(&mut backend, &desc(), false).unwrap();
        let _b = table.create(&mut backend, &desc(), false).unwrap();

        table.clear(&mut backend);
        assert!(table.is_empty());
        assert_eq!(backend.live_textures().count(), 0);
        assert!(table.resolve(a).is_err());
    }
}
