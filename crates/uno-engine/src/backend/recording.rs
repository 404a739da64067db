use std::collections::BTreeSet;
use std::time::Duration;

use super::{
    Backend, BackendError, BatchSizes, FrameSize, NO_RESOURCE, ResourceId, TextureDesc,
    TextureTarget, Vertex,
};

/// One observed backend call.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendCall {
    CreateTexture { id: ResourceId, width: u32, height: u32 },
    DestroyTexture(ResourceId),
    Reserve(BatchSizes),
    WriteVertices { first_vertex: u32, count: u32 },
    WriteIndices { first_index: u32, count: u32 },
    WriteUniforms { byte_offset: u32, len: u32 },
    BeginPass(FrameSize),
    SetActiveUnit(u32),
    BindTexture { unit: u32, target: TextureTarget, id: ResourceId },
    BindUniforms { offset: u32, size: u32 },
    DrawIndexed { first_index: u32, index_count: u32 },
    EndPass,
}

/// Device-less backend that records every call.
///
/// Uploaded data is kept (vertices, indices, uniform bytes) so callers can
/// inspect exactly what a frame would have sent. Texture ids are issued from 1
/// upward and never reused, which makes binds of destroyed textures visible
/// via [`RecordingBackend::dead_binds`].
#[derive(Debug)]
pub struct RecordingBackend {
    alignment: u32,
    calls: Vec<BackendCall>,

    vertices: Vec<Vertex>,
    indices: Vec<u32>,
    uniforms: Vec<u8>,

    live: BTreeSet<ResourceId>,
    next_id: ResourceId,

    in_pass: bool,
    passes: u64,
    dead_binds: u64,

    fail_next_texture: bool,
    fail_next_pass: bool,
    gpu_time: Option<Duration>,
}

impl Default for RecordingBackend {
    fn default() -> Self {
        Self::new(256)
    }
}

impl RecordingBackend {
    /// Creates a backend reporting `alignment` as its uniform offset alignment.
    pub fn new(alignment: u32) -> Self {
        Self {
            alignment: alignment.max(1),
            calls: Vec::new(),
            vertices: Vec::new(),
            indices: Vec::new(),
            uniforms: Vec::new(),
            live: BTreeSet::new(),
            next_id: NO_RESOURCE + 1,
            in_pass: false,
            passes: 0,
            dead_binds: 0,
            fail_next_texture: false,
            fail_next_pass: false,
            gpu_time: None,
        }
    }

    /// Reports `gpu_time` from [`Backend::gpu_time`] after every pass.
    pub fn with_gpu_time(mut self, gpu_time: Duration) -> Self {
        self.gpu_time = Some(gpu_time);
        self
    }

    pub fn calls(&self) -> &[BackendCall] {
        &self.calls
    }

    pub fn take_calls(&mut self) -> Vec<BackendCall> {
        std::mem::take(&mut self.calls)
    }

    /// Number of calls matching `pred`.
    pub fn count(&self, pred: impl Fn(&BackendCall) -> bool) -> usize {
        self.calls.iter().filter(|&c| pred(c)).count()
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn uniform_bytes(&self) -> &[u8] {
        &self.uniforms
    }

    pub fn live_textures(&self) -> impl Iterator<Item = ResourceId> + '_ {
        self.live.iter().copied()
    }

    pub fn is_live(&self, id: ResourceId) -> bool {
        self.live.contains(&id)
    }

    /// Binds of texture ids that were not live at bind time.
    pub fn dead_binds(&self) -> u64 {
        self.dead_binds
    }

    /// Completed passes.
    pub fn passes(&self) -> u64 {
        self.passes
    }

    pub fn is_in_pass(&self) -> bool {
        self.in_pass
    }

    /// Makes the next `create_texture` fail.
    pub fn fail_next_texture(&mut self) {
        self.fail_next_texture = true;
    }

    /// Makes the next `begin_pass` fail.
    pub fn fail_next_pass(&mut self) {
        self.fail_next_pass = true;
    }
}

fn write_at<T: Copy + Default>(dst: &mut Vec<T>, offset: usize, src: &[T]) {
    let end = offset + src.len();
    if dst.len() < end {
        dst.resize(end, T::default());
    }
    dst[offset..end].copy_from_slice(src);
}

impl Backend for RecordingBackend {
    fn min_uniform_alignment(&self) -> u32 {
        self.alignment
    }

    fn create_texture(&mut self, desc: &TextureDesc<'_>) -> Result<ResourceId, BackendError> {
        if std::mem::take(&mut self.fail_next_texture) {
            return Err(BackendError::Device("injected texture failure".into()));
        }
        if desc.width == 0 || desc.height == 0 {
            return Err(BackendError::InvalidTextureSize {
                width: desc.width,
                height: desc.height,
                max: u32::MAX,
            });
        }
        if desc.pixels.len() != desc.expected_len() {
            return Err(BackendError::PixelDataMismatch {
                expected: desc.expected_len(),
                actual: desc.pixels.len(),
            });
        }

        let id = self.next_id;
        self.next_id += 1;
        self.live.insert(id);
        self.calls.push(BackendCall::CreateTexture { id, width: desc.width, height: desc.height });
        Ok(id)
    }

    fn destroy_texture(&mut self, id: ResourceId) {
        self.live.remove(&id);
        self.calls.push(BackendCall::DestroyTexture(id));
    }

    fn reserve(&mut self, sizes: BatchSizes) {
        self.vertices.clear();
        self.indices.clear();
        self.uniforms.clear();
        self.calls.push(BackendCall::Reserve(sizes));
    }

    fn write_vertices(&mut self, first_vertex: u32, vertices: &[Vertex]) {
        write_at(&mut self.vertices, first_vertex as usize, vertices);
        self.calls.push(BackendCall::WriteVertices { first_vertex, count: vertices.len() as u32 });
    }

    fn write_indices(&mut self, first_index: u32, indices: &[u32]) {
        write_at(&mut self.indices, first_index as usize, indices);
        self.calls.push(BackendCall::WriteIndices { first_index, count: indices.len() as u32 });
    }

    fn write_uniforms(&mut self, byte_offset: u32, bytes: &[u8]) {
        write_at(&mut self.uniforms, byte_offset as usize, bytes);
        self.calls.push(BackendCall::WriteUniforms { byte_offset, len: bytes.len() as u32 });
    }

    fn begin_pass(&mut self, frame: FrameSize) -> Result<(), BackendError> {
        if std::mem::take(&mut self.fail_next_pass) {
            return Err(BackendError::NoRenderTarget);
        }
        self.in_pass = true;
        self.calls.push(BackendCall::BeginPass(frame));
        Ok(())
    }

    fn set_active_unit(&mut self, unit: u32) {
        self.calls.push(BackendCall::SetActiveUnit(unit));
    }

    fn bind_texture(&mut self, unit: u32, target: TextureTarget, id: ResourceId) {
        if id != NO_RESOURCE && !self.live.contains(&id) {
            log::warn!("RecordingBackend: bind of dead texture {id}");
            self.dead_binds += 1;
        }
        self.calls.push(BackendCall::BindTexture { unit, target, id });
    }

    fn bind_uniforms(&mut self, offset: u32, size: u32) {
        self.calls.push(BackendCall::BindUniforms { offset, size });
    }

    fn draw_indexed(&mut self, first_index: u32, index_count: u32) {
        debug_assert!(self.in_pass, "draw outside of a pass");
        self.calls.push(BackendCall::DrawIndexed { first_index, index_count });
    }

    fn end_pass(&mut self) -> Result<(), BackendError> {
        self.in_pass = false;
        self.passes += 1;
        self.calls.push(BackendCall::EndPass);
        Ok(())
    }

    fn gpu_time(&mut self) -> Option<Duration> {
        if self.passes == 0 { None } else { self.gpu_time }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn texture_ids_are_never_reused() {
        let mut backend = RecordingBackend::default();
        let pixels = [255u8; 4];
        let a = backend.create_texture(&TextureDesc::rgba8(1, 1, &pixels)).unwrap();
        backend.destroy_texture(a);
        let b = backend.create_texture(&TextureDesc::rgba8(1, 1, &pixels)).unwrap();
        assert_ne!(a, b);
        assert_ne!(a, NO_RESOURCE);
        assert!(!backend.is_live(a));
        assert!(backend.is_live(b));
    }

    #[test]
    fn rejects_mismatched_pixel_data() {
        let mut backend = RecordingBackend::default();
        let err = backend.create_texture(&TextureDesc::rgba8(2, 2, &[0u8; 4])).unwrap_err();
        assert_eq!(err, BackendError::PixelDataMismatch { expected: 16, actual: 4 });
    }

    #[test]
    fn injected_failure_applies_once() {
        let mut backend = RecordingBackend::default();
        backend.fail_next_texture();
        let pixels = [0u8; 4];
        assert!(backend.create_texture(&TextureDesc::rgba8(1, 1, &pixels)).is_err());
        assert!(backend.create_texture(&TextureDesc::rgba8(1, 1, &pixels)).is_ok());
    }

    #[test]
    fn writes_land_at_offsets() {
        let mut backend = RecordingBackend::default();
        backend.write_indices(2, &[7, 8]);
        assert_eq!(backend.indices(), &[0, 0, 7, 8]);
        backend.write_uniforms(4, &[1, 2]);
        assert_eq!(backend.uniform_bytes(), &[0, 0, 0, 0, 1, 2]);
    }

    #[test]
    fn dead_bind_is_counted() {
        let mut backend = RecordingBackend::default();
        backend.bind_texture(0, TextureTarget::D2, 42);
        backend.bind_texture(0, TextureTarget::D2, NO_RESOURCE);
        assert_eq!(backend.dead_binds(), 1);
    }
}
