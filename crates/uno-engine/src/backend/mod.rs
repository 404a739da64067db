//! Graphics backend seam.
//!
//! The core never talks to a graphics API directly. Everything it needs from
//! the device is expressed by [`Backend`]:
//! - texture create/destroy
//! - buffer uploads (vertices, indices, packed uniform blocks)
//! - bind + draw calls inside a single render pass per frame
//!
//! Implementations:
//! - [`GpuBackend`]: wgpu
//! - [`RecordingBackend`]: records calls, no device (headless runs, tests)

mod error;
mod gpu;
mod recording;
mod types;

use std::time::Duration;

pub use error::BackendError;
pub use gpu::GpuBackend;
pub use recording::{BackendCall, RecordingBackend};
pub use types::{
    BatchSizes, DrawUniforms, FrameSize, NO_RESOURCE, ResourceId, TextureDesc, TextureTarget,
    Vertex,
};

/// Device operations consumed by the renderer.
///
/// Call order within a frame is fixed:
/// `reserve` → `write_*` → `begin_pass` → (`set_active_unit` / `bind_texture` /
/// `bind_uniforms` / `draw_indexed`)* → `end_pass`.
///
/// In per-draw mode `write_*` calls are interleaved with the draws instead of
/// preceding `begin_pass`; `reserve` is still issued first.
pub trait Backend {
    /// Minimum spacing between uniform-buffer bind offsets, in bytes.
    fn min_uniform_alignment(&self) -> u32;

    fn create_texture(&mut self, desc: &TextureDesc<'_>) -> Result<ResourceId, BackendError>;

    /// Destroys a texture. Unknown ids are ignored.
    fn destroy_texture(&mut self, id: ResourceId);

    /// Ensures upload storage can hold at least `sizes` for this frame.
    fn reserve(&mut self, sizes: BatchSizes);

    fn write_vertices(&mut self, first_vertex: u32, vertices: &[Vertex]);

    fn write_indices(&mut self, first_index: u32, indices: &[u32]);

    fn write_uniforms(&mut self, byte_offset: u32, bytes: &[u8]);

    fn begin_pass(&mut self, frame: FrameSize) -> Result<(), BackendError>;

    fn set_active_unit(&mut self, unit: u32);

    fn bind_texture(&mut self, unit: u32, target: TextureTarget, id: ResourceId);

    /// Binds `size` bytes of the uniform buffer starting at `offset`.
    fn bind_uniforms(&mut self, offset: u32, size: u32);

    fn draw_indexed(&mut self, first_index: u32, index_count: u32);

    /// Finishes the pass and hands the recorded work to the device.
    fn end_pass(&mut self) -> Result<(), BackendError>;

    /// Device-side duration of the most recently completed frame, if known.
    fn gpu_time(&mut self) -> Option<Duration> {
        None
    }
}
