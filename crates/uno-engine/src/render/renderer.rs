use crate::backend::{
    Backend, BackendError, DrawUniforms, FrameSize, ResourceId, TextureDesc, TextureTarget, Vertex,
};
use crate::batch::DrawList;
use crate::error::RenderError;
use crate::handle::{ResourceTable, TextureHandle};
use crate::release::ReleaseQueue;
use crate::state::StateCache;
use crate::time::{FrameProfiler, FrameStats};

use super::{RendererConfig, SubmitMode};

/// Texture unit every draw samples from.
const DRAW_UNIT: u32 = 0;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
enum Phase {
    Idle,
    Recording,
}

/// Frame-batched renderer over a [`Backend`].
///
/// Owns every piece of renderer state: texture handles, the state cache, the
/// frame's draw list, the deferred-release queue and frame timing. Nothing is
/// global; two renderers never share state.
///
/// Frame protocol:
/// - `begin_frame` → `submit`* → `end_frame`
/// - textures may be created/destroyed at any time; destroying a texture while
///   recording defers the release until the frame has been submitted
pub struct Renderer<B: Backend> {
    backend: B,
    config: RendererConfig,

    textures: ResourceTable,
    state: StateCache,
    draws: DrawList<DrawUniforms>,
    releases: ReleaseQueue<TextureHandle>,

    phase: Phase,
    frame_size: FrameSize,
    profiler: FrameProfiler,
}

impl<B: Backend> Renderer<B> {
    /// Sets up a renderer on `backend`. Pair with [`Renderer::shutdown`].
    pub fn new(backend: B, config: RendererConfig) -> Result<Self, RenderError> {
        config.validate()?;

        let alignment = backend.min_uniform_alignment();
        log::debug!(
            "renderer: {} handles, release latency {}, {:?}, uniform alignment {alignment}",
            config.max_handles,
            config.release_latency,
            config.submit_mode
        );

        Ok(Self {
            textures: ResourceTable::new(config.max_handles),
            state: StateCache::new(),
            draws: DrawList::new(alignment),
            releases: ReleaseQueue::new(config.release_latency),
            phase: Phase::Idle,
            frame_size: FrameSize::default(),
            profiler: FrameProfiler::new(),
            backend,
            config,
        })
    }

    // -------------------------------------------------------------------------
    // Textures
    // -------------------------------------------------------------------------

    pub fn create_texture(&mut self, desc: &TextureDesc<'_>) -> Result<TextureHandle, RenderError> {
        let handle = self
            .textures
            .create(&mut self.backend, desc, self.config.retain_texture_sources)
            .inspect_err(|err| log::warn!("create_texture failed: {err}"))?;

        log::debug!("texture {handle:?} created ({}x{})", desc.width, desc.height);
        Ok(handle)
    }

    /// Destroys `handle`.
    ///
    /// While a frame is recorded, or when a release latency is configured, the
    /// handle is invalidated immediately but the texture and its slot are freed
    /// by the deferred-release drain. Otherwise the texture is destroyed now.
    /// [`TextureHandle::NONE`] is ignored.
    pub fn destroy_texture(&mut self, handle: TextureHandle) -> Result<(), RenderError> {
        if handle.is_none() {
            return Ok(());
        }
        if self.phase == Phase::Idle && self.config.release_latency == 0 {
            return self.destroy_texture_now(handle);
        }

        self.textures.mark_pending(handle)?;
        self.releases.defer(handle);
        log::debug!("texture {handle:?} queued for release");
        Ok(())
    }

    /// Destroys `handle` synchronously.
    ///
    /// The caller guarantees that no command recorded in the current frame
    /// references it.
    pub fn destroy_texture_now(&mut self, handle: TextureHandle) -> Result<(), RenderError> {
        self.textures.destroy_now(&mut self.backend, handle)?;
        log::debug!("texture {handle:?} destroyed");
        Ok(())
    }

    /// Backend id currently behind `handle`.
    #[inline]
    pub fn resolve(&self, handle: TextureHandle) -> Result<ResourceId, RenderError> {
        self.textures.resolve(handle)
    }

    /// Recreates all textures that kept their source pixels (see
    /// [`RendererConfig::retain_texture_sources`]). Handles stay valid.
    pub fn recreate_textures(&mut self) -> Result<usize, RenderError> {
        if self.phase == Phase::Recording {
            return Err(RenderError::FrameInProgress);
        }
        let recreated = self.textures.recreate_all(&mut self.backend)?;
        self.state.invalidate();
        log::info!("recreated {recreated} texture(s)");
        Ok(recreated)
    }

    // -------------------------------------------------------------------------
    // Frames
    // -------------------------------------------------------------------------

    pub fn begin_frame(&mut self, frame_size: FrameSize) -> Result<(), RenderError> {
        if self.phase == Phase::Recording {
            return Err(RenderError::FrameInProgress);
        }

        self.profiler.begin();
        self.draws.clear();
        self.state.reset_counters();
        self.frame_size = frame_size;
        self.phase = Phase::Recording;

        log::trace!(
            "frame {} begin ({}x{})",
            self.profiler.frames(),
            frame_size.width,
            frame_size.height
        );
        Ok(())
    }

    /// Records one indexed draw.
    ///
    /// `indices` refer to `vertices`. The texture handle is resolved here; a
    /// handle destroyed later in the frame still draws with this texture.
    pub fn submit(
        &mut self,
        vertices: &[Vertex],
        indices: &[u32],
        uniforms: &DrawUniforms,
        texture: TextureHandle,
    ) -> Result<(), RenderError> {
        if self.phase != Phase::Recording {
            return Err(RenderError::NotRecording);
        }
        let id = self.textures.resolve(texture)?;
        self.draws.push(vertices, indices, uniforms, id);
        Ok(())
    }

    /// Uploads and replays the frame, then runs the deferred-release drain.
    ///
    /// If the backend fails to begin or end the pass, the frame's draws are
    /// dropped, releases are still drained and the renderer is ready for the
    /// next `begin_frame`.
    pub fn end_frame(&mut self) -> Result<FrameStats, RenderError> {
        if self.phase != Phase::Recording {
            return Err(RenderError::NotRecording);
        }

        let replayed = self.replay();

        let Self { backend, textures, releases, .. } = self;
        let released = releases.end_frame(|handle| textures.release_pending(backend, handle));
        if released > 0 {
            log::debug!("released {released} texture(s)");
        }

        self.phase = Phase::Idle;

        if let Err(err) = replayed {
            log::warn!("frame {} discarded: {err}", self.profiler.frames());
            return Err(RenderError::Backend(err));
        }

        let stats = FrameStats {
            commands: self.draws.len() as u32,
            binds_emitted: self.state.emitted(),
            binds_skipped: self.state.skipped(),
            released: released as u32,
            ..FrameStats::default()
        };
        let gpu_time = self.backend.gpu_time();
        let stats = self.profiler.end(stats, gpu_time);

        log::trace!(
            "frame {} end: {} draws, {} binds ({} skipped), {:.3} ms",
            stats.frame_index,
            stats.commands,
            stats.binds_emitted,
            stats.binds_skipped,
            stats.cpu_time_ms()
        );
        Ok(stats)
    }

    fn replay(&mut self) -> Result<(), BackendError> {
        let Self { backend, draws, state, config, frame_size, .. } = self;
        let per_draw = config.submit_mode == SubmitMode::PerDraw;

        backend.reserve(draws.sizes());
        if !per_draw {
            backend.write_vertices(0, draws.vertices());
            backend.write_indices(0, draws.indices());
            backend.write_uniforms(0, draws.uniform_bytes());
        }

        backend.begin_pass(*frame_size)?;
        // A fresh pass has nothing bound.
        state.invalidate();

        for cmd in draws.commands() {
            if per_draw {
                let vertices =
                    cmd.first_vertex as usize..(cmd.first_vertex + cmd.vertex_count) as usize;
                let indices =
                    cmd.first_index as usize..(cmd.first_index + cmd.index_count) as usize;
                let block = cmd.uniforms.offset as usize
                    ..(cmd.uniforms.offset + cmd.uniforms.size) as usize;

                backend.write_vertices(cmd.first_vertex, &draws.vertices()[vertices]);
                backend.write_indices(cmd.first_index, &draws.indices()[indices]);
                backend.write_uniforms(cmd.uniforms.offset, &draws.uniform_bytes()[block]);
            }

            state.bind_texture(backend, DRAW_UNIT, TextureTarget::D2, cmd.texture, per_draw);
            backend.bind_uniforms(cmd.uniforms.offset, cmd.uniforms.size);
            backend.draw_indexed(cmd.first_index, cmd.index_count);
        }

        backend.end_pass()
    }

    // -------------------------------------------------------------------------
    // Teardown
    // -------------------------------------------------------------------------

    /// Releases every texture and hands the backend back.
    pub fn shutdown(self) -> B {
        let Self { mut backend, mut textures, mut releases, phase, .. } = self;
        if phase == Phase::Recording {
            log::warn!("shutdown during a frame; recorded draws dropped");
        }

        let released = releases.drain_all(|handle| textures.release_pending(&mut backend, handle));
        let live = textures.len();
        textures.clear(&mut backend);

        log::debug!("renderer shut down: {released} deferred, {live} live texture(s) released");
        backend
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    #[inline]
    pub fn is_recording(&self) -> bool {
        self.phase == Phase::Recording
    }

    #[inline]
    pub fn frame_size(&self) -> FrameSize {
        self.frame_size
    }

    #[inline]
    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    /// Stats of the last completed frame.
    #[inline]
    pub fn last_stats(&self) -> &FrameStats {
        self.profiler.last()
    }

    /// Handles waiting for the deferred-release drain.
    #[inline]
    pub fn pending_releases(&self) -> usize {
        self.releases.pending()
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Direct backend access (render target changes and similar).
    ///
    /// Textures must still be created and destroyed through the renderer.
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn textures(&self) -> &ResourceTable {
        &self.textures
    }

    pub fn state_cache(&self) -> &StateCache {
        &self.state
    }

    /// Draws recorded in the current (or last) frame.
    pub fn draw_list(&self) -> &DrawList<DrawUniforms> {
        &self.draws
    }
}
