use std::collections::HashMap;
use std::num::NonZeroU64;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::{
    Backend, BackendError, BatchSizes, DrawUniforms, FrameSize, NO_RESOURCE, ResourceId,
    TextureDesc, TextureTarget, Vertex,
};

const MIN_BUFFER_SIZE: u64 = 4096;

const VERTEX_ATTRS: [wgpu::VertexAttribute; 3] = wgpu::vertex_attr_array![
    0 => Float32x2, // pos
    1 => Float32x2, // uv
    2 => Float32x4  // color
];

fn vertex_layout() -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &VERTEX_ATTRS,
    }
}

fn uniform_block_size() -> u64 {
    std::mem::size_of::<DrawUniforms>() as u64
}

/// Growth-only upload buffer.
struct StreamBuffer {
    label: &'static str,
    usage: wgpu::BufferUsages,
    buffer: Option<wgpu::Buffer>,
    capacity: u64,
}

impl StreamBuffer {
    fn new(label: &'static str, usage: wgpu::BufferUsages) -> Self {
        Self {
            label,
            usage,
            buffer: None,
            capacity: 0,
        }
    }

    /// Returns `true` if the buffer was (re)created.
    fn ensure(&mut self, device: &wgpu::Device, required: u64) -> bool {
        if self.buffer.is_some() && required <= self.capacity {
            return false;
        }

        let size = required.next_power_of_two().max(MIN_BUFFER_SIZE);
        log::debug!("{}: growing {} -> {} bytes", self.label, self.capacity, size);

        self.buffer = Some(device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(self.label),
            size,
            usage: self.usage | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        }));
        self.capacity = size;
        true
    }

    fn write(&self, queue: &wgpu::Queue, offset: u64, bytes: &[u8]) {
        if bytes.is_empty() {
            return;
        }
        let Some(buffer) = self.buffer.as_ref() else {
            log::warn!("{}: write before reserve; dropped", self.label);
            return;
        };

        // Copies must be a multiple of COPY_BUFFER_ALIGNMENT.
        let padded_len = (bytes.len() as u64).next_multiple_of(wgpu::COPY_BUFFER_ALIGNMENT);
        if offset + padded_len > self.capacity {
            log::warn!(
                "{}: write of {} bytes at {} exceeds capacity {}; dropped",
                self.label,
                bytes.len(),
                offset,
                self.capacity
            );
            return;
        }

        if padded_len == bytes.len() as u64 {
            queue.write_buffer(buffer, offset, bytes);
        } else {
            let mut padded = bytes.to_vec();
            padded.resize(padded_len as usize, 0);
            queue.write_buffer(buffer, offset, &padded);
        }
    }
}

struct GpuTexture {
    texture: wgpu::Texture,
    bind_group: wgpu::BindGroup,
}

struct RenderTarget {
    view: wgpu::TextureView,
    size: FrameSize,
}

/// Open frame. `pass` is declared first so it drops before `encoder`.
struct PassState {
    pass: wgpu::RenderPass<'static>,
    encoder: wgpu::CommandEncoder,
    /// The pass writes begin/end timestamps.
    timed: bool,
}

const TIMESTAMP_BYTES: u64 = 2 * std::mem::size_of::<u64>() as u64;

/// Pass duration from begin/end-of-pass timestamp queries.
///
/// Results are mapped back asynchronously, so `last` describes an earlier
/// frame. While a readback is in flight, passes are not timed.
struct GpuTimer {
    queries: wgpu::QuerySet,
    resolve: wgpu::Buffer,
    readback: wgpu::Buffer,
    period_ns: f32,
    pending: bool,
    /// Set by the map callback: `Some(true)` once mapped, `Some(false)` on failure.
    mapped: Arc<Mutex<Option<bool>>>,
    last: Option<Duration>,
}

impl GpuTimer {
    fn new(device: &wgpu::Device, queue: &wgpu::Queue) -> Option<Self> {
        if !device.features().contains(wgpu::Features::TIMESTAMP_QUERY) {
            log::info!("timestamp queries unsupported; GPU time unavailable");
            return None;
        }

        let queries = device.create_query_set(&wgpu::QuerySetDescriptor {
            label: Some("uno pass timestamps"),
            ty: wgpu::QueryType::Timestamp,
            count: 2,
        });
        let resolve = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("uno timestamp resolve"),
            size: TIMESTAMP_BYTES,
            usage: wgpu::BufferUsages::QUERY_RESOLVE | wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        });
        let readback = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("uno timestamp readback"),
            size: TIMESTAMP_BYTES,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        Some(Self {
            queries,
            resolve,
            readback,
            period_ns: queue.get_timestamp_period(),
            pending: false,
            mapped: Arc::new(Mutex::new(None)),
            last: None,
        })
    }

    fn writes(&self) -> wgpu::RenderPassTimestampWrites<'_> {
        wgpu::RenderPassTimestampWrites {
            query_set: &self.queries,
            beginning_of_pass_write_index: Some(0),
            end_of_pass_write_index: Some(1),
        }
    }

    fn resolve(&self, encoder: &mut wgpu::CommandEncoder) {
        encoder.resolve_query_set(&self.queries, 0..2, &self.resolve, 0);
        encoder.copy_buffer_to_buffer(&self.resolve, 0, &self.readback, 0, TIMESTAMP_BYTES);
    }

    fn start_readback(&mut self) {
        let mapped = Arc::clone(&self.mapped);
        self.readback
            .slice(..)
            .map_async(wgpu::MapMode::Read, move |result| {
                if let Ok(mut slot) = mapped.lock() {
                    *slot = Some(result.is_ok());
                }
            });
        self.pending = true;
    }

    /// Picks up a finished readback, if any.
    fn collect(&mut self) {
        if !self.pending {
            return;
        }
        let ready = self.mapped.lock().ok().and_then(|mut slot| slot.take());
        match ready {
            None => {}
            Some(false) => {
                log::warn!("timestamp readback failed");
                self.pending = false;
            }
            Some(true) => {
                let ticks = {
                    let data = self.readback.slice(..).get_mapped_range();
                    let start: u64 = bytemuck::pod_read_unaligned(&data[0..8]);
                    let end: u64 = bytemuck::pod_read_unaligned(&data[8..16]);
                    end.saturating_sub(start)
                };
                self.readback.unmap();
                self.last = Some(ticks_to_duration(ticks, self.period_ns));
                self.pending = false;
            }
        }
    }
}

fn ticks_to_duration(ticks: u64, period_ns: f32) -> Duration {
    Duration::from_nanos((ticks as f64 * period_ns as f64) as u64)
}

/// [`Backend`] on top of wgpu.
///
/// - one pipeline: textured, tinted triangles with alpha blending
/// - uniform blocks are bound with dynamic offsets into a single buffer
/// - vertex/index/uniform buffers only grow
/// - [`NO_RESOURCE`] binds a 1x1 white texture
/// - GPU time comes from timestamp queries when the device has
///   `TIMESTAMP_QUERY`; without it, [`Backend::gpu_time`] is `None`
///
/// The backend renders into a caller-provided view (see [`GpuBackend::set_target`]);
/// acquiring and presenting surface textures is left to the application.
pub struct GpuBackend {
    device: wgpu::Device,
    queue: wgpu::Queue,

    pipeline: wgpu::RenderPipeline,
    uniform_layout: wgpu::BindGroupLayout,
    texture_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,

    min_uniform_alignment: u32,
    max_texture_dimension: u32,

    vertices: StreamBuffer,
    indices: StreamBuffer,
    uniforms: StreamBuffer,
    uniform_bind_group: Option<wgpu::BindGroup>,
    uniform_binding_size: u32,

    textures: HashMap<ResourceId, GpuTexture>,
    white: GpuTexture,
    next_texture_id: ResourceId,

    target: Option<RenderTarget>,
    clear_color: wgpu::Color,
    pass: Option<PassState>,

    timer: Option<GpuTimer>,
}

impl GpuBackend {
    /// Builds the pipeline for `target_format` and the default white texture.
    pub fn new(
        device: wgpu::Device,
        queue: wgpu::Queue,
        target_format: wgpu::TextureFormat,
    ) -> Self {
        let limits = device.limits();

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("uno batch shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/batch.wgsl").into()),
        });

        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("uno uniform bgl"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: NonZeroU64::new(uniform_block_size()),
                },
                count: None,
            }],
        });

        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("uno texture bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("uno batch pipeline layout"),
            bind_group_layouts: &[&uniform_layout, &texture_layout],
            immediate_size: 0,
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("uno batch pipeline"),
            layout: Some(&pipeline_layout),

            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[vertex_layout()],
            },

            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: target_format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),

            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },

            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("uno sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::MipmapFilterMode::Nearest,
            ..Default::default()
        });

        let white = upload_texture(
            &device,
            &queue,
            &texture_layout,
            &sampler,
            &TextureDesc::rgba8(1, 1, &[255, 255, 255, 255]),
        );

        Self {
            min_uniform_alignment: limits.min_uniform_buffer_offset_alignment,
            max_texture_dimension: limits.max_texture_dimension_2d,

            vertices: StreamBuffer::new("uno vertex buffer", wgpu::BufferUsages::VERTEX),
            indices: StreamBuffer::new("uno index buffer", wgpu::BufferUsages::INDEX),
            uniforms: StreamBuffer::new("uno uniform buffer", wgpu::BufferUsages::UNIFORM),
            uniform_bind_group: None,
            uniform_binding_size: uniform_block_size() as u32,

            textures: HashMap::new(),
            white,
            next_texture_id: NO_RESOURCE + 1,

            target: None,
            clear_color: wgpu::Color::BLACK,
            pass: None,

            timer: GpuTimer::new(&device, &queue),

            device,
            queue,
            pipeline,
            uniform_layout,
            texture_layout,
            sampler,
        }
    }

    /// Sets the view the next passes render into.
    pub fn set_target(&mut self, view: wgpu::TextureView, size: FrameSize) {
        self.target = Some(RenderTarget { view, size });
    }

    /// Drops the current target (e.g. after presenting a surface texture).
    pub fn clear_target(&mut self) {
        self.target = None;
    }

    pub fn set_clear_color(&mut self, color: wgpu::Color) {
        self.clear_color = color;
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    /// Number of live textures, not counting the default white one.
    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    fn rebuild_uniform_bind_group(&mut self) {
        let Some(buffer) = self.uniforms.buffer.as_ref() else {
            return;
        };
        let Some(size) = NonZeroU64::new(self.uniform_binding_size as u64) else {
            return;
        };

        self.uniform_bind_group = Some(self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("uno uniform bind group"),
            layout: &self.uniform_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer,
                    offset: 0,
                    size: Some(size),
                }),
            }],
        }));
    }
}

fn upload_texture(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    layout: &wgpu::BindGroupLayout,
    sampler: &wgpu::Sampler,
    desc: &TextureDesc<'_>,
) -> GpuTexture {
    let size = wgpu::Extent3d {
        width: desc.width,
        height: desc.height,
        depth_or_array_layers: 1,
    };

    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("uno texture"),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8Unorm,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });

    queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        desc.pixels,
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(4 * desc.width),
            rows_per_image: Some(desc.height),
        },
        size,
    );

    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("uno texture bind group"),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
        ],
    });

    GpuTexture { texture, bind_group }
}

impl Backend for GpuBackend {
    fn min_uniform_alignment(&self) -> u32 {
        self.min_uniform_alignment
    }

    fn create_texture(&mut self, desc: &TextureDesc<'_>) -> Result<ResourceId, BackendError> {
        let max = self.max_texture_dimension;
        if desc.width == 0 || desc.height == 0 || desc.width > max || desc.height > max {
            return Err(BackendError::InvalidTextureSize {
                width: desc.width,
                height: desc.height,
                max,
            });
        }
        if desc.pixels.len() != desc.expected_len() {
            return Err(BackendError::PixelDataMismatch {
                expected: desc.expected_len(),
                actual: desc.pixels.len(),
            });
        }
        if self.next_texture_id == ResourceId::MAX {
            return Err(BackendError::Device("texture ids exhausted".to_string()));
        }

        let texture = upload_texture(
            &self.device,
            &self.queue,
            &self.texture_layout,
            &self.sampler,
            desc,
        );

        let id = self.next_texture_id;
        self.next_texture_id += 1;
        self.textures.insert(id, texture);

        log::trace!("texture {id} created ({}x{})", desc.width, desc.height);
        Ok(id)
    }

    fn destroy_texture(&mut self, id: ResourceId) {
        if let Some(entry) = self.textures.remove(&id) {
            entry.texture.destroy();
            log::trace!("texture {id} destroyed");
        }
    }

    fn reserve(&mut self, sizes: BatchSizes) {
        let vertex_bytes = sizes.vertices as u64 * std::mem::size_of::<Vertex>() as u64;
        let index_bytes = sizes.indices as u64 * std::mem::size_of::<u32>() as u64;

        self.vertices.ensure(&self.device, vertex_bytes);
        self.indices.ensure(&self.device, index_bytes);

        let grown = self.uniforms.ensure(&self.device, sizes.uniform_bytes as u64);
        if grown || self.uniform_bind_group.is_none() {
            self.rebuild_uniform_bind_group();
        }
    }

    fn write_vertices(&mut self, first_vertex: u32, vertices: &[Vertex]) {
        let offset = first_vertex as u64 * std::mem::size_of::<Vertex>() as u64;
        self.vertices.write(&self.queue, offset, bytemuck::cast_slice(vertices));
    }

    fn write_indices(&mut self, first_index: u32, indices: &[u32]) {
        let offset = first_index as u64 * std::mem::size_of::<u32>() as u64;
        self.indices.write(&self.queue, offset, bytemuck::cast_slice(indices));
    }

    fn write_uniforms(&mut self, byte_offset: u32, bytes: &[u8]) {
        self.uniforms.write(&self.queue, byte_offset as u64, bytes);
    }

    fn begin_pass(&mut self, frame: FrameSize) -> Result<(), BackendError> {
        if self.pass.take().is_some() {
            log::warn!("begin_pass with an open pass; previous pass discarded");
        }

        let Some(target) = self.target.as_ref() else {
            return Err(BackendError::NoRenderTarget);
        };

        if let Some(timer) = self.timer.as_mut() {
            timer.collect();
        }
        let timestamp_writes = self.timer.as_ref().filter(|t| !t.pending).map(GpuTimer::writes);
        let timed = timestamp_writes.is_some();

        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("uno frame encoder"),
        });

        let mut pass = encoder
            .begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("uno batch pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &target.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes,
                occlusion_query_set: None,
                multiview_mask: None,
            })
            .forget_lifetime();

        let width = frame.width.min(target.size.width);
        let height = frame.height.min(target.size.height);
        if width > 0 && height > 0 {
            pass.set_viewport(0.0, 0.0, width as f32, height as f32, 0.0, 1.0);
        }

        pass.set_pipeline(&self.pipeline);
        if let Some(buffer) = self.vertices.buffer.as_ref() {
            pass.set_vertex_buffer(0, buffer.slice(..));
        }
        if let Some(buffer) = self.indices.buffer.as_ref() {
            pass.set_index_buffer(buffer.slice(..), wgpu::IndexFormat::Uint32);
        }

        self.pass = Some(PassState { pass, encoder, timed });
        Ok(())
    }

    fn set_active_unit(&mut self, unit: u32) {
        log::trace!("active unit {unit}");
    }

    fn bind_texture(&mut self, unit: u32, target: TextureTarget, id: ResourceId) {
        if unit != 0 || target != TextureTarget::D2 {
            log::warn!("bind to unit {unit} ({target:?}) unsupported; only unit 0 D2 is sampled");
            return;
        }
        let Some(state) = self.pass.as_mut() else {
            log::warn!("bind_texture outside a pass; ignored");
            return;
        };

        let texture = if id == NO_RESOURCE {
            &self.white
        } else {
            match self.textures.get(&id) {
                Some(texture) => texture,
                None => {
                    log::warn!("bind of unknown texture {id}; using default");
                    &self.white
                }
            }
        };
        state.pass.set_bind_group(1, &texture.bind_group, &[]);
    }

    fn bind_uniforms(&mut self, offset: u32, size: u32) {
        if (size as u64) < uniform_block_size() {
            log::warn!("uniform binding of {size} bytes is smaller than the shader block; ignored");
            return;
        }
        debug_assert_eq!(offset % self.min_uniform_alignment, 0);

        if size != self.uniform_binding_size {
            self.uniform_binding_size = size;
            self.rebuild_uniform_bind_group();
        }

        let (Some(state), Some(bind_group)) = (self.pass.as_mut(), self.uniform_bind_group.as_ref())
        else {
            log::warn!("bind_uniforms outside a pass; ignored");
            return;
        };
        state.pass.set_bind_group(0, bind_group, &[offset]);
    }

    fn draw_indexed(&mut self, first_index: u32, index_count: u32) {
        if index_count == 0 {
            return;
        }
        let Some(state) = self.pass.as_mut() else {
            log::warn!("draw_indexed outside a pass; ignored");
            return;
        };
        state
            .pass
            .draw_indexed(first_index..first_index + index_count, 0, 0..1);
    }

    fn end_pass(&mut self) -> Result<(), BackendError> {
        let Some(PassState { pass, mut encoder, timed }) = self.pass.take() else {
            return Err(BackendError::Device("end_pass without an open pass".to_string()));
        };
        drop(pass);

        let timer = self.timer.as_mut().filter(|_| timed);
        if let Some(timer) = timer.as_deref() {
            timer.resolve(&mut encoder);
        }
        self.queue.submit(std::iter::once(encoder.finish()));
        if let Some(timer) = timer {
            timer.start_readback();
        }

        if let Err(err) = self.device.poll(wgpu::PollType::Poll) {
            log::warn!("device poll failed: {err}");
        }
        if let Some(timer) = self.timer.as_mut() {
            timer.collect();
        }
        Ok(())
    }

    /// Pass time of the latest frame whose timestamps have been read back.
    fn gpu_time(&mut self) -> Option<Duration> {
        self.timer.as_ref().and_then(|timer| timer.last)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{DeviceInit, request_device_blocking};

    #[test]
    fn vertex_layout_matches_vertex_struct() {
        let layout = vertex_layout();
        assert_eq!(layout.array_stride, 32);
        assert_eq!(layout.attributes[1].offset, 8);
        assert_eq!(layout.attributes[2].offset, 16);
    }

    #[test]
    fn timestamp_ticks_scale_by_period() {
        assert_eq!(ticks_to_duration(1_000, 2.5), Duration::from_nanos(2_500));
        assert_eq!(ticks_to_duration(0, 1.0), Duration::ZERO);
    }

    #[test]
    #[ignore = "requires a GPU adapter"]
    fn draws_into_offscreen_target() {
        let (device, queue) = request_device_blocking(DeviceInit {
            force_fallback_adapter: true,
            ..DeviceInit::default()
        })
        .expect("device");

        let format = wgpu::TextureFormat::Rgba8Unorm;
        let target = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("test target"),
            size: wgpu::Extent3d {
                width: 16,
                height: 16,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });

        let mut backend = GpuBackend::new(device, queue, format);
        assert!(matches!(
            backend.begin_pass(FrameSize::new(16, 16)),
            Err(BackendError::NoRenderTarget)
        ));

        backend.set_target(
            target.create_view(&wgpu::TextureViewDescriptor::default()),
            FrameSize::new(16, 16),
        );

        let id = backend
            .create_texture(&TextureDesc::rgba8(2, 2, &[128; 16]))
            .expect("texture");
        assert_eq!(backend.texture_count(), 1);

        let align = backend.min_uniform_alignment();
        backend.reserve(BatchSizes {
            vertices: 3,
            indices: 3,
            uniform_bytes: align,
        });
        backend.write_vertices(
            0,
            &[
                Vertex::new([-1.0, -1.0], [0.0, 1.0], [1.0; 4]),
                Vertex::new([1.0, -1.0], [1.0, 1.0], [1.0; 4]),
                Vertex::new([0.0, 1.0], [0.5, 0.0], [1.0; 4]),
            ],
        );
        backend.write_indices(0, &[0, 1, 2]);
        backend.write_uniforms(0, bytemuck::bytes_of(&DrawUniforms::default()));

        backend.begin_pass(FrameSize::new(16, 16)).expect("begin");
        backend.bind_texture(0, TextureTarget::D2, id);
        backend.bind_uniforms(0, uniform_block_size() as u32);
        backend.draw_indexed(0, 3);
        backend.end_pass().expect("end");

        backend.destroy_texture(id);
        assert_eq!(backend.texture_count(), 0);
    }
}
