use anyhow::{Context, Result};

/// Parameters for acquiring a wgpu device without a surface.
///
/// Keep this structure minimal; add fields only for a concrete backend need.
#[derive(Debug, Clone)]
pub struct DeviceInit {
    pub power_preference: wgpu::PowerPreference,

    /// Accept a software adapter when no hardware adapter is available.
    pub force_fallback_adapter: bool,

    /// Required wgpu features. Favor an empty set for portability.
    pub required_features: wgpu::Features,

    /// Limits requested from the adapter/device.
    pub required_limits: wgpu::Limits,

    /// Also request `TIMESTAMP_QUERY` when the adapter has it, so the backend
    /// can report GPU time.
    pub timestamp_queries: bool,
}

impl Default for DeviceInit {
    fn default() -> Self {
        Self {
            power_preference: wgpu::PowerPreference::HighPerformance,
            force_fallback_adapter: false,
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            timestamp_queries: true,
        }
    }
}

/// Acquires an adapter, device and queue with no surface attached.
///
/// Presentation is left to the caller; the renderer only needs a texture view
/// to draw into.
pub async fn request_device(init: DeviceInit) -> Result<(wgpu::Device, wgpu::Queue)> {
    let DeviceInit {
        power_preference,
        force_fallback_adapter,
        mut required_features,
        required_limits,
        timestamp_queries,
    } = init;

    let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
        backends: wgpu::Backends::all(),
        ..Default::default()
    });

    let adapter = instance
        .request_adapter(&wgpu::RequestAdapterOptions {
            power_preference,
            compatible_surface: None,
            force_fallback_adapter,
        })
        .await
        .context("failed to find a suitable GPU adapter")?;

    if timestamp_queries && adapter.features().contains(wgpu::Features::TIMESTAMP_QUERY) {
        required_features |= wgpu::Features::TIMESTAMP_QUERY;
    }

    let info = adapter.get_info();
    log::info!("using adapter {} ({:?})", info.name, info.backend);

    let (device, queue) = adapter
        .request_device(&wgpu::DeviceDescriptor {
            label: Some("uno device"),
            required_features,
            required_limits,
            experimental_features: wgpu::ExperimentalFeatures::disabled(),
            memory_hints: wgpu::MemoryHints::Performance,
            trace: wgpu::Trace::Off,
        })
        .await
        .context("failed to create wgpu device/queue")?;

    Ok((device, queue))
}

/// Blocking form of [`request_device`].
pub fn request_device_blocking(init: DeviceInit) -> Result<(wgpu::Device, wgpu::Queue)> {
    pollster::block_on(request_device(init))
}
