use thiserror::Error;

/// Failure to stand up the GPU device itself. Distinct from the per-frame
/// error taxonomy in [`crate::scheduler`] / [`crate::encode`] — this happens
/// once, at startup, before any graph exists.
#[derive(Error, Debug)]
pub enum GpuError {
    #[error("failed to request a compatible GPU adapter")]
    AdapterRequestFailed,
    #[error("failed to create GPU device: {0}")]
    DeviceCreateFailed(#[from] wgpu::RequestDeviceError),
}

/// Owns the device and queue every other subsystem dispatches work through.
///
/// Headless by design: this crate produces pixel buffers for an encode
/// handoff, not window-presented frames, so there is no `wgpu::Surface`
/// or swapchain config here.
pub struct GpuContext {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    /// Whether the adapter supports GPU timestamp queries, gating
    /// [`crate::scheduler::Executor`]'s per-node timing capture.
    pub supports_timestamp_queries: bool,
}

impl GpuContext {
    /// Requests an adapter/device with the features the color pipeline and
    /// scheduler need (timestamp queries are requested but not required).
    pub async fn new() -> Result<Self, GpuError> {
        let instance = wgpu::Instance::default();

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .map_err(|_| GpuError::AdapterRequestFailed)?;

        let adapter_features = adapter.features();
        let wanted = wgpu::Features::TIMESTAMP_QUERY;
        let supports_timestamp_queries = adapter_features.contains(wanted);
        let required_features = adapter_features & wanted;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("lumagraph device"),
                required_features,
                required_limits: wgpu::Limits::default(),
                memory_hints: wgpu::MemoryHints::Performance,
                ..Default::default()
            })
            .await?;

        log::info!(
            "GPU device initialized (timestamp queries: {})",
            supports_timestamp_queries
        );

        Ok(Self {
            device,
            queue,
            supports_timestamp_queries,
        })
    }

    /// Creates a new command encoder for one frame's graph execution.
    #[must_use]
    pub fn create_command_encoder(&self, label: &str) -> wgpu::CommandEncoder {
        self.device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some(label) })
    }
}
