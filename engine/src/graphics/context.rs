//! GPU upload seam
//!
//! Everything that touches the graphics device goes through [`GpuContext`],
//! which is only ever driven from the thread that owns the device. Background
//! loaders produce CPU-side data and never see a context.

use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// What a buffer written through [`GpuContext::write_buffer`] is used for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferUsage {
    Vertex,
    Index,
    Uniform,
    Storage,
}

impl BufferUsage {
    fn to_wgpu(self) -> wgpu::BufferUsages {
        let usage = match self {
            BufferUsage::Vertex => wgpu::BufferUsages::VERTEX,
            BufferUsage::Index => wgpu::BufferUsages::INDEX,
            BufferUsage::Uniform => wgpu::BufferUsages::UNIFORM,
            BufferUsage::Storage => wgpu::BufferUsages::STORAGE,
        };
        usage | wgpu::BufferUsages::COPY_DST
    }
}

/// Pixel layouts the loaders produce
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureFormat {
    /// 8-bit sRGB color with alpha
    Rgba8,
    /// 32-bit float HDR color with alpha
    Rgba32Float,
}

impl TextureFormat {
    pub fn bytes_per_pixel(self) -> u32 {
        match self {
            TextureFormat::Rgba8 => 4,
            TextureFormat::Rgba32Float => 16,
        }
    }

    fn to_wgpu(self) -> wgpu::TextureFormat {
        match self {
            TextureFormat::Rgba8 => wgpu::TextureFormat::Rgba8UnormSrgb,
            TextureFormat::Rgba32Float => wgpu::TextureFormat::Rgba32Float,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureDesc {
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
}

impl TextureDesc {
    /// Number of bytes a tightly packed image of this size occupies
    pub fn byte_len(&self) -> usize {
        self.width as usize * self.height as usize * self.format.bytes_per_pixel() as usize
    }
}

/// A buffer created on the device
///
/// Headless contexts hand out buffers without a backing device object.
#[derive(Debug, Clone)]
pub struct GpuBuffer {
    pub label: String,
    pub size: u64,
    raw: Option<Arc<wgpu::Buffer>>,
}

impl GpuBuffer {
    pub fn detached(label: impl Into<String>, size: u64) -> Self {
        Self {
            label: label.into(),
            size,
            raw: None,
        }
    }

    pub fn raw(&self) -> Option<&wgpu::Buffer> {
        self.raw.as_deref()
    }
}

/// A texture created on the device
#[derive(Debug, Clone)]
pub struct GpuTexture {
    pub label: String,
    pub desc: TextureDesc,
    raw: Option<Arc<wgpu::Texture>>,
}

impl GpuTexture {
    pub fn detached(label: impl Into<String>, desc: TextureDesc) -> Self {
        Self {
            label: label.into(),
            desc,
            raw: None,
        }
    }

    pub fn raw(&self) -> Option<&wgpu::Texture> {
        self.raw.as_deref()
    }

    pub fn create_view(&self) -> Option<wgpu::TextureView> {
        self.raw()
            .map(|texture| texture.create_view(&wgpu::TextureViewDescriptor::default()))
    }
}

/// Command-list level access to the graphics device.
///
/// A sync step calls `open_command_list`, any number of writes, then
/// `close_and_submit`, all on the device thread.
pub trait GpuContext {
    fn open_command_list(&mut self);

    fn write_buffer(&mut self, label: &str, usage: BufferUsage, data: &[u8]) -> GpuBuffer;

    fn write_texture(&mut self, label: &str, desc: &TextureDesc, data: &[u8]) -> GpuTexture;

    fn close_and_submit(&mut self);
}

/// CPU-side data that becomes usable once written to the device
pub trait GpuUpload: Send + Sync + 'static {
    /// An empty result is treated as a failed load and never uploaded
    fn is_empty(&self) -> bool;

    /// Issue the writes for this value; called between open and submit
    fn upload(&mut self, gpu: &mut dyn GpuContext);
}

#[derive(Debug, Error)]
pub enum GpuInitError {
    #[error("No suitable GPU adapter: {0}")]
    Adapter(String),

    #[error("Failed to create device: {0}")]
    Device(String),
}

/// [`GpuContext`] backed by a wgpu device and queue
pub struct WgpuContext {
    pub device: Arc<wgpu::Device>,
    pub queue: Arc<wgpu::Queue>,
    pub adapter_info: wgpu::AdapterInfo,
    encoder: Option<wgpu::CommandEncoder>,
}

impl WgpuContext {
    /// Create a context without a surface, suitable for tools and uploads
    pub async fn new_headless() -> Result<Self, GpuInitError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| GpuInitError::Adapter(e.to_string()))?;

        let adapter_info = adapter.get_info();
        info!(
            gpu_name = %adapter_info.name,
            backend = ?adapter_info.backend,
            "GPU adapter selected"
        );

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                label: Some("Asset Device"),
                memory_hints: Default::default(),
                trace: wgpu::Trace::Off,
            })
            .await
            .map_err(|e| GpuInitError::Device(e.to_string()))?;

        Ok(Self::from_parts(Arc::new(device), Arc::new(queue), adapter_info))
    }

    pub fn new_headless_blocking() -> Result<Self, GpuInitError> {
        pollster::block_on(Self::new_headless())
    }

    /// Wrap a device and queue owned by an existing renderer
    pub fn from_parts(
        device: Arc<wgpu::Device>,
        queue: Arc<wgpu::Queue>,
        adapter_info: wgpu::AdapterInfo,
    ) -> Self {
        Self {
            device,
            queue,
            adapter_info,
            encoder: None,
        }
    }
}

impl GpuContext for WgpuContext {
    fn open_command_list(&mut self) {
        if self.encoder.is_some() {
            warn!("Command list already open");
            return;
        }
        self.encoder = Some(
            self.device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("Asset Upload"),
                }),
        );
    }

    fn write_buffer(&mut self, label: &str, usage: BufferUsage, data: &[u8]) -> GpuBuffer {
        // Queue writes must be a multiple of the copy alignment
        let align = wgpu::COPY_BUFFER_ALIGNMENT as usize;
        let padded_len = data.len().div_ceil(align).max(1) * align;
        let mut padded = data.to_vec();
        padded.resize(padded_len, 0);

        let buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size: padded_len as u64,
            usage: usage.to_wgpu(),
            mapped_at_creation: false,
        });
        self.queue.write_buffer(&buffer, 0, &padded);
        debug!(label, size = padded_len, ?usage, "Wrote buffer");

        GpuBuffer {
            label: label.to_string(),
            size: padded_len as u64,
            raw: Some(Arc::new(buffer)),
        }
    }

    fn write_texture(&mut self, label: &str, desc: &TextureDesc, data: &[u8]) -> GpuTexture {
        let size = wgpu::Extent3d {
            width: desc.width,
            height: desc.height,
            depth_or_array_layers: 1,
        };
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: desc.format.to_wgpu(),
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        self.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            data,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(desc.width * desc.format.bytes_per_pixel()),
                rows_per_image: Some(desc.height),
            },
            size,
        );
        debug!(label, width = desc.width, height = desc.height, "Wrote texture");

        GpuTexture {
            label: label.to_string(),
            desc: *desc,
            raw: Some(Arc::new(texture)),
        }
    }

    fn close_and_submit(&mut self) {
        match self.encoder.take() {
            Some(encoder) => {
                self.queue.submit(Some(encoder.finish()));
            }
            None => warn!("Submit without an open command list"),
        }
    }
}

/// Headless context that records upload traffic without a device
#[derive(Debug, Default)]
pub struct NullGpuContext {
    pub opened: usize,
    pub submitted: usize,
    pub buffer_writes: usize,
    pub texture_writes: usize,
    pub bytes_written: usize,
}

impl NullGpuContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write_count(&self) -> usize {
        self.buffer_writes + self.texture_writes
    }
}

impl GpuContext for NullGpuContext {
    fn open_command_list(&mut self) {
        self.opened += 1;
    }

    fn write_buffer(&mut self, label: &str, _usage: BufferUsage, data: &[u8]) -> GpuBuffer {
        self.buffer_writes += 1;
        self.bytes_written += data.len();
        GpuBuffer::detached(label, data.len() as u64)
    }

    fn write_texture(&mut self, label: &str, desc: &TextureDesc, data: &[u8]) -> GpuTexture {
        self.texture_writes += 1;
        self.bytes_written += data.len();
        GpuTexture::detached(label, *desc)
    }

    fn close_and_submit(&mut self) {
        self.submitted += 1;
    }
}
