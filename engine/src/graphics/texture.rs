//! Decoded textures and environment maps

use crate::graphics::context::{GpuContext, GpuTexture, GpuUpload, TextureDesc, TextureFormat};
use std::path::Path;
use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum TextureError {
    #[error("Image decode error: {0}")]
    Decode(#[from] image::ImageError),

    #[error("Image has no pixels: {0}")]
    Empty(String),
}

/// An 8-bit RGBA texture
#[derive(Debug, Clone)]
pub struct TextureData {
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
    pub gpu: Option<GpuTexture>,
}

impl TextureData {
    pub fn from_file(path: &Path) -> Result<Self, TextureError> {
        let image = image::open(path)?.to_rgba8();
        let (width, height) = image.dimensions();
        debug!(path = ?path, width, height, "Decoded texture");
        Ok(Self {
            name: file_name(path),
            width,
            height,
            pixels: image.into_raw(),
            gpu: None,
        })
    }

    pub fn desc(&self) -> TextureDesc {
        TextureDesc {
            width: self.width,
            height: self.height,
            format: TextureFormat::Rgba8,
        }
    }
}

impl GpuUpload for TextureData {
    fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0 || self.pixels.len() != self.desc().byte_len()
    }

    fn upload(&mut self, gpu: &mut dyn GpuContext) {
        self.gpu = Some(gpu.write_texture(&self.name, &self.desc(), &self.pixels));
    }
}

/// A floating point environment map, decoded from HDR sources
#[derive(Debug, Clone)]
pub struct Environment {
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<f32>,
    pub gpu: Option<GpuTexture>,
}

impl Environment {
    pub fn from_file(path: &Path) -> Result<Self, TextureError> {
        let image = image::open(path)?.to_rgba32f();
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(TextureError::Empty(path.display().to_string()));
        }
        debug!(path = ?path, width, height, "Decoded environment map");
        Ok(Self {
            name: file_name(path),
            width,
            height,
            pixels: image.into_raw(),
            gpu: None,
        })
    }

    pub fn desc(&self) -> TextureDesc {
        TextureDesc {
            width: self.width,
            height: self.height,
            format: TextureFormat::Rgba32Float,
        }
    }
}

impl GpuUpload for Environment {
    fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0 || self.pixels.len() * 4 != self.desc().byte_len()
    }

    fn upload(&mut self, gpu: &mut dyn GpuContext) {
        let desc = self.desc();
        self.gpu = Some(gpu.write_texture(&self.name, &desc, bytemuck::cast_slice(&self.pixels)));
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .and_then(|name| name.to_str())
        .unwrap_or_default()
        .to_string()
}
