//! Graphics-side data and the device upload seam

pub mod context;
pub mod mesh;
pub mod mesh_loader;
pub mod texture;

pub use context::{
    BufferUsage, GpuBuffer, GpuContext, GpuInitError, GpuTexture, GpuUpload, NullGpuContext,
    TextureDesc, TextureFormat, WgpuContext,
};
pub use mesh::{MeshData, MeshGpu, Model, Vertex};
pub use mesh_loader::{load_model, MeshLoadError};
pub use texture::{Environment, TextureData, TextureError};
