//! CPU-side mesh data and its upload

use crate::graphics::context::{BufferUsage, GpuBuffer, GpuContext, GpuUpload};
use bytemuck::{Pod, Zeroable};

/// Vertex layout shared by every imported mesh
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl Vertex {
    pub const fn new(position: [f32; 3], normal: [f32; 3], uv: [f32; 2]) -> Self {
        Self {
            position,
            normal,
            uv,
        }
    }

    /// Get the vertex attribute layout for wgpu
    pub fn desc<'a>() -> wgpu::VertexBufferLayout<'a> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 6]>() as wgpu::BufferAddress,
                    shader_location: 2,
                    format: wgpu::VertexFormat::Float32x2,
                },
            ],
        }
    }
}

/// One sub-mesh of a model
#[derive(Debug, Clone, Default)]
pub struct MeshData {
    pub name: String,
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() || self.indices.is_empty()
    }
}

/// Device buffers for one uploaded sub-mesh
#[derive(Debug, Clone)]
pub struct MeshGpu {
    pub vertex_buffer: GpuBuffer,
    pub index_buffer: GpuBuffer,
    pub index_count: u32,
}

/// A mesh source: every sub-mesh of one file
#[derive(Debug, Clone, Default)]
pub struct Model {
    pub name: String,
    pub meshes: Vec<MeshData>,
    /// Filled in by the main-thread sync, one entry per mesh
    pub gpu: Vec<MeshGpu>,
}

impl Model {
    pub fn vertex_count(&self) -> usize {
        self.meshes.iter().map(|mesh| mesh.vertices.len()).sum()
    }

    pub fn is_uploaded(&self) -> bool {
        !self.gpu.is_empty()
    }
}

impl GpuUpload for Model {
    fn is_empty(&self) -> bool {
        self.meshes.iter().all(MeshData::is_empty)
    }

    fn upload(&mut self, gpu: &mut dyn GpuContext) {
        self.gpu = self
            .meshes
            .iter()
            .filter(|mesh| !mesh.is_empty())
            .map(|mesh| MeshGpu {
                vertex_buffer: gpu.write_buffer(
                    &format!("{}:{} vertices", self.name, mesh.name),
                    BufferUsage::Vertex,
                    bytemuck::cast_slice(&mesh.vertices),
                ),
                index_buffer: gpu.write_buffer(
                    &format!("{}:{} indices", self.name, mesh.name),
                    BufferUsage::Index,
                    bytemuck::cast_slice(&mesh.indices),
                ),
                index_count: mesh.indices.len() as u32,
            })
            .collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graphics::context::NullGpuContext;

    fn triangle() -> MeshData {
        MeshData {
            name: "tri".to_string(),
            vertices: vec![
                Vertex::new([0.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 0.0]),
                Vertex::new([1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [1.0, 0.0]),
                Vertex::new([0.0, 1.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0]),
            ],
            indices: vec![0, 1, 2],
        }
    }

    #[test]
    fn test_vertex_size() {
        assert_eq!(std::mem::size_of::<Vertex>(), 32);
    }

    #[test]
    fn test_model_upload_writes_vertex_and_index_buffers() {
        let mut model = Model {
            name: "model".to_string(),
            meshes: vec![triangle(), MeshData::default()],
            gpu: Vec::new(),
        };
        assert!(!model.is_empty());

        let mut gpu = NullGpuContext::new();
        model.upload(&mut gpu);

        assert_eq!(model.gpu.len(), 1);
        assert_eq!(model.gpu[0].index_count, 3);
        assert_eq!(model.gpu[0].vertex_buffer.size, 3 * 32);
        assert_eq!(gpu.buffer_writes, 2);
    }

    #[test]
    fn test_empty_model() {
        let model = Model::default();
        assert!(model.is_empty());
        assert!(!model.is_uploaded());
    }
}
