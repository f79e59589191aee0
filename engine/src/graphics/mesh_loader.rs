//! Mesh file loading
//!
//! Runs on loader threads; produces CPU-side [`Model`] data only.

use crate::graphics::mesh::{MeshData, Model, Vertex};
use glam::Vec3;
use std::path::Path;
use tracing::{debug, info};

/// Errors that can occur during mesh loading
#[derive(Debug, thiserror::Error)]
pub enum MeshLoadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("OBJ loading error: {0}")]
    ObjLoad(#[from] tobj::LoadError),

    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("No mesh data found in file")]
    NoMeshData,
}

/// Load every mesh contained in a file
pub fn load_model(path: &Path) -> Result<Model, MeshLoadError> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|s| s.to_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "obj" => load_obj(path),
        ext => Err(MeshLoadError::UnsupportedFormat(ext.to_string())),
    }
}

fn load_obj(path: &Path) -> Result<Model, MeshLoadError> {
    info!(path = ?path, "Loading OBJ file");

    let (models, _materials) = tobj::load_obj(
        path,
        &tobj::LoadOptions {
            triangulate: true,
            single_index: true,
            ..Default::default()
        },
    )?;

    if models.is_empty() {
        return Err(MeshLoadError::NoMeshData);
    }

    let meshes: Vec<MeshData> = models.iter().map(convert_mesh).collect();
    let name = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or_default()
        .to_string();

    debug!(model = %name, mesh_count = meshes.len(), "Parsed OBJ model");
    Ok(Model {
        name,
        meshes,
        gpu: Vec::new(),
    })
}

fn convert_mesh(model: &tobj::Model) -> MeshData {
    let mesh = &model.mesh;
    let vertex_count = mesh.positions.len() / 3;

    let mut vertices: Vec<Vertex> = (0..vertex_count)
        .map(|i| {
            let p = i * 3;
            let t = i * 2;
            let uv = if t + 1 < mesh.texcoords.len() {
                [mesh.texcoords[t], mesh.texcoords[t + 1]]
            } else {
                [0.0, 0.0]
            };
            let normal = if p + 2 < mesh.normals.len() {
                [mesh.normals[p], mesh.normals[p + 1], mesh.normals[p + 2]]
            } else {
                [0.0, 1.0, 0.0]
            };
            Vertex::new(
                [mesh.positions[p], mesh.positions[p + 1], mesh.positions[p + 2]],
                normal,
                uv,
            )
        })
        .collect();

    if mesh.normals.is_empty() {
        calculate_normals(&mut vertices, &mesh.indices);
    }

    MeshData {
        name: model.name.clone(),
        vertices,
        indices: mesh.indices.clone(),
    }
}

/// Accumulate face normals into each vertex; degenerate faces contribute nothing
fn calculate_normals(vertices: &mut [Vertex], indices: &[u32]) {
    let mut accumulated = vec![Vec3::ZERO; vertices.len()];

    for face in indices.chunks_exact(3) {
        let [i0, i1, i2] = [face[0] as usize, face[1] as usize, face[2] as usize];
        if i0 >= vertices.len() || i1 >= vertices.len() || i2 >= vertices.len() {
            continue;
        }

        let v0 = Vec3::from(vertices[i0].position);
        let v1 = Vec3::from(vertices[i1].position);
        let v2 = Vec3::from(vertices[i2].position);
        let face_normal = (v1 - v0).cross(v2 - v0).normalize_or_zero();

        for i in [i0, i1, i2] {
            accumulated[i] += face_normal;
        }
    }

    for (vertex, normal) in vertices.iter_mut().zip(accumulated) {
        vertex.normal = normal.normalize_or(Vec3::Y).to_array();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_unsupported_format() {
        let result = load_model(Path::new("test.fbx"));
        assert!(matches!(result, Err(MeshLoadError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_load_obj_computes_missing_normals() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("quad.obj");
        fs::write(
            &path,
            "o Quad\nv 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nf 1 2 3\nf 1 3 4\n",
        )
        .unwrap();

        let model = load_model(&path).unwrap();
        assert_eq!(model.name, "quad");
        assert_eq!(model.meshes.len(), 1);
        assert_eq!(model.meshes[0].indices.len(), 6);
        for vertex in &model.meshes[0].vertices {
            assert!((Vec3::from(vertex.normal) - Vec3::Z).length() < 1e-5);
        }
    }

    #[test]
    fn test_degenerate_face_keeps_finite_normals() {
        let mut vertices = vec![Vertex::new([0.0; 3], [0.0; 3], [0.0; 2]); 3];
        calculate_normals(&mut vertices, &[0, 1, 2]);
        for vertex in vertices {
            assert!(Vec3::from(vertex.normal).is_finite());
        }
    }
}
