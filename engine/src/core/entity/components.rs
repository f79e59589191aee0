//! Core components for the entity system

use crate::asset::AssetHandle;
use crate::core::uuid::Uuid;
use glam::{Mat3, Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Upper bound on the bone matrices carried by a single draw
pub const MAX_BONES: usize = 150;

/// Coarse classification of an entity, used by the editor and scene documents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EntityType {
    #[default]
    Common,
    Node,
    Camera,
    Mesh,
    Prefab,
    Joint,
    Invalid,
}

impl EntityType {
    pub fn as_str(self) -> &'static str {
        match self {
            EntityType::Common => "Common",
            EntityType::Node => "Node",
            EntityType::Camera => "Camera",
            EntityType::Mesh => "Mesh",
            EntityType::Prefab => "Prefab",
            EntityType::Joint => "Joint",
            EntityType::Invalid => "Invalid",
        }
    }

    /// Parse a type tag; unknown tags map to `Invalid`
    pub fn from_name(name: &str) -> Self {
        match name {
            "Common" => EntityType::Common,
            "Node" => EntityType::Node,
            "Camera" => EntityType::Camera,
            "Mesh" => EntityType::Mesh,
            "Prefab" => EntityType::Prefab,
            "Joint" => EntityType::Joint,
            _ => EntityType::Invalid,
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity component attached to every entity.
///
/// The parent/children relation of the scene graph lives here. A child UUID is
/// listed by at most one parent at a time; only [`crate::scene::Scene`] mutates it.
#[derive(Debug, Clone, PartialEq)]
pub struct IdComponent {
    pub name: String,
    pub uuid: Uuid,
    pub entity_type: EntityType,
    /// `Uuid::NIL` for roots
    pub parent: Uuid,
    pub children: Vec<Uuid>,
}

impl IdComponent {
    pub fn new(name: impl Into<String>, uuid: Uuid, entity_type: EntityType) -> Self {
        Self {
            name: name.into(),
            uuid,
            entity_type,
            parent: Uuid::NIL,
            children: Vec::new(),
        }
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_nil()
    }
}

/// World and local placement of an entity.
///
/// `translation`/`rotation`/`scale` are world-space values written by the
/// hierarchy pass; the `local_*` triple is relative to the parent and is what
/// gameplay code and physics write.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
    pub local_translation: Vec3,
    pub local_rotation: Quat,
    pub local_scale: Vec3,
    pub visible: bool,
    #[serde(skip)]
    pub dirty: bool,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
            local_translation: Vec3::ZERO,
            local_rotation: Quat::IDENTITY,
            local_scale: Vec3::ONE,
            visible: true,
            dirty: true,
        }
    }
}

impl Transform {
    /// Create a transform whose local and world translation are both `translation`
    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            local_translation: translation,
            ..Default::default()
        }
    }

    /// Create a transform from a local translation, rotation and scale
    pub fn from_local(translation: Vec3, rotation: Quat, scale: Vec3) -> Self {
        Self {
            translation,
            rotation,
            scale,
            local_translation: translation,
            local_rotation: rotation,
            local_scale: scale,
            ..Default::default()
        }
    }

    /// Local matrix, composed as translate * rotate * scale
    pub fn local_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(
            self.local_scale,
            self.local_rotation,
            self.local_translation,
        )
    }

    /// World matrix from the last hierarchy pass
    pub fn world_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }

    /// Overwrite the world triple from a composed matrix
    pub fn set_world_matrix(&mut self, matrix: Mat4) {
        let (scale, rotation, translation) = matrix.to_scale_rotation_translation();
        self.scale = scale;
        self.rotation = rotation;
        self.translation = translation;
    }

    pub fn set_local_translation(&mut self, translation: Vec3) {
        self.local_translation = translation;
        self.dirty = true;
    }

    pub fn set_local_rotation(&mut self, rotation: Quat) {
        self.local_rotation = rotation;
        self.dirty = true;
    }

    pub fn set_local_scale(&mut self, scale: Vec3) {
        self.local_scale = scale;
        self.dirty = true;
    }
}

/// Per-draw data handed to the renderer
#[derive(Debug, Clone, PartialEq)]
pub struct MeshBuffer {
    pub transformation: Mat4,
    /// Inverse-transpose of the upper 3x3 of `transformation`
    pub normal: Mat4,
    pub bone_transforms: Vec<Mat4>,
}

impl Default for MeshBuffer {
    fn default() -> Self {
        Self {
            transformation: Mat4::IDENTITY,
            normal: Mat4::IDENTITY,
            bone_transforms: vec![Mat4::IDENTITY; MAX_BONES],
        }
    }
}

impl MeshBuffer {
    pub fn set_transformation(&mut self, world: Mat4) {
        self.transformation = world;
        let linear = Mat3::from_mat4(world);
        self.normal = if linear.determinant().abs() > f32::EPSILON {
            Mat4::from_mat3(linear.inverse().transpose())
        } else {
            Mat4::IDENTITY
        };
    }

    /// Copy a skeleton pose into the bone slots, padding the rest with identity
    pub fn set_bone_transforms(&mut self, pose: &[Mat4]) {
        self.bone_transforms.resize(MAX_BONES, Mat4::IDENTITY);
        for (index, slot) in self.bone_transforms.iter_mut().enumerate() {
            *slot = pose.get(index).copied().unwrap_or(Mat4::IDENTITY);
        }
    }
}

/// Draws one mesh of a model asset
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MeshRenderer {
    pub mesh: Option<AssetHandle>,
    pub mesh_index: usize,
    /// Entity carrying the [`SkinnedMesh`] this mesh is bound to, `NIL` if static
    pub root: Uuid,
    #[serde(skip)]
    pub buffer: MeshBuffer,
}

/// Skeleton root; holds the current animation pose
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SkinnedMesh {
    pub source: Option<AssetHandle>,
    pub animation_index: usize,
    #[serde(skip)]
    pub pose: Vec<Mat4>,
}

/// Name of a managed script class bound to the entity
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Script {
    pub class_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_type_names_round_trip() {
        for ty in [
            EntityType::Common,
            EntityType::Node,
            EntityType::Camera,
            EntityType::Mesh,
            EntityType::Prefab,
            EntityType::Joint,
        ] {
            assert_eq!(EntityType::from_name(ty.as_str()), ty);
        }
        assert_eq!(EntityType::from_name("Spaceship"), EntityType::Invalid);
    }

    #[test]
    fn test_world_matrix_round_trip() {
        let mut transform = Transform::default();
        let matrix = Mat4::from_scale_rotation_translation(
            Vec3::splat(2.0),
            Quat::from_rotation_y(0.5),
            Vec3::new(1.0, 2.0, 3.0),
        );
        transform.set_world_matrix(matrix);

        assert!(transform.translation.abs_diff_eq(Vec3::new(1.0, 2.0, 3.0), 1e-5));
        assert!(transform.scale.abs_diff_eq(Vec3::splat(2.0), 1e-5));
        assert!(transform.world_matrix().abs_diff_eq(matrix, 1e-5));
    }

    #[test]
    fn test_bone_transforms_padded_with_identity() {
        let mut buffer = MeshBuffer::default();
        let pose = vec![Mat4::from_translation(Vec3::X); 3];
        buffer.set_bone_transforms(&pose);

        assert_eq!(buffer.bone_transforms.len(), MAX_BONES);
        assert_eq!(buffer.bone_transforms[2], Mat4::from_translation(Vec3::X));
        assert_eq!(buffer.bone_transforms[3], Mat4::IDENTITY);
    }

    #[test]
    fn test_normal_matrix_of_uniform_scale() {
        let mut buffer = MeshBuffer::default();
        buffer.set_transformation(Mat4::from_scale(Vec3::splat(2.0)));
        assert!(buffer
            .normal
            .abs_diff_eq(Mat4::from_scale(Vec3::splat(0.5)), 1e-6));
    }
}
