//! Asset identities and the extension table

use crate::core::uuid::Uuid;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Handles are plain UUIDs; `Uuid::NIL` means "no asset"
pub type AssetHandle = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AssetType {
    #[default]
    Invalid,
    Audio,
    Model,
    Project,
    Texture,
    TextureCube,
    SkeletalAnimation,
    Anim2D,
    Skeleton,
    MeshSource,
    Mesh,
    Scene,
}

const EXTENSIONS: &[(&str, AssetType)] = &[
    ("ixproj", AssetType::Project),
    ("ixscene", AssetType::Scene),
    ("png", AssetType::Texture),
    ("jpg", AssetType::Texture),
    ("jpeg", AssetType::Texture),
    ("hdr", AssetType::TextureCube),
    ("mp3", AssetType::Audio),
    ("flac", AssetType::Audio),
    ("wav", AssetType::Audio),
    ("fbx", AssetType::MeshSource),
    ("glb", AssetType::MeshSource),
    ("gltf", AssetType::MeshSource),
    ("obj", AssetType::MeshSource),
];

impl AssetType {
    /// Look up an extension, with or without the leading dot
    pub fn from_extension(extension: &str) -> AssetType {
        let extension = extension.trim_start_matches('.');
        EXTENSIONS
            .iter()
            .find(|(ext, _)| ext.eq_ignore_ascii_case(extension))
            .map(|(_, asset_type)| *asset_type)
            .unwrap_or(AssetType::Invalid)
    }

    pub fn from_path(path: &Path) -> AssetType {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(AssetType::from_extension)
            .unwrap_or(AssetType::Invalid)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AssetType::Invalid => "Invalid",
            AssetType::Audio => "Audio",
            AssetType::Model => "Model",
            AssetType::Project => "Project",
            AssetType::Texture => "Texture",
            AssetType::TextureCube => "TextureCube",
            AssetType::SkeletalAnimation => "SkeletalAnimation",
            AssetType::Anim2D => "Anim2D",
            AssetType::Skeleton => "Skeleton",
            AssetType::MeshSource => "MeshSource",
            AssetType::Mesh => "Mesh",
            AssetType::Scene => "Scene",
        }
    }

    pub fn is_valid(self) -> bool {
        self != AssetType::Invalid
    }
}

impl fmt::Display for AssetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Registry entry; `filepath` is relative to the asset root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetMetaData {
    pub asset_type: AssetType,
    pub filepath: PathBuf,
}

impl AssetMetaData {
    pub fn is_valid(&self) -> bool {
        self.asset_type.is_valid()
    }
}
