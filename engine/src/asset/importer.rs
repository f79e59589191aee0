//! Synchronous importers, one per loadable asset type

use crate::asset::manager::AssetError;
use crate::asset::types::{AssetMetaData, AssetType};
use crate::graphics::{load_model, Environment, Model, TextureData};
use crate::io::SceneDocument;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// A loaded asset
#[derive(Debug, Clone)]
pub enum Asset {
    Scene(Arc<SceneDocument>),
    Texture(Arc<TextureData>),
    Environment(Arc<Environment>),
    MeshSource(Arc<Model>),
}

impl Asset {
    pub fn asset_type(&self) -> AssetType {
        match self {
            Asset::Scene(_) => AssetType::Scene,
            Asset::Texture(_) => AssetType::Texture,
            Asset::Environment(_) => AssetType::TextureCube,
            Asset::MeshSource(_) => AssetType::MeshSource,
        }
    }

    pub fn as_scene(&self) -> Option<&Arc<SceneDocument>> {
        match self {
            Asset::Scene(document) => Some(document),
            _ => None,
        }
    }

    pub fn as_texture(&self) -> Option<&Arc<TextureData>> {
        match self {
            Asset::Texture(texture) => Some(texture),
            _ => None,
        }
    }

    pub fn as_environment(&self) -> Option<&Arc<Environment>> {
        match self {
            Asset::Environment(environment) => Some(environment),
            _ => None,
        }
    }

    pub fn as_model(&self) -> Option<&Arc<Model>> {
        match self {
            Asset::MeshSource(model) => Some(model),
            _ => None,
        }
    }
}

/// Load the file behind `metadata`, whose path is resolved against `asset_root`.
///
/// Types without an importer yield `Ok(None)`.
pub fn import(metadata: &AssetMetaData, asset_root: &Path) -> Result<Option<Asset>, AssetError> {
    let path = asset_root.join(&metadata.filepath);
    debug!(path = ?path, asset_type = %metadata.asset_type, "Importing asset");

    let asset = match metadata.asset_type {
        AssetType::Scene => Asset::Scene(Arc::new(SceneDocument::load_from_file(&path)?)),
        AssetType::Texture => Asset::Texture(Arc::new(TextureData::from_file(&path)?)),
        AssetType::TextureCube => Asset::Environment(Arc::new(Environment::from_file(&path)?)),
        AssetType::MeshSource => Asset::MeshSource(Arc::new(load_model(&path)?)),
        _ => return Ok(None),
    };
    Ok(Some(asset))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[test]
    fn test_no_importer_for_audio() {
        let metadata = AssetMetaData {
            asset_type: AssetType::Audio,
            filepath: PathBuf::from("Sounds/jump.wav"),
        };
        let result = import(&metadata, Path::new("."));
        assert!(matches!(result, Ok(None)));
    }

    #[test]
    fn test_import_texture() {
        let dir = TempDir::new().unwrap();
        image::RgbaImage::new(4, 4)
            .save(dir.path().join("blank.png"))
            .unwrap();
        let metadata = AssetMetaData {
            asset_type: AssetType::Texture,
            filepath: PathBuf::from("blank.png"),
        };

        let asset = import(&metadata, dir.path()).unwrap().unwrap();
        assert_eq!(asset.asset_type(), AssetType::Texture);
        assert_eq!(asset.as_texture().unwrap().width, 4);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let metadata = AssetMetaData {
            asset_type: AssetType::Scene,
            filepath: PathBuf::from("Scenes/gone.ixscene"),
        };
        assert!(import(&metadata, Path::new("/nonexistent")).is_err());
    }
}
