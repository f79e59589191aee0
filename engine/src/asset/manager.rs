//! The asset registry: handle to metadata, with a cache of imported assets

use crate::asset::importer::{self, Asset};
use crate::asset::types::{AssetHandle, AssetMetaData, AssetType};
use crate::graphics::{MeshLoadError, TextureError};
use crate::io::SceneError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use tracing::{debug, error, info, warn};

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Scene error: {0}")]
    Scene(#[from] SceneError),

    #[error("Texture error: {0}")]
    Texture(#[from] TextureError),

    #[error("Mesh error: {0}")]
    Mesh(#[from] MeshLoadError),

    #[error("Path is outside the asset directory: {0}")]
    OutsideAssetRoot(PathBuf),
}

#[derive(Serialize, Deserialize)]
struct RegistryDocument {
    #[serde(rename = "AssetRegistry")]
    registry: RegistryBody,
}

#[derive(Serialize, Deserialize)]
struct RegistryBody {
    #[serde(rename = "Assets", default)]
    assets: Vec<RegistryEntry>,
}

#[derive(Serialize, Deserialize)]
struct RegistryEntry {
    #[serde(rename = "Handle")]
    handle: AssetHandle,
    #[serde(rename = "Type")]
    asset_type: AssetType,
    #[serde(rename = "Filepath")]
    filepath: String,
}

/// Registry of every asset known to a project
pub struct AssetManager {
    asset_root: PathBuf,
    registry: BTreeMap<AssetHandle, AssetMetaData>,
    loaded: HashMap<AssetHandle, Asset>,
}

impl AssetManager {
    pub fn new(asset_root: impl Into<PathBuf>) -> Self {
        Self {
            asset_root: asset_root.into(),
            registry: BTreeMap::new(),
            loaded: HashMap::new(),
        }
    }

    pub fn asset_root(&self) -> &Path {
        &self.asset_root
    }

    pub fn len(&self) -> usize {
        self.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&AssetHandle, &AssetMetaData)> {
        self.registry.iter()
    }

    /// Register a file and return its handle.
    ///
    /// Returns `Uuid::NIL` when the extension is unknown or the path points
    /// outside the asset directory. A path that is already registered keeps
    /// its existing handle.
    pub fn import_asset(&mut self, filepath: impl AsRef<Path>) -> AssetHandle {
        let filepath = filepath.as_ref();
        let Some(relative) = self.relative_path(filepath) else {
            error!(path = ?filepath, root = ?self.asset_root, "Asset path is outside the asset directory");
            return AssetHandle::NIL;
        };

        let asset_type = AssetType::from_path(&relative);
        if !asset_type.is_valid() {
            error!(path = ?relative, "No asset type registered for file extension");
            return AssetHandle::NIL;
        }

        if let Some(handle) = self.find_handle(&relative) {
            debug!(path = ?relative, handle = %handle, "Asset already registered");
            return handle;
        }

        let handle = AssetHandle::new();
        info!(path = ?relative, handle = %handle, asset_type = %asset_type, "Imported asset");
        self.registry.insert(
            handle,
            AssetMetaData {
                asset_type,
                filepath: relative,
            },
        );
        handle
    }

    pub fn find_handle(&self, filepath: &Path) -> Option<AssetHandle> {
        let relative = self.relative_path(filepath)?;
        self.registry
            .iter()
            .find(|(_, metadata)| metadata.filepath == relative)
            .map(|(handle, _)| *handle)
    }

    pub fn metadata(&self, handle: AssetHandle) -> Option<&AssetMetaData> {
        self.registry.get(&handle)
    }

    pub fn is_asset_handle_valid(&self, handle: AssetHandle) -> bool {
        !handle.is_nil() && self.registry.contains_key(&handle)
    }

    /// Absolute location of the file behind `handle`
    pub fn file_path(&self, handle: AssetHandle) -> Option<PathBuf> {
        self.metadata(handle)
            .map(|metadata| self.asset_root.join(&metadata.filepath))
    }

    /// Resolve `handle` to its loaded asset, importing it on first use.
    ///
    /// Unknown handles, types without an importer and failed imports all
    /// yield `None`.
    pub fn get_asset(&mut self, handle: AssetHandle) -> Option<Asset> {
        if let Some(asset) = self.loaded.get(&handle) {
            return Some(asset.clone());
        }

        let Some(metadata) = self.registry.get(&handle) else {
            warn!(handle = %handle, "Unknown asset handle");
            return None;
        };

        match importer::import(metadata, &self.asset_root) {
            Ok(Some(asset)) => {
                self.loaded.insert(handle, asset.clone());
                Some(asset)
            }
            Ok(None) => {
                debug!(handle = %handle, asset_type = %metadata.asset_type, "No importer for asset type");
                None
            }
            Err(e) => {
                error!(handle = %handle, path = ?metadata.filepath, error = %e, "Failed to import asset");
                None
            }
        }
    }

    pub fn is_asset_loaded(&self, handle: AssetHandle) -> bool {
        self.loaded.contains_key(&handle)
    }

    /// Drop the cached copy so the next `get_asset` reads the file again
    pub fn unload_asset(&mut self, handle: AssetHandle) -> bool {
        self.loaded.remove(&handle).is_some()
    }

    pub fn remove_asset(&mut self, handle: AssetHandle) -> Option<AssetMetaData> {
        self.loaded.remove(&handle);
        self.registry.remove(&handle)
    }

    /// Remove and return every entry whose file no longer exists
    pub fn validate_asset_registry(&mut self) -> Vec<(AssetHandle, AssetMetaData)> {
        let missing: Vec<AssetHandle> = self
            .registry
            .iter()
            .filter(|(_, metadata)| !self.asset_root.join(&metadata.filepath).exists())
            .map(|(handle, _)| *handle)
            .collect();

        let removed: Vec<(AssetHandle, AssetMetaData)> = missing
            .into_iter()
            .filter_map(|handle| self.remove_asset(handle).map(|metadata| (handle, metadata)))
            .collect();

        for (handle, metadata) in &removed {
            warn!(handle = %handle, path = ?metadata.filepath, "Asset file missing, removed from registry");
        }
        removed
    }

    pub fn save_registry(&self, path: impl AsRef<Path>) -> Result<(), AssetError> {
        let path = path.as_ref();
        let document = RegistryDocument {
            registry: RegistryBody {
                assets: self
                    .registry
                    .iter()
                    .map(|(handle, metadata)| RegistryEntry {
                        handle: *handle,
                        asset_type: metadata.asset_type,
                        filepath: to_portable(&metadata.filepath),
                    })
                    .collect(),
            },
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, serde_json::to_string_pretty(&document)?)?;
        info!(path = ?path, asset_count = self.registry.len(), "Saved asset registry");
        Ok(())
    }

    /// Replace the registry with the contents of `path`; returns the entry count
    pub fn load_registry(&mut self, path: impl AsRef<Path>) -> Result<usize, AssetError> {
        let path = path.as_ref();
        let document: RegistryDocument = serde_json::from_str(&fs::read_to_string(path)?)?;

        self.registry.clear();
        self.loaded.clear();
        for entry in document.registry.assets {
            if entry.handle.is_nil() || !entry.asset_type.is_valid() {
                warn!(handle = %entry.handle, path = %entry.filepath, "Skipping invalid registry entry");
                continue;
            }
            let raw: PathBuf = entry.filepath.split('/').collect();
            let Some(filepath) = self.relative_path(&raw) else {
                warn!(handle = %entry.handle, path = %entry.filepath, "Registry entry is outside the asset directory, skipping");
                continue;
            };
            if let Some(existing) = self.find_handle(&filepath) {
                warn!(
                    handle = %entry.handle,
                    existing = %existing,
                    path = %entry.filepath,
                    "Duplicate registry path, skipping"
                );
                continue;
            }
            self.registry.insert(
                entry.handle,
                AssetMetaData {
                    asset_type: entry.asset_type,
                    filepath,
                },
            );
        }

        info!(path = ?path, asset_count = self.registry.len(), "Loaded asset registry");
        Ok(self.registry.len())
    }

    /// Express `path` relative to the asset root; `None` if it escapes the root
    fn relative_path(&self, path: &Path) -> Option<PathBuf> {
        let relative = if path.is_absolute() {
            match path.strip_prefix(&self.asset_root) {
                Ok(relative) => relative.to_path_buf(),
                Err(_) => {
                    let root = self.asset_root.canonicalize().ok()?;
                    let path = path.canonicalize().ok()?;
                    path.strip_prefix(root).ok()?.to_path_buf()
                }
            }
        } else {
            path.to_path_buf()
        };

        let mut normalized = PathBuf::new();
        for component in relative.components() {
            match component {
                Component::Normal(part) => normalized.push(part),
                Component::CurDir => {}
                _ => return None,
            }
        }
        (!normalized.as_os_str().is_empty()).then_some(normalized)
    }
}

fn to_portable(path: &Path) -> String {
    path.components()
        .map(|component| component.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::uuid::Uuid;
    use tempfile::TempDir;

    #[test]
    fn test_import_dedups_by_path() {
        let mut manager = AssetManager::new("Assets");
        let first = manager.import_asset("Textures/wood.png");
        let second = manager.import_asset("./Textures/wood.png");

        assert!(!first.is_nil());
        assert_eq!(first, second);
        assert_eq!(manager.len(), 1);
    }

    #[test]
    fn test_unknown_extension_returns_nil() {
        let mut manager = AssetManager::new("Assets");
        assert!(manager.import_asset("notes.txt").is_nil());
        assert!(manager.is_empty());
    }

    #[test]
    fn test_absolute_paths_are_relativized() {
        let dir = TempDir::new().unwrap();
        let mut manager = AssetManager::new(dir.path());
        let handle = manager.import_asset(dir.path().join("Scenes").join("Main.ixscene"));

        let metadata = manager.metadata(handle).unwrap();
        assert_eq!(metadata.filepath, Path::new("Scenes").join("Main.ixscene"));
        assert_eq!(metadata.asset_type, AssetType::Scene);
    }

    #[test]
    fn test_paths_outside_root_are_rejected() {
        let dir = TempDir::new().unwrap();
        let mut manager = AssetManager::new(dir.path().join("Assets"));
        assert!(manager.import_asset("../secret.png").is_nil());
        assert!(manager.import_asset(dir.path().join("other.png")).is_nil());
        assert!(manager.is_empty());
    }

    #[test]
    fn test_validate_removes_missing_files() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("kept.wav"), b"riff").unwrap();

        let mut manager = AssetManager::new(dir.path());
        let kept = manager.import_asset("kept.wav");
        let missing = manager.import_asset("missing.wav");

        let removed = manager.validate_asset_registry();
        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0].0, missing);
        assert!(manager.is_asset_handle_valid(kept));
        assert!(!manager.is_asset_handle_valid(missing));
    }

    #[test]
    fn test_registry_persistence() {
        let dir = TempDir::new().unwrap();
        let mut manager = AssetManager::new(dir.path());
        let texture = manager.import_asset("Textures/Brick/albedo.jpg");
        let scene = manager.import_asset("Scenes/Main.ixscene");

        let registry_path = dir.path().join("AssetRegistry.ixreg");
        manager.save_registry(&registry_path).unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&registry_path).unwrap()).unwrap();
        let assets = raw["AssetRegistry"]["Assets"].as_array().unwrap();
        assert_eq!(assets.len(), 2);
        assert!(assets
            .iter()
            .any(|entry| entry["Filepath"] == "Textures/Brick/albedo.jpg"));

        let mut reloaded = AssetManager::new(dir.path());
        assert_eq!(reloaded.load_registry(&registry_path).unwrap(), 2);
        assert_eq!(
            reloaded.metadata(texture).unwrap().asset_type,
            AssetType::Texture
        );
        assert_eq!(reloaded.find_handle(Path::new("Scenes/Main.ixscene")), Some(scene));
    }

    #[test]
    fn test_load_registry_skips_duplicate_and_escaping_paths() {
        let dir = TempDir::new().unwrap();
        let registry_path = dir.path().join("AssetRegistry.ixreg");
        fs::write(
            &registry_path,
            r#"{
                "AssetRegistry": {
                    "Assets": [
                        { "Handle": 11, "Type": "Texture", "Filepath": "a.png" },
                        { "Handle": 22, "Type": "Texture", "Filepath": "a.png" },
                        { "Handle": 33, "Type": "Texture", "Filepath": "../outside.png" }
                    ]
                }
            }"#,
        )
        .unwrap();

        let mut manager = AssetManager::new(dir.path().join("Assets"));
        assert_eq!(manager.load_registry(&registry_path).unwrap(), 1);
        assert_eq!(manager.len(), 1);
        assert_eq!(manager.find_handle(Path::new("a.png")), Some(Uuid::from_raw(11)));
        assert!(!manager.is_asset_handle_valid(Uuid::from_raw(33)));

        assert_eq!(manager.import_asset("a.png"), Uuid::from_raw(11));
        assert_eq!(manager.len(), 1);
    }

    #[test]
    fn test_get_asset_caches_and_tolerates_failures() {
        let dir = TempDir::new().unwrap();
        image::RgbaImage::new(2, 2)
            .save(dir.path().join("icon.png"))
            .unwrap();

        let mut manager = AssetManager::new(dir.path());
        let icon = manager.import_asset("icon.png");
        let broken = manager.import_asset("broken.png");
        let audio = manager.import_asset("music.flac");

        assert!(manager.get_asset(icon).is_some());
        assert!(manager.is_asset_loaded(icon));
        assert!(manager.get_asset(broken).is_none());
        assert!(manager.get_asset(audio).is_none());
        assert!(manager.get_asset(AssetHandle::NIL).is_none());
    }
}
