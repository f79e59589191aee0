//! Project context: the project file, its asset registry and scene access

use crate::asset::{AssetError, AssetHandle, AssetManager, AssetType};
use crate::config::{validate_file_name, PhysicsConfig, ProjectConfig};
use crate::io::SceneError;
use crate::scene::Scene;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

pub const PROJECT_EXTENSION: &str = "ixproj";

#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Scene error: {0}")]
    Scene(#[from] SceneError),

    #[error("Asset error: {0}")]
    Asset(#[from] AssetError),

    #[error("Invalid name: {0:?}")]
    InvalidName(String),
}

/// Contents of a `.ixproj` file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectInfo {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "AssetDirectory")]
    pub asset_directory: PathBuf,
    #[serde(rename = "AssetRegistry")]
    pub registry_file: String,
    #[serde(rename = "ScenesDirectory")]
    pub scenes_dir: String,
    /// Scene opened when the project starts; NIL if none
    #[serde(rename = "StartScene")]
    pub start_scene: AssetHandle,
    #[serde(rename = "Physics")]
    pub physics: PhysicsConfig,
}

impl Default for ProjectInfo {
    fn default() -> Self {
        let config = ProjectConfig::default();
        Self {
            name: "Untitled".to_string(),
            asset_directory: config.asset_directory,
            registry_file: config.registry_file,
            scenes_dir: config.scenes_dir,
            start_scene: AssetHandle::NIL,
            physics: PhysicsConfig::default(),
        }
    }
}

impl ProjectInfo {
    pub fn config(&self) -> ProjectConfig {
        ProjectConfig::new(
            self.asset_directory.clone(),
            self.scenes_dir.clone(),
            self.registry_file.clone(),
        )
    }
}

pub struct Project {
    info: ProjectInfo,
    config: ProjectConfig,
    project_dir: PathBuf,
    asset_manager: AssetManager,
}

impl Project {
    /// Lay out a new project in `project_dir` and write its files
    pub fn create(project_dir: impl Into<PathBuf>, name: &str) -> Result<Self, ProjectError> {
        validate_file_name(name)?;
        let project_dir = project_dir.into();
        let info = ProjectInfo {
            name: name.to_string(),
            ..ProjectInfo::default()
        };
        let config = info.config();
        fs::create_dir_all(config.asset_root(&project_dir).join(&config.scenes_dir))?;

        let project = Self {
            asset_manager: AssetManager::new(config.asset_root(&project_dir)),
            info,
            config,
            project_dir,
        };
        project.save()?;
        info!(name, path = ?project.project_dir, "Created project");
        Ok(project)
    }

    /// Open a `.ixproj` file, load its registry and drop entries whose files are gone
    pub fn load(project_file: impl AsRef<Path>) -> Result<Self, ProjectError> {
        let project_file = project_file.as_ref();
        let info: ProjectInfo = serde_json::from_str(&fs::read_to_string(project_file)?)?;
        validate_file_name(&info.name)?;

        let project_dir = project_file
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        let config = info.config();
        config.validate(&project_dir)?;

        let mut asset_manager = AssetManager::new(config.asset_root(&project_dir));
        let registry_path = config.registry_path(&project_dir);
        if registry_path.exists() {
            asset_manager.load_registry(&registry_path)?;
        } else {
            warn!(path = ?registry_path, "Project has no asset registry yet");
        }
        let removed = asset_manager.validate_asset_registry();

        info!(
            name = %info.name,
            assets = asset_manager.len(),
            removed = removed.len(),
            "Loaded project"
        );
        Ok(Self {
            info,
            config,
            project_dir,
            asset_manager,
        })
    }

    /// Write the project file and the asset registry
    pub fn save(&self) -> Result<(), ProjectError> {
        fs::create_dir_all(&self.project_dir)?;
        fs::write(self.project_file(), serde_json::to_string_pretty(&self.info)?)?;
        self.asset_manager
            .save_registry(self.config.registry_path(&self.project_dir))?;
        Ok(())
    }

    pub fn info(&self) -> &ProjectInfo {
        &self.info
    }

    pub fn config(&self) -> &ProjectConfig {
        &self.config
    }

    pub fn project_dir(&self) -> &Path {
        &self.project_dir
    }

    pub fn project_file(&self) -> PathBuf {
        self.project_dir
            .join(format!("{}.{PROJECT_EXTENSION}", self.info.name))
    }

    pub fn asset_root(&self) -> PathBuf {
        self.config.asset_root(&self.project_dir)
    }

    pub fn asset_manager(&self) -> &AssetManager {
        &self.asset_manager
    }

    pub fn asset_manager_mut(&mut self) -> &mut AssetManager {
        &mut self.asset_manager
    }

    pub fn set_start_scene(&mut self, handle: AssetHandle) {
        self.info.start_scene = handle;
    }

    /// Save `scene` under the scenes directory and register it.
    ///
    /// The first scene saved becomes the start scene.
    pub fn save_scene(&mut self, scene: &mut Scene) -> Result<AssetHandle, ProjectError> {
        let path = self.config.scene_path(&self.project_dir, scene.name())?;
        scene.save(&path)?;

        let handle = self.asset_manager.import_asset(&path);
        self.asset_manager.unload_asset(handle);
        if self.info.start_scene.is_nil() {
            self.info.start_scene = handle;
        }
        Ok(handle)
    }

    /// Build a fresh scene from a registered scene document
    pub fn open_scene(&mut self, handle: AssetHandle) -> Option<Scene> {
        match self.asset_manager.metadata(handle) {
            Some(metadata) if metadata.asset_type == AssetType::Scene => {}
            Some(metadata) => {
                warn!(handle = %handle, asset_type = %metadata.asset_type, "Asset is not a scene");
                return None;
            }
            None => {
                warn!(handle = %handle, "Unknown scene handle");
                return None;
            }
        }

        let asset = self.asset_manager.get_asset(handle)?;
        let document = asset.as_scene()?;
        Some(document.instantiate(self.info.physics))
    }

    pub fn open_start_scene(&mut self) -> Option<Scene> {
        self.open_scene(self.info.start_scene)
    }
}
