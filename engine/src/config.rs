//! Configuration types for the engine

use crate::project::ProjectError;
use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Scene file extension
pub const SCENE_EXTENSION: &str = "ixscene";

/// Project-relative layout of the asset directories
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ProjectConfig {
    /// Asset root, relative to the project file's directory
    pub asset_directory: PathBuf,
    /// Directory name for scenes (relative to the asset root)
    pub scenes_dir: String,
    /// Registry file name, stored inside the asset root
    pub registry_file: String,
}

impl ProjectConfig {
    /// Create a new ProjectConfig with custom paths
    pub fn new(asset_directory: PathBuf, scenes_dir: String, registry_file: String) -> Self {
        debug!(
            asset_directory = ?asset_directory,
            scenes_dir = scenes_dir,
            registry_file = registry_file,
            "Creating new ProjectConfig"
        );
        Self {
            asset_directory,
            scenes_dir,
            registry_file,
        }
    }

    /// Absolute asset root for a project living in `project_dir`
    pub fn asset_root(&self, project_dir: &Path) -> PathBuf {
        project_dir.join(&self.asset_directory)
    }

    /// Full path of the asset registry document
    pub fn registry_path(&self, project_dir: &Path) -> PathBuf {
        self.asset_root(project_dir).join(&self.registry_file)
    }

    /// Get the full path to a scene file
    pub fn scene_path(&self, project_dir: &Path, name: &str) -> Result<PathBuf, ProjectError> {
        validate_file_name(name)?;
        let path = self
            .asset_root(project_dir)
            .join(&self.scenes_dir)
            .join(format!("{name}.{SCENE_EXTENSION}"));
        debug!(name = name, path = ?path, "Generated scene path");
        Ok(path)
    }

    /// Check if the asset directories exist
    pub fn validate(&self, project_dir: &Path) -> Result<(), std::io::Error> {
        let asset_root = self.asset_root(project_dir);
        if !asset_root.exists() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("Asset root directory not found: {asset_root:?}"),
            ));
        }

        let scenes_path = asset_root.join(&self.scenes_dir);
        if !scenes_path.exists() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("Scenes directory not found: {scenes_path:?}"),
            ));
        }

        Ok(())
    }
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            asset_directory: PathBuf::from("Assets"),
            scenes_dir: "Scenes".to_string(),
            registry_file: "AssetRegistry.ixreg".to_string(),
        }
    }
}

pub(crate) fn validate_file_name(name: &str) -> Result<(), ProjectError> {
    if name.is_empty() || name.contains("..") || name.contains('/') || name.contains('\\') {
        return Err(ProjectError::InvalidName(name.to_string()));
    }
    Ok(())
}

/// When box colliders re-derive their physics shape from the entity scale
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColliderResizePolicy {
    /// Rebuild the shape on every step; follows animated scale
    #[default]
    EveryStep,
    /// Rebuild only when the scaled size differs from the current shape
    OnScaleChange,
}

/// Settings shared by the 2D and 3D physics bridges
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PhysicsConfig {
    pub gravity_2d: Vec2,
    pub gravity_3d: Vec3,
    /// Number of 2D world steps per simulated frame
    pub sub_steps_2d: u32,
    pub collider_resize: ColliderResizePolicy,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity_2d: Vec2::new(0.0, -9.8),
            gravity_3d: Vec3::new(0.0, -9.8, 0.0),
            sub_steps_2d: 4,
            collider_resize: ColliderResizePolicy::EveryStep,
        }
    }
}
