//! Scene document serialization and loading

use crate::config::PhysicsConfig;
use crate::core::entity::{Entity, EntityType, IdComponent};
use crate::core::uuid::Uuid;
use crate::io::component_registry::ComponentKind;
use crate::scene::Scene;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

pub const SCENE_VERSION: &str = "1.0";

/// Serialized form of a scene
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneDocument {
    #[serde(rename = "Scene")]
    pub title: String,
    #[serde(rename = "Version", default)]
    pub version: String,
    #[serde(rename = "Entities", default)]
    pub entities: Vec<SerializedEntity>,
}

/// A single entity record; every key besides the identity fields names a component
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerializedEntity {
    #[serde(rename = "ID")]
    pub id: Uuid,
    #[serde(rename = "Name", default)]
    pub name: String,
    #[serde(rename = "Type", default)]
    pub entity_type: String,
    #[serde(rename = "Parent", default)]
    pub parent: Uuid,
    /// Map of component names to their serialized JSON values
    #[serde(flatten)]
    pub components: BTreeMap<String, serde_json::Value>,
}

/// Errors that can occur during scene operations
#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Scene file not found: {0}")]
    NotFound(PathBuf),
}

impl SceneDocument {
    /// Capture a scene; entities are written parents first so that child
    /// order survives a reload
    pub fn from_scene(scene: &Scene) -> Self {
        let mut entities = Vec::with_capacity(scene.entity_count());
        let mut stack: Vec<Entity> = scene.root_entities();
        stack.reverse();

        while let Some(entity) = stack.pop() {
            let Ok(id) = scene.world().get::<IdComponent>(entity).map(|id| (*id).clone()) else {
                continue;
            };

            let mut components = BTreeMap::new();
            for &kind in scene.components(entity) {
                match scene.serialize_component(entity, kind) {
                    Some(value) => {
                        components.insert(kind.name().to_string(), value);
                    }
                    None => error!(component = %kind, entity = %id.uuid, "Failed to serialize component"),
                }
            }

            for child in id.children.iter().rev() {
                if let Some(child) = scene.get_entity(*child) {
                    stack.push(child);
                }
            }

            entities.push(SerializedEntity {
                id: id.uuid,
                name: id.name,
                entity_type: id.entity_type.as_str().to_string(),
                parent: id.parent,
                components,
            });
        }

        debug!(entity_count = entities.len(), "Captured scene");
        Self {
            title: scene.name().to_string(),
            version: SCENE_VERSION.to_string(),
            entities,
        }
    }

    /// Build a scene from this document.
    ///
    /// Entities are created first, then components attached, then the
    /// hierarchy wired, so every parent exists before its children attach.
    pub fn instantiate(&self, config: PhysicsConfig) -> Scene {
        info!(scene = %self.title, entity_count = self.entities.len(), "Instantiating scene");
        let mut scene = Scene::with_config(self.title.clone(), config);

        let created: Vec<Entity> = self
            .entities
            .iter()
            .map(|record| {
                scene.create_entity_with_uuid(
                    &record.name,
                    EntityType::from_name(&record.entity_type),
                    record.id,
                )
            })
            .collect();

        for (record, &entity) in self.entities.iter().zip(&created) {
            for (name, value) in &record.components {
                let Some(kind) = ComponentKind::from_name(name) else {
                    warn!(component_type = %name, "Unknown component type in scene, skipping");
                    continue;
                };
                if let Err(e) = scene.deserialize_component(entity, kind, value) {
                    error!(error = %e, component = %kind, entity = %record.id, "Failed to deserialize component");
                }
            }
        }

        for (record, &entity) in self.entities.iter().zip(&created) {
            if record.parent.is_nil() {
                continue;
            }
            match scene.get_entity(record.parent) {
                Some(parent) => {
                    if !scene.add_child(parent, entity) {
                        warn!(entity = %record.id, parent = %record.parent, "Rejected parent link");
                    }
                }
                None => warn!(
                    entity = %record.id,
                    parent = %record.parent,
                    "Parent entity not found in scene during instantiation"
                ),
            }
        }

        scene.update_transforms();
        scene.clear_dirty();
        info!("Scene instantiation complete");
        scene
    }

    /// Save this document to a JSON file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), SceneError> {
        let path = path.as_ref();
        info!(path = ?path, "Saving scene to file");

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;

        info!(path = ?path, "Scene saved successfully");
        Ok(())
    }

    /// Load a document from a JSON file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, SceneError> {
        let path = path.as_ref();
        info!(path = ?path, "Loading scene from file");

        if !path.exists() {
            return Err(SceneError::NotFound(path.to_path_buf()));
        }
        let json = fs::read_to_string(path)?;
        let document = serde_json::from_str(&json)?;

        info!(path = ?path, "Scene loaded successfully");
        Ok(document)
    }
}

impl Scene {
    /// Write the scene to `path` and clear its dirty flag
    pub fn save<P: AsRef<Path>>(&mut self, path: P) -> Result<(), SceneError> {
        SceneDocument::from_scene(self).save_to_file(path)?;
        self.clear_dirty();
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(path: P, config: PhysicsConfig) -> Result<Scene, SceneError> {
        Ok(SceneDocument::load_from_file(path)?.instantiate(config))
    }
}
