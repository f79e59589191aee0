//! Frame loop driver

use crate::asset::{AssetHandle, AssetWorker, SyncReport};
use crate::graphics::GpuContext;
use crate::io::{AssetChange, AssetWatcher};
use crate::project::Project;
use crate::scene::Scene;
use tracing::{debug, info, warn};

/// What happened during one [`EngineApp::update`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameReport {
    pub frame: u64,
    pub sync: SyncReport,
    pub asset_changes: usize,
    pub removed_assets: usize,
}

/// Owns the project, the active scene and the asset pipeline
pub struct EngineApp {
    project: Project,
    scene: Scene,
    asset_worker: AssetWorker,
    watcher: Option<AssetWatcher>,
    frame: u64,
}

impl EngineApp {
    /// Start with the project's start scene, or an empty one
    pub fn new(mut project: Project) -> Self {
        let scene = project
            .open_start_scene()
            .unwrap_or_else(|| Scene::with_config("Untitled", project.info().physics));
        Self::with_scene(project, scene)
    }

    pub fn with_scene(project: Project, scene: Scene) -> Self {
        info!(project = %project.info().name, scene = %scene.name(), "Engine started");
        Self {
            project,
            scene,
            asset_worker: AssetWorker::new(),
            watcher: None,
            frame: 0,
        }
    }

    /// Watch the asset directory; removals trigger a registry validation
    pub fn watch_assets(&mut self) -> notify::Result<()> {
        self.watcher = Some(AssetWatcher::new(self.project.asset_root())?);
        Ok(())
    }

    pub fn project(&self) -> &Project {
        &self.project
    }

    pub fn project_mut(&mut self) -> &mut Project {
        &mut self.project
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    pub fn asset_worker_mut(&mut self) -> &mut AssetWorker {
        &mut self.asset_worker
    }

    /// Replace the active scene; the old one stops its physics when dropped
    pub fn set_scene(&mut self, scene: Scene) -> Scene {
        std::mem::replace(&mut self.scene, scene)
    }

    pub fn open_scene(&mut self, handle: AssetHandle) -> bool {
        match self.project.open_scene(handle) {
            Some(scene) => {
                self.set_scene(scene);
                true
            }
            None => {
                warn!(handle = %handle, "Could not open scene");
                false
            }
        }
    }

    pub fn is_playing(&self) -> bool {
        self.scene.is_playing()
    }

    pub fn play(&mut self) {
        if !self.scene.is_playing() {
            self.scene.on_runtime_start();
        }
    }

    pub fn stop(&mut self) {
        if self.scene.is_playing() {
            self.scene.on_runtime_stop();
        }
    }

    /// Step the scene, react to asset changes, then apply finished loads
    pub fn update(&mut self, delta_time: f32, gpu: &mut dyn GpuContext) -> FrameReport {
        if self.scene.is_playing() {
            self.scene.on_update_runtime(delta_time);
        } else {
            self.scene.on_update_edit(delta_time);
        }

        let changes = self
            .watcher
            .as_ref()
            .map(AssetWatcher::poll)
            .unwrap_or_default();
        let removed_assets = self.apply_asset_changes(&changes);

        let sync = self.asset_worker.sync_main_thread(gpu);
        self.frame += 1;

        FrameReport {
            frame: self.frame,
            sync,
            asset_changes: changes.len(),
            removed_assets,
        }
    }

    fn apply_asset_changes(&mut self, changes: &[AssetChange]) -> usize {
        let assets = self.project.asset_manager_mut();
        for change in changes {
            if let AssetChange::Modified(path) = change {
                if let Some(handle) = assets.find_handle(path) {
                    if assets.unload_asset(handle) {
                        debug!(handle = %handle, path = ?path, "Asset changed on disk, dropped cached copy");
                    }
                }
            }
        }

        if changes.iter().any(AssetChange::is_removal) {
            assets.validate_asset_registry().len()
        } else {
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::entity::EntityType;
    use crate::graphics::NullGpuContext;
    use crate::physics::{BoxCollider2D, Rigidbody2D};
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[test]
    fn test_new_project_gets_empty_scene() {
        let dir = TempDir::new().unwrap();
        let project = Project::create(dir.path(), "Game").unwrap();
        let mut app = EngineApp::new(project);

        let mut gpu = NullGpuContext::new();
        let report = app.update(1.0 / 60.0, &mut gpu);
        assert_eq!(report.frame, 1);
        assert_eq!(report.sync, SyncReport::default());
        assert_eq!(app.scene().entity_count(), 0);
    }

    #[test]
    fn test_play_steps_physics() {
        let dir = TempDir::new().unwrap();
        let project = Project::create(dir.path(), "Game").unwrap();
        let mut scene = Scene::new("Drop");
        let body = scene.create_entity("Body", EntityType::Node);
        scene.add_component(body, Rigidbody2D::dynamic()).unwrap();
        scene.add_component(body, BoxCollider2D::default()).unwrap();
        let uuid = scene.uuid_of(body).unwrap();

        let mut app = EngineApp::with_scene(project, scene);
        app.play();
        app.play();
        let mut gpu = NullGpuContext::new();
        for _ in 0..10 {
            app.update(1.0 / 60.0, &mut gpu);
        }
        app.stop();

        let entity = app.scene().get_entity(uuid).unwrap();
        let y = app
            .scene()
            .get_component::<crate::core::entity::Transform>(entity)
            .unwrap()
            .translation
            .y;
        assert!(y < 0.0);
        assert!(!app.is_playing());
    }

    #[test]
    fn test_removed_asset_is_dropped_from_registry() {
        let dir = TempDir::new().unwrap();
        let project = Project::create(dir.path(), "Game").unwrap();
        let mut app = EngineApp::new(project);
        let handle = app
            .project_mut()
            .asset_manager_mut()
            .import_asset("Audio/theme.mp3");

        let removed = app.apply_asset_changes(&[AssetChange::Removed(PathBuf::from("theme.mp3"))]);
        assert_eq!(removed, 1);
        assert!(!app.project().asset_manager().is_asset_handle_valid(handle));
    }
}
