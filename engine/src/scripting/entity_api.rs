use crate::core::entity::{Entity, Transform};
use crate::core::uuid::Uuid;
use crate::scene::Scene;
use glam::{Quat, Vec2, Vec3};
use tracing::{debug, warn};

/// Entity access for script hosts.
///
/// Scripts never hold store handles; every call names its entity by UUID and
/// unknown UUIDs yield `None`, `false` or `Uuid::NIL`.
pub struct ScriptContext<'a> {
    scene: &'a mut Scene,
}

impl<'a> ScriptContext<'a> {
    pub fn new(scene: &'a mut Scene) -> Self {
        Self { scene }
    }

    pub fn scene(&self) -> &Scene {
        self.scene
    }

    fn entity(&self, uuid: Uuid) -> Option<Entity> {
        let entity = self.scene.get_entity(uuid);
        if entity.is_none() {
            warn!(entity = %uuid, "Script referenced unknown entity");
        }
        entity
    }

    fn read_transform<R>(&self, uuid: Uuid, read: impl FnOnce(&Transform) -> R) -> Option<R> {
        let entity = self.entity(uuid)?;
        let transform = self.scene.get_component::<Transform>(entity)?;
        Some(read(&transform))
    }

    fn write_transform(&mut self, uuid: Uuid, write: impl FnOnce(&mut Transform)) -> bool {
        let Some(entity) = self.entity(uuid) else {
            return false;
        };
        match self.scene.get_component_mut::<Transform>(entity) {
            Some(mut transform) => {
                write(&mut transform);
                true
            }
            None => false,
        }
    }

    pub fn exists(&self, uuid: Uuid) -> bool {
        self.scene.get_entity(uuid).is_some()
    }

    pub fn name(&self, uuid: Uuid) -> Option<String> {
        self.scene.entity_name(self.entity(uuid)?)
    }

    /// World-space translation
    pub fn translation(&self, uuid: Uuid) -> Option<Vec3> {
        self.read_transform(uuid, |t| t.translation)
    }

    pub fn rotation(&self, uuid: Uuid) -> Option<Quat> {
        self.read_transform(uuid, |t| t.rotation)
    }

    pub fn scale(&self, uuid: Uuid) -> Option<Vec3> {
        self.read_transform(uuid, |t| t.scale)
    }

    /// Set the translation relative to the parent
    pub fn set_translation(&mut self, uuid: Uuid, translation: Vec3) -> bool {
        self.write_transform(uuid, |t| t.set_local_translation(translation))
    }

    pub fn set_rotation(&mut self, uuid: Uuid, rotation: Quat) -> bool {
        self.write_transform(uuid, |t| t.set_local_rotation(rotation))
    }

    pub fn set_scale(&mut self, uuid: Uuid, scale: Vec3) -> bool {
        self.write_transform(uuid, |t| t.set_local_scale(scale))
    }

    pub fn is_visible(&self, uuid: Uuid) -> Option<bool> {
        self.read_transform(uuid, |t| t.visible)
    }

    pub fn set_visible(&mut self, uuid: Uuid, visible: bool) -> bool {
        self.write_transform(uuid, |t| t.visible = visible)
    }

    /// Clone an entity and its subtree as a new root placed at `translation`.
    ///
    /// While the scene is playing the copies get physics bodies immediately.
    pub fn instantiate(&mut self, uuid: Uuid, translation: Vec3) -> Uuid {
        let Some(source) = self.entity(uuid) else {
            return Uuid::NIL;
        };
        let Some(copy) = self.scene.duplicate_entity(source, false) else {
            return Uuid::NIL;
        };
        if let Some(mut transform) = self.scene.get_component_mut::<Transform>(copy) {
            transform.set_local_translation(translation);
        }
        self.scene.update_transforms();

        if self.scene.is_playing() {
            let bodies = self.scene.instantiate_physics(copy);
            debug!(source = %uuid, bodies, "Instantiated physics for copy");
        }
        self.scene.uuid_of(copy).unwrap_or_default()
    }

    /// Destroy an entity and its subtree, releasing physics bodies first
    pub fn destroy(&mut self, uuid: Uuid) -> bool {
        match self.entity(uuid) {
            Some(entity) => {
                self.scene.destroy_entity(entity);
                true
            }
            None => false,
        }
    }

    /// UUID of the entity with this exact name, or `Uuid::NIL`
    pub fn find_entity_by_name(&self, name: &str) -> Uuid {
        self.scene.find_entity_by_name(name).unwrap_or_default()
    }

    pub fn apply_force_2d(&mut self, uuid: Uuid, force: Vec2, point: Vec2, wake: bool) -> bool {
        let Some(entity) = self.entity(uuid) else {
            return false;
        };
        self.scene.apply_force_2d(entity, force, point, wake)
    }

    pub fn add_force(&mut self, uuid: Uuid, force: Vec3) -> bool {
        let Some(entity) = self.entity(uuid) else {
            return false;
        };
        self.scene.add_force(entity, force)
    }

    pub fn add_impulse(&mut self, uuid: Uuid, impulse: Vec3) -> bool {
        let Some(entity) = self.entity(uuid) else {
            return false;
        };
        self.scene.add_impulse(entity, impulse)
    }

    pub fn linear_velocity(&mut self, uuid: Uuid) -> Option<Vec3> {
        let entity = self.entity(uuid)?;
        self.scene.linear_velocity(entity)
    }

    pub fn set_linear_velocity(&mut self, uuid: Uuid, velocity: Vec3) -> bool {
        let Some(entity) = self.entity(uuid) else {
            return false;
        };
        self.scene.set_linear_velocity(entity, velocity)
    }
}
