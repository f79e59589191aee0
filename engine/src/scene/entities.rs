//! Entity lifecycle and hierarchy operations on a scene

use super::Scene;
use crate::core::entity::{is_ancestor, Entity, EntityType, IdComponent, Transform};
use crate::core::uuid::Uuid;
use crate::io::component_registry::{ComponentKind, SceneComponent};
use glam::{Vec2, Vec3};
use tracing::{debug, warn};

impl Scene {
    /// Create an entity with a fresh UUID, a de-duplicated name and a default
    /// transform
    pub fn create_entity(&mut self, name: &str, entity_type: EntityType) -> Entity {
        self.create_entity_with_uuid(name, entity_type, Uuid::new())
    }

    /// Create an entity with a known UUID; `Uuid::NIL` requests a fresh one
    pub fn create_entity_with_uuid(
        &mut self,
        name: &str,
        entity_type: EntityType,
        uuid: Uuid,
    ) -> Entity {
        let uuid = if uuid.is_nil() {
            Uuid::new()
        } else if self.entities.contains_key(&uuid) {
            warn!(entity = %uuid, "UUID already in use, generating a new one");
            Uuid::new()
        } else {
            uuid
        };

        let name = self.names.unique_name(name);
        let entity = self.spawn_identity(IdComponent::new(name, uuid, entity_type));
        debug!(entity = %uuid, "Created entity");
        entity
    }

    /// Spawn an entity around an identity whose name is already unique
    pub(super) fn spawn_identity(&mut self, id: IdComponent) -> Entity {
        let uuid = id.uuid;
        self.names.insert(id.name.clone(), uuid);
        let entity = self.world.spawn((id, Transform::default()));
        self.entities.insert(uuid, entity);
        self.register_kind(entity, ComponentKind::Transform);
        self.dirty = true;
        entity
    }

    pub(crate) fn register_kind(&mut self, entity: Entity, kind: ComponentKind) {
        let kinds = self.registered.entry(entity).or_default();
        if !kinds.contains(&kind) {
            kinds.push(kind);
        }
    }

    fn unregister_kind(&mut self, entity: Entity, kind: ComponentKind) {
        if let Some(kinds) = self.registered.get_mut(&entity) {
            kinds.retain(|registered| *registered != kind);
        }
    }

    /// Component kinds attached to an entity, in attachment order
    pub fn components(&self, entity: Entity) -> &[ComponentKind] {
        self.registered
            .get(&entity)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Attach `component`, or return the instance the entity already has
    pub fn add_component<T: SceneComponent>(
        &mut self,
        entity: Entity,
        component: T,
    ) -> Result<hecs::RefMut<'_, T>, hecs::ComponentError> {
        if !self.world.contains(entity) {
            return Err(hecs::ComponentError::NoSuchEntity);
        }
        self.register_kind(entity, T::KIND);
        self.dirty = true;
        self.world.add_component(entity, component)
    }

    /// Attach a default-constructed component by kind, as the inspector does
    pub fn add_component_kind(&mut self, entity: Entity, kind: ComponentKind) -> bool {
        if (kind.vtable().has)(&self.world, entity) {
            return true;
        }
        if !(kind.vtable().add_default)(&mut self.world, entity) {
            return false;
        }
        self.register_kind(entity, kind);
        self.dirty = true;
        true
    }

    /// Detach and return a component; physics bodies are released first
    pub fn remove_component<T: SceneComponent>(&mut self, entity: Entity) -> Option<T> {
        self.release_physics(entity, T::KIND);
        let removed = self.world.remove_one::<T>(entity).ok()?;
        self.unregister_kind(entity, T::KIND);
        self.dirty = true;
        Some(removed)
    }

    pub fn remove_component_kind(&mut self, entity: Entity, kind: ComponentKind) -> bool {
        self.release_physics(entity, kind);
        if !(kind.vtable().remove)(&mut self.world, entity) {
            return false;
        }
        self.unregister_kind(entity, kind);
        self.dirty = true;
        true
    }

    fn release_physics(&mut self, entity: Entity, kind: ComponentKind) {
        match kind {
            ComponentKind::Rigidbody2D => {
                self.physics_2d.destroy_body(&mut self.world, entity);
            }
            ComponentKind::Rigidbody => {
                self.physics_3d.destroy_body(&mut self.world, entity);
            }
            _ => {}
        }
    }

    /// Attach a component decoded from a document value
    pub fn deserialize_component(
        &mut self,
        entity: Entity,
        kind: ComponentKind,
        value: &serde_json::Value,
    ) -> Result<(), serde_json::Error> {
        (kind.vtable().deserialize)(&mut self.world, entity, value)?;
        if self.world.contains(entity) {
            self.register_kind(entity, kind);
        }
        Ok(())
    }

    pub fn serialize_component(&self, entity: Entity, kind: ComponentKind) -> Option<serde_json::Value> {
        (kind.vtable().serialize)(&self.world, entity)
    }

    pub fn get_component<T: SceneComponent>(&self, entity: Entity) -> Option<hecs::Ref<'_, T>> {
        self.world.get::<T>(entity).ok()
    }

    pub fn get_component_mut<T: SceneComponent>(
        &self,
        entity: Entity,
    ) -> Option<hecs::RefMut<'_, T>> {
        self.world.get_mut::<T>(entity).ok()
    }

    pub fn has_component<T: SceneComponent>(&self, entity: Entity) -> bool {
        self.world.has::<T>(entity)
    }

    pub fn is_valid(&self, entity: Entity) -> bool {
        self.world.contains(entity)
    }

    pub fn get_entity(&self, uuid: Uuid) -> Option<Entity> {
        self.entities.get(&uuid).copied()
    }

    pub fn uuid_of(&self, entity: Entity) -> Option<Uuid> {
        self.world.get::<IdComponent>(entity).ok().map(|id| id.uuid)
    }

    pub fn entity_name(&self, entity: Entity) -> Option<String> {
        self.world
            .get::<IdComponent>(entity)
            .ok()
            .map(|id| id.name.clone())
    }

    pub fn find_entity_by_name(&self, name: &str) -> Option<Uuid> {
        self.names.lookup(name)
    }

    /// Rename an entity, de-duplicating against the other live names
    pub fn rename_entity(&mut self, entity: Entity, name: &str) -> Option<String> {
        let (uuid, old_name) = {
            let id = self.world.get::<IdComponent>(entity).ok()?;
            (id.uuid, id.name.clone())
        };
        if old_name == name {
            return Some(old_name);
        }

        self.names.release(&old_name);
        let new_name = self.names.claim(name, uuid);
        if let Ok(mut id) = self.world.get_mut::<IdComponent>(entity) {
            id.name = new_name.clone();
        }
        self.dirty = true;
        Some(new_name)
    }

    /// Destroy an entity and, depth first, all of its descendants.
    ///
    /// Physics bodies are released, the entity leaves the lookup maps and its
    /// parent's child list, then its slot is freed. Invalid handles are ignored.
    pub fn destroy_entity(&mut self, entity: Entity) {
        let (uuid, name, parent, children) = match self.world.get::<IdComponent>(entity) {
            Ok(id) => (id.uuid, id.name.clone(), id.parent, id.children.clone()),
            Err(_) => return,
        };

        for child_uuid in children {
            if let Some(child) = self.get_entity(child_uuid) {
                self.destroy_entity(child);
            }
        }

        self.physics_2d.destroy_body(&mut self.world, entity);
        self.physics_3d.destroy_body(&mut self.world, entity);

        self.entities.remove(&uuid);
        if self.names.lookup(&name) == Some(uuid) {
            self.names.release(&name);
        }
        if let Some(parent) = self.get_entity(parent) {
            if let Ok(mut parent_id) = self.world.get_mut::<IdComponent>(parent) {
                parent_id.children.retain(|child| *child != uuid);
            }
        }

        self.registered.remove(&entity);
        let _ = self.world.despawn(entity);
        self.dirty = true;
        debug!(entity = %uuid, "Destroyed entity");
    }

    /// Deep-copy an entity and its subtree under fresh UUIDs and names.
    ///
    /// With `add_to_parent` the copy is attached to the original's parent;
    /// otherwise it is left as a root.
    pub fn duplicate_entity(&mut self, entity: Entity, add_to_parent: bool) -> Option<Entity> {
        let (name, entity_type, parent, children) = {
            let id = self.world.get::<IdComponent>(entity).ok()?;
            (id.name.clone(), id.entity_type, id.parent, id.children.clone())
        };

        let copy = self.create_entity(&name, entity_type);
        let kinds = self.components(entity).to_vec();
        for kind in kinds {
            if (kind.vtable().duplicate)(&mut self.world, entity, copy) {
                self.register_kind(copy, kind);
            }
        }

        for child_uuid in children {
            let Some(child) = self.get_entity(child_uuid) else {
                continue;
            };
            if let Some(child_copy) = self.duplicate_entity(child, false) {
                self.add_child(copy, child_copy);
            }
        }

        if add_to_parent {
            if let Some(parent) = self.get_entity(parent) {
                self.add_child(parent, copy);
            }
        }

        Some(copy)
    }

    /// Whether `source` is a strict ancestor of `target`
    pub fn is_parent(&self, target: Entity, source: Entity) -> bool {
        target != source && is_ancestor(&self.world, &self.entities, target, source)
    }

    /// Make `child` a child of `parent`, detaching it from its old parent.
    ///
    /// Rejected when `child` is `parent` or one of its ancestors, which keeps
    /// the graph acyclic.
    pub fn add_child(&mut self, parent: Entity, child: Entity) -> bool {
        if !self.world.contains(parent) || !self.world.contains(child) {
            return false;
        }
        if is_ancestor(&self.world, &self.entities, parent, child) {
            warn!(parent = ?parent, child = ?child, "Rejected reparent that would create a cycle");
            return false;
        }

        let (parent_uuid, child_uuid, old_parent) = {
            let Ok(parent_id) = self.world.get::<IdComponent>(parent) else {
                return false;
            };
            let Ok(child_id) = self.world.get::<IdComponent>(child) else {
                return false;
            };
            (parent_id.uuid, child_id.uuid, child_id.parent)
        };
        if old_parent == parent_uuid {
            return true;
        }

        if let Some(old) = self.get_entity(old_parent) {
            if let Ok(mut old_id) = self.world.get_mut::<IdComponent>(old) {
                old_id.children.retain(|uuid| *uuid != child_uuid);
            }
        }
        if let Ok(mut parent_id) = self.world.get_mut::<IdComponent>(parent) {
            parent_id.children.push(child_uuid);
        }
        if let Ok(mut child_id) = self.world.get_mut::<IdComponent>(child) {
            child_id.parent = parent_uuid;
        }
        if let Ok(mut transform) = self.world.get_mut::<Transform>(child) {
            transform.dirty = true;
        }

        self.dirty = true;
        true
    }

    /// Detach an entity from its parent, keeping its world placement
    pub fn unparent(&mut self, entity: Entity) -> bool {
        let (uuid, parent) = match self.world.get::<IdComponent>(entity) {
            Ok(id) if !id.is_root() => (id.uuid, id.parent),
            _ => return false,
        };

        if let Some(parent) = self.get_entity(parent) {
            if let Ok(mut parent_id) = self.world.get_mut::<IdComponent>(parent) {
                parent_id.children.retain(|child| *child != uuid);
            }
        }
        if let Ok(mut id) = self.world.get_mut::<IdComponent>(entity) {
            id.parent = Uuid::NIL;
        }
        if let Ok(mut transform) = self.world.get_mut::<Transform>(entity) {
            transform.local_translation = transform.translation;
            transform.local_rotation = transform.rotation;
            transform.local_scale = transform.scale;
            transform.dirty = true;
        }

        self.dirty = true;
        true
    }

    /// Register an entity and its descendants with both live physics worlds
    pub fn instantiate_physics(&mut self, entity: Entity) -> usize {
        let mut created = 0;
        if self.physics_2d.instantiate(&mut self.world, entity) {
            created += 1;
        }
        if self.physics_3d.instantiate(&mut self.world, entity) {
            created += 1;
        }

        let children = self
            .world
            .get::<IdComponent>(entity)
            .map(|id| id.children.clone())
            .unwrap_or_default();
        for child_uuid in children {
            if let Some(child) = self.get_entity(child_uuid) {
                created += self.instantiate_physics(child);
            }
        }
        created
    }

    /// Apply a one-frame force to a live 2D body
    pub fn apply_force_2d(&mut self, entity: Entity, force: Vec2, point: Vec2, wake: bool) -> bool {
        self.physics_2d
            .apply_force(&self.world, entity, force, point, wake)
    }

    pub fn add_force(&mut self, entity: Entity, force: Vec3) -> bool {
        self.physics_3d.add_force(&self.world, entity, force)
    }

    pub fn add_impulse(&mut self, entity: Entity, impulse: Vec3) -> bool {
        self.physics_3d.add_impulse(&self.world, entity, impulse)
    }

    pub fn set_linear_velocity(&mut self, entity: Entity, velocity: Vec3) -> bool {
        self.physics_3d
            .set_linear_velocity(&self.world, entity, velocity)
    }

    pub fn linear_velocity(&mut self, entity: Entity) -> Option<Vec3> {
        self.physics_3d.linear_velocity(&self.world, entity)
    }
}
