//! Closed set of scene components and their type-indexed operations
//!
//! Every component the editor can inspect or a scene document can carry is a
//! [`ComponentKind`]. Each kind resolves to a [`ComponentVTable`] of plain
//! function pointers monomorphized for the concrete type, so generic code
//! (duplication, serialization, the inspector) never downcasts.

use crate::core::entity::{Entity, MeshRenderer, Script, SkinnedMesh, Transform, World};
use crate::physics::{BoxCollider, BoxCollider2D, Rigidbody, Rigidbody2D, SphereCollider};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;

/// A component type that can live in a scene
pub trait SceneComponent:
    hecs::Component + Clone + Default + Serialize + DeserializeOwned
{
    const KIND: ComponentKind;

    /// Copy used when duplicating an entity; runtime state is not shared
    fn duplicated(&self) -> Self {
        self.clone()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ComponentKind {
    Transform,
    MeshRenderer,
    SkinnedMesh,
    Script,
    Rigidbody2D,
    BoxCollider2D,
    Rigidbody,
    BoxCollider,
    SphereCollider,
}

impl ComponentKind {
    pub const ALL: [ComponentKind; 9] = [
        ComponentKind::Transform,
        ComponentKind::MeshRenderer,
        ComponentKind::SkinnedMesh,
        ComponentKind::Script,
        ComponentKind::Rigidbody2D,
        ComponentKind::BoxCollider2D,
        ComponentKind::Rigidbody,
        ComponentKind::BoxCollider,
        ComponentKind::SphereCollider,
    ];

    /// Key used in scene documents and the inspector
    pub fn name(self) -> &'static str {
        match self {
            ComponentKind::Transform => "Transform",
            ComponentKind::MeshRenderer => "MeshRenderer",
            ComponentKind::SkinnedMesh => "SkinnedMesh",
            ComponentKind::Script => "Script",
            ComponentKind::Rigidbody2D => "Rigidbody2D",
            ComponentKind::BoxCollider2D => "BoxCollider2D",
            ComponentKind::Rigidbody => "Rigidbody",
            ComponentKind::BoxCollider => "BoxCollider",
            ComponentKind::SphereCollider => "SphereCollider",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    pub fn vtable(self) -> ComponentVTable {
        match self {
            ComponentKind::Transform => ComponentVTable::of::<Transform>(),
            ComponentKind::MeshRenderer => ComponentVTable::of::<MeshRenderer>(),
            ComponentKind::SkinnedMesh => ComponentVTable::of::<SkinnedMesh>(),
            ComponentKind::Script => ComponentVTable::of::<Script>(),
            ComponentKind::Rigidbody2D => ComponentVTable::of::<Rigidbody2D>(),
            ComponentKind::BoxCollider2D => ComponentVTable::of::<BoxCollider2D>(),
            ComponentKind::Rigidbody => ComponentVTable::of::<Rigidbody>(),
            ComponentKind::BoxCollider => ComponentVTable::of::<BoxCollider>(),
            ComponentKind::SphereCollider => ComponentVTable::of::<SphereCollider>(),
        }
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Type-erased operations on one component kind
#[derive(Clone, Copy)]
pub struct ComponentVTable {
    pub has: fn(&World, Entity) -> bool,
    pub add_default: fn(&mut World, Entity) -> bool,
    pub remove: fn(&mut World, Entity) -> bool,
    /// Copy from one entity onto another in the same world
    pub duplicate: fn(&mut World, Entity, Entity) -> bool,
    /// Copy from an entity in one world onto an entity in another
    pub copy_to: fn(&World, Entity, &mut World, Entity) -> bool,
    pub serialize: fn(&World, Entity) -> Option<serde_json::Value>,
    pub deserialize: fn(&mut World, Entity, &serde_json::Value) -> Result<(), serde_json::Error>,
}

impl ComponentVTable {
    pub fn of<T: SceneComponent>() -> Self {
        Self {
            has: has::<T>,
            add_default: add_default::<T>,
            remove: remove::<T>,
            duplicate: duplicate::<T>,
            copy_to: copy_to::<T>,
            serialize: serialize::<T>,
            deserialize: deserialize::<T>,
        }
    }
}

fn has<T: SceneComponent>(world: &World, entity: Entity) -> bool {
    world.has::<T>(entity)
}

fn add_default<T: SceneComponent>(world: &mut World, entity: Entity) -> bool {
    world.add_component(entity, T::default()).is_ok()
}

fn remove<T: SceneComponent>(world: &mut World, entity: Entity) -> bool {
    world.remove_one::<T>(entity).is_ok()
}

fn duplicate<T: SceneComponent>(world: &mut World, source: Entity, target: Entity) -> bool {
    let copy = match world.get::<T>(source) {
        Ok(component) => component.duplicated(),
        Err(_) => return false,
    };
    world.insert_one(target, copy).is_ok()
}

fn copy_to<T: SceneComponent>(
    source_world: &World,
    source: Entity,
    target_world: &mut World,
    target: Entity,
) -> bool {
    let copy = match source_world.get::<T>(source) {
        Ok(component) => component.duplicated(),
        Err(_) => return false,
    };
    target_world.insert_one(target, copy).is_ok()
}

fn serialize<T: SceneComponent>(world: &World, entity: Entity) -> Option<serde_json::Value> {
    let component = world.get::<T>(entity).ok()?;
    serde_json::to_value(&*component).ok()
}

fn deserialize<T: SceneComponent>(
    world: &mut World,
    entity: Entity,
    value: &serde_json::Value,
) -> Result<(), serde_json::Error> {
    let component: T = serde_json::from_value(value.clone())?;
    world
        .insert_one(entity, component)
        .map_err(<serde_json::Error as serde::de::Error>::custom)?;
    Ok(())
}

impl SceneComponent for Transform {
    const KIND: ComponentKind = ComponentKind::Transform;
}

impl SceneComponent for MeshRenderer {
    const KIND: ComponentKind = ComponentKind::MeshRenderer;
}

impl SceneComponent for SkinnedMesh {
    const KIND: ComponentKind = ComponentKind::SkinnedMesh;
}

impl SceneComponent for Script {
    const KIND: ComponentKind = ComponentKind::Script;
}

impl SceneComponent for Rigidbody2D {
    const KIND: ComponentKind = ComponentKind::Rigidbody2D;

    fn duplicated(&self) -> Self {
        Self {
            runtime_body: None,
            ..self.clone()
        }
    }
}

impl SceneComponent for BoxCollider2D {
    const KIND: ComponentKind = ComponentKind::BoxCollider2D;

    fn duplicated(&self) -> Self {
        Self {
            runtime_shape: None,
            current_size: glam::Vec2::ZERO,
            ..self.clone()
        }
    }
}

impl SceneComponent for Rigidbody {
    const KIND: ComponentKind = ComponentKind::Rigidbody;

    fn duplicated(&self) -> Self {
        Self {
            runtime_body: None,
            ..self.clone()
        }
    }
}

impl SceneComponent for BoxCollider {
    const KIND: ComponentKind = ComponentKind::BoxCollider;

    fn duplicated(&self) -> Self {
        Self {
            runtime_shape: None,
            ..self.clone()
        }
    }
}

impl SceneComponent for SphereCollider {
    const KIND: ComponentKind = ComponentKind::SphereCollider;

    fn duplicated(&self) -> Self {
        Self {
            runtime_shape: None,
            ..self.clone()
        }
    }
}
