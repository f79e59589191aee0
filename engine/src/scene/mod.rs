//! Scene: the entity store, its lookup maps and both physics bridges
//!
//! A [`Scene`] is the explicit context every entity operation goes through.
//! It owns all component memory and the live physics worlds; entity handles
//! are only meaningful inside the scene that produced them, so anything that
//! crosses a subsystem boundary refers to entities by [`Uuid`].

mod entities;
pub mod naming;

use crate::config::PhysicsConfig;
use crate::core::entity::{update_transforms, Entity, IdComponent, World};
use crate::core::uuid::Uuid;
use crate::io::component_registry::ComponentKind;
use crate::physics::{Physics2D, Physics3D};
use naming::NameRegistry;
use std::collections::HashMap;
use tracing::{debug, info};

pub struct Scene {
    // Declared before `world` so the physics worlds are released first
    physics_2d: Physics2D,
    physics_3d: Physics3D,
    name: String,
    world: World,
    entities: HashMap<Uuid, Entity>,
    names: NameRegistry,
    registered: HashMap<Entity, Vec<ComponentKind>>,
    config: PhysicsConfig,
    playing: bool,
    dirty: bool,
}

impl Scene {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_config(name, PhysicsConfig::default())
    }

    pub fn with_config(name: impl Into<String>, config: PhysicsConfig) -> Self {
        let name = name.into();
        debug!(scene = %name, "Creating scene");
        Self {
            physics_2d: Physics2D::new(config),
            physics_3d: Physics3D::new(config),
            name,
            world: World::new(),
            entities: HashMap::new(),
            names: NameRegistry::new(),
            registered: HashMap::new(),
            config,
            playing: false,
            dirty: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
        self.dirty = true;
    }

    pub fn physics_config(&self) -> PhysicsConfig {
        self.config
    }

    /// Read access to the store; components can still be mutated through
    /// `World::get_mut`
    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Snapshot of every live (uuid, entity) pair
    pub fn entities(&self) -> Vec<(Uuid, Entity)> {
        self.entities
            .iter()
            .map(|(&uuid, &entity)| (uuid, entity))
            .collect()
    }

    /// Root entities ordered by UUID
    pub fn root_entities(&self) -> Vec<Entity> {
        let mut roots: Vec<(Uuid, Entity)> = self
            .world
            .query::<&IdComponent>()
            .iter()
            .filter(|(_, id)| id.is_root())
            .map(|(entity, id)| (id.uuid, entity))
            .collect();
        roots.sort_unstable_by_key(|(uuid, _)| *uuid);
        roots.into_iter().map(|(_, entity)| entity).collect()
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Whether the scene changed since the last save
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn clear_dirty(&mut self) {
        self.dirty = false;
    }

    pub fn physics_2d(&self) -> &Physics2D {
        &self.physics_2d
    }

    pub fn physics_3d(&self) -> &Physics3D {
        &self.physics_3d
    }

    /// Enter play mode: place every entity, then create physics bodies from
    /// the resulting world transforms
    pub fn on_runtime_start(&mut self) {
        self.update_transforms();
        self.physics_2d.simulation_start(&mut self.world);
        self.physics_3d.simulation_start(&mut self.world);
        self.playing = true;
        info!(scene = %self.name, entities = self.entities.len(), "Runtime started");
    }

    pub fn on_runtime_stop(&mut self) {
        self.physics_2d.simulation_stop(&mut self.world);
        self.physics_3d.simulation_stop(&mut self.world);
        self.playing = false;
        info!(scene = %self.name, "Runtime stopped");
    }

    /// One play-mode frame: both physics steps, then the hierarchy pass
    pub fn on_update_runtime(&mut self, delta_time: f32) {
        self.physics_2d.simulate(&mut self.world, delta_time);
        self.physics_3d.simulate(&mut self.world, delta_time);
        self.update_transforms();
    }

    /// One edit-mode frame
    pub fn on_update_edit(&mut self, _delta_time: f32) {
        self.update_transforms();
    }

    /// Recompute world transforms from the roots down
    pub fn update_transforms(&mut self) -> usize {
        update_transforms(&mut self.world, &self.entities)
    }

    /// Deep copy with identical UUIDs and names; runtime physics state is not
    /// carried over
    pub fn copy(&self) -> Scene {
        let mut copy = Scene::with_config(self.name.clone(), self.config);

        for (&uuid, &source) in &self.entities {
            let Ok(id) = self.world.get::<IdComponent>(source) else {
                continue;
            };
            let target = copy.spawn_identity(IdComponent {
                uuid,
                ..(*id).clone()
            });

            for &kind in self.components(source) {
                if (kind.vtable().copy_to)(&self.world, source, &mut copy.world, target) {
                    copy.register_kind(target, kind);
                }
            }
        }

        copy.update_transforms();
        copy
    }
}

impl Drop for Scene {
    fn drop(&mut self) {
        self.physics_2d.simulation_stop(&mut self.world);
        self.physics_3d.simulation_stop(&mut self.world);
    }
}
