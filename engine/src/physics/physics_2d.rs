//! 2D physics bridge backed by rapier2d

use super::components::{BodyType2D, BoxCollider2D, Rigidbody2D};
use super::handle::{EpochCounter, EpochHandle};
use crate::config::{ColliderResizePolicy, PhysicsConfig};
use crate::core::entity::{Entity, IdComponent, Transform, World};
use glam::{EulerRot, Quat, Vec2, Vec3};
use rapier2d::prelude::*;
use tracing::{debug, info, trace, warn};

/// Smallest half extent handed to the physics engine
pub const MIN_HALF_EXTENT: f32 = 1.0e-3;

/// Scaled, strictly positive half extents for a box collider
pub fn scaled_half_extents(size: Vec2, scale: Vec2) -> Vec2 {
    (size * scale).abs().max(Vec2::splat(MIN_HALF_EXTENT))
}

/// Rapier structures for one live 2D simulation
pub struct PhysicsWorld2D {
    epoch: u64,
    pub rigid_body_set: RigidBodySet,
    pub collider_set: ColliderSet,
    pub integration_parameters: IntegrationParameters,
    physics_pipeline: PhysicsPipeline,
    island_manager: IslandManager,
    broad_phase: BroadPhase,
    narrow_phase: NarrowPhase,
    impulse_joint_set: ImpulseJointSet,
    multibody_joint_set: MultibodyJointSet,
    ccd_solver: CCDSolver,
    pub gravity: Vector<Real>,
}

impl PhysicsWorld2D {
    fn new(epoch: u64, gravity: Vec2) -> Self {
        Self {
            epoch,
            rigid_body_set: RigidBodySet::new(),
            collider_set: ColliderSet::new(),
            integration_parameters: IntegrationParameters::default(),
            physics_pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: BroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            impulse_joint_set: ImpulseJointSet::new(),
            multibody_joint_set: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            gravity: vector![gravity.x, gravity.y],
        }
    }

    fn step(&mut self, dt: f32) {
        self.integration_parameters.dt = dt;
        self.physics_pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.rigid_body_set,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            &mut self.ccd_solver,
            None,
            &(),
            &(),
        );
    }

    fn remove_body(&mut self, handle: RigidBodyHandle) -> bool {
        self.rigid_body_set
            .remove(
                handle,
                &mut self.island_manager,
                &mut self.collider_set,
                &mut self.impulse_joint_set,
                &mut self.multibody_joint_set,
                true,
            )
            .is_some()
    }
}

/// Keeps `Rigidbody2D`/`BoxCollider2D` entities in lockstep with a rapier2d world
pub struct Physics2D {
    config: PhysicsConfig,
    epochs: EpochCounter,
    world: Option<PhysicsWorld2D>,
}

impl Physics2D {
    pub fn new(config: PhysicsConfig) -> Self {
        Self {
            config,
            epochs: EpochCounter::default(),
            world: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.world.is_some()
    }

    /// Epoch of the live world, `None` when not simulating
    pub fn live_epoch(&self) -> Option<u64> {
        self.world.as_ref().map(|world| world.epoch)
    }

    pub fn physics_world(&self) -> Option<&PhysicsWorld2D> {
        self.world.as_ref()
    }

    pub fn body_count(&self) -> usize {
        self.world
            .as_ref()
            .map_or(0, |world| world.rigid_body_set.len())
    }

    pub fn collider_count(&self) -> usize {
        self.world
            .as_ref()
            .map_or(0, |world| world.collider_set.len())
    }

    /// Create the physics world and a body for every `Rigidbody2D` entity
    pub fn simulation_start(&mut self, world: &mut World) {
        if self.is_running() {
            warn!("2D simulation already running, restarting");
            self.simulation_stop(world);
        }

        let epoch = self.epochs.advance();
        self.world = Some(PhysicsWorld2D::new(epoch, self.config.gravity_2d));

        let entities = world.entities_with::<Rigidbody2D>();
        for &entity in &entities {
            self.create_body(world, entity);
        }

        info!(
            epoch = epoch,
            bodies = self.body_count(),
            colliders = self.collider_count(),
            "2D simulation started"
        );
    }

    /// Destroy every body and tear down the world
    pub fn simulation_stop(&mut self, world: &mut World) {
        if !self.is_running() {
            return;
        }

        for entity in world.entities_with::<Rigidbody2D>() {
            self.destroy_body(world, entity);
        }
        self.world = None;
        info!(epoch = self.epochs.current(), "2D simulation stopped");
    }

    /// Advance the world by `delta_time` and write body poses back into transforms
    pub fn simulate(&mut self, world: &mut World, delta_time: f32) {
        let Some(physics) = self.world.as_mut() else {
            return;
        };
        if delta_time <= 0.0 {
            return;
        }
        let epoch = Some(physics.epoch);

        for (_, (transform, collider)) in world.query_mut::<(&Transform, &mut BoxCollider2D)>() {
            let Some(handle) = collider.runtime_shape.and_then(|h| h.resolve(epoch)) else {
                continue;
            };
            let Some(shape) = physics.collider_set.get_mut(handle) else {
                continue;
            };

            shape.set_friction(collider.friction);
            shape.set_density(collider.density);
            shape.set_restitution(collider.restitution);

            let size = scaled_half_extents(collider.size, transform.scale.truncate());
            let resize = match self.config.collider_resize {
                ColliderResizePolicy::EveryStep => true,
                ColliderResizePolicy::OnScaleChange => size != collider.current_size,
            };
            if resize {
                shape.set_shape(SharedShape::cuboid(size.x, size.y));
                collider.current_size = size;
            }
        }

        let sub_steps = self.config.sub_steps_2d.max(1);
        let dt = delta_time / sub_steps as f32;
        for _ in 0..sub_steps {
            physics.step(dt);
        }

        // Bodies live in world space; parented entities get their pose
        // re-expressed relative to the parent
        let parents = super::parent_inverses::<Rigidbody2D>(world);
        for (_, (id, transform, rb)) in
            world.query_mut::<(&IdComponent, &mut Transform, &Rigidbody2D)>()
        {
            let Some(handle) = rb.runtime_body.and_then(|h| h.resolve(epoch)) else {
                continue;
            };
            let Some(body) = physics.rigid_body_set.get_mut(handle) else {
                continue;
            };
            body.reset_forces(false);

            let position = body.translation();
            let rotation = Quat::from_rotation_z(body.rotation().angle());

            match parents.get(&id.parent) {
                Some(inverse) => {
                    let world_position = Vec3::new(position.x, position.y, transform.translation.z);
                    let (local_translation, local_rotation) =
                        super::pose_to_local(Some(inverse), world_position, rotation);
                    transform.local_translation = local_translation;
                    transform.local_rotation = local_rotation;
                }
                None => {
                    transform.local_translation.x = position.x;
                    transform.local_translation.y = position.y;
                    transform.local_rotation = rotation;
                }
            }
            transform.translation.x = position.x;
            transform.translation.y = position.y;
            transform.rotation = rotation;
            transform.dirty = true;
        }

        trace!(sub_steps = sub_steps, dt = dt, "2D physics stepped");
    }

    /// Create a body for an entity spawned while the simulation is running
    pub fn instantiate(&mut self, world: &mut World, entity: Entity) -> bool {
        let live = self.live_epoch();
        if live.is_none() {
            return false;
        }

        let has_live_body = match world.get::<Rigidbody2D>(entity) {
            Ok(rb) => rb.runtime_body.and_then(|h| h.resolve(live)).is_some(),
            Err(_) => return false,
        };
        if has_live_body {
            debug!(entity = ?entity, "Entity already has a live 2D body");
            return false;
        }

        self.create_body(world, entity)
    }

    /// Release the body of one entity.
    ///
    /// The stored handle is cleared unconditionally, but the physics world is
    /// only touched when the handle belongs to the live world.
    pub fn destroy_body(&mut self, world: &mut World, entity: Entity) -> bool {
        let body = world
            .get_mut::<Rigidbody2D>(entity)
            .ok()
            .and_then(|mut rb| rb.runtime_body.take());
        if let Ok(mut collider) = world.get_mut::<BoxCollider2D>(entity) {
            collider.runtime_shape = None;
            collider.current_size = Vec2::ZERO;
        }

        let Some(body) = body else {
            return false;
        };
        let Some(raw) = body.resolve(self.live_epoch()) else {
            debug!(entity = ?entity, epoch = body.epoch, "Ignoring stale 2D body handle");
            return false;
        };
        let Some(physics) = self.world.as_mut() else {
            return false;
        };

        let removed = physics.remove_body(raw);
        debug!(entity = ?entity, removed = removed, "Destroyed 2D body");
        removed
    }

    /// Apply a force at a world point; it acts for the next simulated frame only
    pub fn apply_force(
        &mut self,
        world: &World,
        entity: Entity,
        force: Vec2,
        point: Vec2,
        wake: bool,
    ) -> bool {
        let live = self.live_epoch();
        let Some(raw) = world
            .get::<Rigidbody2D>(entity)
            .ok()
            .and_then(|rb| rb.runtime_body)
            .and_then(|h| h.resolve(live))
        else {
            return false;
        };

        match self
            .world
            .as_mut()
            .and_then(|physics| physics.rigid_body_set.get_mut(raw))
        {
            Some(body) => {
                body.add_force_at_point(vector![force.x, force.y], point![point.x, point.y], wake);
                true
            }
            None => false,
        }
    }

    fn create_body(&mut self, world: &mut World, entity: Entity) -> bool {
        let Some(physics) = self.world.as_mut() else {
            return false;
        };

        let (settings, transform, user_data) = {
            let Ok(rb) = world.get::<Rigidbody2D>(entity) else {
                return false;
            };
            let transform = world
                .get::<Transform>(entity)
                .map(|t| *t)
                .unwrap_or_default();
            let user_data = world
                .get::<IdComponent>(entity)
                .map(|id| u128::from(id.uuid.raw()))
                .unwrap_or_default();
            ((*rb).clone(), transform, user_data)
        };

        let (_, _, angle) = transform.rotation.to_euler(EulerRot::XYZ);
        let mut builder = RigidBodyBuilder::new(body_type(settings.body_type))
            .translation(vector![transform.translation.x, transform.translation.y])
            .rotation(angle)
            .linvel(vector![
                settings.linear_velocity.x,
                settings.linear_velocity.y
            ])
            .angvel(settings.angular_velocity)
            .gravity_scale(settings.gravity_scale)
            .linear_damping(settings.linear_damping)
            .angular_damping(settings.angular_damping)
            .can_sleep(settings.enable_sleep)
            .sleeping(!settings.is_awake)
            .enabled(settings.is_enabled)
            .user_data(user_data);
        if settings.fixed_rotation {
            builder = builder.lock_rotations();
        }

        let body_handle = physics.rigid_body_set.insert(builder.build());
        let epoch = physics.epoch;

        if let Ok(mut rb) = world.get_mut::<Rigidbody2D>(entity) {
            rb.runtime_body = Some(EpochHandle::new(epoch, body_handle));
        }

        if let Ok(mut collider) = world.get_mut::<BoxCollider2D>(entity) {
            let size = scaled_half_extents(collider.size, transform.scale.truncate());
            let shape = ColliderBuilder::cuboid(size.x, size.y)
                .translation(vector![collider.offset.x, collider.offset.y])
                .density(collider.density)
                .friction(collider.friction)
                .restitution(collider.restitution)
                .sensor(collider.is_sensor)
                .user_data(user_data)
                .build();
            let shape_handle = physics.collider_set.insert_with_parent(
                shape,
                body_handle,
                &mut physics.rigid_body_set,
            );
            collider.runtime_shape = Some(EpochHandle::new(epoch, shape_handle));
            collider.current_size = size;
        }

        debug!(entity = ?entity, epoch = epoch, "Created 2D body");
        true
    }
}

impl Default for Physics2D {
    fn default() -> Self {
        Self::new(PhysicsConfig::default())
    }
}

fn body_type(body_type: BodyType2D) -> RigidBodyType {
    match body_type {
        BodyType2D::Static => RigidBodyType::Fixed,
        BodyType2D::Dynamic => RigidBodyType::Dynamic,
        BodyType2D::Kinematic => RigidBodyType::KinematicVelocityBased,
    }
}
