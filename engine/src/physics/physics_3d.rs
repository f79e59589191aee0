//! 3D physics bridge backed by rapier3d

use super::components::{BoxCollider, MotionQuality, Rigidbody, SphereCollider};
use super::handle::{EpochCounter, EpochHandle};
use crate::config::PhysicsConfig;
use crate::core::entity::{Entity, IdComponent, Transform, World};
use glam::{Quat, Vec3};
use rapier3d::prelude::*;
use tracing::{debug, info, trace, warn};

/// Smallest half extent or radius handed to the physics engine
pub const MIN_EXTENT: f32 = 1.0e-3;

/// Collision layer of bodies that never move
pub const LAYER_NON_MOVING: Group = Group::GROUP_1;
/// Collision layer of dynamic bodies
pub const LAYER_MOVING: Group = Group::GROUP_2;

/// Layer filter: non-moving bodies only collide with moving ones, moving
/// bodies collide with everything
pub fn collision_groups(is_static: bool) -> InteractionGroups {
    if is_static {
        InteractionGroups::new(LAYER_NON_MOVING, LAYER_MOVING)
    } else {
        InteractionGroups::new(LAYER_MOVING, Group::ALL)
    }
}

/// Axes a body may not translate or rotate along
pub fn locked_axes(rb: &Rigidbody) -> LockedAxes {
    let mut axes = LockedAxes::empty();
    if !rb.move_x {
        axes |= LockedAxes::TRANSLATION_LOCKED_X;
    }
    if !rb.move_y {
        axes |= LockedAxes::TRANSLATION_LOCKED_Y;
    }
    if !rb.move_z {
        axes |= LockedAxes::TRANSLATION_LOCKED_Z;
    }
    if !rb.rotate_x {
        axes |= LockedAxes::ROTATION_LOCKED_X;
    }
    if !rb.rotate_y {
        axes |= LockedAxes::ROTATION_LOCKED_Y;
    }
    if !rb.rotate_z {
        axes |= LockedAxes::ROTATION_LOCKED_Z;
    }
    axes
}

/// Rapier structures for one live 3D simulation
pub struct PhysicsWorld3D {
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

impl PhysicsWorld3D {
    fn new(epoch: u64, gravity: Vec3) -> Self {
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
            gravity: vector![gravity.x, gravity.y, gravity.z],
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
}

/// Keeps `Rigidbody` entities and their box/sphere colliders in lockstep with
/// a rapier3d world
pub struct Physics3D {
    config: PhysicsConfig,
    epochs: EpochCounter,
    world: Option<PhysicsWorld3D>,
}

impl Physics3D {
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

    pub fn live_epoch(&self) -> Option<u64> {
        self.world.as_ref().map(|world| world.epoch)
    }

    pub fn physics_world(&self) -> Option<&PhysicsWorld3D> {
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

    pub fn simulation_start(&mut self, world: &mut World) {
        if self.is_running() {
            warn!("3D simulation already running, restarting");
            self.simulation_stop(world);
        }

        let epoch = self.epochs.advance();
        self.world = Some(PhysicsWorld3D::new(epoch, self.config.gravity_3d));

        for entity in world.entities_with::<Rigidbody>() {
            self.create_body(world, entity);
        }

        info!(
            epoch = epoch,
            bodies = self.body_count(),
            colliders = self.collider_count(),
            "3D simulation started"
        );
    }

    pub fn simulation_stop(&mut self, world: &mut World) {
        if !self.is_running() {
            return;
        }

        for entity in world.entities_with::<Rigidbody>() {
            self.destroy_body(world, entity);
        }
        self.world = None;
        info!(epoch = self.epochs.current(), "3D simulation stopped");
    }

    /// Step once and copy body poses into the local transform.
    ///
    /// World values are left to the hierarchy pass that follows.
    pub fn simulate(&mut self, world: &mut World, delta_time: f32) {
        let Some(physics) = self.world.as_mut() else {
            return;
        };
        if delta_time <= 0.0 {
            return;
        }

        physics.step(delta_time);
        let epoch = Some(physics.epoch);

        let parents = super::parent_inverses::<Rigidbody>(world);
        for (_, (id, transform, rb)) in world.query_mut::<(&IdComponent, &mut Transform, &Rigidbody)>() {
            let Some(handle) = rb.runtime_body.and_then(|h| h.resolve(epoch)) else {
                continue;
            };
            let Some(body) = physics.rigid_body_set.get(handle) else {
                continue;
            };

            let position = body.translation();
            let rotation = body.rotation();
            let (local_translation, local_rotation) = super::pose_to_local(
                parents.get(&id.parent),
                Vec3::new(position.x, position.y, position.z),
                Quat::from_xyzw(rotation.i, rotation.j, rotation.k, rotation.w),
            );
            transform.local_translation = local_translation;
            transform.local_rotation = local_rotation;
            transform.dirty = true;
        }

        trace!(dt = delta_time, "3D physics stepped");
    }

    pub fn instantiate(&mut self, world: &mut World, entity: Entity) -> bool {
        let live = self.live_epoch();
        if live.is_none() {
            return false;
        }

        let has_live_body = match world.get::<Rigidbody>(entity) {
            Ok(rb) => rb.runtime_body.and_then(|h| h.resolve(live)).is_some(),
            Err(_) => return false,
        };
        if has_live_body {
            debug!(entity = ?entity, "Entity already has a live 3D body");
            return false;
        }

        self.create_body(world, entity)
    }

    /// Release the body of one entity, guarded by the world epoch
    pub fn destroy_body(&mut self, world: &mut World, entity: Entity) -> bool {
        let body = world
            .get_mut::<Rigidbody>(entity)
            .ok()
            .and_then(|mut rb| rb.runtime_body.take());
        if let Ok(mut collider) = world.get_mut::<BoxCollider>(entity) {
            collider.runtime_shape = None;
        }
        if let Ok(mut collider) = world.get_mut::<SphereCollider>(entity) {
            collider.runtime_shape = None;
        }

        let Some(body) = body else {
            return false;
        };
        let Some(raw) = body.resolve(self.live_epoch()) else {
            debug!(entity = ?entity, epoch = body.epoch, "Ignoring stale 3D body handle");
            return false;
        };
        let Some(physics) = self.world.as_mut() else {
            return false;
        };

        let removed = physics
            .rigid_body_set
            .remove(
                raw,
                &mut physics.island_manager,
                &mut physics.collider_set,
                &mut physics.impulse_joint_set,
                &mut physics.multibody_joint_set,
                true,
            )
            .is_some();
        debug!(entity = ?entity, removed = removed, "Destroyed 3D body");
        removed
    }

    pub fn add_force(&mut self, world: &World, entity: Entity, force: Vec3) -> bool {
        self.with_body(world, entity, |body| {
            body.add_force(vector![force.x, force.y, force.z], true)
        })
        .is_some()
    }

    pub fn add_impulse(&mut self, world: &World, entity: Entity, impulse: Vec3) -> bool {
        self.with_body(world, entity, |body| {
            body.apply_impulse(vector![impulse.x, impulse.y, impulse.z], true)
        })
        .is_some()
    }

    pub fn set_linear_velocity(&mut self, world: &World, entity: Entity, velocity: Vec3) -> bool {
        self.with_body(world, entity, |body| {
            body.set_linvel(vector![velocity.x, velocity.y, velocity.z], true)
        })
        .is_some()
    }

    pub fn linear_velocity(&mut self, world: &World, entity: Entity) -> Option<Vec3> {
        self.with_body(world, entity, |body| {
            let velocity = body.linvel();
            Vec3::new(velocity.x, velocity.y, velocity.z)
        })
    }

    fn with_body<R>(
        &mut self,
        world: &World,
        entity: Entity,
        f: impl FnOnce(&mut RigidBody) -> R,
    ) -> Option<R> {
        let live = self.live_epoch();
        let raw = world
            .get::<Rigidbody>(entity)
            .ok()
            .and_then(|rb| rb.runtime_body)
            .and_then(|h| h.resolve(live))?;
        let body = self.world.as_mut()?.rigid_body_set.get_mut(raw)?;
        Some(f(body))
    }

    fn create_body(&mut self, world: &mut World, entity: Entity) -> bool {
        let Some(physics) = self.world.as_mut() else {
            return false;
        };

        let (settings, transform, user_data) = {
            let Ok(rb) = world.get::<Rigidbody>(entity) else {
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

        let body_type = if settings.is_static {
            RigidBodyType::Fixed
        } else {
            RigidBodyType::Dynamic
        };
        let (axis, angle) = transform.rotation.to_axis_angle();
        let scaled_axis = axis * angle;
        let body = RigidBodyBuilder::new(body_type)
            .translation(vector![
                transform.translation.x,
                transform.translation.y,
                transform.translation.z
            ])
            .rotation(vector![scaled_axis.x, scaled_axis.y, scaled_axis.z])
            .locked_axes(locked_axes(&settings))
            .ccd_enabled(settings.motion_quality == MotionQuality::LinearCast)
            .gravity_scale(settings.gravity_factor)
            .user_data(user_data)
            .build();

        let body_handle = physics.rigid_body_set.insert(body);
        let epoch = physics.epoch;
        let groups = collision_groups(settings.is_static);

        if let Ok(mut rb) = world.get_mut::<Rigidbody>(entity) {
            rb.runtime_body = Some(EpochHandle::new(epoch, body_handle));
        }

        if let Ok(mut collider) = world.get_mut::<BoxCollider>(entity) {
            let half = (collider.scale * transform.scale)
                .abs()
                .max(Vec3::splat(MIN_EXTENT));
            let shape = ColliderBuilder::cuboid(half.x, half.y, half.z)
                .friction(collider.friction)
                .restitution(collider.restitution)
                .density(collider.density)
                .collision_groups(groups)
                .user_data(user_data)
                .build();
            let handle = physics.collider_set.insert_with_parent(
                shape,
                body_handle,
                &mut physics.rigid_body_set,
            );
            collider.runtime_shape = Some(EpochHandle::new(epoch, handle));
        }

        if let Ok(mut collider) = world.get_mut::<SphereCollider>(entity) {
            let radius = (collider.radius * transform.scale.abs().max_element()).max(MIN_EXTENT);
            let shape = ColliderBuilder::ball(radius)
                .friction(collider.friction)
                .restitution(collider.restitution)
                .density(collider.density)
                .collision_groups(groups)
                .user_data(user_data)
                .build();
            let handle = physics.collider_set.insert_with_parent(
                shape,
                body_handle,
                &mut physics.rigid_body_set,
            );
            collider.runtime_shape = Some(EpochHandle::new(epoch, handle));
        }

        debug!(entity = ?entity, epoch = epoch, is_static = settings.is_static, "Created 3D body");
        true
    }
}

impl Default for Physics3D {
    fn default() -> Self {
        Self::new(PhysicsConfig::default())
    }
}
