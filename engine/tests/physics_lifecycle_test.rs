//! Physics bridge lifecycles driven directly against a store

use glam::{Vec2, Vec3};
use ignite_engine::config::PhysicsConfig;
use ignite_engine::core::entity::{Entity, EntityType, IdComponent, Transform, World};
use ignite_engine::core::uuid::Uuid;
use ignite_engine::physics::{
    BoxCollider, BoxCollider2D, Physics2D, Physics3D, Rigidbody, Rigidbody2D, SphereCollider,
};
use ignite_engine::prelude::Scene;

fn spawn_2d(world: &mut World, y: f32) -> Entity {
    world.spawn((
        IdComponent::new("Body", Uuid::new(), EntityType::Node),
        Transform::from_translation(Vec3::new(0.0, y, 0.0)),
        Rigidbody2D::dynamic(),
        BoxCollider2D::default(),
    ))
}

#[test]
fn test_double_destroy_is_guarded() {
    let mut world = World::new();
    let entity = spawn_2d(&mut world, 0.0);
    let mut physics = Physics2D::new(PhysicsConfig::default());

    physics.simulation_start(&mut world);
    assert_eq!(physics.body_count(), 1);

    assert!(physics.destroy_body(&mut world, entity));
    assert!(!physics.destroy_body(&mut world, entity));
    physics.simulation_stop(&mut world);
    physics.simulation_stop(&mut world);
    assert!(!physics.is_running());
}

#[test]
fn test_handle_from_previous_run_is_ignored() {
    let mut world = World::new();
    let entity = spawn_2d(&mut world, 0.0);
    let other = spawn_2d(&mut world, 5.0);
    let mut physics = Physics2D::new(PhysicsConfig::default());

    physics.simulation_start(&mut world);
    let stale = world.get::<Rigidbody2D>(entity).unwrap().runtime_body;
    assert!(stale.is_some());
    physics.simulation_stop(&mut world);

    physics.simulation_start(&mut world);
    assert_eq!(physics.body_count(), 2);

    // Put the previous run's handle back; destroying it must not touch the new world
    world.get_mut::<Rigidbody2D>(entity).unwrap().runtime_body = stale;
    assert!(!physics.destroy_body(&mut world, entity));
    assert_eq!(physics.body_count(), 2);
    assert!(world.get::<Rigidbody2D>(other).unwrap().runtime_body.is_some());
}

#[test]
fn test_3d_body_carries_every_collider() {
    let mut world = World::new();
    let entity = world.spawn((
        IdComponent::new("Ball", Uuid::new(), EntityType::Mesh),
        Transform::from_translation(Vec3::new(0.0, 4.0, 0.0)),
        Rigidbody::default(),
        BoxCollider::default(),
        SphereCollider::default(),
    ));
    let mut physics = Physics3D::new(PhysicsConfig::default());

    physics.simulation_start(&mut world);
    assert_eq!(physics.body_count(), 1);
    assert_eq!(physics.collider_count(), 2);

    for _ in 0..30 {
        physics.simulate(&mut world, 1.0 / 60.0);
    }
    let y = world.get::<Transform>(entity).unwrap().local_translation.y;
    assert!(y < 4.0);

    physics.simulation_stop(&mut world);
    assert!(world.get::<Rigidbody>(entity).unwrap().runtime_body.is_none());
}

#[test]
fn test_scene_stop_then_drop() {
    let mut scene = Scene::new("Lifecycle");
    let entity = scene.create_entity("Crate", EntityType::Node);
    scene.add_component(entity, Rigidbody2D::dynamic()).unwrap();
    scene.add_component(entity, BoxCollider2D::default()).unwrap();

    scene.on_runtime_start();
    scene.on_runtime_start();
    assert_eq!(scene.physics_2d().body_count(), 1);

    assert!(scene.apply_force_2d(entity, Vec2::new(0.0, 100.0), Vec2::ZERO, true));
    scene.on_update_runtime(1.0 / 60.0);

    scene.destroy_entity(entity);
    assert_eq!(scene.physics_2d().body_count(), 0);
    scene.on_runtime_stop();
    drop(scene);
}
