//! Scene documents survive a save and load

use glam::{Quat, Vec2, Vec3};
use ignite_engine::core::entity::{EntityType, IdComponent, Script, Transform};
use ignite_engine::physics::{BodyType2D, BoxCollider2D, Rigidbody2D};
use ignite_engine::prelude::{PhysicsConfig, Scene};
use tempfile::TempDir;

#[test]
fn test_two_level_hierarchy_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("Scenes").join("RoundTrip.ixscene");

    let mut scene = Scene::new("RoundTrip");
    let root = scene.create_entity("Platform", EntityType::Node);
    let child = scene.create_entity("Crate", EntityType::Mesh);
    let other_root = scene.create_entity("Camera", EntityType::Camera);
    assert!(scene.add_child(root, child));

    *scene.get_component_mut::<Transform>(root).unwrap() = Transform::from_local(
        Vec3::new(1.5, -2.0, 0.25),
        Quat::from_rotation_z(0.3),
        Vec3::new(2.0, 1.0, 1.0),
    );
    scene
        .get_component_mut::<Transform>(child)
        .unwrap()
        .set_local_translation(Vec3::new(0.0, 1.0, 0.0));
    scene
        .add_component(
            child,
            Rigidbody2D {
                body_type: BodyType2D::Dynamic,
                gravity_scale: 0.5,
                linear_velocity: Vec2::new(3.0, -1.0),
                fixed_rotation: true,
                ..Default::default()
            },
        )
        .unwrap();
    scene
        .add_component(
            child,
            BoxCollider2D {
                size: Vec2::new(0.25, 0.75),
                is_sensor: true,
                ..Default::default()
            },
        )
        .unwrap();
    scene
        .add_component(
            other_root,
            Script {
                class_name: "CameraController".to_string(),
            },
        )
        .unwrap();
    scene.update_transforms();

    let root_uuid = scene.uuid_of(root).unwrap();
    let child_uuid = scene.uuid_of(child).unwrap();
    scene.save(&path).unwrap();
    assert!(!scene.is_dirty());

    let loaded = Scene::load(&path, PhysicsConfig::default()).unwrap();
    assert_eq!(loaded.name(), "RoundTrip");
    assert_eq!(loaded.entity_count(), scene.entity_count());

    let loaded_root = loaded.get_entity(root_uuid).unwrap();
    let loaded_child = loaded.get_entity(child_uuid).unwrap();
    let child_id = loaded.world().get::<IdComponent>(loaded_child).ok().unwrap();
    assert_eq!(child_id.parent, root_uuid);
    assert_eq!(child_id.entity_type, EntityType::Mesh);
    assert_eq!(
        loaded.world().get::<IdComponent>(loaded_root).ok().unwrap().children,
        vec![child_uuid]
    );

    let original = scene.get_component::<Transform>(child).unwrap();
    let restored = loaded.get_component::<Transform>(loaded_child).unwrap();
    assert!(restored
        .local_translation
        .abs_diff_eq(original.local_translation, 1e-5));
    assert!(restored.translation.abs_diff_eq(original.translation, 1e-4));
    assert!(restored.rotation.abs_diff_eq(original.rotation, 1e-4));
    assert!(restored.scale.abs_diff_eq(original.scale, 1e-4));

    let body = loaded.get_component::<Rigidbody2D>(loaded_child).unwrap();
    assert_eq!(body.body_type, BodyType2D::Dynamic);
    assert!((body.gravity_scale - 0.5).abs() < 1e-6);
    assert_eq!(body.linear_velocity, Vec2::new(3.0, -1.0));
    assert!(body.fixed_rotation);
    assert!(body.runtime_body.is_none());

    let collider = loaded.get_component::<BoxCollider2D>(loaded_child).unwrap();
    assert_eq!(collider.size, Vec2::new(0.25, 0.75));
    assert!(collider.is_sensor);

    let camera = loaded.get_entity(scene.uuid_of(other_root).unwrap()).unwrap();
    assert_eq!(
        loaded.get_component::<Script>(camera).unwrap().class_name,
        "CameraController"
    );
}

#[test]
fn test_loaded_scene_simulates() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("Falling.ixscene");

    let mut scene = Scene::new("Falling");
    let body = scene.create_entity("Body", EntityType::Node);
    scene.add_component(body, Rigidbody2D::dynamic()).unwrap();
    scene.add_component(body, BoxCollider2D::default()).unwrap();
    let uuid = scene.uuid_of(body).unwrap();
    scene.save(&path).unwrap();

    let mut loaded = Scene::load(&path, PhysicsConfig::default()).unwrap();
    loaded.on_runtime_start();
    for _ in 0..20 {
        loaded.on_update_runtime(1.0 / 60.0);
    }
    let entity = loaded.get_entity(uuid).unwrap();
    assert!(loaded.get_component::<Transform>(entity).unwrap().translation.y < 0.0);
}
