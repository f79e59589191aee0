//! Hierarchy invariants exercised through the public scene API

use glam::{Mat4, Quat, Vec3};
use ignite_engine::core::entity::{Entity, EntityType, IdComponent, Transform};
use ignite_engine::prelude::{Scene, Uuid};

fn set_local(scene: &Scene, entity: Entity, transform: Transform) {
    *scene.get_component_mut::<Transform>(entity).unwrap() = transform;
}

#[test]
fn test_three_level_propagation_matches_matrix_composition() {
    let mut scene = Scene::new("Chain");
    let root = scene.create_entity("Root", EntityType::Node);
    let child = scene.create_entity("Child", EntityType::Node);
    let grandchild = scene.create_entity("Grandchild", EntityType::Mesh);
    assert!(scene.add_child(root, child));
    assert!(scene.add_child(child, grandchild));

    let root_local = Transform::from_local(
        Vec3::new(10.0, 0.0, -2.0),
        Quat::from_rotation_y(0.5),
        Vec3::splat(2.0),
    );
    let child_local = Transform::from_local(
        Vec3::new(0.0, 3.0, 0.0),
        Quat::from_rotation_z(-1.2),
        Vec3::new(1.0, 0.5, 1.0),
    );
    let grandchild_local = Transform::from_local(
        Vec3::new(1.0, 1.0, 1.0),
        Quat::from_rotation_x(0.25),
        Vec3::ONE,
    );
    let expected: Mat4 = root_local.local_matrix()
        * child_local.local_matrix()
        * grandchild_local.local_matrix();

    set_local(&scene, root, root_local);
    set_local(&scene, child, child_local);
    set_local(&scene, grandchild, grandchild_local);
    scene.update_transforms();

    let world = scene.get_component::<Transform>(grandchild).unwrap().world_matrix();
    let (expected_scale, expected_rotation, expected_translation) =
        expected.to_scale_rotation_translation();
    let (scale, rotation, translation) = world.to_scale_rotation_translation();

    assert!(translation.abs_diff_eq(expected_translation, 1e-4));
    assert!(scale.abs_diff_eq(expected_scale, 1e-4));
    assert!(rotation.angle_between(expected_rotation) < 1e-3);
}

#[test]
fn test_reparenting_never_creates_cycles() {
    let mut scene = Scene::new("Cycles");
    let a = scene.create_entity("A", EntityType::Node);
    let b = scene.create_entity("B", EntityType::Node);
    let c = scene.create_entity("C", EntityType::Node);
    assert!(scene.add_child(a, b));
    assert!(scene.add_child(b, c));

    assert!(!scene.add_child(c, a));
    assert!(!scene.add_child(b, a));
    assert!(!scene.add_child(a, a));

    // Every parent chain reaches a root within entity_count steps
    let limit = scene.entity_count();
    for (uuid, _) in scene.entities() {
        let mut current = uuid;
        let mut steps = 0;
        while !current.is_nil() {
            let entity = scene.get_entity(current).unwrap();
            current = scene.world().get::<IdComponent>(entity).ok().unwrap().parent;
            steps += 1;
            assert!(steps <= limit, "parent chain did not terminate");
        }
    }
}

#[test]
fn test_name_counter_reuses_freed_suffix() {
    let mut scene = Scene::new("Names");
    let first = scene.create_entity("Box", EntityType::Node);
    let second = scene.create_entity("Box", EntityType::Node);
    let third = scene.create_entity("Box", EntityType::Node);

    assert_eq!(scene.entity_name(first).as_deref(), Some("Box"));
    assert_eq!(scene.entity_name(second).as_deref(), Some("Box (1)"));
    assert_eq!(scene.entity_name(third).as_deref(), Some("Box (2)"));

    scene.destroy_entity(second);
    let again = scene.create_entity("Box", EntityType::Node);
    assert_eq!(scene.entity_name(again).as_deref(), Some("Box (1)"));
}

#[test]
fn test_destroy_removes_subtree_and_parent_link() {
    let mut scene = Scene::new("Destroy");
    let root = scene.create_entity("Root", EntityType::Node);
    let middle = scene.create_entity("Middle", EntityType::Node);
    let leaf = scene.create_entity("Leaf", EntityType::Node);
    scene.add_child(root, middle);
    scene.add_child(middle, leaf);
    let leaf_uuid = scene.uuid_of(leaf).unwrap();

    scene.destroy_entity(middle);

    assert_eq!(scene.entity_count(), 1);
    assert!(scene.get_entity(leaf_uuid).is_none());
    assert!(scene
        .world().get::<IdComponent>(root).ok()
        .unwrap()
        .children
        .is_empty());
    assert_eq!(scene.find_entity_by_name("Leaf"), None::<Uuid>);
}
