//! Hierarchy pass composing local transforms into world transforms

use super::components::{IdComponent, MeshRenderer, SkinnedMesh, Transform};
use super::world::World;
use crate::core::uuid::Uuid;
use glam::{Mat4, Vec3};
use hecs::Entity;
use std::collections::{HashMap, HashSet};
use tracing::{error, trace};

/// Recompute world transforms for every entity reachable from a root.
///
/// Traversal is a depth-first walk starting at each entity whose parent is
/// `NIL`; a parent is always finished before any of its children. Returns the
/// number of entities visited.
pub fn update_transforms(world: &mut World, entities: &HashMap<Uuid, Entity>) -> usize {
    let roots: Vec<Entity> = world
        .query::<&IdComponent>()
        .iter()
        .filter(|(_, id)| id.is_root())
        .map(|(entity, _)| entity)
        .collect();

    let mut visited = HashSet::with_capacity(entities.len());
    for root in roots {
        propagate(world, entities, root, Mat4::IDENTITY, &mut visited);
    }

    trace!(processed_count = visited.len(), "Hierarchy update completed");
    visited.len()
}

fn propagate(
    world: &mut World,
    entities: &HashMap<Uuid, Entity>,
    entity: Entity,
    parent_world: Mat4,
    visited: &mut HashSet<Entity>,
) {
    if !visited.insert(entity) {
        error!(entity = ?entity, "Cyclic parent-child relationship detected");
        return;
    }

    let world_matrix = match world.get_mut::<Transform>(entity) {
        Ok(mut transform) => {
            let world_matrix = parent_world * transform.local_matrix();
            transform.set_world_matrix(world_matrix);
            transform.dirty = false;
            world_matrix
        }
        Err(_) => parent_world,
    };

    update_mesh_buffer(world, entities, entity, world_matrix);

    let children = match world.get::<IdComponent>(entity) {
        Ok(id) => id.children.clone(),
        Err(_) => return,
    };

    for child_uuid in children {
        match entities.get(&child_uuid) {
            Some(&child) => propagate(world, entities, child, world_matrix, visited),
            None => error!(
                entity = ?entity,
                child = %child_uuid,
                "Child UUID has no live entity"
            ),
        }
    }
}

fn update_mesh_buffer(
    world: &mut World,
    entities: &HashMap<Uuid, Entity>,
    entity: Entity,
    world_matrix: Mat4,
) {
    let root = match world.get::<MeshRenderer>(entity) {
        Ok(renderer) => renderer.root,
        Err(_) => return,
    };

    let pose = if root.is_nil() {
        None
    } else {
        entities
            .get(&root)
            .and_then(|&skeleton| world.get::<SkinnedMesh>(skeleton).ok())
            .map(|skinned| skinned.pose.clone())
    };

    if let Ok(mut renderer) = world.get_mut::<MeshRenderer>(entity) {
        renderer.buffer.set_transformation(world_matrix);
        if let Some(pose) = pose {
            renderer.buffer.set_bone_transforms(&pose);
        }
    }
}

/// Whether `source` is `target` itself or one of its ancestors
pub fn is_ancestor(
    world: &World,
    entities: &HashMap<Uuid, Entity>,
    target: Entity,
    source: Entity,
) -> bool {
    if target == source {
        return true;
    }

    let source_uuid = match world.get::<IdComponent>(source) {
        Ok(id) => id.uuid,
        Err(_) => return false,
    };

    let mut current = target;
    // Bounded by the entity count so a corrupted graph cannot loop forever
    for _ in 0..=entities.len() {
        let parent = match world.get::<IdComponent>(current) {
            Ok(id) => id.parent,
            Err(_) => return false,
        };
        if parent.is_nil() {
            return false;
        }
        if parent == source_uuid {
            return true;
        }
        current = match entities.get(&parent) {
            Some(&entity) => entity,
            None => return false,
        };
    }

    error!(target = ?target, "Ancestor chain exceeds entity count");
    true
}

/// World-space translation of an entity, or zero if it has no transform
pub fn world_translation(world: &World, entity: Entity) -> Vec3 {
    world
        .get::<Transform>(entity)
        .map(|transform| transform.translation)
        .unwrap_or(Vec3::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::entity::components::EntityType;
    use glam::Quat;

    fn spawn(
        world: &mut World,
        entities: &mut HashMap<Uuid, Entity>,
        parent: Option<Entity>,
        transform: Transform,
    ) -> Entity {
        let uuid = Uuid::new();
        let mut id = IdComponent::new("node", uuid, EntityType::Node);
        if let Some(parent) = parent {
            let mut parent_id = world.get_mut::<IdComponent>(parent).unwrap();
            parent_id.children.push(uuid);
            id.parent = parent_id.uuid;
        }
        let entity = world.spawn((id, transform));
        entities.insert(uuid, entity);
        entity
    }

    #[test]
    fn test_basic_hierarchy() {
        let mut world = World::new();
        let mut entities = HashMap::new();

        let parent = spawn(&mut world, &mut entities, None, Transform::from_translation(Vec3::X));
        let child = spawn(
            &mut world,
            &mut entities,
            Some(parent),
            Transform::from_translation(Vec3::Y),
        );

        assert_eq!(update_transforms(&mut world, &entities), 2);

        assert_eq!(world_translation(&world, parent), Vec3::X);
        assert_eq!(world_translation(&world, child), Vec3::new(1.0, 1.0, 0.0));
        assert!(!world.get::<Transform>(child).unwrap().dirty);
    }

    #[test]
    fn test_rotation_and_scale_propagation() {
        let mut world = World::new();
        let mut entities = HashMap::new();

        let parent = spawn(
            &mut world,
            &mut entities,
            None,
            Transform::from_local(
                Vec3::ZERO,
                Quat::from_rotation_z(std::f32::consts::FRAC_PI_2),
                Vec3::splat(2.0),
            ),
        );
        let child = spawn(
            &mut world,
            &mut entities,
            Some(parent),
            Transform::from_translation(Vec3::X),
        );

        update_transforms(&mut world, &entities);

        let child_transform = world.get::<Transform>(child).unwrap();
        assert!(child_transform
            .translation
            .abs_diff_eq(Vec3::new(0.0, 2.0, 0.0), 1e-5));
        assert!(child_transform.scale.abs_diff_eq(Vec3::splat(2.0), 1e-5));
    }

    #[test]
    fn test_skinned_mesh_pose_copied_into_buffer() {
        let mut world = World::new();
        let mut entities = HashMap::new();

        let skeleton = spawn(&mut world, &mut entities, None, Transform::default());
        let skeleton_uuid = world.get::<IdComponent>(skeleton).unwrap().uuid;
        world
            .insert_one(
                skeleton,
                SkinnedMesh {
                    pose: vec![Mat4::from_translation(Vec3::Y); 2],
                    ..Default::default()
                },
            )
            .unwrap();

        let mesh = spawn(
            &mut world,
            &mut entities,
            Some(skeleton),
            Transform::from_translation(Vec3::Z),
        );
        world
            .insert_one(
                mesh,
                MeshRenderer {
                    root: skeleton_uuid,
                    ..Default::default()
                },
            )
            .unwrap();

        update_transforms(&mut world, &entities);

        let renderer = world.get::<MeshRenderer>(mesh).unwrap();
        assert_eq!(renderer.buffer.transformation, Mat4::from_translation(Vec3::Z));
        assert_eq!(renderer.buffer.bone_transforms[1], Mat4::from_translation(Vec3::Y));
        assert_eq!(renderer.buffer.bone_transforms[2], Mat4::IDENTITY);
    }

    #[test]
    fn test_is_ancestor() {
        let mut world = World::new();
        let mut entities = HashMap::new();

        let root = spawn(&mut world, &mut entities, None, Transform::default());
        let child = spawn(&mut world, &mut entities, Some(root), Transform::default());
        let grandchild = spawn(&mut world, &mut entities, Some(child), Transform::default());
        let other = spawn(&mut world, &mut entities, None, Transform::default());

        assert!(is_ancestor(&world, &entities, grandchild, root));
        assert!(is_ancestor(&world, &entities, grandchild, grandchild));
        assert!(!is_ancestor(&world, &entities, root, grandchild));
        assert!(!is_ancestor(&world, &entities, other, root));
    }
}
