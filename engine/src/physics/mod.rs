//! Physics bridges using Rapier
//!
//! [`Physics2D`] drives `Rigidbody2D`/`BoxCollider2D` entities through rapier2d
//! and [`Physics3D`] drives `Rigidbody`/`BoxCollider`/`SphereCollider`
//! entities through rapier3d. Both are owned by a [`crate::scene::Scene`] and
//! only exist as live worlds between `simulation_start` and `simulation_stop`.

pub mod components;
pub mod handle;
pub mod physics_2d;
pub mod physics_3d;

// Re-export commonly used types
pub use components::{
    BodyType2D, BoxCollider, BoxCollider2D, MotionQuality, Rigidbody, Rigidbody2D, SphereCollider,
};
pub use handle::{EpochCounter, EpochHandle};
pub use physics_2d::Physics2D;
pub use physics_3d::Physics3D;

use crate::core::entity::{IdComponent, Transform, World};
use crate::core::uuid::Uuid;
use glam::{Mat4, Quat, Vec3};
use std::collections::HashMap;

/// Inverse world matrices of every entity that parents a body carrying `T`
pub(crate) fn parent_inverses<T: hecs::Component>(world: &World) -> HashMap<Uuid, Mat4> {
    let parents: Vec<Uuid> = world
        .query::<(&IdComponent, &T)>()
        .iter()
        .filter(|(_, (id, _))| !id.is_root())
        .map(|(_, (id, _))| id.parent)
        .collect();
    if parents.is_empty() {
        return HashMap::new();
    }

    world
        .query::<(&IdComponent, &Transform)>()
        .iter()
        .filter(|(_, (id, _))| parents.contains(&id.uuid))
        .filter_map(|(_, (id, transform))| {
            let matrix = transform.world_matrix();
            (matrix.determinant().abs() > f32::EPSILON).then(|| (id.uuid, matrix.inverse()))
        })
        .collect()
}

/// Express a world-space body pose relative to its parent
pub(crate) fn pose_to_local(
    parent_inverse: Option<&Mat4>,
    translation: Vec3,
    rotation: Quat,
) -> (Vec3, Quat) {
    match parent_inverse {
        Some(inverse) => {
            let (_, parent_rotation, _) = inverse.to_scale_rotation_translation();
            (
                inverse.transform_point3(translation),
                (parent_rotation * rotation).normalize(),
            )
        }
        None => (translation, rotation),
    }
}
