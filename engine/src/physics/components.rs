//! Physics components for the entity system
//!
//! Runtime handles are never serialized and are `None` unless a simulation is
//! live; only the physics bridges write them.

use super::handle::EpochHandle;
use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

pub type Body2DHandle = EpochHandle<rapier2d::prelude::RigidBodyHandle>;
pub type Collider2DHandle = EpochHandle<rapier2d::prelude::ColliderHandle>;
pub type Body3DHandle = EpochHandle<rapier3d::prelude::RigidBodyHandle>;
pub type Collider3DHandle = EpochHandle<rapier3d::prelude::ColliderHandle>;

/// Motion type of a 2D body
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BodyType2D {
    #[default]
    Static,
    Dynamic,
    Kinematic,
}

/// 2D rigid body
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Rigidbody2D {
    pub body_type: BodyType2D,
    pub linear_velocity: Vec2,
    pub angular_velocity: f32,
    pub gravity_scale: f32,
    pub linear_damping: f32,
    pub angular_damping: f32,
    pub fixed_rotation: bool,
    pub is_awake: bool,
    pub is_enabled: bool,
    pub enable_sleep: bool,
    #[serde(skip)]
    pub runtime_body: Option<Body2DHandle>,
}

impl Default for Rigidbody2D {
    fn default() -> Self {
        Self {
            body_type: BodyType2D::Static,
            linear_velocity: Vec2::ZERO,
            angular_velocity: 0.0,
            gravity_scale: 1.0,
            linear_damping: 0.6,
            angular_damping: 0.2,
            fixed_rotation: false,
            is_awake: true,
            is_enabled: true,
            enable_sleep: false,
            runtime_body: None,
        }
    }
}

impl Rigidbody2D {
    pub fn dynamic() -> Self {
        Self {
            body_type: BodyType2D::Dynamic,
            ..Default::default()
        }
    }
}

/// Axis-aligned box shape attached to a [`Rigidbody2D`]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BoxCollider2D {
    /// Half extents before the entity scale is applied
    pub size: Vec2,
    pub offset: Vec2,
    pub restitution: f32,
    pub friction: f32,
    pub density: f32,
    pub is_sensor: bool,
    /// Scaled half extents last pushed to the physics shape
    #[serde(skip)]
    pub current_size: Vec2,
    #[serde(skip)]
    pub runtime_shape: Option<Collider2DHandle>,
}

impl Default for BoxCollider2D {
    fn default() -> Self {
        Self {
            size: Vec2::splat(0.5),
            offset: Vec2::ZERO,
            restitution: 0.1,
            friction: 0.5,
            density: 1.0,
            is_sensor: false,
            current_size: Vec2::ZERO,
            runtime_shape: None,
        }
    }
}

/// Integration quality of a 3D body
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MotionQuality {
    #[default]
    Discrete,
    /// Continuous collision detection along the linear path
    LinearCast,
}

/// 3D rigid body
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Rigidbody {
    pub is_static: bool,
    pub move_x: bool,
    pub move_y: bool,
    pub move_z: bool,
    pub rotate_x: bool,
    pub rotate_y: bool,
    pub rotate_z: bool,
    pub motion_quality: MotionQuality,
    pub gravity_factor: f32,
    #[serde(skip)]
    pub runtime_body: Option<Body3DHandle>,
}

impl Default for Rigidbody {
    fn default() -> Self {
        Self {
            is_static: false,
            move_x: true,
            move_y: true,
            move_z: true,
            rotate_x: true,
            rotate_y: true,
            rotate_z: true,
            motion_quality: MotionQuality::Discrete,
            gravity_factor: 1.0,
            runtime_body: None,
        }
    }
}

impl Rigidbody {
    pub fn fixed() -> Self {
        Self {
            is_static: true,
            ..Default::default()
        }
    }
}

/// Box collider; `scale` holds half extents before the entity scale is applied
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BoxCollider {
    pub scale: Vec3,
    pub friction: f32,
    pub static_friction: f32,
    pub restitution: f32,
    pub density: f32,
    #[serde(skip)]
    pub runtime_shape: Option<Collider3DHandle>,
}

impl Default for BoxCollider {
    fn default() -> Self {
        Self {
            scale: Vec3::splat(0.5),
            friction: 0.5,
            static_friction: 0.5,
            restitution: 0.0,
            density: 1.0,
            runtime_shape: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SphereCollider {
    pub radius: f32,
    pub friction: f32,
    pub static_friction: f32,
    pub restitution: f32,
    pub density: f32,
    #[serde(skip)]
    pub runtime_shape: Option<Collider3DHandle>,
}

impl Default for SphereCollider {
    fn default() -> Self {
        Self {
            radius: 0.5,
            friction: 0.5,
            static_friction: 0.5,
            restitution: 0.0,
            density: 1.0,
            runtime_shape: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rigidbody2d_defaults() {
        let rb = Rigidbody2D::default();
        assert_eq!(rb.body_type, BodyType2D::Static);
        assert_eq!(rb.gravity_scale, 1.0);
        assert_eq!(rb.linear_damping, 0.6);
        assert_eq!(rb.angular_damping, 0.2);
        assert!(rb.is_awake && rb.is_enabled);
        assert!(rb.runtime_body.is_none());
    }

    #[test]
    fn test_runtime_handles_not_serialized() {
        let mut rb = Rigidbody2D::dynamic();
        rb.runtime_body = Some(EpochHandle::new(
            3,
            rapier2d::prelude::RigidBodyHandle::from_raw_parts(1, 0),
        ));

        let value = serde_json::to_value(&rb).unwrap();
        assert!(value.get("runtime_body").is_none());

        let back: Rigidbody2D = serde_json::from_value(value).unwrap();
        assert_eq!(back.body_type, BodyType2D::Dynamic);
        assert!(back.runtime_body.is_none());
    }

    #[test]
    fn test_missing_fields_take_defaults() {
        let collider: BoxCollider2D = serde_json::from_str(r#"{"friction": 0.9}"#).unwrap();
        assert_eq!(collider.friction, 0.9);
        assert_eq!(collider.size, Vec2::splat(0.5));
        assert_eq!(collider.density, 1.0);
    }
}
