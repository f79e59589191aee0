//! Entity-Component System (ECS) functionality
//!
//! This module provides the component store, the identity and transform
//! components, and the scene-graph transform pass.

pub mod components;
pub mod hierarchy;
pub mod world;

// Re-export commonly used types
pub use components::{
    EntityType, IdComponent, MeshBuffer, MeshRenderer, Script, SkinnedMesh, Transform, MAX_BONES,
};
pub use hierarchy::{is_ancestor, update_transforms};
pub use world::World;

// Re-export hecs types that users will need
pub use hecs::Entity;
