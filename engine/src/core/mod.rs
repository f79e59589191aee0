//! Identity layer and entity store

pub mod entity;
pub mod uuid;

pub use uuid::Uuid;
