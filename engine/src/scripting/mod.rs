//! Scripting host interface
//!
//! A script runtime binds its calls to [`ScriptContext`], which exposes scene
//! entities by UUID only.

pub mod entity_api;

pub use entity_api::ScriptContext;
