//! Scene documents, component reflection and file watching

pub mod component_registry;
pub mod hot_reload;
pub mod scene;

pub use component_registry::{ComponentKind, ComponentVTable, SceneComponent};
pub use hot_reload::{AssetChange, AssetWatcher};
pub use scene::{SceneDocument, SceneError, SerializedEntity, SCENE_VERSION};
