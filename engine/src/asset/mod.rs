//! Asset registry and the async load pipeline

pub mod importer;
pub mod loaders;
pub mod manager;
pub mod types;
pub mod worker;

pub use importer::Asset;
pub use loaders::{load_environment_async, load_model_async, load_texture_async};
pub use manager::{AssetError, AssetManager};
pub use types::{AssetHandle, AssetMetaData, AssetType};
pub use worker::{AssetSlot, AssetWorker, LoadError, SyncReport};
