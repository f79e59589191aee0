//! Ignite engine core
//!
//! Scene graph with transform propagation, 2D and 3D physics bridges, an
//! asset registry and an async load pipeline that uploads to the GPU on the
//! main thread.

pub mod app;
pub mod asset;
pub mod config;
pub mod core;
pub mod graphics;
pub mod io;
pub mod physics;
pub mod project;
pub mod scene;
pub mod scripting;

// Re-export commonly used types
pub mod prelude {
    // Entity system types
    pub use crate::core::entity::{
        EntityType, IdComponent, MeshRenderer, Script, SkinnedMesh, Transform,
    };
    pub use crate::core::uuid::Uuid;
    pub use crate::scene::Scene;

    // Math types
    pub use glam::{Mat3, Mat4, Quat, Vec2, Vec3, Vec4};

    // Physics types
    pub use crate::physics::{
        BodyType2D, BoxCollider, BoxCollider2D, MotionQuality, Rigidbody, Rigidbody2D,
        SphereCollider,
    };

    // Asset types
    pub use crate::asset::{Asset, AssetHandle, AssetManager, AssetSlot, AssetType, AssetWorker};
    pub use crate::graphics::{GpuContext, NullGpuContext, WgpuContext};

    // IO types
    pub use crate::io::{SceneDocument, SceneError};

    // Config types
    pub use crate::config::{PhysicsConfig, ProjectConfig};

    pub use crate::app::{EngineApp, FrameReport};
    pub use crate::project::{Project, ProjectError};
    pub use crate::scripting::ScriptContext;
}

/// Initialize logging for the engine
pub fn init_logging() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,wgpu_core=warn,wgpu_hal=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
