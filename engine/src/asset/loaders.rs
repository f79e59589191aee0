//! Async entry points for the CPU-heavy asset types.
//!
//! The closures handed to the worker capture only owned paths; they build
//! CPU-side data and never see the graphics device.

use crate::asset::worker::{AssetSlot, AssetWorker, LoadError};
use crate::graphics::{load_model, Environment, Model, TextureData};
use std::path::PathBuf;

pub fn load_model_async(worker: &mut AssetWorker, path: impl Into<PathBuf>) -> AssetSlot<Model> {
    let path = path.into();
    worker.load_async(path.display().to_string(), move || {
        load_model(&path).map_err(LoadError::from)
    })
}

pub fn load_texture_async(
    worker: &mut AssetWorker,
    path: impl Into<PathBuf>,
) -> AssetSlot<TextureData> {
    let path = path.into();
    worker.load_async(path.display().to_string(), move || {
        TextureData::from_file(&path).map_err(LoadError::from)
    })
}

/// Decode an HDR environment map to float RGBA
pub fn load_environment_async(
    worker: &mut AssetWorker,
    path: impl Into<PathBuf>,
) -> AssetSlot<Environment> {
    let path = path.into();
    worker.load_async(path.display().to_string(), move || {
        Environment::from_file(&path).map_err(LoadError::from)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graphics::NullGpuContext;
    use std::fs;
    use std::time::{Duration, Instant};
    use tempfile::TempDir;

    fn drain(worker: &mut AssetWorker, gpu: &mut NullGpuContext) {
        let deadline = Instant::now() + Duration::from_secs(10);
        while worker.pending_count() > 0 && Instant::now() < deadline {
            worker.sync_main_thread(gpu);
            std::thread::sleep(Duration::from_millis(1));
        }
    }

    #[test]
    fn test_model_and_texture_loads() {
        let dir = TempDir::new().unwrap();
        let obj = dir.path().join("tri.obj");
        fs::write(&obj, "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n").unwrap();
        let png = dir.path().join("tile.png");
        image::RgbaImage::new(8, 8).save(&png).unwrap();

        let mut worker = AssetWorker::new();
        let model = load_model_async(&mut worker, &obj);
        let texture = load_texture_async(&mut worker, &png);
        let mut gpu = NullGpuContext::new();
        drain(&mut worker, &mut gpu);

        let model = model.get().unwrap();
        assert!(model.is_uploaded());
        assert_eq!(model.vertex_count(), 3);
        assert!(texture.get().unwrap().gpu.is_some());
        assert_eq!(gpu.submitted, 2);
        assert_eq!(gpu.texture_writes, 1);
    }

    #[test]
    fn test_missing_environment_never_fills_slot() {
        let mut worker = AssetWorker::new();
        let environment = load_environment_async(&mut worker, "/nonexistent/sky.hdr");
        let mut gpu = NullGpuContext::new();
        drain(&mut worker, &mut gpu);

        assert!(!environment.is_ready());
        assert_eq!(gpu.submitted, 0);
    }
}
