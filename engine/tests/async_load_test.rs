//! Main-thread sync semantics with a counting device double

use ignite_engine::asset::{load_texture_async, AssetSlot, AssetWorker, LoadError, SyncReport};
use ignite_engine::graphics::{
    BufferUsage, GpuBuffer, GpuContext, GpuTexture, GpuUpload, TextureDesc,
};
use std::sync::mpsc;
use std::time::{Duration, Instant};
use tempfile::TempDir;

#[derive(Default)]
struct CountingGpu {
    opens: usize,
    writes: usize,
    submits: usize,
    open: bool,
}

impl GpuContext for CountingGpu {
    fn open_command_list(&mut self) {
        assert!(!self.open, "command list opened twice");
        self.open = true;
        self.opens += 1;
    }

    fn write_buffer(&mut self, label: &str, _usage: BufferUsage, data: &[u8]) -> GpuBuffer {
        assert!(self.open, "write outside a command list");
        self.writes += 1;
        GpuBuffer::detached(label, data.len() as u64)
    }

    fn write_texture(&mut self, label: &str, desc: &TextureDesc, _data: &[u8]) -> GpuTexture {
        assert!(self.open, "write outside a command list");
        self.writes += 1;
        GpuTexture::detached(label, *desc)
    }

    fn close_and_submit(&mut self) {
        assert!(self.open, "submit without a command list");
        self.open = false;
        self.submits += 1;
    }
}

struct Payload(u32);

impl GpuUpload for Payload {
    fn is_empty(&self) -> bool {
        self.0 == 0
    }

    fn upload(&mut self, gpu: &mut dyn GpuContext) {
        gpu.write_buffer("payload", BufferUsage::Uniform, &self.0.to_le_bytes());
    }
}

fn sync_until_idle(worker: &mut AssetWorker, gpu: &mut CountingGpu) -> SyncReport {
    let deadline = Instant::now() + Duration::from_secs(10);
    let mut total = SyncReport::default();
    while worker.pending_count() > 0 && Instant::now() < deadline {
        let report = worker.sync_main_thread(gpu);
        total.applied += report.applied;
        total.failed += report.failed;
        std::thread::sleep(Duration::from_millis(1));
    }
    total
}

#[test]
fn test_each_completed_task_is_written_exactly_once() {
    let mut worker = AssetWorker::new();
    let slots: Vec<AssetSlot<Payload>> = (1..=5)
        .map(|i| worker.load_async(format!("payload {i}"), move || Ok(Payload(i))))
        .collect();

    let mut gpu = CountingGpu::default();
    let total = sync_until_idle(&mut worker, &mut gpu);
    assert_eq!(total.applied, 5);

    // Another frame finds nothing left to apply
    let next = worker.sync_main_thread(&mut gpu);
    assert_eq!(next, SyncReport::default());

    assert_eq!(gpu.writes, 5);
    assert_eq!(gpu.opens, 5);
    assert_eq!(gpu.submits, 5);
    for (i, slot) in slots.iter().enumerate() {
        assert_eq!(slot.get().unwrap().0, i as u32 + 1);
    }
}

#[test]
fn test_unfinished_task_stays_queued_without_blocking() {
    let (release, gate) = mpsc::channel::<()>();
    let mut worker = AssetWorker::new();
    let slot: AssetSlot<Payload> = worker.load_async("slow", move || {
        let _ = gate.recv();
        Ok(Payload(9))
    });

    let mut gpu = CountingGpu::default();
    for _ in 0..3 {
        let report = worker.sync_main_thread(&mut gpu);
        assert_eq!(report.pending, 1);
    }
    assert!(slot.get().is_none());
    assert_eq!(gpu.writes, 0);

    release.send(()).unwrap();
    sync_until_idle(&mut worker, &mut gpu);
    assert_eq!(slot.get().unwrap().0, 9);
    assert_eq!(gpu.writes, 1);
}

#[test]
fn test_null_and_failed_results_are_removed() {
    let mut worker = AssetWorker::new();
    let empty: AssetSlot<Payload> = worker.load_async("empty", || Ok(Payload(0)));
    let failed: AssetSlot<Payload> = worker.load_async("failed", || {
        Err(LoadError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "missing",
        )))
    });

    let mut gpu = CountingGpu::default();
    let total = sync_until_idle(&mut worker, &mut gpu);

    assert_eq!(total.failed, 2);
    assert_eq!(worker.pending_count(), 0);
    assert_eq!(gpu.submits, 0);
    assert!(empty.get().is_none());
    assert!(failed.get().is_none());
}

#[test]
fn test_texture_load_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("pixel.png");
    image::RgbaImage::from_pixel(3, 2, image::Rgba([10, 20, 30, 255]))
        .save(&path)
        .unwrap();

    let mut worker = AssetWorker::new();
    let slot = load_texture_async(&mut worker, &path);
    let mut gpu = CountingGpu::default();
    sync_until_idle(&mut worker, &mut gpu);

    let texture = slot.get().unwrap();
    assert_eq!((texture.width, texture.height), (3, 2));
    assert!(texture.gpu.is_some());
    assert_eq!(gpu.writes, 1);
}
