//! Background asset loading with a main-thread upload point
//!
//! Each load runs on the rayon pool and reports through its own channel.
//! [`AssetWorker::sync_main_thread`] polls every pending task once, uploads
//! finished results through the [`GpuContext`] and only then publishes them
//! into the task's [`AssetSlot`].

use crate::graphics::{GpuContext, GpuUpload, MeshLoadError, TextureError};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::sync::{Arc, PoisonError, RwLock};
use thiserror::Error;
use tracing::{debug, error, trace, warn};

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Mesh error: {0}")]
    Mesh(#[from] MeshLoadError),

    #[error("Texture error: {0}")]
    Texture(#[from] TextureError),

    #[error("Loader panicked: {0}")]
    Panicked(String),
}

/// Destination of an async load; empty until the main thread publishes it
pub struct AssetSlot<T> {
    inner: Arc<RwLock<Option<Arc<T>>>>,
}

impl<T> AssetSlot<T> {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(None)),
        }
    }

    pub fn get(&self) -> Option<Arc<T>> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_ready(&self) -> bool {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    fn assign(&self, value: Arc<T>) {
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = Some(value);
    }
}

impl<T> Clone for AssetSlot<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Default for AssetSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Outcome of one sync pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub applied: usize,
    pub failed: usize,
    pub pending: usize,
}

enum TaskPoll {
    Pending,
    Applied,
    Failed,
}

trait PendingTask {
    fn poll(&mut self, gpu: &mut dyn GpuContext) -> TaskPoll;
}

struct LoadTask<T> {
    label: String,
    receiver: Receiver<Result<T, LoadError>>,
    slot: AssetSlot<T>,
}

impl<T: GpuUpload> PendingTask for LoadTask<T> {
    fn poll(&mut self, gpu: &mut dyn GpuContext) -> TaskPoll {
        match self.receiver.try_recv() {
            Ok(Ok(mut value)) => {
                if value.is_empty() {
                    warn!(task = %self.label, "Load produced an empty result");
                    return TaskPoll::Failed;
                }
                gpu.open_command_list();
                value.upload(gpu);
                gpu.close_and_submit();
                self.slot.assign(Arc::new(value));
                debug!(task = %self.label, "Load applied");
                TaskPoll::Applied
            }
            Ok(Err(e)) => {
                error!(task = %self.label, error = %e, "Load failed");
                TaskPoll::Failed
            }
            Err(TryRecvError::Empty) => TaskPoll::Pending,
            Err(TryRecvError::Disconnected) => {
                error!(task = %self.label, "Loader exited without a result");
                TaskPoll::Failed
            }
        }
    }
}

/// Owner of every in-flight load
#[derive(Default)]
pub struct AssetWorker {
    pending: Vec<Box<dyn PendingTask>>,
}

impl AssetWorker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Run `load` in the background; the returned slot fills in during a
    /// later `sync_main_thread` once the result is uploaded
    pub fn load_async<T, F>(&mut self, label: impl Into<String>, load: F) -> AssetSlot<T>
    where
        T: GpuUpload,
        F: FnOnce() -> Result<T, LoadError> + Send + 'static,
    {
        let label = label.into();
        let (sender, receiver) = mpsc::channel();
        let slot = AssetSlot::new();

        trace!(task = %label, "Spawning load");
        rayon::spawn(move || {
            let result = panic::catch_unwind(AssertUnwindSafe(load))
                .unwrap_or_else(|payload| Err(LoadError::Panicked(panic_message(payload))));
            // The worker may have been dropped; nobody is left to tell
            let _ = sender.send(result);
        });

        self.pending.push(Box::new(LoadTask {
            label,
            receiver,
            slot: slot.clone(),
        }));
        slot
    }

    /// Poll each pending task once without blocking. Finished tasks are
    /// uploaded, published and dropped from the queue; failed ones are
    /// dropped without touching the device.
    pub fn sync_main_thread(&mut self, gpu: &mut dyn GpuContext) -> SyncReport {
        let mut report = SyncReport::default();
        self.pending.retain_mut(|task| match task.poll(gpu) {
            TaskPoll::Pending => {
                report.pending += 1;
                true
            }
            TaskPoll::Applied => {
                report.applied += 1;
                false
            }
            TaskPoll::Failed => {
                report.failed += 1;
                false
            }
        });

        if report.applied + report.failed > 0 {
            debug!(
                applied = report.applied,
                failed = report.failed,
                pending = report.pending,
                "Main-thread sync"
            );
        }
        report
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
