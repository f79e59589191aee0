//! File watching for the asset directory

use notify::event::{ModifyKind, RenameMode};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use tracing::{debug, error, info, trace};

/// A change observed under the watched directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetChange {
    Created(PathBuf),
    Modified(PathBuf),
    Removed(PathBuf),
}

impl AssetChange {
    pub fn path(&self) -> &Path {
        match self {
            AssetChange::Created(path) | AssetChange::Modified(path) | AssetChange::Removed(path) => {
                path
            }
        }
    }

    pub fn is_removal(&self) -> bool {
        matches!(self, AssetChange::Removed(_))
    }
}

/// Recursive watcher over an asset root; events are queued until [`poll`](Self::poll)
pub struct AssetWatcher {
    _watcher: RecommendedWatcher,
    root: PathBuf,
    events: Receiver<notify::Result<Event>>,
}

impl AssetWatcher {
    pub fn new(root: impl Into<PathBuf>) -> notify::Result<Self> {
        let root = root.into();
        info!(path = ?root, "Creating asset watcher");

        let (sender, events) = mpsc::channel();
        let mut watcher = RecommendedWatcher::new(
            move |res| {
                // Receiver gone means the watcher is being torn down
                let _ = sender.send(res);
            },
            Config::default(),
        )?;
        watcher.watch(&root, RecursiveMode::Recursive)?;
        debug!(path = ?root, "Started watching for file changes");

        Ok(Self {
            _watcher: watcher,
            root,
            events,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Drain every queued event without blocking
    pub fn poll(&self) -> Vec<AssetChange> {
        let mut changes = Vec::new();
        loop {
            match self.events.try_recv() {
                Ok(Ok(event)) => {
                    trace!(kind = ?event.kind, paths = ?event.paths, "File event");
                    changes.extend(classify(&event));
                }
                Ok(Err(e)) => error!(error = %e, "File watcher error"),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    error!(path = ?self.root, "File watcher disconnected");
                    break;
                }
            }
        }
        changes
    }
}

/// Map a raw notify event onto asset changes; renames become a removal of
/// the old path and a creation of the new one
pub fn classify(event: &Event) -> Vec<AssetChange> {
    let paths = event.paths.iter().cloned();
    match event.kind {
        EventKind::Create(_) => paths.map(AssetChange::Created).collect(),
        EventKind::Remove(_) => paths.map(AssetChange::Removed).collect(),
        EventKind::Modify(ModifyKind::Name(RenameMode::From)) => {
            paths.map(AssetChange::Removed).collect()
        }
        EventKind::Modify(ModifyKind::Name(RenameMode::To)) => {
            paths.map(AssetChange::Created).collect()
        }
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => match event.paths.as_slice() {
            [from, to] => vec![
                AssetChange::Removed(from.clone()),
                AssetChange::Created(to.clone()),
            ],
            _ => paths.map(AssetChange::Modified).collect(),
        },
        EventKind::Modify(_) => paths.map(AssetChange::Modified).collect(),
        _ => Vec::new(),
    }
}
