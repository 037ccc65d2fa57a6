//! Filesystem watching for cross pipelines and context directories.
//!
//! ```text
//! notify ─► FsWatcher ─► Debouncer ─► Session::dispatch ─► BridgeContext
//!                                         │ modified  → cross-pipeline rebuild
//!                                         └ add/remove → context dependencies
//! ```
//!
//! - [`watcher`]: notify-backed [`WatchSink`]
//! - [`debouncer`]: event coalescing (timing only)
//! - [`context`]: directory → dependent compilations
//! - [`session`]: the event loop tying them to a bridge

pub mod context;
pub mod debouncer;
pub mod session;
pub mod watcher;

pub use context::ContextDependencies;
pub use debouncer::Debouncer;
pub use session::{Session, SessionEvent};
pub use watcher::FsWatcher;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::FxHashSet;

/// Receives watch registrations.
pub trait WatchSink: Send + Sync {
    fn watch_file(&self, path: &Path);
    fn watch_dir(&self, dir: &Path);
}

/// What happened to a watched path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Created,
    Modified,
    Removed,
}

impl ChangeKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Modified => "modified",
            Self::Removed => "removed",
        }
    }
}

/// Registers each path with the sink at most once.
#[derive(Default)]
pub struct WatchSet {
    sink: Option<Arc<dyn WatchSink>>,
    files: Mutex<FxHashSet<PathBuf>>,
    dirs: Mutex<FxHashSet<PathBuf>>,
}

impl WatchSet {
    pub fn new(sink: Option<Arc<dyn WatchSink>>) -> Self {
        Self {
            sink,
            ..Self::default()
        }
    }

    pub fn is_active(&self) -> bool {
        self.sink.is_some()
    }

    /// Returns `true` when `path` was not watched before.
    pub fn watch_file(&self, path: &Path) -> bool {
        if !self.files.lock().insert(path.to_path_buf()) {
            return false;
        }
        if let Some(sink) = &self.sink {
            sink.watch_file(path);
        }
        true
    }

    pub fn watch_dir(&self, dir: &Path) -> bool {
        if !self.dirs.lock().insert(dir.to_path_buf()) {
            return false;
        }
        if let Some(sink) = &self.sink {
            sink.watch_dir(dir);
        }
        true
    }

    pub fn is_watched(&self, path: &Path) -> bool {
        self.files.lock().contains(path)
    }
}
