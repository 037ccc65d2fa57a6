//! notify-backed watch sink.

use std::path::Path;
use std::sync::mpsc;

use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use parking_lot::Mutex;

use super::WatchSink;
use crate::log;

/// Raw notify results, consumed by [`Session`](super::Session).
pub type NotifyReceiver = mpsc::Receiver<notify::Result<notify::Event>>;

/// Filesystem watcher registering paths non-recursively.
pub struct FsWatcher {
    watcher: Mutex<RecommendedWatcher>,
}

impl FsWatcher {
    /// Start a watcher. Events buffer in the receiver until a session runs.
    pub fn new() -> notify::Result<(Self, NotifyReceiver)> {
        let (tx, rx) = mpsc::channel();
        let watcher = notify::recommended_watcher(move |res| {
            let _ = tx.send(res);
        })?;
        Ok((
            Self {
                watcher: Mutex::new(watcher),
            },
            rx,
        ))
    }

    fn add(&self, path: &Path) {
        if let Err(e) = self.watcher.lock().watch(path, RecursiveMode::NonRecursive) {
            log!("watch"; "cannot watch {}: {}", path.display(), e);
        }
    }
}

impl WatchSink for FsWatcher {
    fn watch_file(&self, path: &Path) {
        self.add(path);
    }

    fn watch_dir(&self, dir: &Path) {
        self.add(dir);
    }
}
