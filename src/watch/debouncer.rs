//! Event coalescing.
//!
//! Pure timing and deduplication: paths collect until no event arrived for
//! the quiet window, and flushes are spaced by a cooldown.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use rustc_hash::FxHashMap;

use super::ChangeKind;
use crate::debug;
use crate::utils::path::normalize_path;

pub const QUIET_WINDOW: Duration = Duration::from_millis(300);
pub const FLUSH_COOLDOWN: Duration = Duration::from_millis(800);

pub struct Debouncer {
    pending: FxHashMap<PathBuf, ChangeKind>,
    last_event: Option<Instant>,
    last_flush: Option<Instant>,
    window: Duration,
    cooldown: Duration,
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::with_timing(QUIET_WINDOW, FLUSH_COOLDOWN)
    }
}

impl Debouncer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timing(window: Duration, cooldown: Duration) -> Self {
        Self {
            pending: FxHashMap::default(),
            last_event: None,
            last_flush: None,
            window,
            cooldown,
        }
    }

    /// Feed a raw notify event. Metadata-only changes are ignored.
    pub fn push(&mut self, event: &notify::Event) {
        use notify::EventKind;
        use notify::event::ModifyKind;

        let kind = match event.kind {
            EventKind::Create(_) => ChangeKind::Created,
            EventKind::Remove(_) => ChangeKind::Removed,
            EventKind::Modify(ModifyKind::Metadata(_)) => return,
            EventKind::Modify(_) => ChangeKind::Modified,
            _ => return,
        };
        for path in &event.paths {
            self.record(path, kind);
        }
    }

    /// Merge one change into the pending set.
    ///
    /// Removed then created/modified becomes the later event; modified then
    /// removed becomes removed; created then removed cancels out. Any other
    /// repeat keeps the first kind.
    pub fn record(&mut self, path: &Path, kind: ChangeKind) {
        if is_editor_artifact(path) {
            return;
        }
        let path = normalize_path(path);

        match self.pending.get(&path).copied() {
            None => {
                debug!("watch"; "{} {}", kind.label(), path.display());
                self.pending.insert(path, kind);
            }
            Some(ChangeKind::Removed) if kind != ChangeKind::Removed => {
                self.pending.insert(path, kind);
            }
            Some(ChangeKind::Modified) if kind == ChangeKind::Removed => {
                self.pending.insert(path, ChangeKind::Removed);
            }
            Some(ChangeKind::Created) if kind == ChangeKind::Removed => {
                self.pending.remove(&path);
            }
            Some(_) => return,
        }
        self.last_event = Some(Instant::now());
    }

    pub fn is_ready(&self) -> bool {
        let Some(last_event) = self.last_event else {
            return false;
        };
        if last_event.elapsed() < self.window {
            return false;
        }
        if let Some(last_flush) = self.last_flush
            && last_flush.elapsed() < self.cooldown
        {
            return false;
        }
        !self.pending.is_empty()
    }

    /// Take the pending changes, sorted by path, once the window elapsed.
    pub fn flush(&mut self) -> Option<Vec<(PathBuf, ChangeKind)>> {
        if self.pending.is_empty() {
            // Everything cancelled out; stop waking up.
            self.last_event = None;
            return None;
        }
        if !self.is_ready() {
            return None;
        }
        self.last_event = None;
        self.last_flush = Some(Instant::now());
        let mut changes: Vec<_> = std::mem::take(&mut self.pending).into_iter().collect();
        changes.sort_by(|a, b| a.0.cmp(&b.0));
        Some(changes)
    }

    /// Time until the next flush could succeed.
    pub fn next_wake(&self) -> Duration {
        let Some(last_event) = self.last_event else {
            return Duration::from_secs(3600);
        };
        let window_left = self.window.saturating_sub(last_event.elapsed());
        let cooldown_left = self
            .last_flush
            .map_or(Duration::ZERO, |t| self.cooldown.saturating_sub(t.elapsed()));
        window_left.max(cooldown_left).max(Duration::from_millis(1))
    }

    #[cfg(test)]
    fn pending(&self, path: &str) -> Option<ChangeKind> {
        self.pending.get(Path::new(path)).copied()
    }
}

/// Editor swap/backup files and dotfiles.
fn is_editor_artifact(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    matches!(ext, "bck" | "bak" | "backup" | "swp" | "swo" | "tmp")
        || name.ends_with('~')
        || name.starts_with('.')
}
