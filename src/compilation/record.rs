//! Per-file compilation record.
//!
//! A record is created once per normalized path and mutated in place, so
//! references held elsewhere (dependency edges, watch sets) stay valid. Only
//! the crate mutates it; everything else reads [`CompilationView`] snapshots.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::analyzer::{Analysis, TreeHandle};
use crate::build::BuildResult;
use crate::diagnostic::Diagnostic;
use crate::freshness::ContentHash;
use crate::pipeline::PluginId;
use crate::reload::SectionSnapshot;

/// Outcome of feeding new source text to a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Invalidation {
    /// Same text as cached; derived state untouched.
    Unchanged,
    /// Text differs; derived state cleared, re-parse pending.
    Changed,
}

/// A consumer judging incoming text against the text it last acted on.
///
/// The host's hot-update hook and the bridge's own watcher both feed new
/// source for the same file; each must see the edit once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Observer {
    /// Hot updates requested through a pipeline's bridge.
    Pipeline(PluginId),
    /// The cross-pipeline file watcher.
    Watcher,
}

/// Result of [`Compilation::observe`].
#[derive(Debug, Clone)]
pub struct Observation {
    /// Judged against what this observer saw last.
    pub change: Invalidation,
    /// Sections of the text this observer acted on last.
    pub previous: Option<Arc<SectionSnapshot>>,
}

#[derive(Debug, Clone)]
struct Seen {
    hash: ContentHash,
    sections: Option<Arc<SectionSnapshot>>,
}

/// Hot-update watch state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WatchState {
    #[default]
    Unwatched,
    Clean,
    Dirty,
}

#[derive(Debug)]
struct Analyzed {
    hash: ContentHash,
    analysis: Arc<Analysis>,
    sections: Arc<SectionSnapshot>,
}

#[derive(Debug)]
struct BuildSlot {
    plugin: PluginId,
    revision: u64,
    selector: Option<String>,
    result: Arc<BuildResult>,
}

#[derive(Debug, Default)]
struct CompilationState {
    source: Option<Arc<str>>,
    hash: Option<ContentHash>,
    /// Bumped on every source change; guards against stale results.
    revision: u64,
    analyzed: Option<Analyzed>,
    build: Option<BuildSlot>,
    watch: WatchState,
    seen: FxHashMap<Observer, Seen>,
}

impl CompilationState {
    fn replace_source(&mut self, source: &str, hash: ContentHash) -> Invalidation {
        if self.hash == Some(hash) {
            return Invalidation::Unchanged;
        }
        self.source = Some(Arc::from(source));
        self.hash = Some(hash);
        self.revision += 1;
        self.analyzed = None;
        self.build = None;
        Invalidation::Changed
    }
}

/// Analyzed state of one source file.
#[derive(Debug)]
pub struct Compilation {
    path: PathBuf,
    state: RwLock<CompilationState>,
    /// Held while a parse is in flight.
    pub(crate) parse_lock: tokio::sync::Mutex<()>,
}

impl Compilation {
    pub(crate) fn new(path: PathBuf) -> Self {
        Self {
            path,
            state: RwLock::new(CompilationState::default()),
            parse_lock: tokio::sync::Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    // ------------------------------------------------------------------------
    // Read access
    // ------------------------------------------------------------------------

    /// Cached source matches the analyzed source.
    pub fn is_valid(&self) -> bool {
        let state = self.state.read();
        match (&state.analyzed, state.hash) {
            (Some(analyzed), Some(hash)) => analyzed.hash == hash,
            _ => false,
        }
    }

    /// Whether `source` equals the cached source.
    pub fn matches_source(&self, source: &str) -> bool {
        self.state.read().hash == Some(ContentHash::of(source))
    }

    pub fn source(&self) -> Option<Arc<str>> {
        self.state.read().source.clone()
    }

    pub fn revision(&self) -> u64 {
        self.state.read().revision
    }

    pub fn watch_state(&self) -> WatchState {
        self.state.read().watch
    }

    pub fn sections(&self) -> Option<Arc<SectionSnapshot>> {
        self.state
            .read()
            .analyzed
            .as_ref()
            .map(|a| Arc::clone(&a.sections))
    }

    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.analysis()
            .map(|a| a.diagnostics.clone())
            .unwrap_or_default()
    }

    pub fn dependencies(&self) -> Vec<PathBuf> {
        self.analysis()
            .map(|a| a.dependencies.clone())
            .unwrap_or_default()
    }

    pub fn is_description_only(&self) -> bool {
        self.analysis().is_some_and(|a| a.description_only)
    }

    pub fn analysis(&self) -> Option<Arc<Analysis>> {
        self.state
            .read()
            .analyzed
            .as_ref()
            .map(|a| Arc::clone(&a.analysis))
    }

    /// Last stored build result, whichever pipeline produced it.
    pub fn build_result(&self) -> Option<Arc<BuildResult>> {
        self.state
            .read()
            .build
            .as_ref()
            .map(|slot| Arc::clone(&slot.result))
    }

    /// Read-only snapshot for pipelines. `None` until analyzed.
    pub fn view(&self) -> Option<CompilationView> {
        let state = self.state.read();
        let analyzed = state.analyzed.as_ref()?;
        let source = state.source.clone()?;
        Some(CompilationView {
            path: self.path.clone(),
            revision: state.revision,
            source,
            analysis: Arc::clone(&analyzed.analysis),
            sections: Arc::clone(&analyzed.sections),
        })
    }

    // ------------------------------------------------------------------------
    // Mutation (crate only)
    // ------------------------------------------------------------------------

    /// Replace the cached source. Clears derived state when the text differs.
    pub(crate) fn set_source(&self, source: &str) -> Invalidation {
        self.state
            .write()
            .replace_source(source, ContentHash::of(source))
    }

    /// Replace the cached source on behalf of `observer`.
    ///
    /// The change is judged against the text `observer` last acted on; an
    /// observer that never acted on this file compares with the cached text.
    pub(crate) fn observe(&self, observer: Observer, source: &str) -> Observation {
        let hash = ContentHash::of(source);
        let mut state = self.state.write();
        let (last, previous) = match state.seen.get(&observer) {
            Some(seen) => (Some(seen.hash), seen.sections.clone()),
            None => (
                state.hash,
                state.analyzed.as_ref().map(|a| Arc::clone(&a.sections)),
            ),
        };
        state.replace_source(source, hash);
        state.seen.insert(
            observer,
            Seen {
                hash,
                sections: previous.clone(),
            },
        );

        let change = if last == Some(hash) {
            Invalidation::Unchanged
        } else {
            Invalidation::Changed
        };
        Observation { change, previous }
    }

    /// Record that `observer` acted on the text analyzed at `revision`.
    pub(crate) fn mark_seen(&self, observer: Observer, revision: u64) -> bool {
        let mut state = self.state.write();
        if state.revision != revision {
            return false;
        }
        let Some(hash) = state.hash else {
            return false;
        };
        let sections = state.analyzed.as_ref().map(|a| Arc::clone(&a.sections));
        state.seen.insert(observer, Seen { hash, sections });
        true
    }

    /// Source and revision to analyze, when the source is known.
    pub(crate) fn pending_source(&self) -> Option<(Arc<str>, u64)> {
        let state = self.state.read();
        state.source.clone().map(|source| (source, state.revision))
    }

    /// Store an analysis made at `revision`. Stale analyses are dropped.
    pub(crate) fn store_analysis(
        &self,
        revision: u64,
        analysis: Analysis,
        sections: SectionSnapshot,
    ) -> bool {
        let mut state = self.state.write();
        let Some(hash) = state.hash else {
            return false;
        };
        if state.revision != revision {
            return false;
        }
        state.analyzed = Some(Analyzed {
            hash,
            analysis: Arc::new(analysis),
            sections: Arc::new(sections),
        });
        true
    }

    /// Cached result for this plugin, revision and selector.
    pub(crate) fn cached_build(
        &self,
        plugin: PluginId,
        revision: u64,
        selector: Option<&str>,
    ) -> Option<Arc<BuildResult>> {
        let state = self.state.read();
        state
            .build
            .as_ref()
            .filter(|slot| {
                slot.plugin == plugin
                    && slot.revision == revision
                    && slot.selector.as_deref() == selector
            })
            .map(|slot| Arc::clone(&slot.result))
    }

    /// Store a build made at `revision`, replacing the previous one.
    /// Returns `false` (and stores nothing) when the source moved on.
    pub(crate) fn store_build(
        &self,
        plugin: PluginId,
        revision: u64,
        selector: Option<String>,
        result: Arc<BuildResult>,
    ) -> bool {
        let mut state = self.state.write();
        if state.revision != revision || state.analyzed.is_none() {
            return false;
        }
        state.build = Some(BuildSlot {
            plugin,
            revision,
            selector,
            result,
        });
        true
    }

    pub(crate) fn set_watch_state(&self, watch: WatchState) {
        self.state.write().watch = watch;
    }

    /// Unwatched → Clean on the first successful analysis.
    pub(crate) fn mark_watched(&self) {
        let mut state = self.state.write();
        if state.watch == WatchState::Unwatched {
            state.watch = WatchState::Clean;
        }
    }
}

/// Immutable snapshot of an analyzed compilation.
#[derive(Debug, Clone)]
pub struct CompilationView {
    pub path: PathBuf,
    pub revision: u64,
    pub source: Arc<str>,
    pub analysis: Arc<Analysis>,
    pub sections: Arc<SectionSnapshot>,
}

impl CompilationView {
    pub fn tree(&self) -> Option<&TreeHandle> {
        self.analysis.tree.as_ref()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.analysis.diagnostics
    }

    pub fn dependencies(&self) -> &[PathBuf] {
        &self.analysis.dependencies
    }

    pub fn is_description_only(&self) -> bool {
        self.analysis.description_only
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analyzed(record: &Compilation) {
        let (source, revision) = record.pending_source().unwrap();
        let sections = SectionSnapshot::extract(&source, &[]);
        assert!(record.store_analysis(revision, Analysis::default(), sections));
    }

    #[test]
    fn test_new_record_is_invalid() {
        let record = Compilation::new(PathBuf::from("/a.es"));
        assert!(!record.is_valid());
        assert!(record.view().is_none());
        assert_eq!(record.watch_state(), WatchState::Unwatched);
    }

    #[test]
    fn test_set_source_equality() {
        let record = Compilation::new(PathBuf::from("/a.es"));
        assert_eq!(record.set_source("x"), Invalidation::Changed);
        analyzed(&record);
        assert!(record.is_valid());

        assert_eq!(record.set_source("x"), Invalidation::Unchanged);
        assert!(record.is_valid());

        assert_eq!(record.set_source("y"), Invalidation::Changed);
        assert!(!record.is_valid());
        assert!(record.sections().is_none());
    }

    #[test]
    fn test_stale_analysis_dropped() {
        let record = Compilation::new(PathBuf::from("/a.es"));
        record.set_source("one");
        let (_, stale) = record.pending_source().unwrap();
        record.set_source("two");

        assert!(!record.store_analysis(stale, Analysis::default(), SectionSnapshot::default()));
        assert!(!record.is_valid());
    }

    #[test]
    fn test_stale_build_dropped() {
        let record = Compilation::new(PathBuf::from("/a.es"));
        record.set_source("one");
        analyzed(&record);
        let revision = record.revision();
        record.set_source("two");
        analyzed(&record);

        let result = Arc::new(BuildResult::new("code"));
        assert!(!record.store_build(PluginId(0), revision, None, result));
        assert!(record.build_result().is_none());
    }

    #[test]
    fn test_cached_build_matching() {
        let record = Compilation::new(PathBuf::from("/a.es"));
        record.set_source("one");
        analyzed(&record);
        let revision = record.revision();
        let result = Arc::new(BuildResult::new("code"));
        assert!(record.store_build(PluginId(0), revision, None, result));

        assert!(record.cached_build(PluginId(0), revision, None).is_some());
        assert!(record.cached_build(PluginId(1), revision, None).is_none());
        assert!(record.cached_build(PluginId(0), revision, Some("x")).is_none());
        assert!(record.cached_build(PluginId(0), revision + 1, None).is_none());
    }

    #[test]
    fn test_observers_judge_independently() {
        let record = Compilation::new(PathBuf::from("/a.es"));
        record.set_source("one");
        analyzed(&record);
        let watcher = Observer::Watcher;
        let client = Observer::Pipeline(PluginId(0));
        assert!(record.mark_seen(client, record.revision()));

        let seen = record.observe(watcher, "two");
        assert_eq!(seen.change, Invalidation::Changed);
        analyzed(&record);

        // The text already moved on, yet the pipeline never saw "two".
        let seen = record.observe(client, "two");
        assert_eq!(seen.change, Invalidation::Changed);
        assert_eq!(seen.previous.unwrap().script, "one");
        assert!(record.is_valid());

        assert_eq!(record.observe(client, "two").change, Invalidation::Unchanged);
        assert_eq!(record.observe(watcher, "two").change, Invalidation::Unchanged);
    }

    #[test]
    fn test_first_observation_compares_cached_text() {
        let record = Compilation::new(PathBuf::from("/a.es"));
        record.set_source("one");
        analyzed(&record);
        let client = Observer::Pipeline(PluginId(0));

        assert_eq!(record.observe(client, "one").change, Invalidation::Unchanged);
        assert!(record.is_valid());
    }

    #[test]
    fn test_mark_seen_ignores_old_revision() {
        let record = Compilation::new(PathBuf::from("/a.es"));
        record.set_source("one");
        let revision = record.revision();
        record.set_source("two");
        assert!(!record.mark_seen(Observer::Watcher, revision));
        assert_eq!(record.observe(Observer::Watcher, "two").change, Invalidation::Unchanged);
    }
}
