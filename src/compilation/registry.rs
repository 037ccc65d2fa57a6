//! Compilation registry.
//!
//! Owns the path → [`Compilation`] mapping and the reverse dependency graph,
//! and is the only caller of the analyzer. One parse is in flight per path:
//! concurrent `ready` calls serialize on the record's parse lock and the
//! later callers find the record already valid.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use dashmap::DashMap;
use parking_lot::RwLock;
use rustc_hash::FxBuildHasher;

use super::record::{Compilation, Invalidation, Observation, Observer};
use crate::analyzer::Analyzer;
use crate::debug;
use crate::deps::DependencyGraph;
use crate::error::{BridgeError, Result};
use crate::freshness::ContentHash;
use crate::reload::SectionSnapshot;
use crate::utils::path::{display_path, normalize_path};

/// Whether `ready` had to analyze.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    /// The record was already valid.
    Cached,
    /// An analysis pass ran and its result was stored.
    Analysed,
}

/// Context object owning every compilation of a session.
///
/// Dropping the registry releases the analyzer resources of every record.
pub struct Registry {
    analyzer: Arc<dyn Analyzer>,
    records: DashMap<PathBuf, Arc<Compilation>, FxBuildHasher>,
    graph: RwLock<DependencyGraph>,
    analyses: AtomicUsize,
}

impl Registry {
    pub fn new(analyzer: Arc<dyn Analyzer>) -> Self {
        Self {
            analyzer,
            records: DashMap::with_hasher(FxBuildHasher),
            graph: RwLock::new(DependencyGraph::new()),
            analyses: AtomicUsize::new(0),
        }
    }

    pub fn analyzer(&self) -> &Arc<dyn Analyzer> {
        &self.analyzer
    }

    /// Existing record for `path`, or a fresh empty one. Never parses.
    pub fn get_or_create(&self, path: &Path) -> Arc<Compilation> {
        let key = normalize_path(path);
        self.records
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Compilation::new(key)))
            .clone()
    }

    pub fn get(&self, path: &Path) -> Option<Arc<Compilation>> {
        self.records
            .get(&normalize_path(path))
            .map(|entry| Arc::clone(entry.value()))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of analysis passes run so far.
    pub fn analyses(&self) -> usize {
        self.analyses.load(Ordering::Relaxed)
    }

    /// Ensure `path` has a valid analysis.
    pub async fn ready(&self, path: &Path) -> Result<Arc<Compilation>> {
        self.ready_tracked(path).await.map(|(compilation, _)| compilation)
    }

    /// [`ready`](Self::ready), also reporting whether an analysis ran.
    ///
    /// The source is read from disk when the record has none yet. An analyzer
    /// failure leaves the record invalid. When the source changes while the
    /// analyzer runs, the stale result is dropped and the new text analyzed.
    pub async fn ready_tracked(&self, path: &Path) -> Result<(Arc<Compilation>, Readiness)> {
        let compilation = self.get_or_create(path);
        let parse = compilation.parse_lock.lock().await;
        let mut readiness = Readiness::Cached;

        while !compilation.is_valid() {
            let Some((source, revision)) = compilation.pending_source() else {
                let text = read_source(compilation.path()).await?;
                compilation.set_source(&text);
                continue;
            };

            self.analyses.fetch_add(1, Ordering::Relaxed);
            debug!(
                "analyze";
                "{} (rev {}, {})",
                display_path(compilation.path()),
                revision,
                ContentHash::of(&source)
            );

            let analysis = self
                .analyzer
                .analyze(compilation.path(), &source)
                .await
                .map_err(|failure| BridgeError::Analysis {
                    path: compilation.path().to_path_buf(),
                    message: failure.0,
                })?;

            let sections = SectionSnapshot::extract(&source, &analysis.blocks);
            let imports = analysis.dependencies.clone();
            if compilation.store_analysis(revision, analysis, sections) {
                self.graph.write().record(compilation.path(), &imports);
                readiness = Readiness::Analysed;
            } else {
                debug!("analyze"; "dropped stale analysis of {}", display_path(compilation.path()));
            }
        }

        compilation.mark_watched();
        drop(parse);
        Ok((compilation, readiness))
    }

    /// Feed new source text for `path`.
    ///
    /// Equal text is a no-op reported as [`Invalidation::Unchanged`]. Otherwise
    /// the derived state is cleared and the next `ready` re-parses.
    pub fn invalidate(&self, path: &Path, source: &str) -> Invalidation {
        let compilation = self.get_or_create(path);
        let outcome = compilation.set_source(source);
        if outcome == Invalidation::Changed {
            debug!("invalidate"; "{}", display_path(compilation.path()));
        }
        outcome
    }

    /// Feed new source text for `path` on behalf of `observer`.
    ///
    /// Unlike [`invalidate`](Self::invalidate), the outcome is judged against
    /// what `observer` last acted on, so an edit already applied by another
    /// consumer is still reported as a change.
    pub fn observe(&self, path: &Path, source: &str, observer: Observer) -> Observation {
        let compilation = self.get_or_create(path);
        let observation = compilation.observe(observer, source);
        if observation.change == Invalidation::Changed {
            debug!("invalidate"; "{} ({:?})", display_path(compilation.path()), observer);
        }
        observation
    }

    /// Files whose compilations import `path`.
    pub fn dependents(&self, path: &Path) -> Vec<PathBuf> {
        self.graph.read().used_by(path)
    }

    /// Release analyzer resources of every record and forget them.
    pub fn dispose(&self) {
        let paths: Vec<PathBuf> = self.records.iter().map(|e| e.key().clone()).collect();
        for path in &paths {
            self.analyzer.release(path);
            self.records.remove(path);
        }
        self.graph.write().clear();
    }
}

impl Drop for Registry {
    fn drop(&mut self) {
        self.dispose();
    }
}

/// Read a source file, mapping a missing file to [`BridgeError::NotFound`].
pub(crate) async fn read_source(path: &Path) -> Result<String> {
    tokio::fs::read_to_string(path).await.map_err(|err| {
        if err.kind() == std::io::ErrorKind::NotFound {
            BridgeError::NotFound(path.to_path_buf())
        } else {
            BridgeError::Io(path.to_path_buf(), err)
        }
    })
}
