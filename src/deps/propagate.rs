//! Dependency watch propagation.
//!
//! Walks a compilation's imports transitively. Server-scoped files are
//! descended into; local-scoped files are leaves that get watched once and
//! collected, in first-reached order, for the server aggregate stub.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use rustc_hash::FxHashSet;

use crate::compilation::Registry;
use crate::pipeline::PluginSet;
use crate::utils::path::{display_path, normalize_path};
use crate::watch::WatchSet;
use crate::{debug, log};

pub struct Propagator<'a> {
    registry: &'a Registry,
    plugins: &'a PluginSet,
    watches: &'a WatchSet,
}

impl<'a> Propagator<'a> {
    pub fn new(registry: &'a Registry, plugins: &'a PluginSet, watches: &'a WatchSet) -> Self {
        Self {
            registry,
            plugins,
            watches,
        }
    }

    /// Local-scope files reachable from `root` through server-scoped files.
    ///
    /// Cycle-safe. A server file that fails to analyze is skipped with a
    /// warning; its imports stay unknown.
    pub async fn local_dependencies(&self, root: &Path) -> Vec<PathBuf> {
        let root = normalize_path(root);
        let mut visited = FxHashSet::default();
        visited.insert(root.clone());

        let mut locals = Vec::new();
        let mut queue: VecDeque<PathBuf> = self.imports_of(&root).await.into();

        while let Some(dep) = queue.pop_front() {
            let dep = normalize_path(&dep);
            if !visited.insert(dep.clone()) {
                continue;
            }
            if self.plugins.is_server_scoped(&dep) {
                queue.extend(self.imports_of(&dep).await);
            } else {
                if self.watches.watch_file(&dep) {
                    debug!("deps"; "watch {}", display_path(&dep));
                }
                locals.push(dep);
            }
        }
        locals
    }

    async fn imports_of(&self, path: &Path) -> Vec<PathBuf> {
        match self.registry.ready(path).await {
            Ok(compilation) => compilation.dependencies(),
            Err(e) => {
                log!("warn"; "skipping dependencies of {}: {}", display_path(path), e);
                Vec::new()
            }
        }
    }
}
