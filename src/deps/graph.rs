//! Reverse dependency edges between compilations.

use rustc_hash::{FxHashMap, FxHashSet};
use std::path::{Path, PathBuf};

use crate::utils::path::normalize_path;

type PathSet = FxHashSet<PathBuf>;
type PathSetMap = FxHashMap<PathBuf, PathSet>;

/// Bidirectional dependency graph.
///
/// Maintains forward (file → imports) and reverse (import → importers)
/// mappings so that a changed file can find the compilations that reference
/// it.
///
/// # Invariants
/// - Forward and reverse mappings are always consistent
/// - Paths are normalized for reliable matching
/// - Self-references are excluded
#[derive(Debug, Default)]
pub struct DependencyGraph {
    forward: PathSetMap,
    reverse: PathSetMap,
}

impl DependencyGraph {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the imports of `file`, replacing any previous edges.
    pub fn record(&mut self, file: &Path, imports: &[PathBuf]) {
        let file = normalize_path(file);
        self.remove(&file);

        let deps: PathSet = imports
            .iter()
            .map(|p| normalize_path(p))
            .filter(|p| *p != file)
            .collect();

        for dep in &deps {
            self.reverse
                .entry(dep.clone())
                .or_default()
                .insert(file.clone());
        }
        self.forward.insert(file, deps);
    }

    /// Files importing `file`, sorted for stable output.
    pub fn used_by(&self, file: &Path) -> Vec<PathBuf> {
        let mut users: Vec<PathBuf> = self
            .reverse
            .get(&normalize_path(file))
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default();
        users.sort();
        users
    }

    /// Files `file` imports.
    #[inline]
    pub fn uses(&self, file: &Path) -> Option<&PathSet> {
        self.forward.get(&normalize_path(file))
    }

    /// Drop `file` and its outgoing edges.
    pub fn remove(&mut self, file: &Path) {
        let file = normalize_path(file);
        let Some(old_deps) = self.forward.remove(&file) else {
            return;
        };
        for dep in old_deps {
            if let Some(users) = self.reverse.get_mut(&dep) {
                users.remove(&file);
                if users.is_empty() {
                    self.reverse.remove(&dep);
                }
            }
        }
    }

    #[inline]
    pub fn clear(&mut self) {
        self.forward.clear();
        self.reverse.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(s: &str) -> PathBuf {
        PathBuf::from(s)
    }

    #[test]
    fn test_record_and_lookup() {
        let mut graph = DependencyGraph::new();
        graph.record(&p("/app/A.es"), &[p("/app/B.es"), p("/app/C.es")]);
        graph.record(&p("/app/D.es"), &[p("/app/B.es")]);

        assert_eq!(graph.used_by(&p("/app/B.es")), vec![p("/app/A.es"), p("/app/D.es")]);
        assert_eq!(graph.used_by(&p("/app/C.es")), vec![p("/app/A.es")]);
        assert_eq!(graph.uses(&p("/app/A.es")).map(|s| s.len()), Some(2));
    }

    #[test]
    fn test_rerecord_replaces_edges() {
        let mut graph = DependencyGraph::new();
        graph.record(&p("/app/A.es"), &[p("/app/B.es")]);
        graph.record(&p("/app/A.es"), &[p("/app/C.es")]);

        assert!(graph.used_by(&p("/app/B.es")).is_empty());
        assert_eq!(graph.used_by(&p("/app/C.es")), vec![p("/app/A.es")]);
    }

    #[test]
    fn test_self_reference_excluded() {
        let mut graph = DependencyGraph::new();
        graph.record(&p("/app/A.es"), &[p("/app/A.es"), p("/app/./B.es")]);
        assert!(graph.used_by(&p("/app/A.es")).is_empty());
        assert_eq!(graph.used_by(&p("/app/B.es")), vec![p("/app/A.es")]);
    }
}
