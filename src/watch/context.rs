//! Context dependencies: directories whose listing a build depends on.

use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::utils::path::normalize_path;

/// Directory → compilations that listed it during their build.
#[derive(Debug, Default)]
pub struct ContextDependencies {
    dirs: RwLock<FxHashMap<PathBuf, Vec<PathBuf>>>,
}

impl ContextDependencies {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `file` depends on the listing of `dir`.
    /// Returns `true` when `dir` was not tracked before.
    pub fn add(&self, dir: &Path, file: &Path) -> bool {
        let dir = normalize_path(dir);
        let file = normalize_path(file);
        let mut dirs = self.dirs.write();
        let fresh = !dirs.contains_key(&dir);
        let files = dirs.entry(dir).or_default();
        if !files.contains(&file) {
            files.push(file);
        }
        fresh
    }

    /// Files depending on the directory containing `path`.
    ///
    /// The deepest tracked directory that is a prefix of `path` wins.
    pub fn affected(&self, path: &Path) -> Option<Vec<PathBuf>> {
        let path = normalize_path(path);
        let dirs = self.dirs.read();
        dirs.iter()
            .filter(|(dir, _)| path.starts_with(dir))
            .max_by_key(|(dir, _)| dir.components().count())
            .map(|(_, files)| files.clone())
    }

    pub fn is_empty(&self) -> bool {
        self.dirs.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_and_lookup() {
        let deps = ContextDependencies::new();
        assert!(deps.add(Path::new("/app/pages"), Path::new("/app/Router.es")));
        assert!(!deps.add(Path::new("/app/pages"), Path::new("/app/Menu.es")));
        assert!(!deps.add(Path::new("/app/pages"), Path::new("/app/Menu.es")));

        assert_eq!(
            deps.affected(Path::new("/app/pages/About.es")),
            Some(vec![PathBuf::from("/app/Router.es"), PathBuf::from("/app/Menu.es")])
        );
        assert_eq!(deps.affected(Path::new("/app/other/X.es")), None);
    }

    #[test]
    fn test_deepest_directory_wins() {
        let deps = ContextDependencies::new();
        deps.add(Path::new("/app/pages"), Path::new("/app/Router.es"));
        deps.add(Path::new("/app/pages/admin"), Path::new("/app/Admin.es"));

        assert_eq!(
            deps.affected(Path::new("/app/pages/admin/Users.es")),
            Some(vec![PathBuf::from("/app/Admin.es")])
        );
    }
}
