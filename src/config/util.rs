//! Configuration utility functions.

use std::path::{Path, PathBuf};

/// Find the config file by searching upward from the current directory.
///
/// ```text
/// /home/user/app/src/components/  ← cwd
/// /home/user/app/bridge.toml      ← found
/// ```
pub fn find_config_file(config_name: &Path) -> Option<PathBuf> {
    if config_name.is_absolute() {
        return config_name.exists().then(|| config_name.to_path_buf());
    }
    let cwd = std::env::current_dir().ok()?;
    find_upward(&cwd, config_name)
}

fn find_upward(start: &Path, config_name: &Path) -> Option<PathBuf> {
    let mut current = start;
    loop {
        let candidate = current.join(config_name);
        if candidate.is_file() {
            return Some(candidate);
        }
        current = current.parent()?;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_find_upward() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("src/components");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(dir.path().join("bridge.toml"), "").unwrap();

        let found = find_upward(&nested, Path::new("bridge.toml")).unwrap();
        assert_eq!(found, dir.path().join("bridge.toml"));
        assert!(find_upward(&nested, Path::new("missing.toml")).is_none());
    }

    #[test]
    fn test_absolute_config_path() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("custom.toml");
        assert!(find_config_file(&file).is_none());
        std::fs::write(&file, "").unwrap();
        assert_eq!(find_config_file(&file), Some(file));
    }
}
