//! Path normalization utilities.
//!
//! - `normalize_path` - registry keys (canonicalize + lexical fallback)
//! - `clean_path` - pure lexical cleanup, no IO
//! - `display_path` - forward-slash rendering for generated code

use std::path::{Component, Path, PathBuf};

/// Normalize a file system path to absolute form.
///
/// Tries `canonicalize()` first (resolves symlinks, `.`, `..`).
/// Falls back to the lexically cleaned path, joined with the current
/// directory when relative. Files that do not exist yet still get a stable key.
#[inline]
pub fn normalize_path(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| {
        if path.is_absolute() {
            clean_path(path)
        } else {
            std::env::current_dir()
                .map_or_else(|_| clean_path(path), |cwd| clean_path(&cwd.join(path)))
        }
    })
}

/// Lexically remove `.` and resolvable `..` components.
///
/// `..` at the root is dropped; leading `..` of a relative path is kept.
pub fn clean_path(path: &Path) -> PathBuf {
    let mut out: Vec<Component<'_>> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.last() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => out.push(component),
            },
            other => out.push(other),
        }
    }
    if out.is_empty() {
        return PathBuf::from(".");
    }
    out.iter().collect()
}

/// Render a path with forward slashes, for import specifiers and comments.
pub fn display_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}
