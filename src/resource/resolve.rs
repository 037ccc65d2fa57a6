//! Id resolution: raw import request → file path with the query re-attached.

use std::path::{Path, PathBuf};

/// Inputs for [`resolve_id`] that come from configuration.
#[derive(Debug, Clone, Copy)]
pub struct ResolveRules<'a> {
    /// Language extensions (without dot).
    pub extensions: &'a [String],
    /// When set, a trailing non-language extension is an import-formation
    /// suffix: stripped before resolution and re-attached afterwards.
    pub formation_suffix: Option<&'a str>,
}

impl ResolveRules<'_> {
    pub fn is_language_extension(&self, ext: &str) -> bool {
        let ext = ext.trim_start_matches('.');
        self.extensions.iter().any(|known| known == ext)
    }
}

/// Resolve a request to an id the host can load.
///
/// `resolver` is asked only when the path is relative or does not exist; a
/// leading `/` is stripped before asking it (root-relative import). When it
/// cannot resolve the request the original path is kept.
pub fn resolve_id(
    id: &str,
    rules: ResolveRules<'_>,
    resolver: impl Fn(&str) -> Option<PathBuf>,
) -> String {
    let mut parts = id.split('?');
    let source = parts.next().unwrap_or_default();
    // Later fragments go first so the first query keeps the last word.
    let first = parts.next();
    let query = parts
        .chain(first)
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join("&");

    let mut file = source.to_string();
    let mut formation_ext = None;
    if rules.formation_suffix.is_some()
        && let Some(ext) = Path::new(&file).extension().and_then(|e| e.to_str())
        && !rules.is_language_extension(ext)
    {
        let suffix = format!(".{ext}");
        let keep = file.len() - suffix.len();
        file.truncate(keep);
        formation_ext = Some(suffix);
    }

    let path = Path::new(&file);
    if !path.is_absolute() || !path.exists() {
        let request = file.strip_prefix('/').unwrap_or(&file);
        if let Some(resolved) = resolver(request) {
            file = resolved.to_string_lossy().into_owned();
        }
    }

    if let Some(ext) = formation_ext {
        file.push_str(&ext);
    }
    if !query.is_empty() {
        file.push('?');
        file.push_str(&query);
    }
    file
}

/// File key the host's module graph uses when import formation appends a
/// suffix to every language file (`App.es` → `App.es.vue`).
pub fn formation_key(file: &Path, suffix: &str) -> PathBuf {
    let suffix = if suffix.starts_with('.') {
        suffix.to_string()
    } else {
        format!(".{suffix}")
    };
    let mut key = file.as_os_str().to_owned();
    key.push(suffix);
    PathBuf::from(key)
}
