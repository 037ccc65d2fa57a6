//! `[resolve]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [resolve]
//! virtual_prefixes = ["virtual:nuxt:"]
//! variant_suffix = ".vue"        # App.es.vue -> App.es
//! extensions = ["es", "ease"]
//! ```

use serde::{Deserialize, Serialize};

use crate::config::{ConfigDiagnostics, FieldPath};

/// Id parsing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolveConfig {
    /// Host-injected prefixes stripped before parsing.
    pub virtual_prefixes: Vec<String>,
    /// Suffix that only disambiguates template variants; empty disables.
    pub variant_suffix: String,
    /// Language file extensions (without dot).
    pub extensions: Vec<String>,
}

impl Default for ResolveConfig {
    fn default() -> Self {
        Self {
            virtual_prefixes: vec!["virtual:nuxt:".to_string()],
            variant_suffix: ".vue".to_string(),
            extensions: vec!["es".to_string(), "ease".to_string()],
        }
    }
}

impl ResolveConfig {
    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.extensions.is_empty() {
            diag.error(
                FieldPath::new("resolve.extensions"),
                "at least one language extension is required",
            );
        }
        for (index, ext) in self.extensions.iter().enumerate() {
            if ext.starts_with('.') {
                diag.error_with_hint(
                    FieldPath::indexed("resolve", index, "extensions"),
                    format!("extension `{ext}` starts with a dot"),
                    format!("write `{}`", ext.trim_start_matches('.')),
                );
            }
        }
        if !self.variant_suffix.is_empty() && !self.variant_suffix.starts_with('.') {
            diag.error(
                FieldPath::new("resolve.variant_suffix"),
                "variant suffix must start with a dot",
            );
        }
    }
}
