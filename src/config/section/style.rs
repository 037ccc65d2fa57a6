//! `[style]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [style]
//! scope_prefix = "data-v-"
//! preprocess_langs = ["less", "sass", "scss", "styl", "stylus"]
//! production = false    # default: main pipeline mode == "production"
//! ```

use serde::{Deserialize, Serialize};

use crate::config::{ConfigDiagnostics, FieldPath};

/// Preprocessor languages handed to the style compiler by default.
pub const DEFAULT_PREPROCESS_LANGS: &[&str] = &["less", "sass", "scss", "styl", "stylus"];

/// Style preprocessing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleConfig {
    /// Prepended to the `scoped` token from the query to form the scope id.
    pub scope_prefix: String,
    /// Languages passed through to the preprocessor; others compile as CSS.
    pub preprocess_langs: Vec<String>,
    pub production: Option<bool>,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            scope_prefix: String::new(),
            preprocess_langs: DEFAULT_PREPROCESS_LANGS
                .iter()
                .map(ToString::to_string)
                .collect(),
            production: None,
        }
    }
}

impl StyleConfig {
    pub fn allows(&self, lang: &str) -> bool {
        self.preprocess_langs.iter().any(|l| l == lang)
    }

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        for (index, lang) in self.preprocess_langs.iter().enumerate() {
            if lang.trim().is_empty() {
                diag.error(
                    FieldPath::indexed("style", index, "preprocess_langs"),
                    "empty language name",
                );
            }
        }
    }
}
