//! `[hot]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [hot]
//! enabled = true     # default: the main pipeline's `hot` option
//! watch = false      # filesystem watcher for cross pipelines
//! ```

use serde::{Deserialize, Serialize};

/// Hot-update settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HotConfig {
    /// Overrides the main pipeline's `hot` option when set.
    pub enabled: Option<bool>,
    /// Watch compilations built by cross pipelines and rebuild them on change.
    pub watch: bool,
}
