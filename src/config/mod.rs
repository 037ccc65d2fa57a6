//! Bridge configuration management for `bridge.toml`.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── section/       # Configuration section definitions
//! │   ├── filter     # [filter]
//! │   ├── resolve    # [resolve]
//! │   ├── hot        # [hot]
//! │   ├── style      # [style]
//! │   └── pipeline   # [[pipeline]]
//! ├── types/         # ConfigError, ConfigDiagnostics, FieldPath
//! └── mod.rs         # BridgeConfig (this file)
//! ```

pub mod section;
pub mod types;
mod util;

pub use section::{
    BuildMode, Capability, ExtFormation, FilterConfig, HotConfig, ImportFormation,
    PipelineConfig, PipelineOptions, ResolveConfig, StyleConfig, Target,
};
pub use types::{ConfigDiagnostic, ConfigDiagnostics, ConfigError, FieldPath};
pub use util::find_config_file;

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::log;

/// Default config file name.
pub const CONFIG_FILE: &str = "bridge.toml";

// ============================================================================
// root configuration
// ============================================================================

/// Root configuration structure representing `bridge.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Absolute path to the config file (internal use only)
    #[serde(skip)]
    pub config_path: PathBuf,

    #[serde(default)]
    pub filter: FilterConfig,

    #[serde(default)]
    pub resolve: ResolveConfig,

    #[serde(default)]
    pub hot: HotConfig,

    #[serde(default)]
    pub style: StyleConfig,

    #[serde(default, rename = "pipeline")]
    pub pipelines: Vec<PipelineConfig>,
}

impl BridgeConfig {
    /// Load and validate configuration from a file.
    ///
    /// Unknown fields are reported as warnings, not errors.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (mut config, ignored) = Self::parse_with_ignored(&content)?;
        if !ignored.is_empty() {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy())
                .unwrap_or_else(|| path.to_string_lossy());
            log!("warn"; "unknown fields in {}: {}", name, ignored.join(", "));
        }

        config.config_path = path.to_path_buf();
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a TOML string (no validation).
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>), ConfigError> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })?;
        Ok((config, ignored))
    }

    /// Validate the whole configuration, collecting every error at once.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut diag = ConfigDiagnostics::new();

        self.filter.validate(&mut diag);
        self.resolve.validate(&mut diag);
        self.style.validate(&mut diag);
        PipelineConfig::validate_all(&self.pipelines, &mut diag);

        if self.hot.watch && self.pipelines.len() < 2 {
            diag.warn(
                FieldPath::new("hot.watch"),
                "watching only applies to cross pipelines; none configured",
            );
        }

        diag.print_warnings();
        diag.into_result().map_err(ConfigError::Diagnostics)
    }

    /// The pipeline marked `main`.
    pub fn main_pipeline(&self) -> Option<&PipelineConfig> {
        self.pipelines.iter().find(|p| p.main)
    }

    /// Whether the hot-update coordinator is active.
    pub fn hot_enabled(&self) -> bool {
        self.hot
            .enabled
            .or_else(|| self.main_pipeline().map(|p| p.options.hot))
            .unwrap_or(false)
    }

    /// Whether style output is built for production.
    pub fn style_production(&self) -> bool {
        self.style
            .production
            .or_else(|| self.main_pipeline().map(|p| p.options.is_production()))
            .unwrap_or(false)
    }
}

// ============================================================================
// Test Helpers (available to all modules via `use crate::config::test_*`)
// ============================================================================

/// Parse config, panicking on unknown fields (to catch config typos in tests).
#[cfg(test)]
pub fn test_parse_config(content: &str) -> BridgeConfig {
    let (parsed, ignored) = BridgeConfig::parse_with_ignored(content).unwrap();
    assert!(
        ignored.is_empty(),
        "test config has unknown fields: {:?}",
        ignored
    );
    parsed
}

// ============================================================================
// tests
// ============================================================================
