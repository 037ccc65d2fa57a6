//! `[[pipeline]]` section configuration.
//!
//! Each entry names a build pipeline the host supplies at startup. Exactly one
//! entry is the main pipeline; the others are cross pipelines.
//!
//! # Example
//!
//! ```toml
//! [[pipeline]]
//! name = "es-vue"
//! main = true
//! scope = []                      # empty = catch-all
//! target = "local"                # "local" | "server"
//! capabilities = ["macros", "hooks"]
//!
//! [pipeline.options]
//! mode = "development"
//! hot = true
//! source_maps = true
//! import_formation = { ext = { enabled = false, suffix = ".vue" } }
//! ```

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::config::{ConfigDiagnostics, FieldPath};

// ============================================================================
// Enums
// ============================================================================

/// Where a pipeline's output runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Target {
    /// Bundled for the running target.
    #[default]
    Local,
    /// Compiled only for the paired backend.
    Server,
}

/// Optional pipeline capabilities, declared at registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Capability {
    Macros,
    Routes,
    Hooks,
}

impl Capability {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Macros => "macros",
            Self::Routes => "routes",
            Self::Hooks => "hooks",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildMode {
    #[default]
    Development,
    Production,
}

// ============================================================================
// Options
// ============================================================================

/// `import_formation.ext`: append a suffix to every language import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtFormation {
    pub enabled: bool,
    pub suffix: String,
}

impl Default for ExtFormation {
    fn default() -> Self {
        Self {
            enabled: false,
            suffix: ".vue".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportFormation {
    pub ext: ExtFormation,
}

/// Options bag handed to a pipeline. Unrecognized keys are kept in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineOptions {
    pub mode: BuildMode,
    pub hot: bool,
    pub source_maps: bool,
    /// `None` until configured or copied from the host's build flags.
    pub ssr: Option<bool>,
    pub import_formation: ImportFormation,
    #[serde(flatten)]
    pub extra: toml::Table,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            mode: BuildMode::Development,
            hot: true,
            source_maps: true,
            ssr: None,
            import_formation: ImportFormation::default(),
            extra: toml::Table::new(),
        }
    }
}

impl PipelineOptions {
    pub fn is_production(&self) -> bool {
        self.mode == BuildMode::Production
    }

    /// Import-formation suffix, when enabled.
    pub fn formation_suffix(&self) -> Option<&str> {
        let ext = &self.import_formation.ext;
        (ext.enabled && !ext.suffix.is_empty()).then_some(ext.suffix.as_str())
    }
}

// ============================================================================
// PipelineConfig
// ============================================================================

/// One `[[pipeline]]` entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub name: String,
    #[serde(default)]
    pub main: bool,
    /// Regexes over file paths; empty means catch-all.
    #[serde(default)]
    pub scope: Vec<String>,
    #[serde(default)]
    pub target: Target,
    #[serde(default)]
    pub capabilities: Vec<Capability>,
    #[serde(default)]
    pub options: PipelineOptions,
}

impl PipelineConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            main: false,
            scope: Vec::new(),
            target: Target::Local,
            capabilities: Vec::new(),
            options: PipelineOptions::default(),
        }
    }

    pub fn has(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }

    /// Validate all pipeline entries together.
    pub fn validate_all(pipelines: &[Self], diag: &mut ConfigDiagnostics) {
        let mains = pipelines.iter().filter(|p| p.main).count();
        match mains {
            1 => {}
            0 => diag.error_with_hint(
                FieldPath::new("pipeline"),
                "no main pipeline",
                "set `main = true` on one [[pipeline]] entry",
            ),
            n => diag.error(
                FieldPath::new("pipeline"),
                format!("{n} pipelines are marked `main`, expected exactly one"),
            ),
        }

        let mut seen = FxHashSet::default();
        for (index, pipeline) in pipelines.iter().enumerate() {
            if pipeline.name.trim().is_empty() {
                diag.error(FieldPath::indexed("pipeline", index, "name"), "empty name");
            } else if !seen.insert(pipeline.name.as_str()) {
                diag.error(
                    FieldPath::indexed("pipeline", index, "name"),
                    format!("duplicate pipeline name `{}`", pipeline.name),
                );
            }

            for pattern in &pipeline.scope {
                if let Err(e) = regex::Regex::new(pattern) {
                    diag.error(FieldPath::indexed("pipeline", index, "scope"), e.to_string());
                }
            }

            if pipeline.main && pipeline.target == Target::Server {
                diag.warn(
                    FieldPath::indexed("pipeline", index, "target"),
                    "main pipeline targets the server; local requests will only see stubs",
                );
            }
        }
    }
}
