//! Build pipelines and plugin scoping.
//!
//! A pipeline is a host-supplied build backend. The bridge binds each
//! configured `[[pipeline]]` entry to one [`Pipeline`] object at startup and
//! wraps it in a [`PluginRecord`] carrying its scope and capabilities.
//!
//! - [`record`]: `PluginRecord`, `PluginSet` (registration order, main pipeline)
//! - [`scope`]: ownership, visibility and server/local split

pub mod record;
pub mod scope;

pub use record::{PluginId, PluginRecord, PluginSet};
pub use scope::{Resolution, inert_stub, resolve_scope, server_stub};

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::build::BuildResult;
use crate::compilation::CompilationView;
use crate::config::PipelineOptions;
use crate::diagnostic::Diagnostic;
use crate::resource::Query;

/// Failure raised inside a pipeline call.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct PipelineError {
    pub message: String,
}

impl PipelineError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// What to build.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuildRequest {
    /// Build only this sub-unit (`id` query without `type`).
    pub selector: Option<String>,
    /// The pipeline's options at the time of the build, host flags included.
    pub options: Arc<PipelineOptions>,
}

impl BuildRequest {
    pub fn full() -> Self {
        Self::default()
    }

    pub fn selector(selector: impl Into<String>) -> Self {
        Self {
            selector: Some(selector.into()),
            ..Self::default()
        }
    }

    pub fn with_options(mut self, options: Arc<PipelineOptions>) -> Self {
        self.options = options;
        self
    }
}

/// A build artifact plus diagnostics raised while producing it.
#[derive(Debug, Clone, Default)]
pub struct BuildOutput {
    pub result: BuildResult,
    pub diagnostics: Vec<Diagnostic>,
}

impl From<BuildResult> for BuildOutput {
    fn from(result: BuildResult) -> Self {
        Self {
            result,
            diagnostics: Vec::new(),
        }
    }
}

/// One route of a route-aware pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Route {
    pub path: String,
    pub file: PathBuf,
    pub name: Option<String>,
}

/// A host-supplied build backend.
///
/// Optional methods are only called when the matching capability is declared
/// in the pipeline's configuration.
#[async_trait]
pub trait Pipeline: Send + Sync {
    /// Build one compilation. `Ok(None)` means the pipeline produced nothing.
    async fn build(
        &self,
        unit: &CompilationView,
        request: &BuildRequest,
    ) -> Result<Option<BuildOutput>, PipelineError>;

    /// Macro expansion for `macro` requests (capability `macros`).
    async fn macros(&self, _unit: &CompilationView) -> Result<Option<String>, PipelineError> {
        Ok(None)
    }

    /// Routes declared by a page compilation (capability `routes`).
    async fn routes(&self, _unit: &CompilationView) -> Result<Vec<Route>, PipelineError> {
        Ok(Vec::new())
    }

    /// Generic call-hook escape hatch (capability `hooks`).
    async fn call_hook(
        &self,
        _unit: &CompilationView,
        _action: &str,
        _query: &Query,
    ) -> Result<Option<String>, PipelineError> {
        Ok(None)
    }

    /// Drop any pipeline-side cache for `path` before a forced rebuild.
    fn clear(&self, _path: &Path) {}
}
