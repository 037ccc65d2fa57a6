//! Bridge error types.
//!
//! One variant per failure class a host can observe. Scope exclusion is not
//! here: an excluded file resolves to a stub module, not an error.

use std::path::PathBuf;

use thiserror::Error;

/// Errors reported to the host bundler.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// The analyzer failed, or left ERROR diagnostics on the compilation.
    #[error("analysis failed for `{}`:\n{message}", path.display())]
    Analysis { path: PathBuf, message: String },

    /// The pipeline failed or raised ERROR diagnostics during the build.
    #[error("build failed for `{resource}`:\n{message}")]
    Build { resource: String, message: String },

    /// The pipeline returned neither an artifact nor an error.
    #[error("Build error no result. on the \"{0}\"")]
    NoResult(String),

    /// The pipeline produced an artifact with no code.
    #[error("Build error code is empty. on the \"{0}\"")]
    EmptyBuild(String),

    /// The requested sub-asset does not exist in the build result.
    #[error("Not found {kind} by \"{index}\". on the \"{resource}\"")]
    AssetNotFound {
        resource: String,
        kind: &'static str,
        index: String,
    },

    /// The style preprocessor reported one or more errors (joined, one per line).
    #[error("{0}")]
    Preprocess(String),

    /// The resource does not exist on disk.
    #[error("'{}' is not exists.", .0.display())]
    NotFound(PathBuf),

    /// The pipeline was asked for a capability it did not advertise.
    #[error("pipeline `{pipeline}` does not support {capability}")]
    Capability {
        pipeline: String,
        capability: &'static str,
    },

    /// A call-hook request failed inside the pipeline.
    #[error("hook `{action}` failed: {message}")]
    Hook { action: String, message: String },

    #[error("IO error when reading `{0}`")]
    Io(PathBuf, #[source] std::io::Error),
}

impl BridgeError {
    /// Short label used as log prefix.
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Analysis { .. } => "analysis",
            Self::Build { .. } | Self::NoResult(_) | Self::EmptyBuild(_) => "build",
            Self::AssetNotFound { .. } => "asset",
            Self::Preprocess(_) => "style",
            Self::NotFound(_) | Self::Io(..) => "io",
            Self::Capability { .. } | Self::Hook { .. } => "pipeline",
        }
    }
}

pub type Result<T, E = BridgeError> = std::result::Result<T, E>;
