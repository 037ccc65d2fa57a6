//! Build orchestration: one pipeline, one compilation.
//!
//! ```text
//! ready(path) ─► analysis errors? ─► cached? ─► spawn pipeline.build ─► store
//!                    │ abort            │ reuse        │ panic/error → Build
//! ```

use std::path::Path;
use std::sync::Arc;

use super::BuildResult;
use crate::compilation::{Compilation, Registry};
use crate::diagnostic::{Diagnostic, partition};
use crate::error::{BridgeError, Result};
use crate::pipeline::{BuildRequest, PluginRecord};
use crate::utils::path::display_path;
use crate::{debug, log};

/// A build result plus the warnings raised on the way.
#[derive(Debug, Clone)]
pub struct Built {
    pub compilation: Arc<Compilation>,
    pub result: Arc<BuildResult>,
    pub warnings: Vec<Diagnostic>,
    /// Source revision the result was built from.
    pub revision: u64,
    /// Served from the compilation's build slot without calling the pipeline.
    pub cached: bool,
}

/// Drives pipeline builds against the registry.
#[derive(Clone, Copy)]
pub struct Orchestrator<'a> {
    registry: &'a Registry,
}

impl<'a> Orchestrator<'a> {
    pub fn new(registry: &'a Registry) -> Self {
        Self { registry }
    }

    /// Build `path` with `plugin`.
    ///
    /// `resource` is the id reported in errors.
    pub async fn build(
        &self,
        path: &Path,
        plugin: &PluginRecord,
        request: BuildRequest,
        resource: &str,
    ) -> Result<Built> {
        let compilation = self.registry.ready(path).await?;
        let Some(view) = compilation.view() else {
            return Err(BridgeError::Analysis {
                path: compilation.path().to_path_buf(),
                message: "compilation has no analysis".into(),
            });
        };

        let analysis = partition(view.diagnostics());
        analysis.log_warnings();
        if analysis.has_errors() {
            return Err(BridgeError::Analysis {
                path: view.path.clone(),
                message: analysis.error_message(),
            });
        }
        let mut warnings = analysis.warnings;

        let selector = request.selector.clone();
        if let Some(result) =
            compilation.cached_build(plugin.id, view.revision, selector.as_deref())
            && !result.has_depend_files()
        {
            debug!("build"; "reuse {} ({})", display_path(&view.path), plugin.name);
            return Ok(Built {
                compilation,
                result,
                warnings,
                revision: view.revision,
                cached: true,
            });
        }
        if compilation
            .build_result()
            .is_some_and(|previous| previous.has_depend_files())
        {
            plugin.pipeline().clear(&view.path);
        }

        debug!("build"; "{} with {}", display_path(&view.path), plugin.name);
        let pipeline = Arc::clone(plugin.pipeline());
        let request = request.with_options(plugin.options());
        let revision = view.revision;
        let task = tokio::spawn(async move { pipeline.build(&view, &request).await });

        let output = match task.await {
            Ok(Ok(Some(output))) => output,
            Ok(Ok(None)) => return Err(BridgeError::NoResult(resource.to_string())),
            Ok(Err(err)) => {
                return Err(BridgeError::Build {
                    resource: resource.to_string(),
                    message: err.message,
                });
            }
            Err(join) => {
                let message = if join.is_panic() {
                    panic_message(join.into_panic())
                } else {
                    "build task cancelled".to_string()
                };
                log!("error"; "pipeline `{}` failed on {}: {}", plugin.name, resource, message);
                return Err(BridgeError::Build {
                    resource: resource.to_string(),
                    message,
                });
            }
        };

        let diagnostics = partition(&output.diagnostics);
        diagnostics.log_warnings();
        if diagnostics.has_errors() {
            return Err(BridgeError::Build {
                resource: resource.to_string(),
                message: diagnostics.error_message(),
            });
        }
        warnings.extend(diagnostics.warnings);

        let result = Arc::new(output.result);
        if !compilation.store_build(plugin.id, revision, selector, Arc::clone(&result)) {
            debug!("build"; "source of {} changed during build, result not cached", resource);
        }

        Ok(Built {
            compilation,
            result,
            warnings,
            revision,
            cached: false,
        })
    }
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("pipeline panicked: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("pipeline panicked: {s}")
    } else {
        "pipeline panicked".to_string()
    }
}
