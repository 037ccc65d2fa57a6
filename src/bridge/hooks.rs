//! Host-facing plugin hooks.
//!
//! One [`Bridge`] per pipeline the host registers as a plugin. All bridges of
//! a session share one [`BridgeContext`].
//!
//! ```text
//! load(id) ─► filter ─► parse_resource ─► ready ─► scope ─┬─ excluded → inert stub
//!                                                          ├─ server   → aggregate stub
//!                                                          ├─ macro / callhook → pipeline hook
//!                                                          └─ build ─► depend files ─► extract
//! ```

use std::path::Path;
use std::sync::Arc;

use serde::Serialize;

use super::context::BridgeContext;
use crate::asset::Extractor;
use crate::build::{BuildResult, Orchestrator};
use crate::compilation::{Compilation, Observer, Readiness};
use crate::config::Capability;
use crate::debug;
use crate::deps::Propagator;
use crate::error::{BridgeError, Result};
use crate::pipeline::{
    BuildRequest, PipelineError, PluginRecord, Resolution, Route, inert_stub, resolve_scope,
    server_stub,
};
use crate::reload::{Coordinator, HotUpdate, ModuleGraph};
use crate::resource::{ResolveRules, ResourceDescriptor, parse_resource, resolve_id};
use crate::utils::path::{display_path, normalize_path};

const MACROS_ACTION: &str = "macros";

/// Code handed back from `load` / `transform`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadOutput {
    pub code: String,
    pub map: Option<String>,
    /// Rendered WARN diagnostics, for the host's warning channel.
    pub warnings: Vec<String>,
}

impl LoadOutput {
    pub fn code(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            map: None,
            warnings: Vec::new(),
        }
    }
}

/// Hooks of one pipeline.
#[derive(Clone)]
pub struct Bridge {
    ctx: Arc<BridgeContext>,
    plugin: Arc<PluginRecord>,
}

impl Bridge {
    pub(super) fn new(ctx: Arc<BridgeContext>, plugin: Arc<PluginRecord>) -> Self {
        Self { ctx, plugin }
    }

    pub fn plugin(&self) -> &PluginRecord {
        &self.plugin
    }

    pub fn context(&self) -> &Arc<BridgeContext> {
        &self.ctx
    }

    /// Whether this bridge handles `id` at all.
    pub fn filter(&self, id: &str) -> bool {
        self.ctx.filter().accepts(id)
    }

    /// Resolve an import request to a loadable id.
    pub fn resolve_id(&self, id: &str) -> Option<String> {
        if !self.filter(id) {
            return None;
        }
        let options = self.plugin.options();
        let rules = ResolveRules {
            extensions: &self.ctx.config().resolve.extensions,
            formation_suffix: options.formation_suffix(),
        };
        let analyzer = self.ctx.registry().analyzer();
        Some(resolve_id(id, rules, |request| analyzer.resolve_file(request)))
    }

    /// Produce the code for `id`. `Ok(None)` when the id is not ours.
    pub async fn load(&self, id: &str) -> Result<Option<LoadOutput>> {
        if !self.filter(id) {
            return Ok(None);
        }
        let descriptor = parse_resource(id, &self.ctx.config().resolve);
        let path = normalize_path(&descriptor.path);
        let registry = self.ctx.registry();

        let (compilation, readiness) = registry.ready_tracked(&path).await?;
        compilation.mark_seen(Observer::Pipeline(self.plugin.id), compilation.revision());
        if readiness == Readiness::Analysed && !compilation.is_description_only() {
            self.ctx.cross_build(&path).await;
        }

        match resolve_scope(self.ctx.plugins(), self.plugin.id, &path) {
            Resolution::Owned => {}
            Resolution::Excluded { .. } => {
                debug!("scope"; "{} excluded from `{}`", display_path(&path), self.plugin.name);
                return Ok(Some(LoadOutput::code(inert_stub(&path, &self.plugin.name))));
            }
            Resolution::ServerAggregate { .. } => {
                let locals =
                    Propagator::new(registry, self.ctx.plugins(), self.ctx.watches())
                        .local_dependencies(&path)
                        .await;
                return Ok(Some(LoadOutput::code(server_stub(&locals))));
            }
        }

        if let Some(action) = hook_action(&descriptor) {
            return self
                .call_hook(&compilation, &descriptor, &action)
                .await
                .map(Some);
        }

        let request = match descriptor.selector() {
            Some(selector) if descriptor.request_type().is_none() => {
                BuildRequest::selector(selector)
            }
            _ => BuildRequest::full(),
        };
        let built = Orchestrator::new(registry)
            .build(&path, &self.plugin, request, &descriptor.raw_id)
            .await?;

        self.track_depend_files(&path, &built.result);
        if descriptor.request_type().is_none() && self.ctx.plugins().is_shared() {
            self.watch_server_dependencies(&compilation);
        }

        let production = self.ctx.config().style_production();
        let preprocessor = self.ctx.preprocessor().cloned();
        let extracted = Extractor::new(&self.ctx.config().style, production, preprocessor)
            .extract(&built.result, &descriptor)
            .await?;

        Ok(Some(LoadOutput {
            code: extracted.code,
            map: extracted.map,
            warnings: built.warnings.iter().map(ToString::to_string).collect(),
        }))
    }

    /// Transform hook: empty code from the host means "load it yourself".
    pub async fn transform(&self, code: &str, id: &str) -> Result<Option<LoadOutput>> {
        if !self.filter(id) || !code.is_empty() {
            return Ok(None);
        }
        self.load(id).await
    }

    /// Hot-update hook. `None` when hot update is off or the file is not ours.
    pub async fn handle_hot_update(
        &self,
        file: &Path,
        source: &str,
        graph: &dyn ModuleGraph,
    ) -> Option<HotUpdate> {
        if !self.ctx.config().hot_enabled() || !self.filter(&file.to_string_lossy()) {
            return None;
        }
        let options = self.plugin.options();
        let coordinator = Coordinator::new(
            self.ctx.registry(),
            self.ctx.plugins(),
            self.plugin.id,
            options.formation_suffix(),
        );
        Some(coordinator.update(file, source, graph).await)
    }

    /// Routes declared by `file`. Only the main pipeline can be route-aware.
    pub async fn routes(&self, file: &Path) -> Result<Option<Vec<Route>>> {
        if !self.plugin.main
            || !self.plugin.has(Capability::Routes)
            || !self.filter(&file.to_string_lossy())
        {
            return Ok(None);
        }
        let compilation = self.ctx.registry().ready(file).await?;
        let view = compilation.view().ok_or_else(|| no_analysis(&compilation))?;
        let routes = self
            .plugin
            .pipeline()
            .routes(&view)
            .await
            .map_err(|e| hook_error("routes", e))?;
        Ok(Some(routes))
    }

    /// Host config hook: the main pipeline adopts the host's `ssr` flag
    /// unless configured.
    pub fn apply_host_config(&self, ssr: Option<bool>) {
        if let Some(ssr) = ssr {
            self.ctx.plugins().main().apply_host_ssr(ssr);
        }
    }

    async fn call_hook(
        &self,
        compilation: &Compilation,
        descriptor: &ResourceDescriptor,
        action: &str,
    ) -> Result<LoadOutput> {
        let view = compilation.view().ok_or_else(|| no_analysis(compilation))?;
        let pipeline = self.plugin.pipeline();

        let code = if action == MACROS_ACTION && self.plugin.has(Capability::Macros) {
            pipeline.macros(&view).await
        } else if self.plugin.has(Capability::Hooks) {
            pipeline.call_hook(&view, action, &descriptor.query).await
        } else {
            let missing = if action == MACROS_ACTION {
                Capability::Macros
            } else {
                Capability::Hooks
            };
            return Err(BridgeError::Capability {
                pipeline: self.plugin.name.clone(),
                capability: missing.name(),
            });
        };

        let code = code.map_err(|e| hook_error(action, e))?;
        Ok(LoadOutput::code(
            code.unwrap_or_else(|| "export default null;".to_string()),
        ))
    }

    /// Register depend-file groups: directories as context dependencies,
    /// enabled existing files with the watcher.
    fn track_depend_files(&self, path: &Path, result: &BuildResult) {
        let hot = self.ctx.config().hot_enabled();
        for group in &result.depend_files {
            if hot && self.ctx.contexts().add(&group.dir, path) {
                self.ctx.watches().watch_dir(&normalize_path(&group.dir));
            }
            if group.disabled {
                continue;
            }
            for file in group.files.iter().filter(|file| file.is_file()) {
                self.ctx.watches().watch_file(&normalize_path(file));
            }
        }
    }

    /// Watch the server-scoped files this compilation imports directly.
    fn watch_server_dependencies(&self, compilation: &Compilation) {
        for dep in compilation.dependencies() {
            let dep = normalize_path(&dep);
            if self.ctx.plugins().is_server_scoped(&dep) && self.ctx.watches().watch_file(&dep) {
                debug!("deps"; "watch server file {}", display_path(&dep));
            }
        }
    }
}

/// `macro` requests become the `macros` call hook.
fn hook_action(descriptor: &ResourceDescriptor) -> Option<String> {
    if descriptor.is_macro() {
        return Some(MACROS_ACTION.to_string());
    }
    if descriptor.query.flag("callhook") {
        return descriptor.query.text("action").map(ToString::to_string);
    }
    None
}

fn hook_error(action: &str, error: PipelineError) -> BridgeError {
    BridgeError::Hook {
        action: action.to_string(),
        message: error.message,
    }
}

fn no_analysis(compilation: &Compilation) -> BridgeError {
    BridgeError::Analysis {
        path: compilation.path().to_path_buf(),
        message: "compilation has no analysis".into(),
    }
}
