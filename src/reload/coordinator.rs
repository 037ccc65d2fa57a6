//! Hot update coordination.
//!
//! On a change notification: compare the new text with the text this
//! requester last acted on, re-parse, diff section snapshots and pick the dependent modules to
//! invalidate. Server-scoped files skip the diff and invalidate the local
//! modules importing them instead.

use std::path::{Path, PathBuf};

use serde::Serialize;

use super::classify::{ModuleTag, SectionChange};
use crate::compilation::{Invalidation, Observer, Registry, WatchState};
use crate::diagnostic::{Diagnostic, partition};
use crate::logger::{status_error, status_success, status_unchanged, status_warning};
use crate::pipeline::{PluginId, PluginSet};
use crate::resource::formation_key;
use crate::utils::path::{display_path, normalize_path};
use crate::{debug, log};

/// A module in the host's module graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleNode {
    /// Module id (file path, possibly with query).
    pub id: String,
    /// Request url, carrying the query tags used for classification.
    pub url: String,
}

impl ModuleNode {
    pub fn new(id: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
        }
    }
}

/// Read access to the host's file → modules index.
pub trait ModuleGraph: Send + Sync {
    fn modules_for_file(&self, file: &Path) -> Vec<ModuleNode>;
}

/// Outcome of one hot update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HotUpdate {
    /// Content identical to the cached source; nothing to do.
    Unchanged,
    Updated {
        modules: Vec<ModuleNode>,
        /// Only markup changed.
        render_only: bool,
    },
    /// The re-parse failed; the host falls back to its default handling.
    Failed { diagnostics: Vec<Diagnostic> },
}

impl HotUpdate {
    pub fn modules(&self) -> &[ModuleNode] {
        match self {
            Self::Updated { modules, .. } => modules,
            _ => &[],
        }
    }
}

/// Per-requester hot-update logic.
pub struct Coordinator<'a> {
    registry: &'a Registry,
    plugins: &'a PluginSet,
    requester: PluginId,
    formation_suffix: Option<&'a str>,
}

impl<'a> Coordinator<'a> {
    pub fn new(
        registry: &'a Registry,
        plugins: &'a PluginSet,
        requester: PluginId,
        formation_suffix: Option<&'a str>,
    ) -> Self {
        Self {
            registry,
            plugins,
            requester,
            formation_suffix,
        }
    }

    pub async fn update(&self, file: &Path, source: &str, graph: &dyn ModuleGraph) -> HotUpdate {
        let file = normalize_path(file);
        let compilation = self.registry.get_or_create(&file);
        let observer = Observer::Pipeline(self.requester);
        let observation = self.registry.observe(&file, source, observer);
        let previous = observation.previous;

        if observation.change == Invalidation::Unchanged {
            status_unchanged(&display_path(&file));
            return HotUpdate::Unchanged;
        }

        if self.plugins.is_server_scoped(&file) {
            let modules = self.server_dependents(&file, graph);
            status_success(&format!(
                "server file {} ({} modules)",
                display_path(&file),
                modules.len()
            ));
            return HotUpdate::Updated {
                modules,
                render_only: false,
            };
        }

        compilation.set_watch_state(WatchState::Dirty);
        let compilation = match self.registry.ready(&file).await {
            Ok(compilation) => compilation,
            Err(e) => {
                status_error(&format!("hot update failed: {}", display_path(&file)), &e.to_string());
                return HotUpdate::Failed {
                    diagnostics: vec![Diagnostic::error(e.to_string()).in_file(&file)],
                };
            }
        };

        let Some(view) = compilation.view() else {
            return HotUpdate::Failed {
                diagnostics: Vec::new(),
            };
        };
        let diagnostics = partition(view.diagnostics());
        if diagnostics.has_errors() || view.tree().is_none() {
            for error in &diagnostics.errors {
                log!("error"; "{}", error);
            }
            diagnostics.log_warnings();
            status_error(
                &format!("hot update failed: {}", display_path(&file)),
                &diagnostics.error_message(),
            );
            return HotUpdate::Failed {
                diagnostics: view.diagnostics().to_vec(),
            };
        }
        for warning in diagnostics.warning_messages() {
            status_warning(&warning);
        }

        let change = SectionChange::between(previous.as_deref(), &view.sections);
        debug!("hot"; "{} {:?}", display_path(&file), change);

        let key = self.module_key(&file);
        let modules: Vec<ModuleNode> = graph
            .modules_for_file(&key)
            .into_iter()
            .filter(|module| change.invalidates(ModuleTag::of_url(&module.url)))
            .collect();
        compilation.set_watch_state(WatchState::Clean);
        compilation.mark_seen(observer, view.revision);

        let render_only = change.render_only();
        status_success(&format!(
            "{} ({} modules{})",
            display_path(&file),
            modules.len(),
            if render_only { ", render only" } else { "" }
        ));
        HotUpdate::Updated {
            modules,
            render_only,
        }
    }

    /// File key under which the host indexes the modules of `file`.
    fn module_key(&self, file: &Path) -> PathBuf {
        match self.formation_suffix {
            Some(suffix) => formation_key(file, suffix),
            None => file.to_path_buf(),
        }
    }

    /// Modules of local, non-description compilations in the requester's
    /// scope that import `file`. Only modules whose id is the importing file
    /// itself are returned.
    fn server_dependents(&self, file: &Path, graph: &dyn ModuleGraph) -> Vec<ModuleNode> {
        let mut modules = Vec::new();
        for dependent in self.registry.dependents(file) {
            if dependent == file
                || self.plugins.is_server_scoped(&dependent)
                || !self.plugins.in_scope(self.requester, &dependent)
            {
                continue;
            }
            let Some(compilation) = self.registry.get(&dependent) else {
                continue;
            };
            if compilation.is_description_only() {
                continue;
            }
            let id = dependent.to_string_lossy();
            modules.extend(
                graph
                    .modules_for_file(&dependent)
                    .into_iter()
                    .filter(|module| module.id == id),
            );
        }
        modules
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{PipelineConfig, Target};
    use crate::pipeline::Pipeline;
    use crate::testing::{MemoryGraph, RecordingPipeline, ScriptedAnalyzer};
    use rustc_hash::FxHashMap;
    use std::sync::Arc;

    const APP: &str = "/app/client/App.es";

    fn plugin_set(with_server: bool) -> PluginSet {
        let mut main = PipelineConfig::new("client");
        main.main = true;
        let mut configs = vec![main];
        if with_server {
            let mut server = PipelineConfig::new("server");
            server.scope = vec!["/server/".into()];
            server.target = Target::Server;
            configs.push(server);
        }
        let implementations: FxHashMap<String, Arc<dyn Pipeline>> = configs
            .iter()
            .map(|c| {
                let p: Arc<dyn Pipeline> = Arc::new(RecordingPipeline::new(&c.name));
                (c.name.clone(), p)
            })
            .collect();
        PluginSet::bind(&configs, implementations).unwrap()
    }

    fn app_graph() -> MemoryGraph {
        let graph = MemoryGraph::new();
        graph.add(APP, APP, APP);
        graph.add(APP, &format!("{APP}?vue&type=style&index=0"), &format!("{APP}?vue&type=style&index=0"));
        graph.add(APP, &format!("{APP}?vue&macro=true"), &format!("{APP}?vue&macro=true"));
        graph.add(APP, &format!("{APP}?direct"), &format!("{APP}?direct"));
        graph
    }

    async fn primed(registry: &Registry, source: &str) {
        registry.invalidate(Path::new(APP), source);
        registry.ready(Path::new(APP)).await.unwrap();
    }

    fn ids(update: &HotUpdate) -> Vec<String> {
        update.modules().iter().map(|m| m.url.clone()).collect()
    }

    #[tokio::test]
    async fn test_unchanged_source() {
        let registry = Registry::new(Arc::new(ScriptedAnalyzer::new()));
        let plugins = plugin_set(false);
        primed(&registry, "let a;\n<x/>").await;

        let update = Coordinator::new(&registry, &plugins, PluginId(0), None)
            .update(Path::new(APP), "let a;\n<x/>", &app_graph())
            .await;
        assert_eq!(update, HotUpdate::Unchanged);
        assert_eq!(registry.analyses(), 1);
    }

    #[tokio::test]
    async fn test_markup_change_is_render_only() {
        let registry = Registry::new(Arc::new(ScriptedAnalyzer::new()));
        let plugins = plugin_set(false);
        primed(&registry, "let a;\n<x/>").await;

        let update = Coordinator::new(&registry, &plugins, PluginId(0), None)
            .update(Path::new(APP), "let a;\n<y/>", &app_graph())
            .await;
        assert_eq!(ids(&update), vec![APP.to_string()]);
        assert!(matches!(update, HotUpdate::Updated { render_only: true, .. }));
        assert_eq!(
            registry.get(Path::new(APP)).unwrap().watch_state(),
            WatchState::Clean
        );
    }

    #[tokio::test]
    async fn test_style_change() {
        let registry = Registry::new(Arc::new(ScriptedAnalyzer::new()));
        let plugins = plugin_set(false);
        primed(&registry, "let a;\n<style>.a{}</style>").await;

        let update = Coordinator::new(&registry, &plugins, PluginId(0), None)
            .update(Path::new(APP), "let a;\n<style>.b{}</style>", &app_graph())
            .await;
        assert_eq!(ids(&update), vec![format!("{APP}?vue&type=style&index=0")]);
        assert!(matches!(update, HotUpdate::Updated { render_only: false, .. }));
    }

    #[tokio::test]
    async fn test_script_change() {
        let registry = Registry::new(Arc::new(ScriptedAnalyzer::new()));
        let plugins = plugin_set(false);
        primed(&registry, "let a;\n<x/>").await;

        let update = Coordinator::new(&registry, &plugins, PluginId(0), None)
            .update(Path::new(APP), "let b;\n<x/>", &app_graph())
            .await;
        assert_eq!(
            ids(&update),
            vec![APP.to_string(), format!("{APP}?vue&macro=true")]
        );
    }

    #[tokio::test]
    async fn test_first_update_invalidates_all_but_direct() {
        let registry = Registry::new(Arc::new(ScriptedAnalyzer::new()));
        let plugins = plugin_set(false);

        let update = Coordinator::new(&registry, &plugins, PluginId(0), None)
            .update(Path::new(APP), "let a;", &app_graph())
            .await;
        assert_eq!(update.modules().len(), 3);
    }

    #[tokio::test]
    async fn test_parse_errors_fail_update() {
        let registry = Registry::new(Arc::new(ScriptedAnalyzer::new()));
        let plugins = plugin_set(false);
        primed(&registry, "let a;").await;

        let update = Coordinator::new(&registry, &plugins, PluginId(0), None)
            .update(Path::new(APP), "@error unexpected token", &app_graph())
            .await;
        match update {
            HotUpdate::Failed { diagnostics } => {
                assert_eq!(diagnostics.len(), 1);
                assert_eq!(diagnostics[0].message, "unexpected token");
            }
            other => panic!("expected failure, got {other:?}"),
        }
        assert_eq!(
            registry.get(Path::new(APP)).unwrap().watch_state(),
            WatchState::Dirty
        );
    }

    #[tokio::test]
    async fn test_formation_key() {
        let registry = Registry::new(Arc::new(ScriptedAnalyzer::new()));
        let plugins = plugin_set(false);
        primed(&registry, "let a;").await;
        let graph = MemoryGraph::new();
        graph.add(&format!("{APP}.vue"), &format!("{APP}.vue"), &format!("{APP}.vue"));

        let update = Coordinator::new(&registry, &plugins, PluginId(0), Some(".vue"))
            .update(Path::new(APP), "let b;", &graph)
            .await;
        assert_eq!(ids(&update), vec![format!("{APP}.vue")]);
    }

    #[tokio::test]
    async fn test_server_file_invalidates_local_importers() {
        let registry = Registry::new(Arc::new(ScriptedAnalyzer::new()));
        let plugins = plugin_set(true);
        let api = "/app/server/Api.es";
        let types = "/app/client/Types.d.es";

        registry.invalidate(Path::new(APP), "import \"/app/server/Api.es\";");
        registry.invalidate(Path::new(types), "import \"/app/server/Api.es\";");
        registry.invalidate(Path::new("/app/server/Db.es"), "import \"./Api.es\";");
        registry.invalidate(Path::new(api), "let api;");
        for path in [APP, types, "/app/server/Db.es", api] {
            registry.ready(Path::new(path)).await.unwrap();
        }

        let graph = app_graph();
        graph.add(types, types, types);
        let update = Coordinator::new(&registry, &plugins, PluginId(0), None)
            .update(Path::new(api), "let api = 2;", &graph)
            .await;
        assert_eq!(ids(&update), vec![APP.to_string()]);
    }
}
