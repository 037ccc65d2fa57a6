//! Session context shared by every bridge hook.
//!
//! Owns the registry, the bound pipelines and the watch bookkeeping. Built
//! once per host session; dropping the last handle releases every
//! compilation.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use super::hooks::Bridge;
use crate::analyzer::Analyzer;
use crate::asset::StylePreprocessor;
use crate::build::Orchestrator;
use crate::compilation::registry::read_source;
use crate::compilation::{Invalidation, Observer, Registry};
use crate::config::{BridgeConfig, ConfigError};
use crate::error::Result;
use crate::pipeline::{BuildRequest, Pipeline, PluginSet};
use crate::resource::Filter;
use crate::utils::path::{display_path, normalize_path};
use crate::watch::watcher::NotifyReceiver;
use crate::watch::{ContextDependencies, FsWatcher, Session, WatchSet, WatchSink};
use crate::{debug, log};

/// Everything a bridge hook needs, owned in one place.
pub struct BridgeContext {
    config: BridgeConfig,
    filter: Filter,
    registry: Registry,
    plugins: PluginSet,
    preprocessor: Option<Arc<dyn StylePreprocessor>>,
    /// Host watch registrations (depend files, server dependencies).
    watches: WatchSet,
    /// Files built by cross pipelines; only with `hot.watch`.
    cross_watches: Option<WatchSet>,
    /// Events of the bridge-owned watcher, until a session takes them.
    session_rx: Mutex<Option<NotifyReceiver>>,
    contexts: ContextDependencies,
}

/// Collects the host-supplied collaborators before binding.
pub struct BridgeBuilder {
    config: BridgeConfig,
    analyzer: Arc<dyn Analyzer>,
    pipelines: FxHashMap<String, Arc<dyn Pipeline>>,
    preprocessor: Option<Arc<dyn StylePreprocessor>>,
    sink: Option<Arc<dyn WatchSink>>,
    cross_sink: Option<Arc<dyn WatchSink>>,
}

impl BridgeBuilder {
    /// Supply the implementation of the `[[pipeline]]` entry called `name`.
    pub fn pipeline(mut self, name: impl Into<String>, pipeline: Arc<dyn Pipeline>) -> Self {
        self.pipelines.insert(name.into(), pipeline);
        self
    }

    pub fn preprocessor(mut self, preprocessor: Arc<dyn StylePreprocessor>) -> Self {
        self.preprocessor = Some(preprocessor);
        self
    }

    pub fn watch_sink(mut self, sink: Arc<dyn WatchSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Receiver of cross-pipeline watch registrations. Without one, `hot.watch`
    /// starts a notify watcher owned by the bridge.
    pub fn cross_watch_sink(mut self, sink: Arc<dyn WatchSink>) -> Self {
        self.cross_sink = Some(sink);
        self
    }

    /// Validate the configuration and bind every pipeline.
    pub fn build(self) -> Result<Arc<BridgeContext>, ConfigError> {
        self.config.validate()?;
        let filter = self.config.filter.build().map_err(|e| {
            ConfigError::Validation(format!("filter pattern does not compile: {e}"))
        })?;
        let plugins = PluginSet::bind(&self.config.pipelines, self.pipelines)?;

        let mut session_rx = None;
        let cross_watches = match (self.config.hot.watch, self.cross_sink) {
            (false, _) => None,
            (true, Some(sink)) => Some(WatchSet::new(Some(sink))),
            (true, None) => {
                let (watcher, rx) = FsWatcher::new().map_err(|e| {
                    ConfigError::Validation(format!("`hot.watch` cannot start a watcher: {e}"))
                })?;
                session_rx = Some(rx);
                let sink: Arc<dyn WatchSink> = Arc::new(watcher);
                Some(WatchSet::new(Some(sink)))
            }
        };

        debug!(
            "bridge";
            "{} pipeline(s), main `{}`",
            plugins.iter().count(),
            plugins.main().name
        );
        Ok(Arc::new(BridgeContext {
            config: self.config,
            filter,
            registry: Registry::new(self.analyzer),
            plugins,
            preprocessor: self.preprocessor,
            watches: WatchSet::new(self.sink),
            cross_watches,
            session_rx: Mutex::new(session_rx),
            contexts: ContextDependencies::new(),
        }))
    }
}

impl BridgeContext {
    pub fn builder(config: BridgeConfig, analyzer: Arc<dyn Analyzer>) -> BridgeBuilder {
        BridgeBuilder {
            config,
            analyzer,
            pipelines: FxHashMap::default(),
            preprocessor: None,
            sink: None,
            cross_sink: None,
        }
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn filter(&self) -> &Filter {
        &self.filter
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn plugins(&self) -> &PluginSet {
        &self.plugins
    }

    pub fn preprocessor(&self) -> Option<&Arc<dyn StylePreprocessor>> {
        self.preprocessor.as_ref()
    }

    pub fn watches(&self) -> &WatchSet {
        &self.watches
    }

    pub fn cross_watches(&self) -> Option<&WatchSet> {
        self.cross_watches.as_ref()
    }

    /// Session draining the bridge-owned watcher. `Some` once, and only when
    /// `hot.watch` started that watcher.
    pub fn watch_session(self: &Arc<Self>) -> Option<Session> {
        let rx = self.session_rx.lock().take()?;
        Some(Session::new(Arc::clone(self), rx))
    }

    pub fn contexts(&self) -> &ContextDependencies {
        &self.contexts
    }

    /// Host-facing hooks for the pipeline called `name`.
    pub fn bridge(self: &Arc<Self>, name: &str) -> Option<Bridge> {
        let plugin = self.plugins.by_name(name)?;
        Some(Bridge::new(Arc::clone(self), Arc::clone(plugin)))
    }

    /// Host-facing hooks for the main pipeline.
    pub fn main_bridge(self: &Arc<Self>) -> Bridge {
        Bridge::new(Arc::clone(self), Arc::clone(self.plugins.main()))
    }

    /// Build `path` with every auxiliary pipeline owning it.
    ///
    /// Failures are logged; the names of the pipelines that built are returned.
    pub async fn cross_build(&self, path: &Path) -> Vec<String> {
        let mut built = Vec::new();
        let orchestrator = Orchestrator::new(&self.registry);
        let resource = display_path(path);

        for plugin in self.plugins.cross() {
            if !self.plugins.in_scope(plugin.id, path) {
                continue;
            }
            match orchestrator
                .build(path, plugin, BuildRequest::full(), &resource)
                .await
            {
                Ok(output) => {
                    output.compilation.mark_seen(Observer::Watcher, output.revision);
                    if let Some(watches) = &self.cross_watches
                        && watches.watch_file(path)
                    {
                        debug!("cross"; "watch {}", resource);
                    }
                    built.push(plugin.name.clone());
                }
                Err(e) => log!("cross"; "{} failed in `{}`: {}", resource, plugin.name, e),
            }
        }
        built
    }

    /// React to a watched file's content change.
    ///
    /// The file is re-read; when its text differs from what the watcher last
    /// built it is re-analysed and rebuilt by every auxiliary pipeline in scope. Unknown and
    /// description-only files are ignored.
    pub async fn rebuild_changed(&self, path: &Path) -> Result<Vec<String>> {
        let path = normalize_path(path);
        let Some(compilation) = self.registry.get(&path) else {
            return Ok(Vec::new());
        };
        if compilation.is_description_only() {
            return Ok(Vec::new());
        }

        let source = read_source(&path).await?;
        let observation = self.registry.observe(&path, &source, Observer::Watcher);
        if observation.change == Invalidation::Unchanged {
            debug!("cross"; "{} unchanged", display_path(&path));
            return Ok(Vec::new());
        }
        Ok(self.cross_build(&path).await)
    }

    /// Compilations depending on the listing of the directory containing `path`.
    pub fn context_change(&self, path: &Path) -> Option<Vec<PathBuf>> {
        self.contexts.affected(path)
    }

    /// Release every compilation's analyzer resources.
    pub fn dispose(&self) {
        self.registry.dispose();
    }
}
