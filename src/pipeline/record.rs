//! Registered pipelines.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use arc_swap::ArcSwap;
use regex::RegexSet;
use rustc_hash::FxHashMap;

use super::Pipeline;
use crate::config::{Capability, ConfigError, PipelineConfig, PipelineOptions, Target};

/// Index of a pipeline in registration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PluginId(pub usize);

/// One registered build pipeline.
pub struct PluginRecord {
    pub id: PluginId,
    pub name: String,
    pub main: bool,
    pub target: Target,
    capabilities: Vec<Capability>,
    /// `None` for catch-all pipelines.
    scope: Option<RegexSet>,
    options: ArcSwap<PipelineOptions>,
    pipeline: Arc<dyn Pipeline>,
}

impl PluginRecord {
    pub fn new(
        id: PluginId,
        config: &PipelineConfig,
        pipeline: Arc<dyn Pipeline>,
    ) -> Result<Self, regex::Error> {
        let scope = if config.scope.is_empty() {
            None
        } else {
            Some(RegexSet::new(&config.scope)?)
        };
        Ok(Self {
            id,
            name: config.name.clone(),
            main: config.main,
            target: config.target,
            capabilities: config.capabilities.clone(),
            scope,
            options: ArcSwap::from_pointee(config.options.clone()),
            pipeline,
        })
    }

    pub fn pipeline(&self) -> &Arc<dyn Pipeline> {
        &self.pipeline
    }

    pub fn has(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }

    pub fn is_catch_all(&self) -> bool {
        self.scope.is_none()
    }

    /// Whether an explicit scope pattern matches `path`.
    pub fn claims(&self, path: &Path) -> bool {
        self.scope
            .as_ref()
            .is_some_and(|set| set.is_match(&path.to_string_lossy()))
    }

    pub fn options(&self) -> Arc<PipelineOptions> {
        self.options.load_full()
    }

    /// Copy the host's `ssr` flag into the options unless already set.
    pub fn apply_host_ssr(&self, ssr: bool) {
        self.options.rcu(|current| {
            let mut next = PipelineOptions::clone(current);
            if next.ssr.is_none() {
                next.ssr = Some(ssr);
            }
            next
        });
    }
}

impl fmt::Debug for PluginRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginRecord")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("main", &self.main)
            .field("target", &self.target)
            .field("capabilities", &self.capabilities)
            .field("catch_all", &self.is_catch_all())
            .finish()
    }
}

/// All registered pipelines, in registration order.
#[derive(Debug)]
pub struct PluginSet {
    records: Vec<Arc<PluginRecord>>,
    main: PluginId,
}

impl PluginSet {
    /// Bind configured pipelines to host-supplied implementations.
    ///
    /// Every configured name needs an implementation; exactly one entry must
    /// be `main` (checked by config validation, re-checked here).
    pub fn bind(
        configs: &[PipelineConfig],
        mut implementations: FxHashMap<String, Arc<dyn Pipeline>>,
    ) -> Result<Self, ConfigError> {
        let mut records = Vec::with_capacity(configs.len());
        let mut main = None;

        for (index, config) in configs.iter().enumerate() {
            let pipeline = implementations.remove(&config.name).ok_or_else(|| {
                ConfigError::Validation(format!(
                    "pipeline `{}` is configured but no implementation was supplied",
                    config.name
                ))
            })?;
            let record = PluginRecord::new(PluginId(index), config, pipeline).map_err(|e| {
                ConfigError::Validation(format!("pipeline `{}` scope: {e}", config.name))
            })?;
            if record.main {
                main = Some(record.id);
            }
            records.push(Arc::new(record));
        }

        if let Some(name) = implementations.keys().next() {
            crate::log!("warn"; "pipeline `{}` supplied but not configured", name);
        }

        let main = main.ok_or_else(|| ConfigError::Validation("no main pipeline".into()))?;
        Ok(Self { records, main })
    }

    pub fn main(&self) -> &Arc<PluginRecord> {
        &self.records[self.main.0]
    }

    pub fn get(&self, id: PluginId) -> Option<&Arc<PluginRecord>> {
        self.records.get(id.0)
    }

    pub fn by_name(&self, name: &str) -> Option<&Arc<PluginRecord>> {
        self.records.iter().find(|record| record.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<PluginRecord>> {
        self.records.iter()
    }

    /// Auxiliary pipelines (everything but main).
    pub fn cross(&self) -> impl Iterator<Item = &Arc<PluginRecord>> {
        self.records.iter().filter(|record| !record.main)
    }

    /// More than one pipeline cooperates in this session.
    pub fn is_shared(&self) -> bool {
        self.records.len() > 1
    }

    /// The pipeline owning `path`.
    ///
    /// Explicit scopes are checked in registration order and the first match
    /// wins. Unclaimed files go to a catch-all pipeline, preferring main, and
    /// to main when there is no catch-all.
    pub fn owner(&self, path: &Path) -> &Arc<PluginRecord> {
        if let Some(record) = self.records.iter().find(|record| record.claims(path)) {
            return record;
        }
        let main = self.main();
        if main.is_catch_all() {
            return main;
        }
        self.records
            .iter()
            .find(|record| record.is_catch_all())
            .unwrap_or(main)
    }

    pub fn in_scope(&self, plugin: PluginId, path: &Path) -> bool {
        self.owner(path).id == plugin
    }

    /// Owned by a server-target pipeline.
    pub fn is_server_scoped(&self, path: &Path) -> bool {
        self.owner(path).target == Target::Server
    }
}
