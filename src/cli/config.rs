//! `ease-bridge config`: validate `bridge.toml` and show pipeline ownership.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use ease_bridge::compilation::CompilationView;
use ease_bridge::config::{BridgeConfig, Capability};
use ease_bridge::pipeline::{BuildOutput, BuildRequest, Pipeline, PipelineError, PluginSet};
use ease_bridge::utils::path::normalize_path;
use owo_colors::OwoColorize;
use rustc_hash::FxHashMap;

/// Stands in for a host pipeline so ownership can be computed offline.
struct Unbound;

#[async_trait]
impl Pipeline for Unbound {
    async fn build(
        &self,
        _unit: &CompilationView,
        _request: &BuildRequest,
    ) -> Result<Option<BuildOutput>, PipelineError> {
        Err(PipelineError::new("no pipeline bound in tooling mode"))
    }
}

pub fn run(config: &BridgeConfig, owners: &[PathBuf]) -> Result<()> {
    if config.config_path.as_os_str().is_empty() {
        println!("{}", "no config file, showing defaults".dimmed());
    } else {
        println!("{} {}", "config".bold(), config.config_path.display());
    }
    println!(
        "hot: {}  style production: {}",
        config.hot_enabled(),
        config.style_production()
    );

    if config.pipelines.is_empty() {
        println!("{}", "no pipelines configured".yellow());
        return Ok(());
    }

    for pipeline in &config.pipelines {
        let marker = if pipeline.main { "*" } else { " " };
        let scope = if pipeline.scope.is_empty() {
            "(catch-all)".to_string()
        } else {
            pipeline.scope.join(", ")
        };
        let capabilities: Vec<&str> = pipeline
            .capabilities
            .iter()
            .copied()
            .map(Capability::name)
            .collect();
        println!(
            "{} {:<16} {:<7} {}  [{}]",
            marker.green(),
            pipeline.name.bold(),
            format!("{:?}", pipeline.target).to_lowercase(),
            scope,
            capabilities.join(", ")
        );
    }

    if owners.is_empty() {
        return Ok(());
    }

    let implementations: FxHashMap<String, Arc<dyn Pipeline>> = config
        .pipelines
        .iter()
        .map(|p| (p.name.clone(), Arc::new(Unbound) as Arc<dyn Pipeline>))
        .collect();
    let plugins = PluginSet::bind(&config.pipelines, implementations)?;
    println!();
    for file in owners {
        print_owner(&plugins, file);
    }
    Ok(())
}

fn print_owner(plugins: &PluginSet, file: &Path) {
    let path = normalize_path(file);
    let owner = plugins.owner(&path);
    let note = if plugins.is_server_scoped(&path) {
        " (server)"
    } else {
        ""
    };
    println!("{} -> {}{}", path.display(), owner.name.cyan(), note);
}
