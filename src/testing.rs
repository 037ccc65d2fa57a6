//! Test doubles for the external collaborators.
//!
//! The scripted analyzer understands a tiny source dialect:
//!
//! - `import "<path>";` adds a dependency (`./`/`../` relative to the file)
//! - `<tag .../>` is a markup block
//! - `<style ...>...</style>` is a style block, `scoped` / `scoped="false"`
//! - `@error <msg>` / `@warn <msg>` lines raise diagnostics
//! - `@throw <msg>` makes the analysis itself fail
//!
//! Files ending in `.d.es` are description-only.

use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use regex::Regex;
use rustc_hash::FxHashMap;

use crate::analyzer::{Analysis, Analyzer, AnalyzerFailure, SourceBlock};
use crate::asset::{StyleOutput, StylePreprocessor, StyleRequest};
use crate::build::{Asset, BuildResult};
use crate::compilation::CompilationView;
use crate::config::{PipelineConfig, PipelineOptions};
use crate::diagnostic::Diagnostic;
use crate::pipeline::{
    BuildOutput, BuildRequest, Pipeline, PipelineError, PluginId, PluginRecord, Route,
};
use crate::reload::{ModuleGraph, ModuleNode};
use crate::resource::Query;
use crate::utils::path::{clean_path, display_path};
use crate::watch::WatchSink;

static IMPORT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"import\s+"([^"]+)";"#).unwrap());
static STYLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<style([^>]*)>.*?</style>").unwrap());
static MARKUP_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[A-Za-z][^<>]*/>").unwrap());
static SCOPED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\bscoped(?:="([^"]*)")?"#).unwrap());

// ============================================================================
// Analyzer
// ============================================================================

#[derive(Default)]
pub struct ScriptedAnalyzer {
    delay: Option<Duration>,
    resolutions: FxHashMap<String, PathBuf>,
    released: Mutex<Vec<PathBuf>>,
}

impl ScriptedAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn with_resolution(mut self, request: &str, file: impl Into<PathBuf>) -> Self {
        self.resolutions.insert(request.to_string(), file.into());
        self
    }

    pub fn released(&self) -> Vec<PathBuf> {
        self.released.lock().clone()
    }
}

#[async_trait]
impl Analyzer for ScriptedAnalyzer {
    async fn analyze(&self, path: &Path, source: &str) -> Result<Analysis, AnalyzerFailure> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let mut analysis = Analysis {
            description_only: path.to_string_lossy().ends_with(".d.es"),
            ..Analysis::default()
        };

        for line in source.lines() {
            let line = line.trim();
            if let Some(message) = line.strip_prefix("@throw") {
                return Err(AnalyzerFailure(message.trim().to_string()));
            } else if let Some(message) = line.strip_prefix("@error ") {
                analysis
                    .diagnostics
                    .push(Diagnostic::error(message.trim()).in_file(path));
            } else if let Some(message) = line.strip_prefix("@warn ") {
                analysis
                    .diagnostics
                    .push(Diagnostic::warn(message.trim()).in_file(path));
            }
        }

        for capture in IMPORT_RE.captures_iter(source) {
            if let Some(dep) = self.resolve_import(path, &capture[1]) {
                analysis.dependencies.push(dep);
            }
        }

        let mut styles = Vec::new();
        for capture in STYLE_RE.captures_iter(source) {
            let Some(whole) = capture.get(0) else {
                continue;
            };
            let scoped = SCOPED_RE
                .captures(&capture[1])
                .map(|attr| attr.get(1).is_none_or(|value| value.as_str() != "false"));
            styles.push(whole.range());
            analysis
                .blocks
                .push(SourceBlock::style(whole.range(), scoped));
        }
        for found in MARKUP_RE.find_iter(source) {
            let inside_style = styles
                .iter()
                .any(|style| style.start <= found.start() && found.end() <= style.end);
            if !inside_style {
                analysis.blocks.push(SourceBlock::markup(found.range()));
            }
        }

        if !analysis.diagnostics.iter().any(Diagnostic::is_error) {
            analysis.tree = Some(Arc::new(source.to_string()));
        }
        Ok(analysis)
    }

    fn resolve_file(&self, request: &str) -> Option<PathBuf> {
        self.resolutions.get(request).cloned()
    }

    fn release(&self, path: &Path) {
        self.released.lock().push(path.to_path_buf());
    }
}

impl ScriptedAnalyzer {
    fn resolve_import(&self, file: &Path, request: &str) -> Option<PathBuf> {
        if request.starts_with("./") || request.starts_with("../") {
            let dir = file.parent().unwrap_or(Path::new("/"));
            Some(clean_path(&dir.join(request)))
        } else if Path::new(request).is_absolute() {
            Some(PathBuf::from(request))
        } else {
            self.resolutions.get(request).cloned()
        }
    }
}

// ============================================================================
// Pipeline
// ============================================================================

/// What the next [`RecordingPipeline`] build does.
#[derive(Debug, Clone, Default)]
pub enum Behavior {
    /// Code plus one style asset per style section, raw source attached.
    #[default]
    Build,
    /// Like `Build`, with a WARN diagnostic.
    Warn(String),
    /// `Ok(None)`.
    Nothing,
    /// `Err(PipelineError)`.
    Fail(String),
    /// Result with an ERROR diagnostic.
    Error(String),
    Panic,
    Result(BuildResult),
}

pub struct RecordingPipeline {
    name: String,
    delay: Option<Duration>,
    behavior: Mutex<Behavior>,
    builds: Mutex<Vec<(PathBuf, Option<String>)>>,
    options: Mutex<Option<Arc<PipelineOptions>>>,
    cleared: Mutex<Vec<PathBuf>>,
    hooks: Mutex<Vec<String>>,
}

impl RecordingPipeline {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            delay: None,
            behavior: Mutex::new(Behavior::default()),
            builds: Mutex::new(Vec::new()),
            options: Mutex::new(None),
            cleared: Mutex::new(Vec::new()),
            hooks: Mutex::new(Vec::new()),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_behavior(&self, behavior: Behavior) {
        *self.behavior.lock() = behavior;
    }

    pub fn builds(&self) -> Vec<(PathBuf, Option<String>)> {
        self.builds.lock().clone()
    }

    pub fn built_paths(&self) -> Vec<PathBuf> {
        self.builds.lock().iter().map(|(path, _)| path.clone()).collect()
    }

    /// Options handed to the most recent build.
    pub fn last_options(&self) -> Option<Arc<PipelineOptions>> {
        self.options.lock().clone()
    }

    pub fn cleared(&self) -> Vec<PathBuf> {
        self.cleared.lock().clone()
    }

    /// Actions received through `macros` and `call_hook`.
    pub fn hooks(&self) -> Vec<String> {
        self.hooks.lock().clone()
    }

    fn default_result(&self, unit: &CompilationView) -> BuildResult {
        let mut result = BuildResult::new(format!(
            "/*{}*/export default \"{}\";",
            self.name,
            display_path(&unit.path)
        ))
        .with_raw(unit.source.to_string());
        if !unit.sections.style.is_empty() {
            result = result.with_asset(Asset::style("0", unit.sections.style.clone()));
        }
        result
    }
}

#[async_trait]
impl Pipeline for RecordingPipeline {
    async fn build(
        &self,
        unit: &CompilationView,
        request: &BuildRequest,
    ) -> Result<Option<BuildOutput>, PipelineError> {
        self.builds
            .lock()
            .push((unit.path.clone(), request.selector.clone()));
        *self.options.lock() = Some(Arc::clone(&request.options));
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let behavior = self.behavior.lock().clone();
        match behavior {
            Behavior::Build => Ok(Some(self.default_result(unit).into())),
            Behavior::Warn(message) => Ok(Some(BuildOutput {
                result: self.default_result(unit),
                diagnostics: vec![Diagnostic::warn(message)],
            })),
            Behavior::Nothing => Ok(None),
            Behavior::Fail(message) => Err(PipelineError::new(message)),
            Behavior::Error(message) => Ok(Some(BuildOutput {
                result: self.default_result(unit),
                diagnostics: vec![Diagnostic::error(message)],
            })),
            Behavior::Panic => panic!("pipeline `{}` exploded", self.name),
            Behavior::Result(result) => Ok(Some(result.into())),
        }
    }

    async fn macros(&self, unit: &CompilationView) -> Result<Option<String>, PipelineError> {
        self.hooks.lock().push("macros".into());
        Ok(Some(format!(
            "export default {{ file: \"{}\" }};",
            display_path(&unit.path)
        )))
    }

    async fn routes(&self, unit: &CompilationView) -> Result<Vec<Route>, PipelineError> {
        let name = unit
            .path
            .file_stem()
            .map(|stem| stem.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        Ok(vec![Route {
            path: format!("/{name}"),
            file: unit.path.clone(),
            name: Some(name),
        }])
    }

    async fn call_hook(
        &self,
        _unit: &CompilationView,
        action: &str,
        query: &Query,
    ) -> Result<Option<String>, PipelineError> {
        self.hooks.lock().push(action.to_string());
        if action == "fail" {
            return Err(PipelineError::new("hook refused"));
        }
        let arg = query.text("arg").unwrap_or_default();
        Ok(Some(format!("/*{action}:{arg}*/")))
    }

    fn clear(&self, path: &Path) {
        self.cleared.lock().push(path.to_path_buf());
    }
}

/// A catch-all record around `pipeline`; id 0 is main.
pub fn plugin_record(id: usize, pipeline: Arc<RecordingPipeline>) -> PluginRecord {
    let mut config = PipelineConfig::new(pipeline.name());
    config.main = id == 0;
    PluginRecord::new(PluginId(id), &config, pipeline).unwrap()
}

// ============================================================================
// Watch sink, style preprocessor, module graph
// ============================================================================

#[derive(Default)]
pub struct RecordingSink {
    files: Mutex<Vec<PathBuf>>,
    dirs: Mutex<Vec<PathBuf>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn files(&self) -> Vec<PathBuf> {
        self.files.lock().clone()
    }

    pub fn dirs(&self) -> Vec<PathBuf> {
        self.dirs.lock().clone()
    }
}

impl WatchSink for RecordingSink {
    fn watch_file(&self, path: &Path) {
        self.files.lock().push(path.to_path_buf());
    }

    fn watch_dir(&self, dir: &Path) {
        self.dirs.lock().push(dir.to_path_buf());
    }
}

#[derive(Default)]
pub struct RecordingPreprocessor {
    requests: Mutex<Vec<StyleRequest>>,
    failure: Mutex<Option<StyleOutput>>,
}

impl RecordingPreprocessor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn requests(&self) -> Vec<StyleRequest> {
        self.requests.lock().clone()
    }

    /// Return `output` (carrying errors) from every later call.
    pub fn fail_with(&self, output: StyleOutput) {
        *self.failure.lock() = Some(output);
    }
}

#[async_trait]
impl StylePreprocessor for RecordingPreprocessor {
    async fn compile(&self, request: StyleRequest) -> StyleOutput {
        self.requests.lock().push(request.clone());
        if let Some(failure) = self.failure.lock().clone() {
            return failure;
        }
        StyleOutput {
            code: format!("/*compiled*/{}", request.source),
            map: request.in_map,
            errors: Vec::new(),
        }
    }
}

/// Host module graph keyed by file.
#[derive(Default)]
pub struct MemoryGraph {
    modules: Mutex<FxHashMap<PathBuf, Vec<ModuleNode>>>,
}

impl MemoryGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, file: &str, id: &str, url: &str) {
        self.modules
            .lock()
            .entry(PathBuf::from(file))
            .or_default()
            .push(ModuleNode::new(id, url));
    }
}

impl ModuleGraph for MemoryGraph {
    fn modules_for_file(&self, file: &Path) -> Vec<ModuleNode> {
        self.modules.lock().get(file).cloned().unwrap_or_default()
    }
}
