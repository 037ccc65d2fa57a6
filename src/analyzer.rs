//! External analyzer interface.
//!
//! The language analyzer is a black box: it turns source text into an opaque
//! parse tree plus diagnostics, dependency edges and the spans of the
//! embedded markup and style blocks. The registry is its only caller.

use std::any::Any;
use std::fmt;
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::diagnostic::Diagnostic;

/// Opaque parse tree owned by the analyzer.
pub type TreeHandle = Arc<dyn Any + Send + Sync>;

/// Kind of an embedded block inside a source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    /// Embedded markup (jsx-like element tree).
    Markup,
    /// Embedded style element; `scoped` is `None` when no `scoped` attribute
    /// is present, otherwise the attribute's boolean value.
    Style { scoped: Option<bool> },
}

/// A markup or style block, addressed by byte offsets into the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceBlock {
    pub kind: BlockKind,
    pub span: Range<usize>,
}

impl SourceBlock {
    pub fn markup(span: Range<usize>) -> Self {
        Self {
            kind: BlockKind::Markup,
            span,
        }
    }

    pub fn style(span: Range<usize>, scoped: Option<bool>) -> Self {
        Self {
            kind: BlockKind::Style { scoped },
            span,
        }
    }
}

/// Result of one analysis pass.
#[derive(Clone, Default)]
pub struct Analysis {
    /// `None` when the parse produced diagnostics but no usable tree.
    pub tree: Option<TreeHandle>,
    pub blocks: Vec<SourceBlock>,
    pub diagnostics: Vec<Diagnostic>,
    /// Files this source depends on (imports), as the analyzer resolved them.
    pub dependencies: Vec<PathBuf>,
    /// Declaration-only file that never produces runtime output.
    pub description_only: bool,
}

impl fmt::Debug for Analysis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Analysis")
            .field("tree", &self.tree.is_some())
            .field("blocks", &self.blocks)
            .field("diagnostics", &self.diagnostics)
            .field("dependencies", &self.dependencies)
            .field("description_only", &self.description_only)
            .finish()
    }
}

/// The analyzer threw instead of producing an analysis.
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct AnalyzerFailure(pub String);

/// The external language analyzer.
#[async_trait]
pub trait Analyzer: Send + Sync {
    /// Parse and analyze one source text.
    async fn analyze(&self, path: &Path, source: &str) -> Result<Analysis, AnalyzerFailure>;

    /// Resolve a bare or root-relative request to a file on disk.
    fn resolve_file(&self, _request: &str) -> Option<PathBuf> {
        None
    }

    /// Release any native resources held for `path`.
    fn release(&self, _path: &Path) {}
}
