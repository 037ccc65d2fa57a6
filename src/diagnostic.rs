//! Analyzer and pipeline diagnostics.
//!
//! ERROR diagnostics abort the current build; WARN diagnostics are surfaced
//! and the build proceeds.

use std::fmt;
use std::path::PathBuf;

use owo_colors::OwoColorize;

/// Severity of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    Error,
    Warn,
}

/// A single diagnostic raised by the analyzer or a pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
    /// File the diagnostic points into, if known.
    pub file: Option<PathBuf>,
    /// 1-based line and column.
    pub position: Option<(usize, usize)>,
}

impl Diagnostic {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: DiagnosticKind::Error,
            message: message.into(),
            file: None,
            position: None,
        }
    }

    pub fn warn(message: impl Into<String>) -> Self {
        Self {
            kind: DiagnosticKind::Warn,
            message: message.into(),
            file: None,
            position: None,
        }
    }

    pub fn in_file(mut self, file: impl Into<PathBuf>) -> Self {
        self.file = Some(file.into());
        self
    }

    pub fn at(mut self, line: usize, column: usize) -> Self {
        self.position = Some((line, column));
        self
    }

    #[inline]
    pub fn is_error(&self) -> bool {
        self.kind == DiagnosticKind::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self.kind {
            DiagnosticKind::Error => "error".red().bold().to_string(),
            DiagnosticKind::Warn => "warning".yellow().bold().to_string(),
        };
        write!(f, "{label}: {}", self.message)?;
        if let Some(file) = &self.file {
            write!(f, "\n  {} {}", "-->".dimmed(), file.display())?;
            if let Some((line, column)) = self.position {
                write!(f, ":{line}:{column}")?;
            }
        }
        Ok(())
    }
}

/// Diagnostics split by severity.
#[derive(Debug, Default, Clone)]
pub struct Partitioned {
    pub errors: Vec<Diagnostic>,
    pub warnings: Vec<Diagnostic>,
}

impl Partitioned {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Errors rendered one per block, for a single reported message.
    pub fn error_message(&self) -> String {
        self.errors
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Warnings rendered as strings, for the host's warning channel.
    pub fn warning_messages(&self) -> Vec<String> {
        self.warnings.iter().map(ToString::to_string).collect()
    }

    /// Log every warning under the `warn` prefix.
    pub fn log_warnings(&self) {
        for warning in &self.warnings {
            crate::log!("warn"; "{}", warning);
        }
    }
}

/// Split diagnostics into errors and warnings, preserving order.
pub fn partition<'a>(diagnostics: impl IntoIterator<Item = &'a Diagnostic>) -> Partitioned {
    let mut out = Partitioned::default();
    for diagnostic in diagnostics {
        match diagnostic.kind {
            DiagnosticKind::Error => out.errors.push(diagnostic.clone()),
            DiagnosticKind::Warn => out.warnings.push(diagnostic.clone()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partition_preserves_order() {
        let diagnostics = vec![
            Diagnostic::warn("w1"),
            Diagnostic::error("e1"),
            Diagnostic::warn("w2"),
        ];
        let split = partition(&diagnostics);
        assert!(split.has_errors());
        assert_eq!(split.errors.len(), 1);
        assert_eq!(split.warnings[0].message, "w1");
        assert_eq!(split.warnings[1].message, "w2");
    }

    #[test]
    fn test_display_with_position() {
        owo_colors::set_override(false);
        let diagnostic = Diagnostic::error("unexpected token")
            .in_file("/src/App.es")
            .at(3, 7);
        let display = diagnostic.to_string();
        assert!(display.contains("unexpected token"));
        assert!(display.contains("/src/App.es:3:7"));
    }

    #[test]
    fn test_no_errors() {
        let split = partition(&[Diagnostic::warn("only a warning")]);
        assert!(!split.has_errors());
        assert_eq!(split.warning_messages().len(), 1);
    }
}
