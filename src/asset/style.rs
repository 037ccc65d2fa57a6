//! External style preprocessor interface.

use std::path::PathBuf;

use async_trait::async_trait;

/// Input handed to the style preprocessor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleRequest {
    pub source: String,
    pub filename: PathBuf,
    pub scoped: bool,
    /// Scope prefix + scope token, empty when unscoped.
    pub scope_id: String,
    pub in_map: Option<String>,
    /// Set only for allow-listed preprocessor languages.
    pub preprocess_lang: Option<String>,
    pub production: bool,
}

/// One preprocessor error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleError {
    pub message: String,
    pub stack: Option<String>,
}

impl StyleError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            stack: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StyleOutput {
    pub code: String,
    pub map: Option<String>,
    pub errors: Vec<StyleError>,
}

/// Compiles style assets (preprocessing, scoping, minification).
#[async_trait]
pub trait StylePreprocessor: Send + Sync {
    async fn compile(&self, request: StyleRequest) -> StyleOutput;
}

/// Render errors as one message: `message\nstack` per error, one per line.
pub fn join_errors(errors: &[StyleError]) -> String {
    errors
        .iter()
        .map(|err| match &err.stack {
            Some(stack) => format!("{}\n{}", err.message, stack),
            None => err.message.clone(),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_errors() {
        let errors = [
            StyleError {
                message: "unclosed block".into(),
                stack: Some("at line 3".into()),
            },
            StyleError::new("unknown mixin"),
        ];
        assert_eq!(join_errors(&errors), "unclosed block\nat line 3\nunknown mixin");
    }
}
