//! `[filter]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [filter]
//! include = ['\.(es|ease)(\.vue)?(\?|$)']   # regexes, matched case-insensitively
//! exclude = ['/node_modules/']
//! ```

use serde::{Deserialize, Serialize};

use crate::config::{ConfigDiagnostics, FieldPath};
use crate::resource::Filter;
use crate::resource::filter::DEFAULT_INCLUDE;

/// Include/exclude patterns matched against the path part of an id.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    pub include: Vec<String>,
    pub exclude: Vec<String>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            include: vec![DEFAULT_INCLUDE.to_string()],
            exclude: Vec::new(),
        }
    }
}

impl FilterConfig {
    /// Compile into a [`Filter`].
    pub fn build(&self) -> Result<Filter, regex::Error> {
        Filter::new(&self.include, &self.exclude)
    }

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        let sections = [("include", &self.include), ("exclude", &self.exclude)];
        for (field, patterns) in sections {
            for (index, pattern) in patterns.iter().enumerate() {
                if let Err(e) = regex::Regex::new(pattern) {
                    diag.error(FieldPath::indexed("filter", index, field), e.to_string());
                }
            }
        }
    }
}
