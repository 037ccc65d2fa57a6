//! Include/exclude filter deciding whether an id belongs to this bridge.
//!
//! Called on every hook invocation: patterns are compiled once into
//! [`RegexSet`]s and matching does no IO.

use regex::{RegexSet, RegexSetBuilder};

/// Default include pattern: `.es`/`.ease` files, optionally with the
/// template-variant suffix.
pub const DEFAULT_INCLUDE: &str = r"\.(es|ease)(\.vue)?(\?|$)";

/// Precompiled include/exclude matcher.
#[derive(Debug, Clone)]
pub struct Filter {
    include: RegexSet,
    exclude: RegexSet,
}

impl Filter {
    /// Compile include/exclude patterns (case-insensitive).
    ///
    /// An empty include list accepts every id not excluded.
    pub fn new<S: AsRef<str>>(include: &[S], exclude: &[S]) -> Result<Self, regex::Error> {
        Ok(Self {
            include: compile(include)?,
            exclude: compile(exclude)?,
        })
    }

    /// Check an id. The query part is stripped before matching; ids the host
    /// marks as internal (leading NUL) are never accepted.
    pub fn accepts(&self, id: &str) -> bool {
        if id.starts_with('\0') {
            return false;
        }
        let path = id.split_once('?').map_or(id, |(path, _)| path);
        if self.exclude.is_match(path) {
            return false;
        }
        self.include.is_empty() || self.include.is_match(path)
    }
}

impl Default for Filter {
    fn default() -> Self {
        Self {
            include: compile(&[DEFAULT_INCLUDE]).unwrap_or_else(|_| RegexSet::empty()),
            exclude: RegexSet::empty(),
        }
    }
}

fn compile<S: AsRef<str>>(patterns: &[S]) -> Result<RegexSet, regex::Error> {
    RegexSetBuilder::new(patterns.iter().map(AsRef::as_ref))
        .case_insensitive(true)
        .build()
}
