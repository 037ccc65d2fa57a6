//! Change classification.
//!
//! Pure functions deciding which dependent modules a section change
//! invalidates. No registry access, no side effects.

use super::sections::SectionSnapshot;
use crate::resource::Query;

// =============================================================================
// Module tags
// =============================================================================

/// How a dependent module relates to its source file, read from its url.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleTag {
    /// `direct` request: never invalidated by section diffing.
    Direct,
    /// `macro=true`: depends on the script section only.
    Macro,
    /// `type=style`: depends on the style section only.
    Style,
    /// Everything else: depends on script and markup.
    Default,
}

impl ModuleTag {
    pub fn of_url(url: &str) -> Self {
        let Some((_, raw_query)) = url.split_once('?') else {
            return Self::Default;
        };
        let query = Query::parse(raw_query);
        if query.contains("direct") {
            Self::Direct
        } else if query.text("macro") == Some("true") {
            Self::Macro
        } else if query.text("type") == Some("style") {
            Self::Style
        } else {
            Self::Default
        }
    }
}

// =============================================================================
// Section changes
// =============================================================================

/// Which sections differ between two snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionChange {
    pub script: bool,
    pub markup: bool,
    pub style: bool,
}

impl SectionChange {
    /// Compare snapshots. Without a previous snapshot everything changed.
    pub fn between(prev: Option<&SectionSnapshot>, next: &SectionSnapshot) -> Self {
        match prev {
            Some(prev) => Self {
                script: prev.script != next.script,
                markup: prev.markup != next.markup,
                style: prev.style != next.style,
            },
            None => Self::all(),
        }
    }

    pub const fn all() -> Self {
        Self {
            script: true,
            markup: true,
            style: true,
        }
    }

    pub fn is_empty(&self) -> bool {
        !(self.script || self.markup || self.style)
    }

    /// Whether a module with this tag must be invalidated.
    pub fn invalidates(&self, tag: ModuleTag) -> bool {
        match tag {
            ModuleTag::Direct => false,
            ModuleTag::Macro => self.script,
            ModuleTag::Style => self.style,
            ModuleTag::Default => self.script || self.markup,
        }
    }

    /// Only markup changed: the template runtime can re-render in place.
    pub fn render_only(&self) -> bool {
        self.markup && !self.script && !self.style
    }
}
