//! Section extraction for hot-update diffing.
//!
//! A source file splits into three disjoint slices: the script residue (the
//! source with every embedded block cut out), the concatenated markup blocks
//! and the concatenated style blocks. Newlines and tabs are stripped so that
//! reformatting alone never counts as a change.

use serde::Serialize;

use crate::analyzer::{BlockKind, SourceBlock};

/// Structural slices of one parse, compared across revisions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SectionSnapshot {
    pub script: String,
    pub markup: String,
    pub style: String,
    /// First `scoped` attribute seen on a style block.
    pub has_scoped_style: bool,
}

impl SectionSnapshot {
    /// Extract sections from `source` using the analyzer's block spans.
    ///
    /// Blocks are taken in source order. A block overlapping an earlier one
    /// or with a span outside `source` is ignored.
    pub fn extract(source: &str, blocks: &[SourceBlock]) -> Self {
        let mut ordered: Vec<&SourceBlock> = blocks.iter().collect();
        ordered.sort_by_key(|block| block.span.start);

        let mut script = String::with_capacity(source.len());
        let mut markup = String::new();
        let mut style = String::new();
        let mut scoped_seen = None;
        let mut cursor = 0;

        for block in ordered {
            let span = block.span.clone();
            if span.start < cursor {
                continue;
            }
            let Some(raw) = source.get(span.clone()) else {
                continue;
            };
            script.push_str(&source[cursor..span.start]);
            cursor = span.end;

            match block.kind {
                BlockKind::Markup => markup.push_str(raw),
                BlockKind::Style { scoped } => {
                    style.push_str(raw);
                    if let Some(scoped) = scoped {
                        scoped_seen.get_or_insert(scoped);
                        style.push_str(&format!("/*[scoped={scoped}]*/"));
                    }
                }
            }
        }
        script.push_str(&source[cursor..]);

        Self {
            script: strip_layout(&script),
            markup: strip_layout(&markup),
            style: strip_layout(&style),
            has_scoped_style: scoped_seen.unwrap_or(false),
        }
    }
}

fn strip_layout(text: &str) -> String {
    text.chars()
        .filter(|c| !matches!(c, '\r' | '\n' | '\t'))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span_of(source: &str, needle: &str) -> std::ops::Range<usize> {
        let start = source.find(needle).unwrap();
        start..start + needle.len()
    }

    #[test]
    fn test_no_blocks() {
        let snapshot = SectionSnapshot::extract("let a = 1;\n\tlet b = 2;", &[]);
        assert_eq!(snapshot.script, "let a = 1;let b = 2;");
        assert!(snapshot.markup.is_empty());
        assert!(snapshot.style.is_empty());
        assert!(!snapshot.has_scoped_style);
    }

    #[test]
    fn test_blocks_cut_from_script() {
        let source = "a<x/>b<style scoped>.c{}</style>d<y/>";
        let blocks = [
            SourceBlock::markup(span_of(source, "<y/>")),
            SourceBlock::style(span_of(source, "<style scoped>.c{}</style>"), Some(true)),
            SourceBlock::markup(span_of(source, "<x/>")),
        ];
        let snapshot = SectionSnapshot::extract(source, &blocks);
        assert_eq!(snapshot.script, "abd");
        assert_eq!(snapshot.markup, "<x/><y/>");
        assert_eq!(
            snapshot.style,
            "<style scoped>.c{}</style>/*[scoped=true]*/"
        );
        assert!(snapshot.has_scoped_style);
    }

    #[test]
    fn test_first_scoped_attribute_wins() {
        let source = "<style scoped=\"false\">a</style><style scoped>b</style>";
        let first = span_of(source, "<style scoped=\"false\">a</style>");
        let second = span_of(source, "<style scoped>b</style>");
        let snapshot = SectionSnapshot::extract(
            source,
            &[
                SourceBlock::style(first, Some(false)),
                SourceBlock::style(second, Some(true)),
            ],
        );
        assert!(!snapshot.has_scoped_style);
        assert!(snapshot.style.ends_with("/*[scoped=true]*/"));
    }

    #[test]
    fn test_overlapping_and_out_of_range_ignored() {
        let source = "ab<x><y/></x>c";
        let outer = span_of(source, "<x><y/></x>");
        let inner = span_of(source, "<y/>");
        let snapshot = SectionSnapshot::extract(
            source,
            &[
                SourceBlock::markup(outer),
                SourceBlock::markup(inner),
                SourceBlock::markup(100..120),
            ],
        );
        assert_eq!(snapshot.script, "abc");
        assert_eq!(snapshot.markup, "<x><y/></x>");
    }

    #[test]
    fn test_deterministic_modulo_layout() {
        let one = "a\n<x/>\n";
        let two = "a\r\n\t<x/>";
        let extract = |s: &str| SectionSnapshot::extract(s, &[SourceBlock::markup(span_of(s, "<x/>"))]);
        assert_eq!(extract(one), extract(two));
    }
}
