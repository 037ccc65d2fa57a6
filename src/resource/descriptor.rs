//! Resource identifier parsing.
//!
//! Turns an opaque module id as the host hands it over
//! (`virtual:nuxt:/src/App.es.vue?vue&type=style&index=0&lang.css`) into a
//! path plus query descriptor. Parsing is total: malformed query fragments are
//! dropped one by one, never reported.

use std::path::{Path, PathBuf};

use percent_encoding::percent_decode_str;
use serde::Serialize;

use crate::config::ResolveConfig;
use crate::utils::path::clean_path;

/// Keys whose presence alone means `true`.
const FLAG_KEYS: &[&str] = &["vue", "macro", "src", "callhook", "direct"];

/// A query value: bare keys are flags, `key=value` pairs carry text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum QueryValue {
    Flag(bool),
    Text(String),
}

impl QueryValue {
    /// Truthiness as a flag: bare key, or any text except `false`/`0`.
    pub fn is_set(&self) -> bool {
        match self {
            Self::Flag(on) => *on,
            Self::Text(text) => !matches!(text.as_str(), "false" | "0"),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Flag(_) => None,
            Self::Text(text) => Some(text),
        }
    }
}

/// Ordered query mapping. Re-inserting a key keeps its first position and the
/// last value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Query(Vec<(String, QueryValue)>);

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a raw query string. Further `?` separators are treated as `&`.
    pub fn parse(raw: &str) -> Self {
        let mut query = Self::new();
        for fragment in raw.split(['&', '?']) {
            if fragment.is_empty() {
                continue;
            }
            let (key, value) = match fragment.split_once('=') {
                Some((key, value)) => (key, QueryValue::Text(value.to_string())),
                None => (fragment, QueryValue::Flag(true)),
            };
            if key.is_empty() {
                continue;
            }
            query.insert(key, value);
        }
        query
    }

    pub fn insert(&mut self, key: &str, value: QueryValue) {
        match self.0.iter_mut().find(|(k, _)| k == key) {
            Some(slot) => slot.1 = value,
            None => self.0.push((key.to_string(), value)),
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<QueryValue> {
        let index = self.0.iter().position(|(k, _)| k == key)?;
        Some(self.0.remove(index).1)
    }

    pub fn get(&self, key: &str) -> Option<&QueryValue> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Flag lookup: present and truthy.
    pub fn flag(&self, key: &str) -> bool {
        self.get(key).is_some_and(QueryValue::is_set)
    }

    /// Text lookup: present with a value.
    pub fn text(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(QueryValue::as_text)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &QueryValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// What a virtual module request asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestType {
    Style,
    EmbedAssets,
    /// A `type` this bridge does not serve itself.
    Other(String),
}

/// Parsed module id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceDescriptor {
    /// File path with the virtual prefix and the variant suffix removed.
    pub path: PathBuf,
    /// The id exactly as the host handed it over.
    pub raw_id: String,
    pub query: Query,
}

impl ResourceDescriptor {
    pub fn request_type(&self) -> Option<RequestType> {
        self.query.text("type").map(|ty| match ty {
            "style" => RequestType::Style,
            "embedAssets" => RequestType::EmbedAssets,
            other => RequestType::Other(other.to_string()),
        })
    }

    /// Asset selector (`index`).
    pub fn index(&self) -> Option<&str> {
        self.query.text("index")
    }

    /// Sub-unit selector for builds (`id`).
    pub fn selector(&self) -> Option<&str> {
        self.query.text("id")
    }

    pub fn lang(&self) -> Option<&str> {
        self.query.text("lang")
    }

    /// Style scope token, from `scoped=<token>` or `scopeId=<token>`.
    pub fn scope_token(&self) -> Option<&str> {
        self.query
            .text("scoped")
            .or_else(|| self.query.text("scopeId"))
            .filter(|token| !token.is_empty())
    }

    pub fn is_macro(&self) -> bool {
        self.query.flag("macro")
    }

    pub fn wants_source(&self) -> bool {
        self.query.flag("src")
    }
}

/// Parse a module id into a [`ResourceDescriptor`].
pub fn parse_resource(id: &str, config: &ResolveConfig) -> ResourceDescriptor {
    let decoded = percent_decode_str(id).decode_utf8_lossy();
    let mut rest: &str = &decoded;

    if let Some(stripped) = config
        .virtual_prefixes
        .iter()
        .find_map(|prefix| rest.strip_prefix(prefix.as_str()))
    {
        rest = stripped;
    }

    let (raw_path, raw_query) = rest.split_once('?').unwrap_or((rest, ""));
    let mut query = Query::parse(raw_query);

    for key in FLAG_KEYS {
        if *key == "vue" && query.contains(key) {
            query.insert(key, QueryValue::Flag(true));
        } else if let Some(QueryValue::Text(text)) = query.get(key)
            && text.is_empty()
        {
            query.insert(key, QueryValue::Flag(true));
        }
    }

    let mut path = raw_path;
    if let Some(stripped) = strip_variant_suffix(path, config) {
        path = stripped;
        if !query.contains("vue") {
            query.insert("vue", QueryValue::Flag(true));
        }
    }

    ResourceDescriptor {
        path: clean_path(Path::new(path)),
        raw_id: id.to_string(),
        query,
    }
}

/// Strip the template-variant suffix from `name.<ext><suffix>` when `<ext>`
/// is a language extension.
fn strip_variant_suffix<'a>(path: &'a str, config: &ResolveConfig) -> Option<&'a str> {
    if config.variant_suffix.is_empty() {
        return None;
    }
    let base = path.strip_suffix(config.variant_suffix.as_str())?;
    let ext = Path::new(base).extension()?.to_str()?;
    config
        .extensions
        .iter()
        .any(|known| known == ext)
        .then_some(base)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(id: &str) -> ResourceDescriptor {
        parse_resource(id, &ResolveConfig::default())
    }

    #[test]
    fn test_plain_path() {
        let res = parse("/src/App.es");
        assert_eq!(res.path, PathBuf::from("/src/App.es"));
        assert!(res.query.is_empty());
        assert_eq!(res.raw_id, "/src/App.es");
    }

    #[test]
    fn test_virtual_prefix_stripped() {
        let res = parse("virtual:nuxt:/src/App.es?type=style&index=0");
        assert_eq!(res.path, PathBuf::from("/src/App.es"));
        assert_eq!(res.request_type(), Some(RequestType::Style));
        assert_eq!(res.index(), Some("0"));
    }

    #[test]
    fn test_percent_decoded() {
        let res = parse("/src/My%20App.es?type=embedAssets&index=a%2Fb");
        assert_eq!(res.path, PathBuf::from("/src/My App.es"));
        assert_eq!(res.index(), Some("a/b"));
    }

    #[test]
    fn test_vue_flag_normalized() {
        let res = parse("/src/App.es?vue&type=style");
        assert_eq!(res.query.get("vue"), Some(&QueryValue::Flag(true)));

        let res = parse("/src/App.es?vue=anything");
        assert_eq!(res.query.get("vue"), Some(&QueryValue::Flag(true)));
    }

    #[test]
    fn test_last_occurrence_wins() {
        let res = parse("/src/App.es?index=0&type=style&index=3");
        assert_eq!(res.index(), Some("3"));
        let keys: Vec<_> = res.query.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["index", "type"]);
    }

    #[test]
    fn test_malformed_fragments_dropped() {
        let res = parse("/src/App.es?=oops&&type=style&=");
        assert_eq!(res.query.iter().count(), 1);
        assert_eq!(res.request_type(), Some(RequestType::Style));
    }

    #[test]
    fn test_extra_question_marks_join_query() {
        let res = parse("/src/App.es?vue?type=style&index=1");
        assert!(res.query.flag("vue"));
        assert_eq!(res.index(), Some("1"));
    }

    #[test]
    fn test_variant_suffix_stripped_and_recorded() {
        let res = parse("/src/App.es.vue");
        assert_eq!(res.path, PathBuf::from("/src/App.es"));
        assert!(res.query.flag("vue"));

        // Not a language extension before the suffix: untouched
        let res = parse("/src/App.vue");
        assert_eq!(res.path, PathBuf::from("/src/App.vue"));
        assert!(!res.query.flag("vue"));
    }

    #[test]
    fn test_macro_and_src_flags() {
        let res = parse("/src/App.es?macro=true");
        assert!(res.is_macro());
        let res = parse("/src/App.es?macro=false");
        assert!(!res.is_macro());
        let res = parse("/src/App.es?src");
        assert!(res.wants_source());
    }

    #[test]
    fn test_scope_token() {
        let res = parse("/src/App.es?type=style&index=0&scoped=7ac1");
        assert_eq!(res.scope_token(), Some("7ac1"));
        let res = parse("/src/App.es?type=style&index=0&scopeId=9f");
        assert_eq!(res.scope_token(), Some("9f"));
        let res = parse("/src/App.es?type=style&index=0&scoped");
        assert_eq!(res.scope_token(), None);
    }

    #[test]
    fn test_dot_segments_cleaned() {
        let res = parse("/src/pages/../App.es");
        assert_eq!(res.path, PathBuf::from("/src/App.es"));
    }
}
