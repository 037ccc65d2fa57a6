//! Build artifacts produced by a pipeline.

use std::path::PathBuf;

use serde::Serialize;

/// Kind of a named sub-artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum AssetKind {
    Style,
    EmbedAsset,
    Macro,
}

impl AssetKind {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Style => "style",
            Self::EmbedAsset => "embedAssets",
            Self::Macro => "macro",
        }
    }
}

/// A named sub-artifact inside a [`BuildResult`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Asset {
    /// Selector matched against the request's `index`.
    pub id: String,
    pub kind: AssetKind,
    pub code: String,
    pub map: Option<String>,
    pub scoped: bool,
    pub scope_id: Option<String>,
}

impl Asset {
    pub fn new(id: impl Into<String>, kind: AssetKind, code: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            code: code.into(),
            map: None,
            scoped: false,
            scope_id: None,
        }
    }

    pub fn style(id: impl Into<String>, code: impl Into<String>) -> Self {
        Self::new(id, AssetKind::Style, code)
    }

    pub fn with_map(mut self, map: impl Into<String>) -> Self {
        self.map = Some(map.into());
        self
    }

    pub fn with_scope(mut self, scope_id: impl Into<String>) -> Self {
        self.scoped = true;
        self.scope_id = Some(scope_id.into());
        self
    }
}

/// Files a build read from a directory; changes to the directory listing
/// invalidate the compilation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DependGroup {
    pub dir: PathBuf,
    pub files: Vec<PathBuf>,
    /// Only the directory is tracked, not its files.
    pub disabled: bool,
}

/// Output of one pipeline build for one compilation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BuildResult {
    pub code: String,
    pub map: Option<String>,
    pub assets: Vec<Asset>,
    /// Pre-template code, served for `src` requests.
    pub raw: Option<String>,
    pub depend_files: Vec<DependGroup>,
}

impl BuildResult {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            ..Self::default()
        }
    }

    pub fn with_map(mut self, map: impl Into<String>) -> Self {
        self.map = Some(map.into());
        self
    }

    pub fn with_asset(mut self, asset: Asset) -> Self {
        self.assets.push(asset);
        self
    }

    pub fn with_raw(mut self, raw: impl Into<String>) -> Self {
        self.raw = Some(raw.into());
        self
    }

    pub fn with_depend_group(mut self, group: DependGroup) -> Self {
        self.depend_files.push(group);
        self
    }

    /// Asset of `kind` whose id equals `id`.
    pub fn find_asset(&self, kind: AssetKind, id: &str) -> Option<&Asset> {
        self.assets
            .iter()
            .find(|asset| asset.kind == kind && asset.id == id)
    }

    pub fn has_depend_files(&self) -> bool {
        !self.depend_files.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_asset_by_kind_and_id() {
        let result = BuildResult::new("export default 1")
            .with_asset(Asset::style("0", ".a{}"))
            .with_asset(Asset::new("0", AssetKind::EmbedAsset, "raw"))
            .with_asset(Asset::style("1", ".b{}"));

        assert_eq!(result.find_asset(AssetKind::Style, "1").unwrap().code, ".b{}");
        assert_eq!(
            result.find_asset(AssetKind::EmbedAsset, "0").unwrap().code,
            "raw"
        );
        assert!(result.find_asset(AssetKind::Style, "2").is_none());
        assert!(result.find_asset(AssetKind::Macro, "0").is_none());
    }
}
