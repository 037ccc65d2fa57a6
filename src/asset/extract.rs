//! Sub-asset selection from a build result.

use std::sync::Arc;

use super::style::{StylePreprocessor, StyleRequest, join_errors};
use crate::build::{Asset, AssetKind, BuildResult};
use crate::config::StyleConfig;
use crate::error::{BridgeError, Result};
use crate::resource::{RequestType, ResourceDescriptor};

/// Code handed back to the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extracted {
    pub code: String,
    pub map: Option<String>,
}

/// Selects the artifact a request asks for.
#[derive(Clone)]
pub struct Extractor<'a> {
    style: &'a StyleConfig,
    production: bool,
    preprocessor: Option<Arc<dyn StylePreprocessor>>,
}

impl<'a> Extractor<'a> {
    pub fn new(
        style: &'a StyleConfig,
        production: bool,
        preprocessor: Option<Arc<dyn StylePreprocessor>>,
    ) -> Self {
        Self {
            style,
            production,
            preprocessor,
        }
    }

    pub async fn extract(
        &self,
        result: &BuildResult,
        descriptor: &ResourceDescriptor,
    ) -> Result<Extracted> {
        let extracted = match descriptor.request_type() {
            Some(RequestType::EmbedAssets) => embed_asset(result, descriptor)?,
            Some(RequestType::Style) => self.style_asset(result, descriptor).await?,
            _ if descriptor.wants_source() => raw_source(result, descriptor)?,
            _ => Extracted {
                code: result.code.clone(),
                map: result.map.clone(),
            },
        };

        if extracted.code.is_empty() {
            return Err(BridgeError::EmptyBuild(descriptor.raw_id.clone()));
        }
        Ok(extracted)
    }

    async fn style_asset(
        &self,
        result: &BuildResult,
        descriptor: &ResourceDescriptor,
    ) -> Result<Extracted> {
        let asset = find(result, descriptor, AssetKind::Style)?;
        let Some(preprocessor) = &self.preprocessor else {
            return Ok(Extracted {
                code: asset.code.clone(),
                map: asset.map.clone(),
            });
        };

        let scope_id = descriptor
            .scope_token()
            .map(|token| format!("{}{}", self.style.scope_prefix, token))
            .unwrap_or_default();
        let request = StyleRequest {
            source: asset.code.clone(),
            filename: descriptor.path.clone(),
            scoped: !scope_id.is_empty(),
            scope_id,
            in_map: asset.map.clone(),
            preprocess_lang: descriptor
                .lang()
                .filter(|lang| self.style.allows(lang))
                .map(ToString::to_string),
            production: self.production,
        };

        let output = preprocessor.compile(request).await;
        if !output.errors.is_empty() {
            return Err(BridgeError::Preprocess(join_errors(&output.errors)));
        }
        Ok(Extracted {
            code: output.code,
            map: output.map,
        })
    }
}

fn find<'r>(
    result: &'r BuildResult,
    descriptor: &ResourceDescriptor,
    kind: AssetKind,
) -> Result<&'r Asset> {
    let index = descriptor.index().unwrap_or_default();
    result
        .find_asset(kind, index)
        .ok_or_else(|| BridgeError::AssetNotFound {
            resource: descriptor.raw_id.clone(),
            kind: kind.name(),
            index: index.to_string(),
        })
}

fn embed_asset(result: &BuildResult, descriptor: &ResourceDescriptor) -> Result<Extracted> {
    let asset = find(result, descriptor, AssetKind::EmbedAsset)?;
    let literal = serde_json::Value::String(asset.code.clone()).to_string();
    Ok(Extracted {
        code: format!("export default {literal}"),
        map: asset.map.clone(),
    })
}

fn raw_source(result: &BuildResult, descriptor: &ResourceDescriptor) -> Result<Extracted> {
    let raw = result
        .raw
        .as_ref()
        .ok_or_else(|| BridgeError::AssetNotFound {
            resource: descriptor.raw_id.clone(),
            kind: "src",
            index: String::new(),
        })?;
    Ok(Extracted {
        code: raw.clone(),
        map: None,
    })
}
