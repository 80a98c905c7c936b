//! マニフェストパーサー
//!
//! 1つの入力に含まれる複数のYAML/JSONドキュメント（`---` 区切り）を
//! 出現順に [`Resource`] へ変換します。

use crate::error::Result;
use crate::model::Resource;
use serde::Deserialize;
use tracing::{debug, warn};

/// マニフェストのバイト列をパース
///
/// - 空ドキュメント、および `kind` と `apiVersion` の両方を持たないドキュメントは黙って無視
/// - YAMLとしては正しいがリソースの形をしていないドキュメントは警告を出してスキップ
/// - YAMLの構文エラーは入力全体のエラー
pub fn parse_manifests(bytes: &[u8]) -> Result<Vec<Resource>> {
    let mut resources = Vec::new();

    for (index, document) in serde_yaml::Deserializer::from_slice(bytes).enumerate() {
        let value = serde_yaml::Value::deserialize(document)?;

        if !has_type_discriminator(&value) {
            debug!(document = index, "Skipping document without kind/apiVersion");
            continue;
        }

        match into_resource(value) {
            Ok(resource) => resources.push(resource),
            Err(reason) => {
                warn!(document = index, %reason, "Skipping malformed document");
            }
        }
    }

    debug!(count = resources.len(), "Parsed manifest documents");
    Ok(resources)
}

fn has_type_discriminator(value: &serde_yaml::Value) -> bool {
    value.get("kind").is_some() || value.get("apiVersion").is_some()
}

fn into_resource(value: serde_yaml::Value) -> std::result::Result<Resource, String> {
    let mut resource: Resource = serde_yaml::from_value(value).map_err(|e| e.to_string())?;

    if resource.kind.trim().is_empty() {
        return Err("kind が空です".to_string());
    }
    if resource.api_version.trim().is_empty() {
        return Err("apiVersion が空です".to_string());
    }
    if resource.metadata.name.trim().is_empty() {
        return Err("metadata.name が空です".to_string());
    }

    match &resource.spec {
        serde_json::Value::Object(_) => {}
        serde_json::Value::Null => {
            resource.spec = serde_json::Value::Object(serde_json::Map::new());
        }
        other => return Err(format!("spec はマッピングである必要があります: {}", other)),
    }

    if matches!(resource.status, Some(serde_json::Value::Null)) {
        resource.status = None;
    }

    Ok(resource)
}
