//! リソースモデル
//!
//! マニフェストに宣言されたリソースと、その識別子を定義します。

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// namespace が省略された場合に使用される値
pub const DEFAULT_NAMESPACE: &str = "default";

/// リソースの一意な識別子 (kind, namespace, name)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResourceId {
    pub kind: String,
    pub namespace: String,
    pub name: String,
}

impl ResourceId {
    pub fn new(
        kind: impl Into<String>,
        namespace: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            kind: kind.into(),
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.kind, self.namespace, self.name)
    }
}

/// メタデータ
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    pub name: String,

    /// 省略時は [`DEFAULT_NAMESPACE`]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
}

/// マニフェストで宣言されたリソース（望ましい状態）
///
/// 実行ごとにマニフェストから新しく生成されます。`spec` の中身は
/// kind ごとに異なり、この層では型付けしません。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    pub api_version: String,
    pub kind: String,
    pub metadata: Metadata,

    #[serde(default = "empty_object")]
    pub spec: serde_json::Value,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<serde_json::Value>,
}

fn empty_object() -> serde_json::Value {
    serde_json::Value::Object(serde_json::Map::new())
}

impl Resource {
    pub fn new(
        api_version: impl Into<String>,
        kind: impl Into<String>,
        name: impl Into<String>,
        spec: serde_json::Value,
    ) -> Self {
        Self {
            api_version: api_version.into(),
            kind: kind.into(),
            metadata: Metadata {
                name: name.into(),
                ..Default::default()
            },
            spec,
            status: None,
        }
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.metadata.namespace = Some(namespace.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    /// namespace（省略時は `default`）
    pub fn namespace(&self) -> &str {
        self.metadata
            .namespace
            .as_deref()
            .filter(|ns| !ns.is_empty())
            .unwrap_or(DEFAULT_NAMESPACE)
    }

    pub fn id(&self) -> ResourceId {
        ResourceId::new(&self.kind, self.namespace(), &self.metadata.name)
    }

    /// spec フィールドを型付きで取得
    pub fn spec_field<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.spec
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }
}
