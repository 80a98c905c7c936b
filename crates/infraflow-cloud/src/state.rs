//! State management for provisioned resources
//!
//! One JSON record per resource identity, stored at
//! `<root>/<kind>/<namespace>/<name>.json`. Records are written to a sibling
//! temporary file and renamed into place, so a reader never observes a
//! half-written record.
//!
//! There is no cross-process locking: a single writer per state directory is
//! assumed.

use crate::error::{CloudError, Result};
use crate::provider::ProviderResources;
use chrono::{DateTime, Utc};
use infraflow_core::{Resource, ResourceId};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

pub const STATE_VERSION: u32 = 1;
const RECORD_EXTENSION: &str = "json";
const TEMP_SUFFIX: &str = ".tmp";

fn state_version() -> u32 {
    STATE_VERSION
}

/// Persisted record of what was provisioned for a resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceState {
    /// Record format version
    #[serde(default = "state_version")]
    pub version: u32,

    pub api_version: String,
    pub kind: String,
    pub name: String,
    pub namespace: String,

    /// Declared spec at the time of creation
    pub spec: serde_json::Value,

    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub status: serde_json::Map<String, serde_json::Value>,

    /// Logical key (e.g. `vpcId`) → provider-assigned identifier
    #[serde(default)]
    pub provider_resources: ProviderResources,

    /// Fixed on first save
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,

    /// Refreshed on every save
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl ResourceState {
    pub fn new(id: &ResourceId, api_version: impl Into<String>) -> Self {
        Self {
            version: STATE_VERSION,
            api_version: api_version.into(),
            kind: id.kind.clone(),
            name: id.name.clone(),
            namespace: id.namespace.clone(),
            spec: serde_json::Value::Object(serde_json::Map::new()),
            status: serde_json::Map::new(),
            provider_resources: ProviderResources::new(),
            created_at: None,
            updated_at: None,
        }
    }

    /// Fresh, unsaved record mirroring a declared resource
    pub fn from_resource(resource: &Resource) -> Self {
        let mut state = Self::new(&resource.id(), &resource.api_version);
        state.spec = resource.spec.clone();
        if let Some(serde_json::Value::Object(status)) = &resource.status {
            state.status = status.clone();
        }
        state
    }

    pub fn id(&self) -> ResourceId {
        ResourceId::new(&self.kind, &self.namespace, &self.name)
    }

    pub fn with_provider_resource(mut self, key: impl Into<String>, id: impl Into<String>) -> Self {
        self.provider_resources.insert(key.into(), id.into());
        self
    }

    pub fn provider_id(&self, key: &str) -> Option<&str> {
        self.provider_resources.get(key).map(String::as_str)
    }

    pub fn set_status(&mut self, key: impl Into<String>, value: serde_json::Value) {
        self.status.insert(key.into(), value);
    }
}

/// File-per-resource state store
#[derive(Debug, Clone)]
pub struct StateStore {
    root: PathBuf,
}

impl StateStore {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn kind_dir(&self, kind: &str) -> Result<PathBuf> {
        validate_component("kind", kind)?;
        Ok(self.root.join(kind))
    }

    fn record_path(&self, id: &ResourceId) -> Result<PathBuf> {
        validate_component("namespace", &id.namespace)?;
        validate_component("name", &id.name)?;
        Ok(self
            .kind_dir(&id.kind)?
            .join(&id.namespace)
            .join(format!("{}.{}", id.name, RECORD_EXTENSION)))
    }

    /// Write or overwrite the record for `state.id()`
    ///
    /// Stamps `updated_at`, and `created_at` when unset.
    pub async fn save(&self, state: &mut ResourceState) -> Result<()> {
        let path = self.record_path(&state.id())?;

        let now = Utc::now();
        if state.created_at.is_none() {
            state.created_at = Some(now);
        }
        state.updated_at = Some(now);

        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)
                .await
                .map_err(|e| CloudError::state_io(dir, e))?;
        }

        let content = serde_json::to_vec_pretty(state)?;
        let temp_path = temp_path_for(&path);
        fs::write(&temp_path, content)
            .await
            .map_err(|e| CloudError::state_io(&temp_path, e))?;
        fs::rename(&temp_path, &path)
            .await
            .map_err(|e| CloudError::state_io(&path, e))?;

        tracing::debug!(
            resource = %state.id(),
            provider_resources = state.provider_resources.len(),
            "Saved resource state"
        );
        Ok(())
    }

    /// Load a record; `None` when absent
    pub async fn load(&self, id: &ResourceId) -> Result<Option<ResourceState>> {
        let path = self.record_path(id)?;
        match fs::read(&path).await {
            Ok(content) => read_record(&path, &content).map(Some),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(resource = %id, "No state record");
                Ok(None)
            }
            Err(e) => Err(CloudError::state_io(&path, e)),
        }
    }

    /// Remove a record; removing an absent record is not an error
    pub async fn delete(&self, id: &ResourceId) -> Result<()> {
        let path = self.record_path(id)?;
        match fs::remove_file(&path).await {
            Ok(()) => {
                tracing::debug!(resource = %id, "Removed resource state");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CloudError::state_io(&path, e)),
        }
    }

    /// All records of one kind, in no particular order
    pub async fn list_by_kind(&self, kind: &str) -> Result<Vec<ResourceState>> {
        let kind_dir = self.kind_dir(kind)?;
        let mut states = Vec::new();

        for namespace_dir in subdirectories(&kind_dir).await? {
            let mut entries = match fs::read_dir(&namespace_dir).await {
                Ok(entries) => entries,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(CloudError::state_io(&namespace_dir, e)),
            };

            while let Some(entry) = entries
                .next_entry()
                .await
                .map_err(|e| CloudError::state_io(&namespace_dir, e))?
            {
                let path = entry.path();
                if path.extension().and_then(|e| e.to_str()) != Some(RECORD_EXTENSION) {
                    continue;
                }
                let content = match fs::read(&path).await {
                    Ok(content) => content,
                    // removed between listing and reading
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                    Err(e) => return Err(CloudError::state_io(&path, e)),
                };
                states.push(read_record(&path, &content)?);
            }
        }

        Ok(states)
    }

    /// Every record in the store, in no particular order
    pub async fn list_all(&self) -> Result<Vec<ResourceState>> {
        let mut states = Vec::new();
        for kind_dir in subdirectories(&self.root).await? {
            let Some(kind) = kind_dir.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if validate_component("kind", kind).is_err() {
                continue;
            }
            states.extend(self.list_by_kind(kind).await?);
        }
        Ok(states)
    }
}

fn read_record(path: &Path, content: &[u8]) -> Result<ResourceState> {
    let state: ResourceState =
        serde_json::from_slice(content).map_err(|e| CloudError::state_io(path, e))?;

    if state.version > STATE_VERSION {
        return Err(CloudError::state_io(
            path,
            format!(
                "state record version {} is newer than supported version {}",
                state.version, STATE_VERSION
            ),
        ));
    }

    Ok(state)
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(TEMP_SUFFIX);
    path.with_file_name(name)
}

async fn subdirectories(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = match fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(CloudError::state_io(dir, e)),
    };

    let mut dirs = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| CloudError::state_io(dir, e))?
    {
        let file_type = entry
            .file_type()
            .await
            .map_err(|e| CloudError::state_io(entry.path(), e))?;
        if file_type.is_dir() {
            dirs.push(entry.path());
        }
    }
    Ok(dirs)
}

/// Identity components become path segments and must stay inside the root
fn validate_component(field: &str, value: &str) -> Result<()> {
    let invalid = value.is_empty()
        || value == "."
        || value == ".."
        || value.contains(['/', '\\', '\0']);
    if invalid {
        return Err(CloudError::InvalidIdentity(format!(
            "{} '{}' cannot be used as a path segment",
            field, value
        )));
    }
    Ok(())
}
