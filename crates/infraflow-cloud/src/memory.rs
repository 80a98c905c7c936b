//! In-process provider
//!
//! Simulates a control plane in memory: deterministic identifiers, a journal
//! of every call, and injectable failures. Nothing survives the process.

use crate::error::{CloudError, Result};
use crate::provider::{CloudProvider, PrimitiveKind, ProviderOutput, ProviderResources};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashSet};
use std::sync::Mutex;

/// A call observed by [`MemoryProvider`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderCall {
    Create { kind: String },
    Delete { kind: String, id: String },
}

#[derive(Debug, Default)]
struct MemoryState {
    next_id: u64,
    /// provider id → kind
    live: BTreeMap<String, String>,
    journal: Vec<ProviderCall>,
    create_faults: HashSet<String>,
    delete_faults: HashSet<String>,
}

#[derive(Debug, Default)]
pub struct MemoryProvider {
    inner: Mutex<MemoryState>,
}

impl MemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every create of `kind` fail until cleared
    pub fn fail_create_on(&self, kind: impl Into<String>) {
        self.lock().create_faults.insert(kind.into());
    }

    /// Make every delete of `kind` fail until cleared
    pub fn fail_delete_on(&self, kind: impl Into<String>) {
        self.lock().delete_faults.insert(kind.into());
    }

    pub fn clear_faults(&self) {
        let mut state = self.lock();
        state.create_faults.clear();
        state.delete_faults.clear();
    }

    pub fn calls(&self) -> Vec<ProviderCall> {
        self.lock().journal.clone()
    }

    pub fn clear_calls(&self) {
        self.lock().journal.clear();
    }

    /// Kinds of created resources, in call order
    pub fn created_kinds(&self) -> Vec<String> {
        self.lock()
            .journal
            .iter()
            .filter_map(|call| match call {
                ProviderCall::Create { kind } => Some(kind.clone()),
                ProviderCall::Delete { .. } => None,
            })
            .collect()
    }

    /// Identifiers passed to delete, in call order
    pub fn deleted_ids(&self) -> Vec<String> {
        self.lock()
            .journal
            .iter()
            .filter_map(|call| match call {
                ProviderCall::Delete { id, .. } => Some(id.clone()),
                ProviderCall::Create { .. } => None,
            })
            .collect()
    }

    pub fn is_live(&self, id: &str) -> bool {
        self.lock().live.contains_key(id)
    }

    pub fn live_count(&self) -> usize {
        self.lock().live.len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        // A panic while holding the lock cannot leave the maps inconsistent
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl CloudProvider for MemoryProvider {
    fn name(&self) -> &str {
        "memory"
    }

    async fn create(&self, kind: &str, _spec: &serde_json::Value) -> Result<ProviderOutput> {
        let primitive =
            PrimitiveKind::from_kind(kind).ok_or_else(|| CloudError::NotSupported(kind.to_string()))?;

        let mut state = self.lock();
        state.journal.push(ProviderCall::Create {
            kind: kind.to_string(),
        });

        if state.create_faults.contains(kind) {
            return Err(CloudError::Provider(format!(
                "simulated failure creating {}",
                kind
            )));
        }

        state.next_id += 1;
        let id = format!("{}-{:08x}", primitive.id_prefix(), state.next_id);
        state.live.insert(id.clone(), kind.to_string());
        tracing::debug!(kind, id = %id, "Created in memory");

        let mut output = ProviderOutput::with_id(primitive.output_key(), id);
        output
            .status
            .insert("state".into(), serde_json::json!("available"));
        Ok(output)
    }

    async fn delete(&self, kind: &str, provider_resources: &ProviderResources) -> Result<()> {
        let primitive =
            PrimitiveKind::from_kind(kind).ok_or_else(|| CloudError::NotSupported(kind.to_string()))?;
        let id = provider_resources
            .get(primitive.output_key())
            .ok_or_else(|| {
                CloudError::ResourceNotFound(format!("{} without {}", kind, primitive.output_key()))
            })?
            .clone();

        let mut state = self.lock();
        state.journal.push(ProviderCall::Delete {
            kind: kind.to_string(),
            id: id.clone(),
        });

        if state.delete_faults.contains(kind) {
            return Err(CloudError::Provider(format!(
                "simulated failure deleting {} {}",
                kind, id
            )));
        }

        match state.live.remove(&id) {
            Some(_) => {
                tracing::debug!(kind, id = %id, "Deleted in memory");
                Ok(())
            }
            None => Err(CloudError::ResourceNotFound(id)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_create_and_delete() {
        let provider = MemoryProvider::new();

        let output = provider.create("VPC", &json!({"cidr": "10.0.0.0/16"})).await.unwrap();
        let id = output.provider_resources["vpcId"].clone();
        assert!(id.starts_with("vpc-"));
        assert!(provider.is_live(&id));

        provider.delete("VPC", &output.provider_resources).await.unwrap();
        assert!(!provider.is_live(&id));

        let again = provider.delete("VPC", &output.provider_resources).await;
        assert!(matches!(again, Err(CloudError::ResourceNotFound(_))));
    }

    #[tokio::test]
    async fn test_unknown_kind() {
        let provider = MemoryProvider::new();
        let result = provider.create("Bucket", &json!({})).await;
        assert!(matches!(result, Err(CloudError::NotSupported(_))));
        assert!(provider.calls().is_empty());
    }

    #[tokio::test]
    async fn test_fault_injection() {
        let provider = MemoryProvider::new();
        provider.fail_create_on("Subnet");

        assert!(provider.create("Subnet", &json!({})).await.is_err());
        assert_eq!(provider.live_count(), 0);
        assert_eq!(provider.created_kinds(), vec!["Subnet"]);

        provider.clear_faults();
        assert!(provider.create("Subnet", &json!({})).await.is_ok());
        assert_eq!(provider.live_count(), 1);
    }
}
