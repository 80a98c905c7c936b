//! Batch result types for plan, apply and delete

use infraflow_core::ResourceId;
use serde::{Deserialize, Serialize};

/// Reason recorded when apply finds an existing record
pub const REASON_ALREADY_EXISTS: &str = "already exists";

/// Reason recorded when delete finds no record
pub const REASON_NOT_FOUND: &str = "not found";

/// Result of a dry-run diff
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanResult {
    pub to_create: Vec<ResourceId>,

    /// Always empty: only existence is compared
    pub to_update: Vec<ResourceId>,

    /// Always empty: deletion is driven by explicit delete calls
    pub to_delete: Vec<ResourceId>,

    pub no_change: Vec<ResourceId>,
}

impl PlanResult {
    pub fn has_changes(&self) -> bool {
        !self.to_create.is_empty() || !self.to_update.is_empty() || !self.to_delete.is_empty()
    }

    pub fn summary(&self) -> PlanSummary {
        PlanSummary {
            create: self.to_create.len(),
            update: self.to_update.len(),
            delete: self.to_delete.len(),
            no_change: self.no_change.len(),
        }
    }
}

/// Summary of planned actions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlanSummary {
    pub create: usize,
    pub update: usize,
    pub delete: usize,
    pub no_change: usize,
}

impl std::fmt::Display for PlanSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} to create, {} to update, {} to delete, {} unchanged",
            self.create, self.update, self.delete, self.no_change
        )
    }
}

/// A resource that could not be reconciled
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailedResource {
    pub resource: ResourceId,
    pub error: String,

    /// Per-step teardown outcomes, when the failure happened during delete
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub steps: Vec<TeardownStep>,
}

/// A resource left untouched
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedResource {
    pub resource: ResourceId,
    pub reason: String,
}

/// Result of applying a batch
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyResult {
    pub created: Vec<ResourceId>,

    /// Always empty: existing records are skipped
    pub updated: Vec<ResourceId>,

    pub failed: Vec<FailedResource>,
    pub skipped: Vec<SkippedResource>,

    /// Total execution time in milliseconds
    pub duration_ms: u64,
}

impl ApplyResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn add_failure(&mut self, resource: ResourceId, error: String) {
        self.failed.push(FailedResource {
            resource,
            error,
            steps: Vec::new(),
        });
    }

    pub fn add_skip(&mut self, resource: ResourceId, reason: impl Into<String>) {
        self.skipped.push(SkippedResource {
            resource,
            reason: reason.into(),
        });
    }
}

/// Result of deleting a batch
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResult {
    pub deleted: Vec<ResourceId>,
    pub failed: Vec<FailedResource>,
    pub skipped: Vec<SkippedResource>,

    /// Total execution time in milliseconds
    pub duration_ms: u64,
}

impl DeleteResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn add_failure(&mut self, resource: ResourceId, error: String, steps: Vec<TeardownStep>) {
        self.failed.push(FailedResource {
            resource,
            error,
            steps,
        });
    }

    pub fn add_skip(&mut self, resource: ResourceId, reason: impl Into<String>) {
        self.skipped.push(SkippedResource {
            resource,
            reason: reason.into(),
        });
    }
}

/// Outcome of tearing down one provider resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TeardownOutcome {
    Deleted,
    /// The provider no longer knows the resource
    AlreadyAbsent,
    Failed(String),
}

/// One teardown call against the provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeardownStep {
    /// Logical key in `providerResources`
    pub key: String,
    pub provider_id: String,
    pub outcome: TeardownOutcome,
}

impl TeardownStep {
    pub fn is_failed(&self) -> bool {
        matches!(self.outcome, TeardownOutcome::Failed(_))
    }
}

impl std::fmt::Display for TeardownOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TeardownOutcome::Deleted => write!(f, "deleted"),
            TeardownOutcome::AlreadyAbsent => write!(f, "already absent"),
            TeardownOutcome::Failed(e) => write!(f, "failed: {}", e),
        }
    }
}
