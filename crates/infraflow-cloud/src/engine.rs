//! Reconciliation engine
//!
//! Drives plan / apply / delete over a batch of declared resources. Resources
//! are processed one at a time in dependency order (reverse order for
//! delete). Apply and delete continue past per-resource failures and report
//! every resource's disposition; plan and get abort on the first error.

use crate::action::{
    ApplyResult, DeleteResult, PlanResult, REASON_ALREADY_EXISTS, REASON_NOT_FOUND, TeardownStep,
};
use crate::error::{CloudError, Result};
use crate::handler::{HandlerContext, KindRegistry};
use crate::provider::CloudProvider;
use crate::state::{ResourceState, StateStore};
use infraflow_core::{OrderingTable, Resource, ResourceId};
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument, warn};

enum ApplyOutcome {
    Created,
    Skipped(&'static str),
}

enum DeleteOutcome {
    Deleted,
    Skipped(&'static str),
    /// Teardown ran but at least one step failed
    Incomplete(Vec<TeardownStep>),
}

pub struct Engine {
    store: StateStore,
    provider: Arc<dyn CloudProvider>,
    registry: KindRegistry,
    ordering: OrderingTable,
}

impl Engine {
    /// Engine with the default kind registry and ordering table
    pub fn new(store: StateStore, provider: Arc<dyn CloudProvider>) -> Self {
        Self {
            store,
            provider,
            registry: KindRegistry::with_defaults(),
            ordering: OrderingTable::default(),
        }
    }

    pub fn with_registry(mut self, registry: KindRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_ordering(mut self, ordering: OrderingTable) -> Self {
        self.ordering = ordering;
        self
    }

    pub fn store(&self) -> &StateStore {
        &self.store
    }

    pub fn ordering(&self) -> &OrderingTable {
        &self.ordering
    }

    fn context<'a>(&'a self, cancel: &'a CancellationToken) -> HandlerContext<'a> {
        HandlerContext {
            provider: self.provider.as_ref(),
            store: &self.store,
            cancel,
        }
    }

    /// Existence-only diff against recorded state
    #[instrument(skip_all, fields(resources = resources.len()))]
    pub async fn plan(&self, resources: &[Resource]) -> Result<PlanResult> {
        let mut plan = PlanResult::default();

        for resource in self.ordering.order(resources) {
            let id = resource.id();
            match self.store.load(&id).await? {
                Some(_) => plan.no_change.push(id),
                None => plan.to_create.push(id),
            }
        }

        info!(summary = %plan.summary(), "Plan computed");
        Ok(plan)
    }

    /// Create every resource that has no record yet
    #[instrument(skip_all, fields(resources = resources.len(), provider = self.provider.name()))]
    pub async fn apply(&self, resources: &[Resource], cancel: &CancellationToken) -> ApplyResult {
        let start = Instant::now();
        let mut result = ApplyResult::new();

        for resource in self.ordering.order(resources) {
            let id = resource.id();
            match self.apply_one(resource, cancel).await {
                Ok(ApplyOutcome::Created) => {
                    info!(resource = %id, "Created");
                    result.created.push(id);
                }
                Ok(ApplyOutcome::Skipped(reason)) => {
                    info!(resource = %id, reason, "Skipped");
                    result.add_skip(id, reason);
                }
                Err(e) => {
                    warn!(resource = %id, error = %e, "Apply failed");
                    result.add_failure(id, e.to_string());
                }
            }
        }

        result.duration_ms = start.elapsed().as_millis() as u64;
        result
    }

    async fn apply_one(
        &self,
        resource: &Resource,
        cancel: &CancellationToken,
    ) -> Result<ApplyOutcome> {
        let id = resource.id();
        if self.store.load(&id).await?.is_some() {
            return Ok(ApplyOutcome::Skipped(REASON_ALREADY_EXISTS));
        }

        let handler = self.registry.get(&resource.kind)?;
        let mut state = ResourceState::from_resource(resource);
        let ctx = self.context(cancel);

        match handler.create(&ctx, resource, &mut state).await {
            Ok(()) => {
                state.set_status("phase", serde_json::json!("Ready"));
                if let Err(e) = self.store.save(&mut state).await {
                    error!(
                        resource = %id,
                        provider_resources = ?state.provider_resources,
                        "Created but the state record could not be written"
                    );
                    return Err(e);
                }
                Ok(ApplyOutcome::Created)
            }
            Err(e) => {
                // keep partial composite progress so a delete can clean it up
                if !state.provider_resources.is_empty() {
                    state.set_status("phase", serde_json::json!("Failed"));
                    state.set_status("lastError", serde_json::json!(e.to_string()));
                    if let Err(save_err) = self.store.save(&mut state).await {
                        error!(
                            resource = %id,
                            error = %save_err,
                            provider_resources = ?state.provider_resources,
                            "Partial state could not be written"
                        );
                    }
                }
                Err(e)
            }
        }
    }

    /// Tear down every resource that has a record, in reverse dependency order
    #[instrument(skip_all, fields(resources = resources.len(), provider = self.provider.name()))]
    pub async fn delete(&self, resources: &[Resource], cancel: &CancellationToken) -> DeleteResult {
        let start = Instant::now();
        let mut result = DeleteResult::new();

        for resource in self.ordering.reverse_order(resources) {
            let id = resource.id();
            match self.delete_one(&id, cancel).await {
                Ok(DeleteOutcome::Deleted) => {
                    info!(resource = %id, "Deleted");
                    result.deleted.push(id);
                }
                Ok(DeleteOutcome::Skipped(reason)) => {
                    info!(resource = %id, reason, "Skipped");
                    result.add_skip(id, reason);
                }
                Ok(DeleteOutcome::Incomplete(steps)) => {
                    let failed: Vec<&str> = steps
                        .iter()
                        .filter(|s| s.is_failed())
                        .map(|s| s.key.as_str())
                        .collect();
                    let error = CloudError::PartialTeardown(failed.join(", "));
                    warn!(resource = %id, error = %error, "Delete incomplete, state kept");
                    result.add_failure(id, error.to_string(), steps);
                }
                Err(e) => {
                    warn!(resource = %id, error = %e, "Delete failed");
                    result.add_failure(id, e.to_string(), Vec::new());
                }
            }
        }

        result.duration_ms = start.elapsed().as_millis() as u64;
        result
    }

    async fn delete_one(&self, id: &ResourceId, cancel: &CancellationToken) -> Result<DeleteOutcome> {
        let Some(state) = self.store.load(id).await? else {
            return Ok(DeleteOutcome::Skipped(REASON_NOT_FOUND));
        };

        let handler = self.registry.get(&state.kind)?;
        let steps = handler.delete(&self.context(cancel), &state).await?;

        if steps.iter().any(TeardownStep::is_failed) {
            return Ok(DeleteOutcome::Incomplete(steps));
        }

        // the record goes only after teardown has been attempted
        self.store.delete(id).await?;
        Ok(DeleteOutcome::Deleted)
    }

    /// Recorded state, optionally filtered by kind, sorted by identity
    pub async fn get(&self, kind: Option<&str>) -> Result<Vec<ResourceState>> {
        let mut states = match kind {
            Some(kind) => self.store.list_by_kind(kind).await?,
            None => self.store.list_all().await?,
        };
        states.sort_by_key(|state| state.id());
        Ok(states)
    }

    /// One-line summary of a record using its kind's handler
    pub fn describe(&self, state: &ResourceState) -> String {
        match self.registry.get(&state.kind) {
            Ok(handler) => handler.describe(state),
            Err(_) => format!("{} ({} provider ids)", state.kind, state.provider_resources.len()),
        }
    }
}
