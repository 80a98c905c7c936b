//! Per-kind behaviour
//!
//! Each resource kind is served by a [`KindHandler`] registered in a
//! [`KindRegistry`]. The engine looks handlers up by kind name, so new kinds
//! are added by registering a handler rather than touching the engine.

use crate::action::{TeardownOutcome, TeardownStep};
use crate::error::{CloudError, Result};
use crate::provider::{CloudProvider, PrimitiveKind, ProviderOutput, ProviderResources};
use crate::state::{ResourceState, StateStore};
use async_trait::async_trait;
use infraflow_core::{Resource, ResourceId};
use std::collections::HashMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Spec fields that name another resource in the same namespace:
/// (field, referenced kind)
const REFERENCE_FIELDS: [(&str, PrimitiveKind); 5] = [
    ("vpcRef", PrimitiveKind::Vpc),
    ("internetGatewayRef", PrimitiveKind::InternetGateway),
    ("subnetRef", PrimitiveKind::Subnet),
    ("routeTableRef", PrimitiveKind::RouteTable),
    ("securityGroupRef", PrimitiveKind::SecurityGroup),
];

/// Collaborators available to a handler during one engine call
pub struct HandlerContext<'a> {
    pub provider: &'a dyn CloudProvider,
    pub store: &'a StateStore,
    pub cancel: &'a CancellationToken,
}

impl HandlerContext<'_> {
    /// Provider create, aborted when the batch is cancelled
    pub async fn create(&self, kind: &str, spec: &serde_json::Value) -> Result<ProviderOutput> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(CloudError::Cancelled),
            result = self.provider.create(kind, spec) => result,
        }
    }

    /// Provider delete, aborted when the batch is cancelled
    pub async fn delete(&self, kind: &str, provider_resources: &ProviderResources) -> Result<()> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(CloudError::Cancelled),
            result = self.provider.delete(kind, provider_resources) => result,
        }
    }

    /// Delete and classify the result as a teardown step
    ///
    /// Only cancellation is returned as an error.
    pub async fn teardown(
        &self,
        kind: PrimitiveKind,
        key: &str,
        target: &ProviderResources,
    ) -> Result<TeardownStep> {
        let provider_id = target.get(key).cloned().unwrap_or_default();
        let outcome = match self.delete(kind.as_str(), target).await {
            Ok(()) => TeardownOutcome::Deleted,
            Err(CloudError::Cancelled) => return Err(CloudError::Cancelled),
            Err(e) if e.is_not_found() => TeardownOutcome::AlreadyAbsent,
            Err(e) => {
                tracing::warn!(kind = %kind, id = %provider_id, error = %e, "Teardown failed");
                TeardownOutcome::Failed(e.to_string())
            }
        };
        Ok(TeardownStep {
            key: key.to_string(),
            provider_id,
            outcome,
        })
    }

    /// Provider id recorded for `kind/namespace/name`
    pub async fn resolve_reference(
        &self,
        field: &str,
        kind: PrimitiveKind,
        namespace: &str,
        name: &str,
    ) -> Result<String> {
        let id = ResourceId::new(kind.as_str(), namespace, name);
        let unresolved = || CloudError::UnresolvedReference {
            field: field.to_string(),
            kind: kind.as_str().to_string(),
            name: name.to_string(),
            key: kind.output_key().to_string(),
        };

        let state = self.store.load(&id).await?.ok_or_else(unresolved)?;
        state
            .provider_id(kind.output_key())
            .map(str::to_string)
            .ok_or_else(unresolved)
    }

    /// Resolve every `*Ref` field of a spec to the referenced provider id
    ///
    /// Returns the spec to send to the provider and the resolved ids, keyed by
    /// the referenced kind's output key (e.g. `vpcRef: main` → `vpcId`).
    pub async fn resolve_references(
        &self,
        resource: &Resource,
    ) -> Result<(serde_json::Value, ProviderResources)> {
        let mut spec = resource.spec.clone();
        let mut resolved = ProviderResources::new();

        for (field, kind) in REFERENCE_FIELDS {
            let Some(target) = resource.spec_field::<String>(field) else {
                continue;
            };
            let provider_id = self
                .resolve_reference(field, kind, resource.namespace(), &target)
                .await?;
            if let Some(map) = spec.as_object_mut() {
                map.insert(
                    kind.output_key().to_string(),
                    serde_json::Value::String(provider_id.clone()),
                );
            }
            resolved.insert(kind.output_key().to_string(), provider_id);
        }

        Ok((spec, resolved))
    }
}

/// Create/delete/describe behaviour for one resource kind
#[async_trait]
pub trait KindHandler: Send + Sync {
    fn kind(&self) -> &str;

    /// Provision the resource, recording provider ids into `state`
    ///
    /// On error, whatever ids were recorded before the failure stay in
    /// `state.provider_resources`.
    async fn create(
        &self,
        ctx: &HandlerContext<'_>,
        resource: &Resource,
        state: &mut ResourceState,
    ) -> Result<()>;

    /// Tear down everything recorded in `state`
    ///
    /// Individual step failures are reported as [`TeardownOutcome::Failed`];
    /// an `Err` means the teardown was aborted.
    async fn delete(
        &self,
        ctx: &HandlerContext<'_>,
        state: &ResourceState,
    ) -> Result<Vec<TeardownStep>>;

    /// One-line human summary of a record
    fn describe(&self, state: &ResourceState) -> String;
}

/// A kind provisioned by a single provider call
pub struct PrimitiveHandler {
    kind: PrimitiveKind,
}

impl PrimitiveHandler {
    pub fn new(kind: PrimitiveKind) -> Self {
        Self { kind }
    }
}

#[async_trait]
impl KindHandler for PrimitiveHandler {
    fn kind(&self) -> &str {
        self.kind.as_str()
    }

    async fn create(
        &self,
        ctx: &HandlerContext<'_>,
        resource: &Resource,
        state: &mut ResourceState,
    ) -> Result<()> {
        let (spec, references) = ctx.resolve_references(resource).await?;
        let output = ctx.create(self.kind.as_str(), &spec).await?;

        let key = self.kind.output_key();
        let complete = output.provider_resources.contains_key(key);

        // ids returned without the primary one are still recorded
        if complete || !output.provider_resources.is_empty() {
            // referenced ids are kept as context for the delete call
            state.provider_resources.extend(references);
            state.provider_resources.extend(output.provider_resources);
        }
        state.status.extend(output.status);

        if !complete {
            return Err(CloudError::MissingOutput {
                kind: self.kind.as_str().to_string(),
                key: key.to_string(),
            });
        }
        Ok(())
    }

    async fn delete(
        &self,
        ctx: &HandlerContext<'_>,
        state: &ResourceState,
    ) -> Result<Vec<TeardownStep>> {
        let key = self.kind.output_key();
        if state.provider_id(key).is_none() {
            return Ok(Vec::new());
        }
        let step = ctx.teardown(self.kind, key, &state.provider_resources).await?;
        Ok(vec![step])
    }

    fn describe(&self, state: &ResourceState) -> String {
        match state.provider_id(self.kind.output_key()) {
            Some(id) => format!("{} {}", self.kind, id),
            None => format!("{} (no provider id)", self.kind),
        }
    }
}

/// Kind name → handler
#[derive(Clone, Default)]
pub struct KindRegistry {
    handlers: HashMap<String, Arc<dyn KindHandler>>,
}

impl KindRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Standalone primitives plus the composite `Stack`
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        for kind in [
            PrimitiveKind::Vpc,
            PrimitiveKind::InternetGateway,
            PrimitiveKind::Subnet,
            PrimitiveKind::RouteTable,
            PrimitiveKind::SecurityGroup,
            PrimitiveKind::Instance,
        ] {
            registry.register(Arc::new(PrimitiveHandler::new(kind)));
        }
        registry.register(Arc::new(crate::stack::StackHandler::new()));
        registry
    }

    pub fn register(&mut self, handler: Arc<dyn KindHandler>) {
        self.handlers.insert(handler.kind().to_string(), handler);
    }

    pub fn get(&self, kind: &str) -> Result<Arc<dyn KindHandler>> {
        self.handlers
            .get(kind)
            .cloned()
            .ok_or_else(|| CloudError::NotSupported(kind.to_string()))
    }

    pub fn kinds(&self) -> Vec<&str> {
        let mut kinds: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        kinds.sort_unstable();
        kinds
    }
}
