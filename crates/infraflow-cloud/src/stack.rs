//! Composite stack expansion
//!
//! A `Stack` resource expands into a network plus optional compute:
//!
//! ```text
//! VPC → InternetGateway → Subnet → RouteTable → Route (0.0.0.0/0)
//!     → RouteTableAssociation → SecurityGroup → [Instance]
//! ```
//!
//! Every step's id lands in `providerResources` and is checkpointed to the
//! state store as soon as the step succeeds, so a failure at step N+1 leaves
//! a record holding exactly steps 1..N. Teardown walks the recorded keys in
//! reverse creation order and keeps going past individual failures.

use crate::action::TeardownStep;
use crate::error::{CloudError, Result};
use crate::handler::{HandlerContext, KindHandler};
use crate::provider::{PrimitiveKind, ProviderResources};
use crate::state::ResourceState;
use async_trait::async_trait;
use infraflow_core::{Resource, STACK_KIND};
use serde::Deserialize;
use serde_json::json;

/// Key for a VPC the stack uses but does not own (`vpcRef`)
pub const SHARED_VPC_KEY: &str = "sharedVpcId";

const DEFAULT_ROUTE_CIDR: &str = "0.0.0.0/0";

/// Reverse of creation order
const TEARDOWN_ORDER: [PrimitiveKind; 8] = [
    PrimitiveKind::Instance,
    PrimitiveKind::SecurityGroup,
    PrimitiveKind::RouteTableAssociation,
    PrimitiveKind::Route,
    PrimitiveKind::RouteTable,
    PrimitiveKind::Subnet,
    PrimitiveKind::InternetGateway,
    PrimitiveKind::Vpc,
];

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StackSpec {
    vpc: Option<VpcSpec>,
    vpc_ref: Option<String>,
    subnet: SubnetSpec,
    #[serde(default)]
    security_group: SecurityGroupSpec,
    instance: Option<InstanceSpec>,
}

#[derive(Debug, Deserialize)]
struct VpcSpec {
    cidr: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubnetSpec {
    cidr: String,
    availability_zone: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct SecurityGroupSpec {
    #[serde(default)]
    ingress: Vec<serde_json::Value>,
    #[serde(default)]
    egress: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InstanceSpec {
    image_id: String,
    instance_type: Option<String>,
}

#[derive(Debug, Default)]
pub struct StackHandler;

impl StackHandler {
    pub fn new() -> Self {
        Self
    }

    /// One provider create; its id is recorded and checkpointed before returning
    async fn step(
        &self,
        ctx: &HandlerContext<'_>,
        state: &mut ResourceState,
        kind: PrimitiveKind,
        params: serde_json::Value,
    ) -> Result<String> {
        let output = ctx.create(kind.as_str(), &params).await?;
        let key = kind.output_key();
        let id = output
            .provider_resources
            .get(key)
            .cloned()
            .ok_or_else(|| CloudError::MissingOutput {
                kind: kind.as_str().to_string(),
                key: key.to_string(),
            })?;

        state.provider_resources.insert(key.to_string(), id.clone());
        ctx.store.save(state).await?;

        tracing::info!(stack = %state.id(), step = %kind, id = %id, "Stack step created");
        Ok(id)
    }
}

fn parse_spec(resource: &Resource) -> Result<StackSpec> {
    let spec: StackSpec = serde_json::from_value(resource.spec.clone())
        .map_err(|e| CloudError::InvalidConfig(format!("{}: {}", resource.id(), e)))?;

    if spec.vpc.is_some() == spec.vpc_ref.is_some() {
        return Err(CloudError::InvalidConfig(format!(
            "{}: exactly one of spec.vpc or spec.vpcRef is required",
            resource.id()
        )));
    }
    Ok(spec)
}

#[async_trait]
impl KindHandler for StackHandler {
    fn kind(&self) -> &str {
        STACK_KIND
    }

    async fn create(
        &self,
        ctx: &HandlerContext<'_>,
        resource: &Resource,
        state: &mut ResourceState,
    ) -> Result<()> {
        let spec = parse_spec(resource)?;
        let name = resource.name();

        let vpc_id = if let Some(vpc) = &spec.vpc {
            self.step(ctx, state, PrimitiveKind::Vpc, json!({ "cidr": vpc.cidr, "name": name }))
                .await?
        } else if let Some(vpc_name) = &spec.vpc_ref {
            let id = ctx
                .resolve_reference("vpcRef", PrimitiveKind::Vpc, resource.namespace(), vpc_name)
                .await?;
            state
                .provider_resources
                .insert(SHARED_VPC_KEY.to_string(), id.clone());
            ctx.store.save(state).await?;
            id
        } else {
            return Err(CloudError::InvalidConfig(format!("{}: no VPC source", resource.id())));
        };

        let gateway_id = self
            .step(ctx, state, PrimitiveKind::InternetGateway, json!({ "vpcId": vpc_id }))
            .await?;

        let subnet_id = self
            .step(
                ctx,
                state,
                PrimitiveKind::Subnet,
                json!({
                    "vpcId": vpc_id,
                    "cidr": spec.subnet.cidr,
                    "availabilityZone": spec.subnet.availability_zone,
                }),
            )
            .await?;

        let route_table_id = self
            .step(ctx, state, PrimitiveKind::RouteTable, json!({ "vpcId": vpc_id }))
            .await?;

        self.step(
            ctx,
            state,
            PrimitiveKind::Route,
            json!({
                "routeTableId": route_table_id,
                "destinationCidr": DEFAULT_ROUTE_CIDR,
                "internetGatewayId": gateway_id,
            }),
        )
        .await?;

        self.step(
            ctx,
            state,
            PrimitiveKind::RouteTableAssociation,
            json!({ "routeTableId": route_table_id, "subnetId": subnet_id }),
        )
        .await?;

        let security_group_id = self
            .step(
                ctx,
                state,
                PrimitiveKind::SecurityGroup,
                json!({
                    "vpcId": vpc_id,
                    "name": format!("{}-sg", name),
                    "ingress": spec.security_group.ingress,
                    "egress": spec.security_group.egress,
                }),
            )
            .await?;

        if let Some(instance) = &spec.instance {
            self.step(
                ctx,
                state,
                PrimitiveKind::Instance,
                json!({
                    "subnetId": subnet_id,
                    "securityGroupIds": [security_group_id],
                    "imageId": instance.image_id,
                    "instanceType": instance.instance_type,
                }),
            )
            .await?;
        }

        Ok(())
    }

    async fn delete(
        &self,
        ctx: &HandlerContext<'_>,
        state: &ResourceState,
    ) -> Result<Vec<TeardownStep>> {
        let vpc_id = state
            .provider_id(PrimitiveKind::Vpc.output_key())
            .or_else(|| state.provider_id(SHARED_VPC_KEY));
        let mut steps = Vec::new();

        for kind in TEARDOWN_ORDER {
            let key = kind.output_key();
            let Some(id) = state.provider_id(key) else {
                continue;
            };

            let mut target = ProviderResources::new();
            target.insert(key.to_string(), id.to_string());
            match kind {
                // detach before delete
                PrimitiveKind::InternetGateway => {
                    if let Some(vpc_id) = vpc_id {
                        target.insert("vpcId".to_string(), vpc_id.to_string());
                    }
                }
                PrimitiveKind::Route | PrimitiveKind::RouteTableAssociation => {
                    if let Some(route_table_id) = state.provider_id("routeTableId") {
                        target.insert("routeTableId".to_string(), route_table_id.to_string());
                    }
                }
                _ => {}
            }

            steps.push(ctx.teardown(kind, key, &target).await?);
        }

        Ok(steps)
    }

    fn describe(&self, state: &ResourceState) -> String {
        let owned = TEARDOWN_ORDER
            .iter()
            .filter(|kind| state.provider_id(kind.output_key()).is_some())
            .count();
        match state.provider_id(SHARED_VPC_KEY) {
            Some(vpc) => format!("Stack ({} primitives, shared VPC {})", owned, vpc),
            None => format!("Stack ({} primitives)", owned),
        }
    }
}
