//! Cloud provider trait definition

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Logical key (e.g. `"vpcId"`) → provider-assigned identifier
pub type ProviderResources = BTreeMap<String, String>;

/// Cloud provider abstraction trait
///
/// The boundary to the remote control plane. The core never assumes anything
/// about the transport or authentication behind it.
#[async_trait]
pub trait CloudProvider: Send + Sync {
    /// Returns the provider name (e.g. "http", "memory")
    fn name(&self) -> &str;

    /// Create one resource of `kind` from its spec
    async fn create(&self, kind: &str, spec: &serde_json::Value) -> Result<ProviderOutput>;

    /// Tear down the resource identified by `provider_resources`
    ///
    /// Implementations report an already-absent resource as
    /// [`CloudError::ResourceNotFound`](crate::CloudError::ResourceNotFound).
    async fn delete(&self, kind: &str, provider_resources: &ProviderResources) -> Result<()>;
}

/// What a provider returns from a create call
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderOutput {
    #[serde(default)]
    pub provider_resources: ProviderResources,

    #[serde(default)]
    pub status: serde_json::Map<String, serde_json::Value>,
}

impl ProviderOutput {
    pub fn with_id(key: impl Into<String>, id: impl Into<String>) -> Self {
        let mut output = Self::default();
        output.provider_resources.insert(key.into(), id.into());
        output
    }
}

/// Primitive kinds understood by providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Vpc,
    InternetGateway,
    Subnet,
    RouteTable,
    Route,
    RouteTableAssociation,
    SecurityGroup,
    Instance,
}

impl PrimitiveKind {
    pub const ALL: [PrimitiveKind; 8] = [
        PrimitiveKind::Vpc,
        PrimitiveKind::InternetGateway,
        PrimitiveKind::Subnet,
        PrimitiveKind::RouteTable,
        PrimitiveKind::Route,
        PrimitiveKind::RouteTableAssociation,
        PrimitiveKind::SecurityGroup,
        PrimitiveKind::Instance,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PrimitiveKind::Vpc => "VPC",
            PrimitiveKind::InternetGateway => "InternetGateway",
            PrimitiveKind::Subnet => "Subnet",
            PrimitiveKind::RouteTable => "RouteTable",
            PrimitiveKind::Route => "Route",
            PrimitiveKind::RouteTableAssociation => "RouteTableAssociation",
            PrimitiveKind::SecurityGroup => "SecurityGroup",
            PrimitiveKind::Instance => "Instance",
        }
    }

    /// Key under which the provider reports the created identifier
    pub fn output_key(&self) -> &'static str {
        match self {
            PrimitiveKind::Vpc => "vpcId",
            PrimitiveKind::InternetGateway => "internetGatewayId",
            PrimitiveKind::Subnet => "subnetId",
            PrimitiveKind::RouteTable => "routeTableId",
            PrimitiveKind::Route => "routeId",
            PrimitiveKind::RouteTableAssociation => "associationId",
            PrimitiveKind::SecurityGroup => "securityGroupId",
            PrimitiveKind::Instance => "instanceId",
        }
    }

    pub fn id_prefix(&self) -> &'static str {
        match self {
            PrimitiveKind::Vpc => "vpc",
            PrimitiveKind::InternetGateway => "igw",
            PrimitiveKind::Subnet => "subnet",
            PrimitiveKind::RouteTable => "rtb",
            PrimitiveKind::Route => "r",
            PrimitiveKind::RouteTableAssociation => "rtbassoc",
            PrimitiveKind::SecurityGroup => "sg",
            PrimitiveKind::Instance => "i",
        }
    }

    pub fn from_kind(kind: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == kind)
    }
}

impl std::fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Retry configuration for provider operations
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of attempts, including the first
    pub max_attempts: u32,

    /// Initial delay between retries
    pub initial_delay: std::time::Duration,

    /// Maximum delay between retries
    pub max_delay: std::time::Duration,

    /// Backoff multiplier
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: std::time::Duration::from_secs(1),
            max_delay: std::time::Duration::from_secs(30),
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    /// No retries
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Delay before retry number `retry` (1-based)
    pub fn delay_for(&self, retry: u32) -> std::time::Duration {
        let factor = self
            .backoff_multiplier
            .powi(retry.saturating_sub(1) as i32);
        self.initial_delay.mul_f64(factor).min(self.max_delay)
    }
}
