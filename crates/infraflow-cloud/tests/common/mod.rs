use infraflow_cloud::{CloudProvider, Engine, MemoryProvider, StateStore};
use infraflow_core::{Resource, ResourceId};
use serde_json::{Value, json};
use std::sync::Arc;
use tempfile::TempDir;

pub const API_VERSION: &str = "infraflow.io/v1";

/// Engine backed by a memory provider and a temporary state directory
pub struct TestEnv {
    pub root: TempDir,
    pub provider: Arc<MemoryProvider>,
    pub engine: Engine,
}

impl TestEnv {
    pub fn new() -> Self {
        let root = tempfile::tempdir().unwrap();
        let provider = Arc::new(MemoryProvider::new());
        let engine = Engine::new(
            StateStore::new(root.path()),
            provider.clone() as Arc<dyn CloudProvider>,
        );
        Self {
            root,
            provider,
            engine,
        }
    }

    /// Second engine over the same state directory and provider
    #[allow(dead_code)]
    pub fn reopen(&self) -> Engine {
        Engine::new(
            StateStore::new(self.root.path()),
            self.provider.clone() as Arc<dyn CloudProvider>,
        )
    }
}

pub fn resource(kind: &str, name: &str, spec: Value) -> Resource {
    Resource::new(API_VERSION, kind, name, spec)
}

pub fn vpc(name: &str) -> Resource {
    resource("VPC", name, json!({ "cidr": "10.0.0.0/16" }))
}

#[allow(dead_code)]
pub fn stack_with_vpc(name: &str) -> Resource {
    resource(
        "Stack",
        name,
        json!({
            "vpc": { "cidr": "10.1.0.0/16" },
            "subnet": { "cidr": "10.1.1.0/24" },
            "securityGroup": {
                "ingress": [{ "protocol": "tcp", "port": 443, "cidr": "0.0.0.0/0" }]
            }
        }),
    )
}

#[allow(dead_code)]
pub fn stack_with_vpc_ref(name: &str, vpc_name: &str) -> Resource {
    resource(
        "Stack",
        name,
        json!({
            "vpcRef": vpc_name,
            "subnet": { "cidr": "10.0.1.0/24", "availabilityZone": "us-east-1a" },
            "instance": { "imageId": "ami-12345", "instanceType": "t3.micro" }
        }),
    )
}

pub fn id(kind: &str, name: &str) -> ResourceId {
    ResourceId::new(kind, "default", name)
}
