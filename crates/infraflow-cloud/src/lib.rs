//! InfraFlow Cloud Reconciliation
//!
//! This crate reconciles declared resources against a remote control plane,
//! recording what was provisioned in a local state store.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │                  InfraFlow CLI                   │
//! │            (infra plan/apply/delete)             │
//! └─────────────────┬───────────────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────────────┐
//! │               infraflow-cloud                    │
//! │  ┌──────────────────────────────────────────┐   │
//! │  │                 Engine                    │   │
//! │  │     plan / apply / delete / get           │   │
//! │  └──────────────────────────────────────────┘   │
//! │  ┌──────────────┐  ┌──────────────┐            │
//! │  │ KindRegistry │  │  StateStore  │            │
//! │  │ (Stack, VPC…)│  │ (JSON files) │            │
//! │  └──────────────┘  └──────────────┘            │
//! │  ┌──────────────────────────────────────────┐   │
//! │  │          Provider Abstraction             │   │
//! │  │  trait CloudProvider { ... }              │   │
//! │  └──────────────────────────────────────────┘   │
//! └───────┬─────────────────┬───────────────────────┘
//!         │                 │
//! ┌───────▼───────┐ ┌───────▼───────┐
//! │    memory     │ │     http      │
//! │   provider    │ │   provider    │
//! └───────────────┘ └───────────────┘
//! ```

pub mod action;
pub mod engine;
pub mod error;
pub mod handler;
pub mod memory;
pub mod provider;
pub mod stack;
pub mod state;

// Re-exports
pub use action::{
    ApplyResult, DeleteResult, FailedResource, PlanResult, PlanSummary, REASON_ALREADY_EXISTS,
    REASON_NOT_FOUND, SkippedResource, TeardownOutcome, TeardownStep,
};
pub use engine::Engine;
pub use error::{CloudError, Result};
pub use handler::{HandlerContext, KindHandler, KindRegistry, PrimitiveHandler};
pub use memory::{MemoryProvider, ProviderCall};
pub use provider::{CloudProvider, PrimitiveKind, ProviderOutput, ProviderResources, RetryConfig};
pub use stack::{SHARED_VPC_KEY, StackHandler};
pub use state::{ResourceState, StateStore, STATE_VERSION};
