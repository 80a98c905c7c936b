//! HTTP provider for InfraFlow
//!
//! Implements [`CloudProvider`](infraflow_cloud::CloudProvider) against a
//! JSON control-plane API:
//!
//! ```text
//! POST   {endpoint}/v1/regions/{region}/resources/{kind}   body: spec
//! DELETE {endpoint}/v1/regions/{region}/resources/{kind}   body: {"providerResources": {...}}
//! ```
//!
//! # Requirements
//!
//! - An endpoint and region (see `infraflow-config`)
//! - Optionally a bearer token in `INFRAFLOW_API_TOKEN` (or the configured variable)
//!
//! # Example
//!
//! ```ignore
//! use infraflow_cloud_http::{HttpProvider, HttpProviderConfig};
//!
//! let config = HttpProviderConfig::new("https://cloud.example.com", "us-east-1")
//!     .with_token_from_env("INFRAFLOW_API_TOKEN");
//! let provider = HttpProvider::new(config)?;
//! ```

pub mod error;
pub mod provider;

pub use error::{HttpProviderError, Result};
pub use provider::{DEFAULT_TOKEN_ENV, HttpProvider, HttpProviderConfig};
