//! Cloud provider and reconciliation error types

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while reconciling resources
#[derive(Error, Debug)]
pub enum CloudError {
    /// A remote provider call failed
    #[error("Provider error: {0}")]
    Provider(String),

    /// The provider reports the resource as absent
    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    #[error("State I/O error at {}: {message}", path.display())]
    StateIo { path: PathBuf, message: String },

    #[error("Unsupported resource kind: {0}")]
    NotSupported(String),

    #[error("Invalid resource identity: {0}")]
    InvalidIdentity(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Unresolved reference: {field} names {kind} '{name}' which has no recorded {key}")]
    UnresolvedReference {
        field: String,
        kind: String,
        name: String,
        key: String,
    },

    #[error("Provider returned no '{key}' for {kind}")]
    MissingOutput { kind: String, key: String },

    #[error("Teardown incomplete, failed steps: {0}")]
    PartialTeardown(String),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CloudError {
    pub(crate) fn state_io(path: impl Into<PathBuf>, err: impl std::fmt::Display) -> Self {
        CloudError::StateIo {
            path: path.into(),
            message: err.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, CloudError::ResourceNotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, CloudError>;
