//! HTTP provider error types

use infraflow_cloud::CloudError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HttpProviderError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<HttpProviderError> for CloudError {
    fn from(err: HttpProviderError) -> Self {
        match err {
            HttpProviderError::NotFound(what) => CloudError::ResourceNotFound(what),
            HttpProviderError::InvalidConfig(message) => CloudError::InvalidConfig(message),
            other => CloudError::Provider(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, HttpProviderError>;
