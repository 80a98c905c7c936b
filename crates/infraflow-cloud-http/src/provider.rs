//! HTTP provider implementation

use crate::error::{HttpProviderError, Result};
use async_trait::async_trait;
use infraflow_cloud::{CloudProvider, ProviderOutput, ProviderResources, RetryConfig};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// Environment variable read for the bearer token unless configured otherwise
pub const DEFAULT_TOKEN_ENV: &str = "INFRAFLOW_API_TOKEN";

const API_VERSION_PATH: &str = "v1";
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Connection settings for [`HttpProvider`]
#[derive(Debug, Clone)]
pub struct HttpProviderConfig {
    pub endpoint: String,
    pub region: String,
    pub api_token: Option<String>,
    pub retry: RetryConfig,

    /// Per-request timeout
    pub request_timeout: Duration,
}

impl HttpProviderConfig {
    pub fn new(endpoint: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            region: region.into(),
            api_token: None,
            retry: RetryConfig::default(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Read the bearer token from `var`; an unset or empty variable means no token
    pub fn with_token_from_env(mut self, var: &str) -> Self {
        self.api_token = std::env::var(var).ok().filter(|t| !t.is_empty());
        self
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(token.into());
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DeleteRequest<'a> {
    provider_resources: &'a ProviderResources,
}

#[derive(Deserialize, Default)]
struct ApiErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Provider backed by a remote JSON control plane
pub struct HttpProvider {
    client: reqwest::Client,
    config: HttpProviderConfig,
}

impl HttpProvider {
    pub fn new(config: HttpProviderConfig) -> Result<Self> {
        if config.endpoint.trim().is_empty() {
            return Err(HttpProviderError::InvalidConfig(
                "provider endpoint is not set".to_string(),
            ));
        }
        if !config.endpoint.starts_with("http://") && !config.endpoint.starts_with("https://") {
            return Err(HttpProviderError::InvalidConfig(format!(
                "provider endpoint must be an http(s) URL: {}",
                config.endpoint
            )));
        }
        if config.region.trim().is_empty() {
            return Err(HttpProviderError::InvalidConfig(
                "provider region is not set".to_string(),
            ));
        }

        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &HttpProviderConfig {
        &self.config
    }

    /// Collection URL for one resource kind
    pub fn resource_url(&self, kind: &str) -> String {
        format!(
            "{}/{}/regions/{}/resources/{}",
            self.config.endpoint.trim_end_matches('/'),
            API_VERSION_PATH,
            self.config.region,
            kind
        )
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.config.api_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Send a request, retrying the failures `replay` allows
    async fn send_with_retry<F>(&self, replay: Replay, build: F) -> Result<reqwest::Response>
    where
        F: Fn() -> reqwest::RequestBuilder,
    {
        let max_attempts = self.config.retry.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            let last_attempt = attempt >= max_attempts;
            match self.authorize(build()).send().await {
                Ok(response) if replay.retries_status(response.status()) && !last_attempt => {
                    warn!(status = %response.status(), attempt, "Retryable response");
                }
                Ok(response) => return Ok(response),
                Err(e) if replay.retries_error(&e) && !last_attempt => {
                    warn!(error = %e, attempt, "Request failed, retrying");
                }
                Err(e) => return Err(e.into()),
            }

            tokio::time::sleep(self.config.retry.delay_for(attempt)).await;
            attempt += 1;
        }
    }
}

/// Which failures a request may be repeated after
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Replay {
    /// Repeating has no further effect (DELETE): 429, 5xx, connect and timeout
    Idempotent,
    /// The server may already have acted (POST): only 429 and connect errors,
    /// where the request was refused before being processed
    Unprocessed,
}

impl Replay {
    fn retries_status(self, status: StatusCode) -> bool {
        match self {
            Replay::Idempotent => {
                status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
            }
            Replay::Unprocessed => status == StatusCode::TOO_MANY_REQUESTS,
        }
    }

    fn retries_error(self, error: &reqwest::Error) -> bool {
        match self {
            Replay::Idempotent => error.is_connect() || error.is_timeout(),
            Replay::Unprocessed => error.is_connect(),
        }
    }
}

/// Turn a non-success response into an error
async fn error_from_response(response: reqwest::Response, what: String) -> HttpProviderError {
    let status = response.status();
    if status == StatusCode::NOT_FOUND {
        return HttpProviderError::NotFound(what);
    }

    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ApiErrorBody>(&text)
        .ok()
        .and_then(|body| body.message.or(body.error))
        .unwrap_or_else(|| {
            if text.is_empty() {
                status
                    .canonical_reason()
                    .unwrap_or("Unknown error")
                    .to_string()
            } else {
                text
            }
        });

    HttpProviderError::Api {
        status: status.as_u16(),
        message,
    }
}

#[async_trait]
impl CloudProvider for HttpProvider {
    fn name(&self) -> &str {
        "http"
    }

    async fn create(
        &self,
        kind: &str,
        spec: &serde_json::Value,
    ) -> infraflow_cloud::Result<ProviderOutput> {
        let url = self.resource_url(kind);
        debug!(url = %url, "POST");

        let response = self
            .send_with_retry(Replay::Unprocessed, || self.client.post(&url).json(spec))
            .await?;

        if !response.status().is_success() {
            return Err(error_from_response(response, kind.to_string()).await.into());
        }

        let output: ProviderOutput = response.json().await.map_err(HttpProviderError::from)?;
        Ok(output)
    }

    async fn delete(
        &self,
        kind: &str,
        provider_resources: &ProviderResources,
    ) -> infraflow_cloud::Result<()> {
        let url = self.resource_url(kind);
        let body = DeleteRequest { provider_resources };
        debug!(url = %url, "DELETE");

        let response = self
            .send_with_retry(Replay::Idempotent, || self.client.delete(&url).json(&body))
            .await?;

        if !response.status().is_success() {
            let what = format!("{} {:?}", kind, provider_resources);
            return Err(error_from_response(response, what).await.into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use infraflow_cloud::CloudError;

    fn provider(endpoint: &str) -> HttpProvider {
        HttpProvider::new(HttpProviderConfig::new(endpoint, "us-east-1")).unwrap()
    }

    #[test]
    fn test_resource_url() {
        assert_eq!(
            provider("https://cloud.example.com").resource_url("VPC"),
            "https://cloud.example.com/v1/regions/us-east-1/resources/VPC"
        );
        assert_eq!(
            provider("https://cloud.example.com/api/").resource_url("Subnet"),
            "https://cloud.example.com/api/v1/regions/us-east-1/resources/Subnet"
        );
    }

    #[test]
    fn test_rejects_invalid_config() {
        let empty = HttpProvider::new(HttpProviderConfig::new("", "us-east-1"));
        assert!(matches!(empty, Err(HttpProviderError::InvalidConfig(_))));

        let scheme = HttpProvider::new(HttpProviderConfig::new("cloud.example.com", "us-east-1"));
        assert!(matches!(scheme, Err(HttpProviderError::InvalidConfig(_))));

        let region = HttpProvider::new(HttpProviderConfig::new("https://cloud.example.com", ""));
        assert!(matches!(region, Err(HttpProviderError::InvalidConfig(_))));
    }

    #[test]
    fn test_retryable_status() {
        let delete = Replay::Idempotent;
        assert!(delete.retries_status(StatusCode::TOO_MANY_REQUESTS));
        assert!(delete.retries_status(StatusCode::BAD_GATEWAY));
        assert!(delete.retries_status(StatusCode::SERVICE_UNAVAILABLE));
        assert!(!delete.retries_status(StatusCode::NOT_FOUND));
        assert!(!delete.retries_status(StatusCode::BAD_REQUEST));

        // a 5xx on create may follow a resource the server already made
        let create = Replay::Unprocessed;
        assert!(create.retries_status(StatusCode::TOO_MANY_REQUESTS));
        assert!(!create.retries_status(StatusCode::INTERNAL_SERVER_ERROR));
        assert!(!create.retries_status(StatusCode::SERVICE_UNAVAILABLE));
        assert!(!create.retries_status(StatusCode::BAD_REQUEST));
    }

    #[test]
    fn test_error_conversion() {
        let not_found: CloudError = HttpProviderError::NotFound("VPC vpc-1".into()).into();
        assert!(not_found.is_not_found());

        let api: CloudError = HttpProviderError::Api {
            status: 400,
            message: "bad cidr".into(),
        }
        .into();
        assert!(matches!(api, CloudError::Provider(ref m) if m.contains("bad cidr")));
    }

    #[test]
    fn test_token_from_env() {
        let config = HttpProviderConfig::new("https://cloud.example.com", "us-east-1")
            .with_token_from_env("INFRAFLOW_TEST_TOKEN_THAT_IS_NEVER_SET");
        assert_eq!(config.api_token, None);

        let config = config.with_token("secret");
        assert_eq!(config.api_token.as_deref(), Some("secret"));
    }
}
