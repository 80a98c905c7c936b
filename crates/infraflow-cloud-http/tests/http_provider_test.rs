//! Integration tests for the HTTP provider using wiremock.

use infraflow_cloud::{CloudError, CloudProvider, ProviderResources, RetryConfig};
use infraflow_cloud_http::{HttpProvider, HttpProviderConfig};
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fast_retry() -> RetryConfig {
    RetryConfig {
        max_attempts: 3,
        initial_delay: Duration::from_millis(10),
        max_delay: Duration::from_millis(20),
        backoff_multiplier: 2.0,
    }
}

fn provider(server: &MockServer) -> HttpProvider {
    HttpProvider::new(HttpProviderConfig::new(server.uri(), "us-east-1").with_retry(fast_retry()))
        .unwrap()
}

#[tokio::test]
async fn test_create_posts_spec_with_token() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/regions/eu-west-1/resources/VPC"))
        .and(header("Authorization", "Bearer secret-token"))
        .and(body_json(json!({ "cidr": "10.0.0.0/16" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "providerResources": { "vpcId": "vpc-0abc" },
            "status": { "state": "available" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let provider = HttpProvider::new(
        HttpProviderConfig::new(server.uri(), "eu-west-1").with_token("secret-token"),
    )
    .unwrap();

    let output = provider
        .create("VPC", &json!({ "cidr": "10.0.0.0/16" }))
        .await
        .unwrap();
    assert_eq!(output.provider_resources["vpcId"], "vpc-0abc");
    assert_eq!(output.status["state"], json!("available"));
}

#[tokio::test]
async fn test_delete_sends_provider_resources() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/v1/regions/us-east-1/resources/Subnet"))
        .and(body_json(json!({
            "providerResources": { "subnetId": "subnet-1", "vpcId": "vpc-1" }
        })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let mut target = ProviderResources::new();
    target.insert("subnetId".into(), "subnet-1".into());
    target.insert("vpcId".into(), "vpc-1".into());

    provider(&server).delete("Subnet", &target).await.unwrap();
}

#[tokio::test]
async fn test_delete_404_is_not_found() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/v1/regions/us-east-1/resources/VPC"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"message": "no such vpc"})))
        .expect(1)
        .mount(&server)
        .await;

    let mut target = ProviderResources::new();
    target.insert("vpcId".into(), "vpc-gone".into());

    let result = provider(&server).delete("VPC", &target).await;
    assert!(matches!(result, Err(CloudError::ResourceNotFound(_))));
}

#[tokio::test]
async fn test_create_retries_429() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/regions/us-east-1/resources/Subnet"))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({"message": "slow down"})))
        .up_to_n_times(2)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v1/regions/us-east-1/resources/Subnet"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "providerResources": { "subnetId": "subnet-1" }
        })))
        .mount(&server)
        .await;

    let output = provider(&server).create("Subnet", &json!({})).await;
    assert!(
        output.is_ok(),
        "Should succeed after retries: {:?}",
        output.err()
    );
    assert_eq!(output.unwrap().provider_resources["subnetId"], "subnet-1");
}

#[tokio::test]
async fn test_create_does_not_retry_server_error() {
    let server = MockServer::start().await;

    // the server may have created the VPC before failing
    Mock::given(method("POST"))
        .and(path("/v1/regions/us-east-1/resources/VPC"))
        .respond_with(ResponseTemplate::new(503).set_body_string("Service Unavailable"))
        .expect(1)
        .mount(&server)
        .await;

    let result = provider(&server).create("VPC", &json!({})).await;
    assert!(matches!(result, Err(CloudError::Provider(ref m)) if m.contains("503")));
}

#[tokio::test]
async fn test_delete_retries_503_and_429() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/v1/regions/us-east-1/resources/VPC"))
        .respond_with(ResponseTemplate::new(503).set_body_string("Service Unavailable"))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/v1/regions/us-east-1/resources/VPC"))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({"message": "slow down"})))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/v1/regions/us-east-1/resources/VPC"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let mut target = ProviderResources::new();
    target.insert("vpcId".into(), "vpc-1".into());

    let result = provider(&server).delete("VPC", &target).await;
    assert!(result.is_ok(), "Should succeed after retries: {:?}", result.err());
}

#[tokio::test]
async fn test_no_retry_on_400() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/regions/us-east-1/resources/VPC"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({"message": "invalid cidr"})))
        .expect(1)
        .mount(&server)
        .await;

    let result = provider(&server).create("VPC", &json!({ "cidr": "nope" })).await;
    match result {
        Err(CloudError::Provider(message)) => {
            assert!(message.contains("400"), "{}", message);
            assert!(message.contains("invalid cidr"), "{}", message);
        }
        other => panic!("unexpected result: {:?}", other),
    }
}

#[tokio::test]
async fn test_retry_exhausted() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/v1/regions/us-east-1/resources/VPC"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"error": "boom"})))
        .expect(3)
        .mount(&server)
        .await;

    let mut target = ProviderResources::new();
    target.insert("vpcId".into(), "vpc-1".into());

    let result = provider(&server).delete("VPC", &target).await;
    assert!(matches!(result, Err(CloudError::Provider(ref m)) if m.contains("boom")));
}
