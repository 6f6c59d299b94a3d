//! HTTP Transport Integration Tests
//!
//! Tests for the reqwest transport against a scripted local HTTP server.

mod common;

use std::sync::Arc;
use std::time::Duration;

use reqwest::Method;
use serde_json::json;
use tempfile::TempDir;
use tokio::net::TcpListener;

use common::spawn_server;
use reporter::delivery::{
    Credentials, DeliveryClient, DeliveryError, DeliveryRequest, EvidenceForm, HttpTransport,
    RetryPolicy,
};

fn http_client(max_attempts: u32) -> DeliveryClient {
    let transport = HttpTransport::new(Duration::from_secs(5)).unwrap();
    DeliveryClient::new(Arc::new(transport))
        .with_retry_policy(RetryPolicy::immediate(max_attempts))
}

#[tokio::test]
async fn test_json_post_with_bearer_token() {
    let (base_url, server) = spawn_server(vec![(201, r#"{"ok": true}"#)]).await;

    let request = DeliveryRequest::json(
        Method::POST,
        format!("{}/api/v1/projects/acme/backend/approvals/", base_url),
        &json!({ "artifact_sha256": "abc" }),
    )
    .unwrap()
    .with_credentials(Credentials::Bearer("s3cret".to_string()));

    let response = http_client(3).send(&request).await.unwrap();
    assert_eq!(response.status_code, 201);
    assert_eq!(response.body, r#"{"ok": true}"#);

    let received = server.await.unwrap();
    let raw = &received[0];
    let lower = raw.to_lowercase();
    assert!(raw.starts_with("POST /api/v1/projects/acme/backend/approvals/ HTTP/1.1"));
    assert!(lower.contains("authorization: bearer s3cret"));
    assert!(lower.contains("content-type: application/json"));
    assert!(raw.ends_with(r#"{"artifact_sha256":"abc"}"#));
}

#[tokio::test]
async fn test_basic_auth_header() {
    let (base_url, server) = spawn_server(vec![(200, "{}")]).await;

    let url = format!("{}/api/v1/environments/acme/prod", base_url);
    let request = DeliveryRequest::empty(Method::GET, url).with_credentials(Credentials::Basic {
        username: "user".to_string(),
        password: "pass".to_string(),
    });

    http_client(1).send(&request).await.unwrap();

    let received = server.await.unwrap();
    assert!(received[0].starts_with("GET /api/v1/environments/acme/prod HTTP/1.1"));
    assert!(received[0].to_lowercase().contains("authorization: basic dxnlcjpwyxnz"));
}

#[tokio::test]
async fn test_token_only_basic_auth_header() {
    let (base_url, server) = spawn_server(vec![(200, "{}")]).await;

    let request = DeliveryRequest::empty(Method::GET, format!("{}/api", base_url))
        .with_credentials(Credentials::Basic {
            username: String::new(),
            password: "s3cret".to_string(),
        });

    http_client(1).send(&request).await.unwrap();

    let received = server.await.unwrap();
    // base64(":s3cret")
    assert!(received[0].contains("Basic OnMzY3JldA=="));
}

#[tokio::test]
async fn test_server_error_then_success_over_http() {
    let (base_url, server) =
        spawn_server(vec![(503, r#"{"message": "busy"}"#), (200, "{}")]).await;

    let request = DeliveryRequest::json(Method::PUT, format!("{}/report", base_url), &json!({}))
        .unwrap();
    let response = http_client(3).send(&request).await.unwrap();

    assert_eq!(response.status_code, 200);
    let received = server.await.unwrap();
    assert_eq!(received.len(), 2);
    assert_eq!(received[0], received[1]);
}

#[tokio::test]
async fn test_client_rejection_over_http() {
    let (base_url, server) =
        spawn_server(vec![(403, r#"{"message": "Invalid API token"}"#)]).await;

    let request = DeliveryRequest::json(Method::POST, format!("{}/report", base_url), &json!({}))
        .unwrap();
    let err = http_client(3).send(&request).await.unwrap_err();

    match err {
        DeliveryError::ClientRejected {
            status, message, ..
        } => {
            assert_eq!(status, 403);
            assert_eq!(message, "Invalid API token");
        }
        other => panic!("Expected ClientRejected error, got {:?}", other),
    }
    assert_eq!(server.await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_multipart_form_streams_attachment() {
    let (base_url, server) = spawn_server(vec![(200, "{}")]).await;

    let evidence = TempDir::new().unwrap();
    let report = evidence.path().join("junit.xml");
    std::fs::write(&report, "<testsuite tests=\"3\"/>").unwrap();

    let form = EvidenceForm::new()
        .payload(&json!({ "name": "unit-tests", "commit_sha1": "abc" }))
        .unwrap()
        .attach(&report);
    let request = DeliveryRequest::form(Method::POST, format!("{}/evidence", base_url), form);

    http_client(1).send(&request).await.unwrap();

    let received = server.await.unwrap();
    let raw = &received[0];
    assert!(raw.to_lowercase().contains("content-type: multipart/form-data; boundary="));
    assert!(raw.contains("name=\"data_json\""));
    assert!(raw.contains(r#"{"commit_sha1":"abc","name":"unit-tests"}"#));
    assert!(raw.contains("name=\"evidence_file\"; filename=\"junit.xml\""));
    assert!(raw.contains("<testsuite tests=\"3\"/>"));
}

#[tokio::test]
async fn test_connection_refused_is_retried_then_reported() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let request = DeliveryRequest::empty(Method::GET, format!("http://{}/api", addr));
    let err = http_client(2).send(&request).await.unwrap_err();

    match err {
        DeliveryError::Transport { attempts, .. } => assert_eq!(attempts, 2),
        other => panic!("Expected Transport error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_invalid_url_is_not_retried() {
    let request = DeliveryRequest::empty(Method::GET, "not a url");
    let err = http_client(3).send(&request).await.unwrap_err();

    assert_eq!(err.attempts(), 1);
    assert!(matches!(err, DeliveryError::Transport { .. }));
}
