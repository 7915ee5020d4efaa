//! Failover behaviour against real HTTP hosts.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use reqwest::Method;
use search_client::hosts::HealthState;
use search_client::{ApiRequest, ClientError, SearchClient, TrafficClass};

mod common;

fn search() -> ApiRequest {
    ApiRequest::read(Method::POST, "/1/indexes/products/query")
        .with_body(serde_json::json!({"query": "lamp"}))
}

#[tokio::test]
async fn test_fails_over_to_next_host() {
    let down = common::start_mock_backend(503, r#"{"message":"unavailable"}"#).await;
    let up = common::start_mock_backend(200, r#"{"hits":[{"objectID":"1"}],"nbHits":1}"#).await;

    let client = SearchClient::new(common::config_for(&[down, up], &[up])).unwrap();
    let response = client.execute(search()).await.expect("second host should answer");

    assert_eq!(response.status, 200);
    assert_eq!(response.attempts, 2);
    assert_eq!(response.host, up.to_string());
    assert_eq!(response.body["nbHits"], 1);

    let hosts = client.host_status(TrafficClass::Read);
    assert_eq!(hosts[0].state, HealthState::Down);
    assert_eq!(hosts[1].state, HealthState::Up);
}

#[tokio::test]
async fn test_penalised_host_is_skipped_by_later_calls() {
    let calls_to_bad = Arc::new(AtomicU32::new(0));
    let counter = calls_to_bad.clone();
    let bad = common::start_programmable_backend(move || {
        let counter = counter.clone();
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            (500, r#"{"message":"internal"}"#.to_string())
        }
    })
    .await;
    let good = common::start_mock_backend(200, "{}").await;

    let client = SearchClient::new(common::config_for(&[bad, good], &[good])).unwrap();
    for _ in 0..5 {
        client.execute(search()).await.unwrap();
    }

    assert_eq!(calls_to_bad.load(Ordering::SeqCst), 1, "bad host tried only once");
}

#[tokio::test]
async fn test_client_error_is_not_retried() {
    let calls = Arc::new(AtomicU32::new(0));
    let counter = calls.clone();
    let forbidden = common::start_programmable_backend(move || {
        let counter = counter.clone();
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            (403, r#"{"message":"Invalid API key"}"#.to_string())
        }
    })
    .await;
    let other = common::start_mock_backend(200, "{}").await;
    let third = common::start_mock_backend(200, "{}").await;

    let client = SearchClient::new(common::config_for(&[forbidden, other, third], &[other])).unwrap();
    let err = client.execute(search()).await.unwrap_err();

    assert_eq!(err.status(), Some(403));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(client.host_status(TrafficClass::Read)[0].state, HealthState::Unknown);
}

#[tokio::test]
async fn test_all_hosts_unreachable() {
    let a = common::closed_addr();
    let b = common::closed_addr();

    let client = SearchClient::new(common::config_for(&[a, b], &[a])).unwrap();
    let err = client.execute(search()).await.unwrap_err();

    match err {
        ClientError::RetriesExhausted { attempts, last } => {
            assert_eq!(attempts, 2);
            assert!(last.is_transient());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_silent_host_times_out_then_fails_over() {
    let silent = common::start_silent_backend().await;
    let up = common::start_mock_backend(200, r#"{"ok":true}"#).await;

    let mut config = common::config_for(&[silent, up], &[up]);
    config.timeouts.read_ms = 200;
    let client = SearchClient::new(config).unwrap();

    let started = std::time::Instant::now();
    let response = client.execute(search()).await.unwrap();
    assert_eq!(response.host, up.to_string());
    assert!(started.elapsed() >= Duration::from_millis(200));
}

#[tokio::test]
async fn test_writes_use_write_hosts() {
    let read = common::start_mock_backend(500, "{}").await;
    let write = common::start_mock_backend(200, r#"{"taskID":42}"#).await;

    let client = SearchClient::new(common::config_for(&[read], &[write])).unwrap();
    let request = ApiRequest::write(Method::POST, "/1/indexes/products/batch")
        .with_body(serde_json::json!({"requests": []}));
    let response = client.execute(request).await.unwrap();

    assert_eq!(response.host, write.to_string());
    assert_eq!(response.body["taskID"], 42);
}
