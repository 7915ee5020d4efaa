//! Request execution across hosts.
//!
//! # Responsibilities
//! - Pull hosts for a logical call from the retry strategy
//! - Perform sequential physical attempts with escalating timeouts
//! - Classify each attempt and report it back to the strategy
//! - Stop on success, on a non-transient failure, or when hosts run out

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use std::sync::Arc;
use std::time::Duration;
use url::Url;
use uuid::Uuid;

use crate::config::{ClientConfig, TimeoutConfig};
use crate::error::ClientError;
use crate::executor::request::{ApiRequest, ApiResponse};
use crate::hosts::HostRecord;
use crate::observability::metrics;
use crate::retry::{classify_response, classify_transport, Outcome, RetryStrategy};
use crate::transport::{HttpRequest, RawResponse, Transport, TransportError, TransportErrorKind};

/// Header carrying the application id.
pub const APPLICATION_ID_HEADER: &str = "x-search-application-id";
/// Header carrying the API key.
pub const API_KEY_HEADER: &str = "x-search-api-key";

/// Drives logical calls against the hosts of a [`RetryStrategy`].
pub struct RequestExecutor {
    strategy: RetryStrategy,
    transport: Arc<dyn Transport>,
    timeouts: TimeoutConfig,
    default_headers: HeaderMap,
    retryable_statuses: Vec<u16>,
}

impl RequestExecutor {
    pub fn new(
        strategy: RetryStrategy,
        transport: Arc<dyn Transport>,
        config: &ClientConfig,
    ) -> Result<Self, ClientError> {
        Ok(Self {
            strategy,
            transport,
            timeouts: config.timeouts.clone(),
            default_headers: default_headers(config)?,
            retryable_statuses: config.retry.retryable_statuses.clone(),
        })
    }

    pub fn strategy(&self) -> &RetryStrategy {
        &self.strategy
    }

    /// Run one logical call to completion.
    ///
    /// Attempt `n` uses `base × n` as its timeout. Dropping the returned
    /// future abandons the in-flight attempt without reporting it.
    pub async fn execute(&self, request: &ApiRequest, operation_id: Uuid) -> Result<ApiResponse, ClientError> {
        let traffic = request.traffic;
        let base = match request.timeout {
            Some(timeout) if timeout.is_zero() => {
                return Err(ClientError::InvalidRequest(
                    "per-request timeout must be greater than zero".to_string(),
                ));
            }
            Some(timeout) => timeout,
            None => self.timeouts.base_for(traffic),
        };
        let headers = self.headers_for(request);
        let body = request
            .body
            .as_ref()
            .map(serde_json::to_vec)
            .transpose()
            .map_err(|e| ClientError::InvalidRequest(format!("body is not serializable: {}", e)))?;
        let retryable: Vec<u16> = self
            .retryable_statuses
            .iter()
            .chain(request.retryable_statuses.iter())
            .copied()
            .collect();

        let hosts = self.strategy.pool(traffic);
        let mut timeout = Duration::ZERO;
        let mut attempts: u32 = 0;
        let mut last_error: Option<ClientError> = None;

        for host in hosts {
            attempts += 1;
            timeout += base;

            let url = build_url(&host.url, &request.path, &request.query)?;
            let http_request = HttpRequest {
                method: request.method.clone(),
                url,
                headers: headers.clone(),
                body: body.clone(),
                timeout,
            };

            tracing::debug!(
                operation_id = %operation_id,
                host = %host.authority(),
                attempt = attempts,
                timeout_ms = timeout.as_millis() as u64,
                "Sending attempt"
            );

            let result = match tokio::time::timeout(timeout, self.transport.send(http_request)).await {
                Ok(result) => result,
                Err(_) => Err(TransportError::timeout(format!("no response within {:?}", timeout))),
            };

            let (outcome, error) = match result {
                Ok(response) => match classify_response(&response, &retryable) {
                    Outcome::Success => match parse_body(&response) {
                        Ok(body) => {
                            self.strategy.notify(&host, Outcome::Success);
                            metrics::record_attempt(traffic, Outcome::Success);
                            return Ok(ApiResponse {
                                status: response.status,
                                host: host.authority(),
                                attempts,
                                body,
                            });
                        }
                        Err(message) => (
                            Outcome::NonTransient,
                            ClientError::MalformedResponse {
                                host: host.authority(),
                                message,
                            },
                        ),
                    },
                    outcome => (
                        outcome,
                        ClientError::Status {
                            host: host.authority(),
                            status: response.status,
                            message: response.body_excerpt(),
                        },
                    ),
                },
                Err(err) => (classify_transport(&err), transport_error(&host, err, timeout)),
            };

            self.strategy.notify(&host, outcome);
            metrics::record_attempt(traffic, outcome);

            if outcome == Outcome::NonTransient {
                tracing::debug!(
                    operation_id = %operation_id,
                    host = %host.authority(),
                    error = %error,
                    "Non-transient failure, not retrying"
                );
                return Err(error);
            }

            tracing::warn!(
                operation_id = %operation_id,
                host = %host.authority(),
                attempt = attempts,
                error = %error,
                "Transient failure, trying next host"
            );
            last_error = Some(error);
        }

        match last_error {
            Some(last) => Err(ClientError::RetriesExhausted {
                attempts,
                last: Box::new(last),
            }),
            None => Err(ClientError::NoHosts(traffic)),
        }
    }

    // Defaults first, request headers override.
    fn headers_for(&self, request: &ApiRequest) -> HeaderMap {
        let mut headers = self.default_headers.clone();
        if request.body.is_some() {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        }
        for (name, value) in request.headers.iter() {
            headers.insert(name.clone(), value.clone());
        }
        headers
    }
}

/// Config headers followed by credentials.
fn default_headers(config: &ClientConfig) -> Result<HeaderMap, ClientError> {
    let mut headers = HeaderMap::new();
    for (name, value) in &config.headers {
        insert_header(&mut headers, name, value)?;
    }
    if let Some(credentials) = &config.credentials {
        insert_header(&mut headers, APPLICATION_ID_HEADER, &credentials.application_id)?;
        insert_header(&mut headers, API_KEY_HEADER, &credentials.api_key)?;
    }
    Ok(headers)
}

fn insert_header(headers: &mut HeaderMap, name: &str, value: &str) -> Result<(), ClientError> {
    let name = HeaderName::from_bytes(name.as_bytes())
        .map_err(|e| ClientError::InvalidRequest(format!("header name '{}': {}", name, e)))?;
    let value = HeaderValue::from_str(value)
        .map_err(|e| ClientError::InvalidRequest(format!("header '{}': {}", name, e)))?;
    headers.insert(name, value);
    Ok(())
}

/// Absolute URL for `path` on `base`, with query pairs appended.
///
/// The result always keeps the scheme and authority of `base`.
pub fn build_url(base: &Url, path: &str, query: &[(String, String)]) -> Result<Url, ClientError> {
    if !path.starts_with('/') || path.starts_with("//") {
        return Err(ClientError::InvalidRequest(format!(
            "path must start with a single '/': {}",
            path
        )));
    }
    let (path, inline_query) = match path.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (path, None),
    };

    let mut url = base.clone();
    url.set_path(path);
    url.set_query(inline_query);
    url.set_fragment(None);
    if !query.is_empty() {
        let mut pairs = url.query_pairs_mut();
        for (key, value) in query {
            pairs.append_pair(key, value);
        }
    }

    if url.host_str() != base.host_str() || url.port_or_known_default() != base.port_or_known_default() {
        return Err(ClientError::InvalidRequest(format!(
            "path '{}' escapes host {}",
            path, base
        )));
    }
    Ok(url)
}

fn parse_body(response: &RawResponse) -> Result<serde_json::Value, String> {
    if response.body.iter().all(u8::is_ascii_whitespace) {
        return Ok(serde_json::Value::Null);
    }
    serde_json::from_slice(&response.body).map_err(|e| e.to_string())
}

fn transport_error(host: &HostRecord, err: TransportError, timeout: Duration) -> ClientError {
    let host = host.authority();
    match err.kind {
        TransportErrorKind::Timeout => ClientError::Timeout { host, timeout },
        TransportErrorKind::Connect => ClientError::Connect {
            host,
            message: err.message,
        },
        TransportErrorKind::Dns => ClientError::Dns {
            host,
            message: err.message,
        },
        TransportErrorKind::Other => ClientError::Transport {
            host,
            message: err.message,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hosts::{parse_host, HealthState, TrafficClass};
    use crate::retry::DEFAULT_EXPIRATION_DELAY;
    use crate::transport::mock::{MockTransport, Scripted};
    use reqwest::Method;

    const BASE: Duration = Duration::from_millis(500);

    fn setup(read: &[&str]) -> (Arc<MockTransport>, RequestExecutor) {
        let strategy = RetryStrategy::new(
            read.iter().map(|n| parse_host(n).unwrap()),
            vec![parse_host("w").unwrap()],
            DEFAULT_EXPIRATION_DELAY,
        );
        let transport = Arc::new(MockTransport::new());
        let mut config = ClientConfig::for_application("app", "key");
        config.timeouts.read_ms = BASE.as_millis() as u64;
        let executor = RequestExecutor::new(strategy, transport.clone(), &config).unwrap();
        (transport, executor)
    }

    fn search() -> ApiRequest {
        ApiRequest::read(Method::POST, "/1/indexes/products/query")
    }

    #[tokio::test]
    async fn test_success_on_first_host() {
        let (transport, executor) = setup(&["a", "b"]);
        transport.respond("a", 200, r#"{"hits":[]}"#);

        let response = executor.execute(&search(), Uuid::new_v4()).await.unwrap();
        assert_eq!(response.host, "a");
        assert_eq!(response.attempts, 1);
        assert_eq!(response.body["hits"], serde_json::json!([]));

        let a = &executor.strategy().hosts(TrafficClass::Read)[0];
        assert_eq!(a.state, HealthState::Up);
    }

    #[tokio::test]
    async fn test_exhaustion_escalates_timeout() {
        let (transport, executor) = setup(&["a", "b"]);
        transport.respond("a", 503, "unavailable");
        transport.fail("b", TransportErrorKind::Connect);

        let err = executor.execute(&search(), Uuid::new_v4()).await.unwrap_err();
        match err {
            ClientError::RetriesExhausted { attempts, last } => {
                assert_eq!(attempts, 2);
                assert!(matches!(*last, ClientError::Connect { .. }));
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let calls = transport.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].timeout, BASE);
        assert_eq!(calls[1].timeout, BASE * 2);

        let records = executor.strategy().hosts(TrafficClass::Read);
        assert!(records.iter().all(|r| r.state == HealthState::Down));
    }

    #[tokio::test]
    async fn test_non_transient_short_circuits() {
        let (transport, executor) = setup(&["a", "b", "c"]);
        transport.respond("a", 403, r#"{"message":"Invalid API key"}"#);

        let err = executor.execute(&search(), Uuid::new_v4()).await.unwrap_err();
        assert_eq!(err.status(), Some(403));
        assert_eq!(transport.hosts_called(), vec!["a"]);

        let a = &executor.strategy().hosts(TrafficClass::Read)[0];
        assert_eq!(a.state, HealthState::Unknown);
        assert_eq!(executor.strategy().eligible_hosts(TrafficClass::Read).len(), 3);
    }

    #[tokio::test]
    async fn test_failover_then_success() {
        let (transport, executor) = setup(&["a", "b", "c"]);
        transport.fail("a", TransportErrorKind::Dns);
        transport.respond("b", 200, "{}");

        let response = executor.execute(&search(), Uuid::new_v4()).await.unwrap();
        assert_eq!(response.host, "b");
        assert_eq!(response.attempts, 2);

        // The next call skips the penalised host.
        executor.execute(&search(), Uuid::new_v4()).await.unwrap();
        assert_eq!(transport.hosts_called(), vec!["a", "b", "b"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hanging_host_times_out() {
        let (transport, executor) = setup(&["a", "b"]);
        transport.script("a", Scripted::Hang);
        transport.respond("b", 200, "{}");

        let response = executor.execute(&search(), Uuid::new_v4()).await.unwrap();
        assert_eq!(response.host, "b");
        let a = &executor.strategy().hosts(TrafficClass::Read)[0];
        assert_eq!(a.state, HealthState::Down);
    }

    #[tokio::test]
    async fn test_designated_status_is_retried() {
        let (transport, executor) = setup(&["a", "b"]);
        transport.respond("a", 429, "slow down");
        transport.respond("b", 200, "{}");

        let response = executor
            .execute(&search().retry_on_status(429), Uuid::new_v4())
            .await
            .unwrap();
        assert_eq!(response.host, "b");
    }

    #[tokio::test]
    async fn test_malformed_success_body() {
        let (transport, executor) = setup(&["a", "b"]);
        transport.respond("a", 200, "<html>oops</html>");

        let err = executor.execute(&search(), Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, ClientError::MalformedResponse { .. }));
        assert_eq!(transport.hosts_called(), vec!["a"]);
    }

    #[tokio::test]
    async fn test_empty_body_is_null() {
        let (transport, executor) = setup(&["a"]);
        transport.respond("a", 204, "");
        let response = executor.execute(&search(), Uuid::new_v4()).await.unwrap();
        assert!(response.body.is_null());
    }

    #[tokio::test]
    async fn test_headers_and_url() {
        let (transport, executor) = setup(&["a"]);
        let request = search()
            .with_body(serde_json::json!({"query": "shoes"}))
            .with_header(
                HeaderName::from_static(API_KEY_HEADER),
                HeaderValue::from_static("override"),
            );
        executor.execute(&request, Uuid::new_v4()).await.unwrap();

        let call = &transport.calls()[0];
        assert_eq!(call.path, "/1/indexes/products/query");
        assert_eq!(call.headers[APPLICATION_ID_HEADER], "app");
        assert_eq!(call.headers[API_KEY_HEADER], "override");
        assert_eq!(call.headers[CONTENT_TYPE], "application/json");
    }

    #[tokio::test]
    async fn test_scheme_relative_path_never_leaves_pool() {
        let (transport, executor) = setup(&["a.example.net", "b.example.net"]);
        let request = ApiRequest::read(Method::GET, "//evil.example/1/indexes");

        let err = executor.execute(&request, Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, ClientError::InvalidRequest(_)));
        assert!(transport.calls().is_empty());
        let records = executor.strategy().hosts(TrafficClass::Read);
        assert!(records.iter().all(|r| r.state == HealthState::Unknown));
    }

    #[tokio::test]
    async fn test_zero_timeout_rejected_before_any_attempt() {
        let (transport, executor) = setup(&["a", "b"]);
        let request = search().with_timeout(Duration::ZERO);

        let err = executor.execute(&request, Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, ClientError::InvalidRequest(_)));
        assert!(transport.calls().is_empty());
        let records = executor.strategy().hosts(TrafficClass::Read);
        assert!(records.iter().all(|r| r.state == HealthState::Unknown));
    }

    #[test]
    fn test_build_url_keeps_host() {
        let base = parse_host("https://a.example.net").unwrap();
        assert!(build_url(&base, "//evil.example/1/indexes", &[]).is_err());

        let url = build_url(&base, "/1/indexes?page=2", &[("hitsPerPage".into(), "5".into())]).unwrap();
        assert_eq!(url.host_str(), Some("a.example.net"));
        assert_eq!(url.as_str(), "https://a.example.net/1/indexes?page=2&hitsPerPage=5");

        // Dot segments are normalised but stay on the host.
        let url = build_url(&base, "/../1/keys", &[]).unwrap();
        assert_eq!(url.as_str(), "https://a.example.net/1/keys");
    }

    #[test]
    fn test_build_url() {
        let base = parse_host("http://127.0.0.1:7700").unwrap();
        let url = build_url(
            &base,
            "/1/indexes/products",
            &[("query".into(), "red shoes".into())],
        )
        .unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:7700/1/indexes/products?query=red+shoes");
        assert!(build_url(&base, "relative", &[]).is_err());
    }
}
