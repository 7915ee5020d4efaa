//! reqwest-backed transport.

use async_trait::async_trait;
use std::error::Error as StdError;
use std::time::Duration;

use crate::error::ClientError;
use crate::transport::request::{HttpRequest, RawResponse, TransportError, TransportErrorKind};
use crate::transport::Transport;

/// User agent sent on every attempt.
pub const USER_AGENT: &str = concat!("search-client/", env!("CARGO_PKG_VERSION"));

/// Transport performing real HTTP(S) exchanges through a pooled reqwest client.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Build a transport with the given connect timeout.
    pub fn new(connect_timeout: Duration) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .user_agent(USER_AGENT)
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .map_err(|e| ClientError::Runtime(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: HttpRequest) -> Result<RawResponse, TransportError> {
        let mut builder = self
            .client
            .request(request.method, request.url)
            .headers(request.headers)
            .timeout(request.timeout);
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(map_reqwest_error)?;
        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(map_reqwest_error)?;

        Ok(RawResponse {
            status,
            body: body.to_vec(),
        })
    }
}

fn map_reqwest_error(err: reqwest::Error) -> TransportError {
    let kind = if err.is_timeout() {
        TransportErrorKind::Timeout
    } else if err.is_connect() {
        if caused_by_dns(&err) {
            TransportErrorKind::Dns
        } else {
            TransportErrorKind::Connect
        }
    } else {
        TransportErrorKind::Other
    };
    TransportError::new(kind, error_chain(&err))
}

// hyper-util reports resolver failures as a connect error whose source
// chain mentions "dns error".
fn caused_by_dns(err: &(dyn StdError + 'static)) -> bool {
    let mut current: Option<&(dyn StdError + 'static)> = Some(err);
    while let Some(e) = current {
        if e.to_string().to_lowercase().contains("dns error") {
            return true;
        }
        current = e.source();
    }
    false
}

fn error_chain(err: &(dyn StdError + 'static)) -> String {
    let mut parts = vec![err.to_string()];
    let mut current = err.source();
    while let Some(e) = current {
        parts.push(e.to_string());
        current = e.source();
    }
    parts.join(": ")
}
