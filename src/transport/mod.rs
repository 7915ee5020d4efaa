//! Transport subsystem.
//!
//! # Data Flow
//! ```text
//! RequestExecutor
//!     → request.rs (HttpRequest: method, absolute URL, headers, body, timeout)
//!     → Transport::send (one physical exchange, async)
//!         - http.rs (reqwest client, connection pooling)
//!     → RawResponse (status + body bytes) or TransportError
//! ```
//!
//! # Design Decisions
//! - The transport knows nothing about hosts, retries or health
//! - Status codes are returned as data; classification happens in `retry`
//! - Transport errors carry a coarse kind (connect/DNS/timeout/other)

pub mod http;
#[cfg(test)]
pub(crate) mod mock;
pub mod request;

use async_trait::async_trait;

pub use http::HttpTransport;
pub use request::{HttpRequest, RawResponse, TransportError, TransportErrorKind};

/// Performs one physical HTTP exchange.
///
/// Implementations must be cancel-safe: the executor drops the returned
/// future to abandon an in-flight attempt.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<RawResponse, TransportError>;
}
