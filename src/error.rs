//! Error types surfaced to callers.
//!
//! Every terminal failure of a logical call reaches the caller as a
//! [`ClientError`] value through the completion callback. Cancellation is not
//! an error and never appears here.

use std::time::Duration;
use thiserror::Error;

use crate::hosts::TrafficClass;

/// Errors produced while executing a logical call.
#[derive(Debug, Error)]
pub enum ClientError {
    /// TCP/TLS connection to the host could not be established.
    #[error("connection to {host} failed: {message}")]
    Connect { host: String, message: String },

    /// Host name could not be resolved.
    #[error("could not resolve {host}: {message}")]
    Dns { host: String, message: String },

    /// The attempt did not complete within its per-attempt timeout.
    #[error("request to {host} timed out after {timeout:?}")]
    Timeout { host: String, timeout: Duration },

    /// The host answered with a non-success status code.
    #[error("{host} responded with HTTP {status}: {message}")]
    Status {
        host: String,
        status: u16,
        message: String,
    },

    /// A success status came back with a body that is not valid JSON.
    #[error("malformed response from {host}: {message}")]
    MalformedResponse { host: String, message: String },

    /// Any other transport-level failure (reset, protocol error, ...).
    #[error("transport error against {host}: {message}")]
    Transport { host: String, message: String },

    /// Every eligible host failed transiently.
    #[error("all hosts failed after {attempts} attempt(s); last error: {last}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        last: Box<ClientError>,
    },

    /// No host is configured for the requested traffic class.
    #[error("no hosts available for {0} traffic")]
    NoHosts(TrafficClass),

    /// The request could not be turned into a physical HTTP request.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The configuration handed to the client is invalid.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The client was built outside of a Tokio runtime or could not start
    /// its background machinery.
    #[error("runtime error: {0}")]
    Runtime(String),

    /// The operation ended without delivering a result (client shut down).
    #[error("client closed before the operation completed")]
    Closed,
}

impl ClientError {
    /// True for failures that penalise the host and trigger a retry.
    ///
    /// Status errors are only reported here as transient for 5xx; caller
    /// designated 4xx codes are resolved at classification time.
    pub fn is_transient(&self) -> bool {
        match self {
            ClientError::Connect { .. }
            | ClientError::Dns { .. }
            | ClientError::Timeout { .. }
            | ClientError::Transport { .. } => true,
            ClientError::Status { status, .. } => (500..=599).contains(status),
            _ => false,
        }
    }

    /// Status code carried by this error, looking through retry exhaustion.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Status { status, .. } => Some(*status),
            ClientError::RetriesExhausted { last, .. } => last.status(),
            _ => None,
        }
    }
}

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;
