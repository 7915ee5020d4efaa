//! Classify attempt results into retry outcomes.

use crate::transport::{RawResponse, TransportError};

/// Classification of one physical attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The host answered with a usable success response.
    Success,
    /// Another host may succeed. Penalises the host.
    Transient,
    /// The request itself is at fault. Host health untouched, no retry.
    NonTransient,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Success => "success",
            Outcome::Transient => "transient",
            Outcome::NonTransient => "non_transient",
        }
    }
}

/// Classify an HTTP status code.
///
/// `retryable` lists 4xx codes the caller designated as transient
/// (e.g. 429 when the service throttles per host).
pub fn classify_status(status: u16, retryable: &[u16]) -> Outcome {
    match status {
        200..=299 => Outcome::Success,
        500..=599 => Outcome::Transient,
        s if retryable.contains(&s) => Outcome::Transient,
        _ => Outcome::NonTransient,
    }
}

/// Classify a raw response by status only.
pub fn classify_response(response: &RawResponse, retryable: &[u16]) -> Outcome {
    classify_status(response.status, retryable)
}

/// Transport failures (connect, DNS, timeout, reset) are always transient.
pub fn classify_transport(_error: &TransportError) -> Outcome {
    Outcome::Transient
}
