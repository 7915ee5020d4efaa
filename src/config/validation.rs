//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Every traffic class resolves to at least one parseable host
//! - Validate value ranges (timeouts > 0, worker limit > 0, 4xx designations)

use thiserror::Error;

use crate::config::schema::ClientConfig;
use crate::hosts::{parse_host, TrafficClass};

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("no {0} hosts configured and no application id to derive them from")]
    NoHosts(TrafficClass),

    #[error("invalid {traffic} host '{host}': {reason}")]
    InvalidHost {
        traffic: TrafficClass,
        host: String,
        reason: String,
    },

    #[error("{0} must be greater than zero")]
    NotPositive(&'static str),

    #[error("retryable status {0} is not a 4xx code")]
    InvalidRetryableStatus(u16),

    #[error("invalid default header '{0}'")]
    InvalidHeader(String),
}

/// Validate a configuration, collecting every problem found.
pub fn validate_config(config: &ClientConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    for traffic in [TrafficClass::Read, TrafficClass::Write] {
        let hosts = config.host_names(traffic);
        if hosts.is_empty() {
            errors.push(ValidationError::NoHosts(traffic));
        }
        for host in hosts {
            match parse_host(&host) {
                Ok(url) if url.host_str().is_none() => errors.push(ValidationError::InvalidHost {
                    traffic,
                    host,
                    reason: "missing host name".to_string(),
                }),
                Ok(_) => {}
                Err(e) => errors.push(ValidationError::InvalidHost {
                    traffic,
                    host,
                    reason: e.to_string(),
                }),
            }
        }
    }

    if config.hosts.down_expiration_secs == 0 {
        errors.push(ValidationError::NotPositive("hosts.down_expiration_secs"));
    }
    if config.timeouts.connect_ms == 0 {
        errors.push(ValidationError::NotPositive("timeouts.connect_ms"));
    }
    if config.timeouts.read_ms == 0 {
        errors.push(ValidationError::NotPositive("timeouts.read_ms"));
    }
    if config.timeouts.write_ms == 0 {
        errors.push(ValidationError::NotPositive("timeouts.write_ms"));
    }
    if config.workers.max_concurrent_operations == 0 {
        errors.push(ValidationError::NotPositive("workers.max_concurrent_operations"));
    }

    for status in &config.retry.retryable_statuses {
        if !(400..=499).contains(status) {
            errors.push(ValidationError::InvalidRetryableStatus(*status));
        }
    }

    for (name, value) in &config.headers {
        let valid = reqwest::header::HeaderName::from_bytes(name.as_bytes()).is_ok()
            && reqwest::header::HeaderValue::from_str(value).is_ok();
        if !valid {
            errors.push(ValidationError::InvalidHeader(name.clone()));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
