//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the client.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

use crate::hosts::{defaults, TrafficClass};

/// Root configuration for a search client.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ClientConfig {
    /// Application credentials sent with every attempt.
    pub credentials: Option<Credentials>,

    /// Candidate hosts per traffic class.
    pub hosts: HostsConfig,

    /// Connect and per-attempt timeouts.
    pub timeouts: TimeoutConfig,

    /// Bounded execution settings.
    pub workers: WorkerConfig,

    /// Retry classification settings.
    pub retry: RetryConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Default headers added to every attempt.
    pub headers: BTreeMap<String, String>,
}

impl ClientConfig {
    /// Configuration for an application using the derived default hosts.
    pub fn for_application(application_id: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            credentials: Some(Credentials {
                application_id: application_id.into(),
                api_key: api_key.into(),
            }),
            ..Self::default()
        }
    }

    /// Configured hosts for `traffic`, or the defaults derived from the
    /// application id when none are listed.
    pub fn host_names(&self, traffic: TrafficClass) -> Vec<String> {
        let configured = match traffic {
            TrafficClass::Read => &self.hosts.read,
            TrafficClass::Write => &self.hosts.write,
        };
        if !configured.is_empty() {
            return configured.clone();
        }

        let Some(credentials) = &self.credentials else {
            return Vec::new();
        };
        let app = &credentials.application_id;
        match traffic {
            TrafficClass::Read => {
                defaults::read_hosts(app, &self.hosts.primary_domain, &self.hosts.fallback_domain)
            }
            TrafficClass::Write => {
                defaults::write_hosts(app, &self.hosts.primary_domain, &self.hosts.fallback_domain)
            }
        }
    }
}

/// Application credentials.
#[derive(Clone, Deserialize, Serialize)]
pub struct Credentials {
    pub application_id: String,
    pub api_key: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("application_id", &self.application_id)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

/// Host configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HostsConfig {
    /// Read hosts in priority order. Scheme defaults to https.
    pub read: Vec<String>,

    /// Write hosts in priority order.
    pub write: Vec<String>,

    /// How long a host stays excluded after a transient failure.
    pub down_expiration_secs: u64,

    /// Domain of the per-application primary hosts.
    pub primary_domain: String,

    /// Domain of the shared fallback hosts.
    pub fallback_domain: String,
}

impl HostsConfig {
    pub fn down_expiration(&self) -> Duration {
        Duration::from_secs(self.down_expiration_secs)
    }
}

impl Default for HostsConfig {
    fn default() -> Self {
        Self {
            read: Vec::new(),
            write: Vec::new(),
            down_expiration_secs: 300,
            primary_domain: "search.example.net".to_string(),
            fallback_domain: "searchnet.example.net".to_string(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Connection establishment timeout in milliseconds.
    pub connect_ms: u64,

    /// Base per-attempt timeout for read traffic in milliseconds.
    pub read_ms: u64,

    /// Base per-attempt timeout for write traffic in milliseconds.
    pub write_ms: u64,
}

impl TimeoutConfig {
    pub fn connect(&self) -> Duration {
        Duration::from_millis(self.connect_ms)
    }

    /// Base per-attempt timeout for `traffic`.
    pub fn base_for(&self, traffic: TrafficClass) -> Duration {
        match traffic {
            TrafficClass::Read => Duration::from_millis(self.read_ms),
            TrafficClass::Write => Duration::from_millis(self.write_ms),
        }
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_ms: 2_000,
            read_ms: 5_000,
            write_ms: 30_000,
        }
    }
}

/// Bounded execution configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// Maximum logical calls executing at once; extra calls queue.
    pub max_concurrent_operations: usize,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_operations: 16,
        }
    }
}

/// Retry classification configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RetryConfig {
    /// 4xx status codes treated as transient for every call.
    pub retryable_statuses: Vec<u16>,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}
