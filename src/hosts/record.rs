//! Host abstraction.
//!
//! # Responsibilities
//! - Represent a single candidate endpoint of the search service
//! - Track its believed health (Unknown/Up/Down)
//! - Decide eligibility relative to the down-state expiration window

use std::fmt;
use std::time::Duration;
use tokio::time::Instant;
use url::Url;

/// Read/write partition of candidate hosts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrafficClass {
    Read,
    Write,
}

impl fmt::Display for TrafficClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrafficClass::Read => write!(f, "read"),
            TrafficClass::Write => write!(f, "write"),
        }
    }
}

/// Health state of a host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthState {
    /// Never reported on. Eligible.
    Unknown,
    Up,
    Down,
}

impl fmt::Display for HealthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HealthState::Unknown => write!(f, "unknown"),
            HealthState::Up => write!(f, "up"),
            HealthState::Down => write!(f, "down"),
        }
    }
}

/// A single candidate host.
#[derive(Debug, Clone)]
pub struct HostRecord {
    /// Base URL of the host (scheme + authority).
    pub url: Url,
    /// Traffic class of the pool owning this record.
    pub traffic: TrafficClass,
    /// Last reported health.
    pub state: HealthState,
    /// When `state` last changed.
    pub last_change: Instant,
    /// Consecutive transient failures.
    pub retry_count: u32,
}

impl HostRecord {
    /// Create a new record in the `Unknown` state.
    pub fn new(url: Url, traffic: TrafficClass) -> Self {
        Self {
            url,
            traffic,
            state: HealthState::Unknown,
            last_change: Instant::now(),
            retry_count: 0,
        }
    }

    /// Host name used for logging and error messages.
    pub fn host(&self) -> &str {
        self.url.host_str().unwrap_or_else(|| self.url.as_str())
    }

    /// Label including the port when one is set, e.g. `127.0.0.1:8080`.
    pub fn authority(&self) -> String {
        match self.url.port() {
            Some(port) => format!("{}:{}", self.host(), port),
            None => self.host().to_string(),
        }
    }

    /// Whether the host may be attempted at `now`.
    ///
    /// A `Down` record becomes eligible again once `expiration` has elapsed
    /// since it was marked, without needing a success report.
    pub fn is_eligible_at(&self, now: Instant, expiration: Duration) -> bool {
        match self.state {
            HealthState::Unknown | HealthState::Up => true,
            HealthState::Down => now.saturating_duration_since(self.last_change) >= expiration,
        }
    }

    // --- Health Logic ---

    /// Report a successful attempt. Returns true if the host was down.
    pub fn mark_success(&mut self, now: Instant) -> bool {
        let was_down = self.state == HealthState::Down;
        self.retry_count = 0;
        if self.state != HealthState::Up {
            self.state = HealthState::Up;
            self.last_change = now;
        }
        was_down
    }

    /// Report a transient failure. Returns true if the host was not down.
    ///
    /// The timestamp is refreshed on every failure so a host that keeps
    /// failing after its window expired is penalised again.
    pub fn mark_failure(&mut self, now: Instant) -> bool {
        let was_down = self.state == HealthState::Down;
        self.state = HealthState::Down;
        self.last_change = now;
        self.retry_count = self.retry_count.saturating_add(1);
        !was_down
    }
}

/// Parse a configured host into a base URL, defaulting to `https`.
pub fn parse_host(raw: &str) -> Result<Url, url::ParseError> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.contains("://") {
        Url::parse(trimmed)
    } else {
        Url::parse(&format!("https://{}", trimmed))
    }
}
