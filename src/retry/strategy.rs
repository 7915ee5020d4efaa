//! Shared host-health state for a client.
//!
//! # Responsibilities
//! - Own one HostPool per traffic class
//! - Serialize every read and write of host health
//! - Hand out live iterators over eligible hosts
//! - Apply attempt outcomes reported by executors

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use url::Url;

use crate::hosts::{HealthTransition, HostPool, HostRecord, TrafficClass};
use crate::observability::metrics;
use crate::retry::classify::Outcome;
use crate::retry::iterator::HostIterator;

/// Default time a host stays down after a transient failure.
pub const DEFAULT_EXPIRATION_DELAY: Duration = Duration::from_secs(5 * 60);

/// Lock-protected pools plus the expiration delay.
#[derive(Debug)]
pub(crate) struct StrategyState {
    pools: Mutex<HashMap<TrafficClass, HostPool>>,
    expiration: Duration,
}

impl StrategyState {
    // Every mutation leaves the pools consistent, so a panic elsewhere while
    // holding the lock does not invalidate the data.
    fn lock(&self) -> MutexGuard<'_, HashMap<TrafficClass, HostPool>> {
        self.pools.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn eligible_hosts(&self, traffic: TrafficClass) -> Vec<HostRecord> {
        self.lock()
            .get(&traffic)
            .map(|pool| pool.eligible_hosts(self.expiration))
            .unwrap_or_default()
    }
}

/// Single source of truth for host health and rotation.
///
/// Cloning is cheap and every clone shares the same state.
#[derive(Debug, Clone)]
pub struct RetryStrategy {
    state: Arc<StrategyState>,
}

impl RetryStrategy {
    /// Build a strategy from ordered read and write hosts.
    pub fn new(
        read: impl IntoIterator<Item = Url>,
        write: impl IntoIterator<Item = Url>,
        expiration: Duration,
    ) -> Self {
        let mut pools = HashMap::new();
        pools.insert(TrafficClass::Read, HostPool::new(TrafficClass::Read, read));
        pools.insert(TrafficClass::Write, HostPool::new(TrafficClass::Write, write));

        for pool in pools.values() {
            tracing::debug!(
                traffic = %pool.traffic(),
                hosts = pool.len(),
                "Host pool created"
            );
        }

        Self {
            state: Arc::new(StrategyState {
                pools: Mutex::new(pools),
                expiration,
            }),
        }
    }

    /// Time-to-live of a `Down` classification.
    pub fn expiration_delay(&self) -> Duration {
        self.state.expiration
    }

    /// Fresh iterator over the live pool for `traffic`.
    ///
    /// The iterator holds a weak reference: it observes every later health
    /// change and yields nothing once the strategy is dropped.
    pub fn pool(&self, traffic: TrafficClass) -> HostIterator {
        HostIterator::new(Arc::downgrade(&self.state), traffic)
    }

    /// Eligible hosts for `traffic` right now, in priority order.
    pub fn eligible_hosts(&self, traffic: TrafficClass) -> Vec<HostRecord> {
        self.state.eligible_hosts(traffic)
    }

    /// Snapshot of every record for `traffic`, eligible or not.
    pub fn hosts(&self, traffic: TrafficClass) -> Vec<HostRecord> {
        self.state
            .lock()
            .get(&traffic)
            .map(|pool| pool.records().to_vec())
            .unwrap_or_default()
    }

    /// Whether any host is configured for `traffic`.
    pub fn has_hosts(&self, traffic: TrafficClass) -> bool {
        self.state
            .lock()
            .get(&traffic)
            .is_some_and(|pool| !pool.is_empty())
    }

    /// Report the outcome of an attempt against `host`.
    pub fn notify(&self, host: &HostRecord, outcome: Outcome) -> HealthTransition {
        let (succeeded, is_transient) = match outcome {
            Outcome::Success => (true, false),
            Outcome::Transient => (false, true),
            Outcome::NonTransient => (false, false),
        };

        let (transition, retry_count) = {
            let mut pools = self.state.lock();
            match pools.get_mut(&host.traffic) {
                Some(pool) => {
                    let transition = pool.mark_outcome(&host.url, succeeded, is_transient);
                    let retry_count = pool
                        .records()
                        .iter()
                        .find(|r| r.url == host.url)
                        .map(|r| r.retry_count)
                        .unwrap_or(0);
                    (transition, retry_count)
                }
                None => (HealthTransition::NotFound, 0),
            }
        };

        match transition {
            HealthTransition::WentDown => {
                tracing::warn!(
                    host = %host.authority(),
                    traffic = %host.traffic,
                    retry_count,
                    expiration_secs = self.state.expiration.as_secs(),
                    "Host marked down"
                );
                metrics::record_host_health(&host.authority(), false);
            }
            HealthTransition::CameUp => {
                tracing::info!(host = %host.authority(), traffic = %host.traffic, "Host back up");
                metrics::record_host_health(&host.authority(), true);
            }
            HealthTransition::NotFound => {
                tracing::debug!(host = %host.authority(), "Outcome for unknown host ignored");
            }
            HealthTransition::Unchanged => {}
        }

        transition
    }
}
