//! Live iterator over a pool's eligible hosts.

use std::sync::Weak;
use url::Url;

use crate::hosts::{HostRecord, TrafficClass};
use crate::retry::strategy::StrategyState;

/// Yields each eligible host at most once per logical call.
///
/// Eligibility is recomputed on every `next()` from the shared pool, so a host
/// marked down by a concurrent call is skipped and a host whose window expires
/// mid-call can still be picked up. The iterator ends when every eligible host
/// has been visited, or once the owning strategy is gone.
#[derive(Debug)]
pub struct HostIterator {
    state: Weak<StrategyState>,
    traffic: TrafficClass,
    visited: Vec<Url>,
}

impl HostIterator {
    pub(crate) fn new(state: Weak<StrategyState>, traffic: TrafficClass) -> Self {
        Self {
            state,
            traffic,
            visited: Vec::new(),
        }
    }

    pub fn traffic(&self) -> TrafficClass {
        self.traffic
    }

    /// Number of hosts handed out so far.
    pub fn visited(&self) -> usize {
        self.visited.len()
    }
}

impl Iterator for HostIterator {
    type Item = HostRecord;

    fn next(&mut self) -> Option<HostRecord> {
        let state = self.state.upgrade()?;
        let host = state
            .eligible_hosts(self.traffic)
            .into_iter()
            .find(|h| !self.visited.contains(&h.url))?;
        self.visited.push(host.url.clone());
        Some(host)
    }
}
