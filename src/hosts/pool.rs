//! Host pool for one traffic class.
//!
//! # Responsibilities
//! - Keep candidate hosts in configuration (priority) order
//! - Produce the list of eligible hosts on demand
//! - Apply outcome reports to the matching record

use std::time::Duration;
use tokio::time::Instant;
use url::Url;

use crate::hosts::record::{HostRecord, TrafficClass};

/// Change applied to a host by [`HostPool::mark_outcome`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthTransition {
    /// Host moved to `Down`.
    WentDown,
    /// Host recovered from `Down`.
    CameUp,
    /// Health flag unchanged (counters may still have moved).
    Unchanged,
    /// Host is not part of this pool.
    NotFound,
}

/// Ordered hosts of one traffic class.
#[derive(Debug, Clone)]
pub struct HostPool {
    traffic: TrafficClass,
    hosts: Vec<HostRecord>,
}

impl HostPool {
    /// Build a pool from configured endpoints, preserving their order.
    ///
    /// Duplicate endpoints are collapsed onto their first occurrence.
    pub fn new(traffic: TrafficClass, endpoints: impl IntoIterator<Item = Url>) -> Self {
        let mut hosts: Vec<HostRecord> = Vec::new();
        for url in endpoints {
            if hosts.iter().any(|h| h.url == url) {
                tracing::debug!(host = %url, traffic = %traffic, "Ignoring duplicate host");
                continue;
            }
            hosts.push(HostRecord::new(url, traffic));
        }
        Self { traffic, hosts }
    }

    pub fn traffic(&self) -> TrafficClass {
        self.traffic
    }

    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }

    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    /// All records in priority order.
    pub fn records(&self) -> &[HostRecord] {
        &self.hosts
    }

    /// Eligible hosts at the current instant.
    pub fn eligible_hosts(&self, expiration: Duration) -> Vec<HostRecord> {
        self.eligible_hosts_at(Instant::now(), expiration)
    }

    /// Hosts that are up, unknown, or down with an elapsed window, in
    /// priority order.
    ///
    /// Never empty for a non-empty pool: when every host is penalised the full
    /// list is returned so callers always have something to try.
    pub fn eligible_hosts_at(&self, now: Instant, expiration: Duration) -> Vec<HostRecord> {
        let eligible: Vec<HostRecord> = self
            .hosts
            .iter()
            .filter(|h| h.is_eligible_at(now, expiration))
            .cloned()
            .collect();

        if eligible.is_empty() {
            self.hosts.clone()
        } else {
            eligible
        }
    }

    /// Apply the outcome of an attempt against `host`.
    ///
    /// Non-transient failures leave the record untouched: the host answered,
    /// the request itself was at fault.
    pub fn mark_outcome(&mut self, host: &Url, succeeded: bool, is_transient: bool) -> HealthTransition {
        self.mark_outcome_at(host, succeeded, is_transient, Instant::now())
    }

    pub fn mark_outcome_at(
        &mut self,
        host: &Url,
        succeeded: bool,
        is_transient: bool,
        now: Instant,
    ) -> HealthTransition {
        let Some(record) = self.hosts.iter_mut().find(|h| &h.url == host) else {
            return HealthTransition::NotFound;
        };

        if succeeded {
            if record.mark_success(now) {
                HealthTransition::CameUp
            } else {
                HealthTransition::Unchanged
            }
        } else if is_transient {
            if record.mark_failure(now) {
                HealthTransition::WentDown
            } else {
                HealthTransition::Unchanged
            }
        } else {
            HealthTransition::Unchanged
        }
    }
}
