//! Metrics collection.
//!
//! # Metrics
//! - `search_client_attempts_total` (counter): physical attempts by traffic, outcome
//! - `search_client_host_up` (gauge): 1=eligible, 0=marked down
//! - `search_client_operations_total` (counter): logical calls by traffic, result
//! - `search_client_operation_duration_seconds` (histogram): logical call latency
//!
//! Nothing is recorded unless the application installs a `metrics` recorder.

use std::time::Instant;

use crate::hosts::TrafficClass;
use crate::retry::Outcome;

/// Record one physical attempt.
pub fn record_attempt(traffic: TrafficClass, outcome: Outcome) {
    metrics::counter!(
        "search_client_attempts_total",
        "traffic" => traffic.to_string(),
        "outcome" => outcome.as_str(),
    )
    .increment(1);
}

/// Record a host health transition.
pub fn record_host_health(host: &str, up: bool) {
    metrics::gauge!("search_client_host_up", "host" => host.to_string())
        .set(if up { 1.0 } else { 0.0 });
}

/// Record the end of a logical call (`result` is succeeded/failed/cancelled).
pub fn record_operation(traffic: TrafficClass, result: &'static str, started: Instant) {
    metrics::counter!(
        "search_client_operations_total",
        "traffic" => traffic.to_string(),
        "result" => result,
    )
    .increment(1);
    metrics::histogram!(
        "search_client_operation_duration_seconds",
        "traffic" => traffic.to_string(),
    )
    .record(started.elapsed().as_secs_f64());
}
