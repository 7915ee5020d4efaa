//! Host health subsystem.
//!
//! # Data Flow
//! ```text
//! Configured hosts (config order = priority)
//!     → record.rs (one HostRecord per endpoint)
//!     → pool.rs (HostPool per traffic class)
//!     → eligible_hosts(): up/unknown + expired-down, never empty
//!
//! Attempt outcome reported
//!     → pool.rs mark_outcome()
//!     → record.rs Up/Down transition
//! ```
//!
//! # Design Decisions
//! - Pools are plain data; synchronization lives in `retry::RetryStrategy`
//! - Down state decays after an expiration window instead of needing a health check
//! - Client errors never blame the host

pub mod defaults;
pub mod pool;
pub mod record;

pub use pool::{HealthTransition, HostPool};
pub use record::{parse_host, HealthState, HostRecord, TrafficClass};
