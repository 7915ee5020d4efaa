//! Retry subsystem.
//!
//! # Data Flow
//! ```text
//! Logical call starts:
//!     → strategy.rs pool(traffic) → iterator.rs HostIterator (weak, live view)
//!     → next() re-reads eligible hosts under the strategy lock
//!
//! Attempt finishes:
//!     → classify.rs (status / transport error → Outcome)
//!     → strategy.rs notify(host, outcome)
//!     → hosts::HostPool::mark_outcome (under the same lock)
//! ```
//!
//! # Design Decisions
//! - One mutex per strategy; iterators never cache a snapshot
//! - Connection errors, DNS errors, timeouts and 5xx are transient
//! - 4xx are NOT transient unless the caller designates them
//! - Down hosts decay back to eligible after the expiration delay

pub mod classify;
pub mod iterator;
pub mod strategy;

pub use classify::{classify_response, classify_status, classify_transport, Outcome};
pub use iterator::HostIterator;
pub use strategy::{RetryStrategy, DEFAULT_EXPIRATION_DELAY};
