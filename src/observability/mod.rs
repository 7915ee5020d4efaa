//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured tracing events)
//!     → metrics.rs (counters, gauges, histograms via the `metrics` facade)
//!
//! Consumers:
//!     → Application-installed tracing subscriber (or init_logging)
//!     → Application-installed metrics recorder (no-op otherwise)
//! ```
//!
//! # Design Decisions
//! - The library only emits; the application decides where output goes
//! - Operation ID flows through every attempt event
//! - Metrics are cheap (no recorder installed means no work)

pub mod logging;
pub mod metrics;
