//! Structured logging.
//!
//! # Responsibilities
//! - Initialize a tracing subscriber for binaries and examples
//! - Honour `RUST_LOG` before the configured level

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::ObservabilityConfig;

/// Install a global `fmt` subscriber.
///
/// Returns false when a global subscriber was already set (for example by the
/// embedding application), in which case nothing changes.
pub fn init_logging(config: &ObservabilityConfig) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(&config.log_level)));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .try_init()
        .is_ok()
}

fn default_directive(level: &str) -> String {
    format!("search_client={level},search_cli={level}")
}
