//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ClientConfig (validated, immutable)
//!     → SearchClient::new (hosts → RetryStrategy, timeouts → executor)
//! ```
//!
//! # Design Decisions
//! - Config is immutable once a client is built
//! - All fields have defaults to allow minimal configs
//! - Missing host lists are derived from the application id
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    ClientConfig, Credentials, HostsConfig, ObservabilityConfig, RetryConfig, TimeoutConfig,
    WorkerConfig,
};
pub use validation::{validate_config, ValidationError};
