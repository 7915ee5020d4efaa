//! Multi-host request execution engine for a hosted search service.
//!
//! # Architecture Overview
//!
//! ```text
//!   caller
//!     │  submit(ApiRequest, callback) / execute(ApiRequest).await
//!     ▼
//! ┌──────────────┐     ┌──────────────┐     ┌───────────────────┐
//! │ SearchClient │────▶│ WorkerPool   │────▶│ RequestExecutor   │
//! │   (client)   │     │ (bounded)    │     │ (retry + timeout) │
//! └──────────────┘     └──────────────┘     └─────────┬─────────┘
//!                                                     │ pool(traffic) / notify(host, outcome)
//!                                                     ▼
//!                                           ┌───────────────────┐
//!                                           │ RetryStrategy     │
//!                                           │  HostPool (read)  │
//!                                           │  HostPool (write) │
//!                                           └─────────┬─────────┘
//!                                                     │ next eligible host
//!                                                     ▼
//!                                           ┌───────────────────┐
//!                                           │ Transport (HTTPS) │────▶ search hosts
//!                                           └───────────────────┘
//!
//!   completion ◀── CallbackQueue (dedicated thread) ◀── Succeeded | Failed
//! ```

// Core subsystems
pub mod client;
pub mod executor;
pub mod hosts;
pub mod retry;
pub mod transport;

// Cross-cutting concerns
pub mod config;
pub mod error;
pub mod observability;

pub use client::SearchClient;
pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
pub use executor::{ApiRequest, ApiResponse, OperationHandle, OperationState};
pub use hosts::TrafficClass;
pub use retry::RetryStrategy;
