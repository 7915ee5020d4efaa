//! Request execution subsystem.
//!
//! # Data Flow
//! ```text
//! SearchClient::submit(request, callback)
//!     → handle.rs (OperationHandle, state = Ready, task spawned)
//!     → dispatch.rs WorkerPool (wait for a slot, cancellable)
//!     → state = Executing
//!     → attempt.rs RequestExecutor
//!         → retry::RetryStrategy::pool(traffic) → next host
//!         → transport attempt (timeout = base × attempt)
//!         → classify → notify strategy → retry or stop
//!     → state = Succeeded | Failed (CAS; loses to Cancelled)
//!     → dispatch.rs CallbackQueue (dedicated thread) → callback(result)
//! ```
//!
//! # Design Decisions
//! - Attempts within one call are sequential, never fanned out
//! - Cancellation is a state, not an outcome: no callback fires
//! - The spawned task owns the call until it ends; no retaining buffer

pub mod attempt;
pub mod dispatch;
pub mod handle;
pub mod request;
pub mod state;

pub use attempt::{RequestExecutor, API_KEY_HEADER, APPLICATION_ID_HEADER};
pub use dispatch::{CallbackQueue, WorkerPool, CALLBACK_THREAD_NAME};
pub use handle::{Completion, OperationHandle};
pub use request::{ApiRequest, ApiResponse};
pub use state::{OperationState, StateCell};
