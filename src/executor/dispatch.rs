//! Bounded execution and completion delivery.
//!
//! # Responsibilities
//! - Limit how many logical calls execute at once (semaphore permits)
//! - Run completion callbacks on one dedicated thread, away from the runtime

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tokio::sync::{mpsc, OwnedSemaphorePermit, Semaphore};

use crate::error::ClientError;

/// Name of the thread running completion callbacks.
pub const CALLBACK_THREAD_NAME: &str = "search-client-callbacks";

/// A bounded pool of execution slots.
///
/// Calls wait for a permit before their first attempt; queued calls cost no
/// more than a parked task.
#[derive(Debug, Clone)]
pub struct WorkerPool {
    permits: Arc<Semaphore>,
    max_concurrent: usize,
}

impl WorkerPool {
    pub fn new(max_concurrent: usize) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(max_concurrent)),
            max_concurrent,
        }
    }

    /// Wait for a free slot. The slot is released when the permit drops.
    pub async fn acquire(&self) -> Result<OwnedSemaphorePermit, ClientError> {
        self.permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| ClientError::Closed)
    }

    /// Stop handing out permits; waiting and future calls fail with `Closed`.
    pub fn close(&self) {
        self.permits.close();
    }

    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }
}

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Serial queue of completion callbacks.
///
/// The thread exits once every clone of the queue is dropped and the queue
/// is drained.
#[derive(Debug, Clone)]
pub struct CallbackQueue {
    tx: mpsc::UnboundedSender<Job>,
}

impl CallbackQueue {
    /// Spawn the delivery thread.
    pub fn start() -> Result<Self, ClientError> {
        let (tx, mut rx) = mpsc::unbounded_channel::<Job>();

        std::thread::Builder::new()
            .name(CALLBACK_THREAD_NAME.to_string())
            .spawn(move || {
                while let Some(job) = rx.blocking_recv() {
                    if let Err(panic) = catch_unwind(AssertUnwindSafe(job)) {
                        let message = panic
                            .downcast_ref::<&str>()
                            .map(|s| s.to_string())
                            .or_else(|| panic.downcast_ref::<String>().cloned())
                            .unwrap_or_else(|| "unknown panic".to_string());
                        tracing::error!(panic = %message, "Completion callback panicked");
                    }
                }
                tracing::debug!("Callback thread exiting");
            })
            .map_err(|e| ClientError::Runtime(format!("failed to spawn callback thread: {}", e)))?;

        Ok(Self { tx })
    }

    /// Queue `job` for delivery. False if the delivery thread is gone.
    pub fn deliver(&self, job: impl FnOnce() + Send + 'static) -> bool {
        self.tx.send(Box::new(job)).is_ok()
    }
}
