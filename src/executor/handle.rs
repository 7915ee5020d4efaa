//! Cancellable handle over one logical call.

use std::sync::Arc;
use std::time::Instant;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::Instrument;
use uuid::Uuid;

use crate::error::ClientError;
use crate::executor::attempt::RequestExecutor;
use crate::executor::dispatch::{CallbackQueue, WorkerPool};
use crate::executor::request::{ApiRequest, ApiResponse};
use crate::executor::state::{OperationState, StateCell};
use crate::hosts::TrafficClass;
use crate::observability::metrics;

/// Completion callback of a logical call.
pub type Completion = Box<dyn FnOnce(Result<ApiResponse, ClientError>) + Send + 'static>;

/// Everything a spawned operation needs from its client.
#[derive(Clone)]
pub(crate) struct OperationContext {
    pub runtime: Handle,
    pub executor: Arc<RequestExecutor>,
    pub workers: WorkerPool,
    pub callbacks: CallbackQueue,
}

/// Handle to a submitted logical call.
///
/// Dropping the handle detaches the call: it keeps running and its callback
/// still fires. Use [`cancel`](Self::cancel) to stop it.
#[derive(Debug)]
pub struct OperationHandle {
    id: Uuid,
    traffic: TrafficClass,
    state: Arc<StateCell>,
    cancel_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl OperationHandle {
    /// Spawn the call on the context's runtime. It starts in `Ready` and
    /// moves to `Executing` once a worker slot is free.
    pub(crate) fn spawn(context: &OperationContext, request: ApiRequest, on_complete: Completion) -> Self {
        let id = Uuid::new_v4();
        let traffic = request.traffic;
        let state = Arc::new(StateCell::new());
        let (cancel_tx, cancel_rx) = watch::channel(false);

        let span = tracing::debug_span!(
            "operation",
            id = %id,
            traffic = %traffic,
            method = %request.method,
            path = %request.path,
        );
        let task = context.runtime.spawn(
            run_operation(
                id,
                context.clone(),
                state.clone(),
                cancel_rx,
                request,
                on_complete,
            )
            .instrument(span),
        );

        Self {
            id,
            traffic,
            state,
            cancel_tx,
            task,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn traffic(&self) -> TrafficClass {
        self.traffic
    }

    pub fn state(&self) -> OperationState {
        self.state.get()
    }

    pub fn is_finished(&self) -> bool {
        self.state.get().is_terminal()
    }

    /// Cancel the call. Any in-flight attempt is abandoned and the completion
    /// callback will never fire. Returns false if the call already reached a
    /// terminal state.
    pub fn cancel(&self) -> bool {
        if !self.state.cancel() {
            return false;
        }
        self.cancel_tx.send_replace(true);
        tracing::debug!(operation_id = %self.id, "Operation cancelled");
        true
    }

    /// Wait until the background task has exited.
    ///
    /// The completion callback runs on the callback thread and may still be
    /// pending when this returns.
    pub async fn join(self) {
        let _ = self.task.await;
    }
}

async fn run_operation(
    id: Uuid,
    context: OperationContext,
    state: Arc<StateCell>,
    mut cancel_rx: watch::Receiver<bool>,
    request: ApiRequest,
    on_complete: Completion,
) {
    let started = Instant::now();
    let traffic = request.traffic;

    let permit = tokio::select! {
        biased;
        _ = cancelled(&mut cancel_rx) => {
            metrics::record_operation(traffic, OperationState::Cancelled.as_str(), started);
            return;
        }
        permit = context.workers.acquire() => permit,
    };

    let _permit = match permit {
        Ok(permit) => permit,
        Err(err) => {
            if state.start() && state.complete(false) {
                metrics::record_operation(traffic, OperationState::Failed.as_str(), started);
                deliver(&context.callbacks, on_complete, Err(err));
            }
            return;
        }
    };

    if !state.start() {
        metrics::record_operation(traffic, OperationState::Cancelled.as_str(), started);
        return;
    }

    let result = tokio::select! {
        biased;
        _ = cancelled(&mut cancel_rx) => {
            metrics::record_operation(traffic, OperationState::Cancelled.as_str(), started);
            return;
        }
        result = context.executor.execute(&request, id) => result,
    };

    if !state.complete(result.is_ok()) {
        tracing::debug!(operation_id = %id, "Discarding result of cancelled operation");
        metrics::record_operation(traffic, OperationState::Cancelled.as_str(), started);
        return;
    }

    let final_state = state.get();
    metrics::record_operation(traffic, final_state.as_str(), started);
    match &result {
        Ok(response) => tracing::debug!(
            operation_id = %id,
            host = %response.host,
            attempts = response.attempts,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Operation succeeded"
        ),
        Err(err) => tracing::debug!(
            operation_id = %id,
            error = %err,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Operation failed"
        ),
    }

    deliver(&context.callbacks, on_complete, result);
}

fn deliver(callbacks: &CallbackQueue, on_complete: Completion, result: Result<ApiResponse, ClientError>) {
    if !callbacks.deliver(move || on_complete(result)) {
        tracing::warn!("Callback thread unavailable, completion dropped");
    }
}

/// Resolves once cancellation is requested. A dropped handle (closed
/// channel) never resolves: detached calls run to completion.
async fn cancelled(rx: &mut watch::Receiver<bool>) {
    if rx.wait_for(|cancelled| *cancelled).await.is_err() {
        std::future::pending::<()>().await;
    }
}
