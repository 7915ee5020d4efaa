//! Search client facade.
//!
//! # Responsibilities
//! - Build the retry strategy, executor, worker pool and callback queue
//!   from a validated configuration
//! - Accept logical calls and return cancellable handles
//! - Offer an async `execute` for callers who prefer awaiting a result

use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use url::Url;

use crate::config::{validate_config, ClientConfig};
use crate::error::ClientError;
use crate::executor::handle::OperationContext;
use crate::executor::{
    ApiRequest, ApiResponse, CallbackQueue, OperationHandle, RequestExecutor, WorkerPool,
};
use crate::hosts::{parse_host, HostRecord, TrafficClass};
use crate::retry::RetryStrategy;
use crate::transport::{HttpTransport, Transport};

/// Client for the hosted search service.
///
/// Cheap to clone; clones share host health, workers and the callback thread.
#[derive(Clone)]
pub struct SearchClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    config: ClientConfig,
    strategy: RetryStrategy,
    context: OperationContext,
}

impl SearchClient {
    /// Build a client using the reqwest transport.
    ///
    /// Must be called from within a Tokio runtime; calls run on that runtime.
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let transport = HttpTransport::new(config.timeouts.connect())?;
        Self::with_transport(config, Arc::new(transport))
    }

    /// Build a client on a custom transport.
    pub fn with_transport(config: ClientConfig, transport: Arc<dyn Transport>) -> Result<Self, ClientError> {
        validate_config(&config).map_err(|errors| {
            ClientError::Config(
                errors
                    .iter()
                    .map(|e| e.to_string())
                    .collect::<Vec<_>>()
                    .join(", "),
            )
        })?;

        let runtime = Handle::try_current()
            .map_err(|e| ClientError::Runtime(format!("no Tokio runtime: {}", e)))?;

        let read = resolve_hosts(&config, TrafficClass::Read)?;
        let write = resolve_hosts(&config, TrafficClass::Write)?;
        let strategy = RetryStrategy::new(read, write, config.hosts.down_expiration());

        let executor = Arc::new(RequestExecutor::new(strategy.clone(), transport, &config)?);
        let workers = WorkerPool::new(config.workers.max_concurrent_operations);
        let callbacks = CallbackQueue::start()?;

        tracing::info!(
            read_hosts = strategy.hosts(TrafficClass::Read).len(),
            write_hosts = strategy.hosts(TrafficClass::Write).len(),
            max_concurrent_operations = workers.max_concurrent(),
            down_expiration_secs = config.hosts.down_expiration_secs,
            "Search client ready"
        );

        Ok(Self {
            inner: Arc::new(ClientInner {
                config,
                strategy,
                context: OperationContext {
                    runtime,
                    executor,
                    workers,
                    callbacks,
                },
            }),
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// Shared host-health state.
    pub fn retry_strategy(&self) -> &RetryStrategy {
        &self.inner.strategy
    }

    /// Every host of `traffic` with its current health.
    pub fn host_status(&self, traffic: TrafficClass) -> Vec<HostRecord> {
        self.inner.strategy.hosts(traffic)
    }

    /// Submit a logical call.
    ///
    /// `on_complete` receives exactly one result on the callback thread,
    /// unless the call is cancelled, in which case it never runs.
    pub fn submit<F>(&self, request: ApiRequest, on_complete: F) -> OperationHandle
    where
        F: FnOnce(Result<ApiResponse, ClientError>) + Send + 'static,
    {
        OperationHandle::spawn(&self.inner.context, request, Box::new(on_complete))
    }

    /// Submit a logical call and wait for its result.
    ///
    /// Dropping the returned future cancels the call.
    pub async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, ClientError> {
        let (tx, rx) = oneshot::channel();
        let handle = self.submit(request, move |result| {
            let _ = tx.send(result);
        });
        let guard = CancelOnDrop(Some(handle));

        let result = rx.await.map_err(|_| ClientError::Closed)?;
        guard.disarm();
        result
    }

    /// Stop accepting work: queued and future calls fail with `Closed`.
    /// Calls already executing run to completion.
    pub fn close(&self) {
        self.inner.context.workers.close();
    }
}

impl std::fmt::Debug for SearchClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchClient")
            .field("config", &self.inner.config)
            .field("strategy", &self.inner.strategy)
            .finish()
    }
}

struct CancelOnDrop(Option<OperationHandle>);

impl CancelOnDrop {
    fn disarm(mut self) {
        self.0.take();
    }
}

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        if let Some(handle) = self.0.take() {
            handle.cancel();
        }
    }
}

fn resolve_hosts(config: &ClientConfig, traffic: TrafficClass) -> Result<Vec<Url>, ClientError> {
    config
        .host_names(traffic)
        .iter()
        .map(|name| {
            parse_host(name).map_err(|e| ClientError::Config(format!("invalid {traffic} host '{name}': {e}")))
        })
        .collect()
}
