//! Scripted transport for unit tests.

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::oneshot;

use crate::transport::request::{HttpRequest, RawResponse, TransportError, TransportErrorKind};
use crate::transport::Transport;

/// What a host does on its next attempt.
pub(crate) enum Scripted {
    Respond(RawResponse),
    Fail(TransportError),
    /// Never answers; only a timeout or cancellation ends the attempt.
    Hang,
    /// Answers once the test sends a response through the channel.
    Gate(oneshot::Receiver<RawResponse>),
    /// Answers after sleeping.
    Delay(Duration, RawResponse),
    /// Runs the hook, then answers without yielding.
    Then(Box<dyn FnOnce() + Send>, RawResponse),
}

#[derive(Debug, Clone)]
pub(crate) struct RecordedCall {
    pub host: String,
    pub path: String,
    pub timeout: Duration,
    pub headers: HeaderMap,
}

/// Transport that replays per-host scripts and records every call.
pub(crate) struct MockTransport {
    scripts: Mutex<HashMap<String, VecDeque<Scripted>>>,
    calls: Mutex<Vec<RecordedCall>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MockTransport {
    pub(crate) fn new() -> Self {
        Self {
            scripts: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    /// Queue the next behaviour of `host` (authority, e.g. `a.example.net`).
    pub(crate) fn script(&self, host: &str, step: Scripted) -> &Self {
        self.scripts
            .lock()
            .unwrap()
            .entry(host.to_string())
            .or_default()
            .push_back(step);
        self
    }

    pub(crate) fn respond(&self, host: &str, status: u16, body: &str) -> &Self {
        self.script(host, Scripted::Respond(RawResponse::new(status, body)))
    }

    pub(crate) fn fail(&self, host: &str, kind: TransportErrorKind) -> &Self {
        self.script(host, Scripted::Fail(TransportError::new(kind, "scripted failure")))
    }

    pub(crate) fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn hosts_called(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.host).collect()
    }

    pub(crate) fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: HttpRequest) -> Result<RawResponse, TransportError> {
        let host = match request.url.port() {
            Some(port) => format!("{}:{}", request.url.host_str().unwrap_or_default(), port),
            None => request.url.host_str().unwrap_or_default().to_string(),
        };
        self.calls.lock().unwrap().push(RecordedCall {
            host: host.clone(),
            path: request.url.path().to_string(),
            timeout: request.timeout,
            headers: request.headers.clone(),
        });

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        let _guard = InFlight(&self.in_flight);

        let step = self
            .scripts
            .lock()
            .unwrap()
            .get_mut(&host)
            .and_then(|queue| queue.pop_front());

        match step {
            None => Ok(RawResponse::new(200, "{}")),
            Some(Scripted::Respond(resp)) => Ok(resp),
            Some(Scripted::Fail(err)) => Err(err),
            Some(Scripted::Hang) => std::future::pending().await,
            Some(Scripted::Gate(rx)) => rx
                .await
                .map_err(|_| TransportError::new(TransportErrorKind::Other, "gate dropped")),
            Some(Scripted::Then(hook, resp)) => {
                hook();
                Ok(resp)
            }
            Some(Scripted::Delay(delay, resp)) => {
                tokio::time::sleep(delay).await;
                Ok(resp)
            }
        }
    }
}
