//! Logical call description and its successful result.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

use crate::error::ClientError;
use crate::hosts::TrafficClass;

/// One caller-visible API request.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub traffic: TrafficClass,
    pub method: Method,
    /// Path relative to the host, e.g. `/1/indexes/products/query`.
    pub path: String,
    pub query: Vec<(String, String)>,
    pub headers: HeaderMap,
    pub body: Option<serde_json::Value>,
    /// Base per-attempt timeout; the traffic class default when `None`.
    pub timeout: Option<Duration>,
    /// Extra 4xx codes treated as transient for this call.
    pub retryable_statuses: Vec<u16>,
}

impl ApiRequest {
    pub fn new(traffic: TrafficClass, method: Method, path: impl Into<String>) -> Self {
        Self {
            traffic,
            method,
            path: path.into(),
            query: Vec::new(),
            headers: HeaderMap::new(),
            body: None,
            timeout: None,
            retryable_statuses: Vec::new(),
        }
    }

    pub fn read(method: Method, path: impl Into<String>) -> Self {
        Self::new(TrafficClass::Read, method, path)
    }

    pub fn write(method: Method, path: impl Into<String>) -> Self {
        Self::new(TrafficClass::Write, method, path)
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn with_body(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Serialize `body` as the JSON payload.
    pub fn with_json<T: Serialize>(self, body: &T) -> Result<Self, ClientError> {
        let value = serde_json::to_value(body)
            .map_err(|e| ClientError::InvalidRequest(format!("body is not serializable: {}", e)))?;
        Ok(self.with_body(value))
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Treat `status` as transient for this call.
    pub fn retry_on_status(mut self, status: u16) -> Self {
        self.retryable_statuses.push(status);
        self
    }
}

/// Successful result of a logical call.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    /// Host that answered (`host[:port]`).
    pub host: String,
    /// Physical attempts made, including the successful one.
    pub attempts: u32,
    /// Parsed JSON body (`Null` when the body was empty).
    pub body: serde_json::Value,
}

impl ApiResponse {
    /// Deserialize the body into a typed model.
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T, ClientError> {
        serde_json::from_value(self.body.clone()).map_err(|e| ClientError::MalformedResponse {
            host: self.host.clone(),
            message: e.to_string(),
        })
    }
}
