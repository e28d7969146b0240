//! Transport layer for talking to the authentication service
//!
//! Steps never touch `reqwest` directly. They describe a call as an
//! [`ApiRequest`] and hand it to a [`Transport`], which either returns the
//! raw [`ApiResponse`] or a [`TransportError`] when no response was obtained.
//! Swapping the transport is how the step contracts are unit-tested.

use async_trait::async_trait;
use serde_json::Value;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

pub mod endpoints;
pub mod http;

#[cfg(test)]
pub(crate) mod scripted;

pub use http::HttpTransport;

/// Transport errors: the request never produced an HTTP response
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("Connection failed: {0}")]
    Connect(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Invalid request URL: {0}")]
    InvalidUrl(String),

    #[error("Request failed: {0}")]
    Request(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            TransportError::Timeout(e.to_string())
        } else if e.is_connect() {
            TransportError::Connect(e.to_string())
        } else if e.is_builder() {
            TransportError::InvalidUrl(e.to_string())
        } else {
            TransportError::Request(e.to_string())
        }
    }
}

/// HTTP methods used by the lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
        })
    }
}

/// One call against the service, relative to its base URL
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    /// Path beginning with `/`, already percent-encoded
    pub path: String,
    /// Sent as `Authorization: Bearer <token>` when present
    pub bearer: Option<String>,
    pub body: Option<Value>,
    /// Overrides the transport's default timeout
    pub timeout: Option<Duration>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            bearer: None,
            body: None,
            timeout: None,
        }
    }

    #[must_use]
    pub fn with_json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    #[must_use]
    pub fn with_bearer(mut self, token: &str) -> Self {
        self.bearer = Some(token.to_string());
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Raw response as received from the service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Body parsed as JSON, `None` when it is empty or not JSON
    pub fn json(&self) -> Option<Value> {
        serde_json::from_str(&self.body).ok()
    }

    /// Body for diagnostics: pretty JSON when possible, raw text otherwise
    pub fn display_body(&self) -> String {
        match self.json() {
            Some(value) => {
                serde_json::to_string_pretty(&value).unwrap_or_else(|_| self.body.clone())
            }
            None => self.body.clone(),
        }
    }
}

/// Sends requests to the service under test
#[async_trait]
pub trait Transport: Send + Sync {
    /// Perform one request and wait for its response
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, TransportError>;
}
