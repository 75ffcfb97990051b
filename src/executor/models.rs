use reqwest::Method;
use serde_json::Value;
use thiserror::Error;

/// One fully resolved call against the target service.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    /// Path appended to the executor's base endpoint, e.g. `/tasks/T1`.
    pub path: String,
    pub payload: Option<Value>,
    pub credential: Option<String>,
}

/// Normalized outcome of any call that produced an HTTP response,
/// whatever its status class.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
    pub duration_ms: f64,
}

/// The call produced no HTTP response at all.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("no response from {url}: {message}")]
pub struct TransportError {
    pub url: String,
    pub message: String,
}

impl TransportError {
    pub fn new(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            message: message.into(),
        }
    }

    pub(super) fn from_reqwest(url: &str, err: &reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            "timed out"
        } else if err.is_connect() {
            "connection failed"
        } else if err.is_builder() {
            "invalid request"
        } else {
            "request failed"
        };

        let mut message = kind.to_string();
        let mut source = std::error::Error::source(err);
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }

        Self::new(url, message)
    }
}
