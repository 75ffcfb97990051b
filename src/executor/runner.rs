use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{
    header::{AUTHORIZATION, CONTENT_TYPE},
    Client,
};
use serde_json::{json, Value};
use tracing::{debug, warn};

use super::{
    models::{ApiRequest, ApiResponse, TransportError},
    RequestExecutor,
};

#[derive(Debug, Clone, Default)]
pub struct ExecutorOptions {
    pub base_url: String,
    /// Prefix for the `Authorization` header value, e.g. `Bearer`.
    /// When unset the credential is sent as-is.
    pub auth_scheme: Option<String>,
    pub timeout: Option<Duration>,
}

/// [`RequestExecutor`] backed by a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpExecutor {
    client: Client,
    base_url: String,
    auth_scheme: Option<String>,
}

impl HttpExecutor {
    pub fn new(options: ExecutorOptions) -> Result<Self> {
        let mut builder = Client::builder().user_agent(concat!(
            env!("CARGO_PKG_NAME"),
            "/",
            env!("CARGO_PKG_VERSION")
        ));
        if let Some(timeout) = options.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().context("building HTTP client")?;

        Ok(Self {
            client,
            base_url: options.base_url.trim_end_matches('/').to_string(),
            auth_scheme: options.auth_scheme.filter(|s| !s.trim().is_empty()),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url_for(&self, path: &str) -> String {
        if path.is_empty() || path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    fn authorization_value(&self, credential: &str) -> String {
        match &self.auth_scheme {
            Some(scheme) => format!("{} {}", scheme.trim(), credential),
            None => credential.to_string(),
        }
    }
}

#[async_trait]
impl RequestExecutor for HttpExecutor {
    async fn execute(&self, request: &ApiRequest) -> Result<ApiResponse, TransportError> {
        let url = self.url_for(&request.path);
        let mut request_builder = self
            .client
            .request(request.method.clone(), &url)
            .header(CONTENT_TYPE, "application/json");

        if let Some(credential) = &request.credential {
            request_builder =
                request_builder.header(AUTHORIZATION, self.authorization_value(credential));
        }

        if let Some(payload) = &request.payload {
            request_builder = request_builder.json(payload);
        }

        debug!(
            method = %request.method,
            url = %url,
            authenticated = request.credential.is_some(),
            "sending request"
        );

        let start = Instant::now();
        let response = request_builder
            .send()
            .await
            .map_err(|err| TransportError::from_reqwest(&url, &err))?;

        // A status line arrived, so every failure from here on is still a response.
        let status = response.status().as_u16();
        let body = match response.bytes().await {
            Ok(bytes) => {
                debug!(status, bytes = bytes.len(), "received response");
                parse_body(status, &bytes)
            }
            Err(err) => {
                warn!(status, error = %err, "response body unreadable");
                unreadable_body(status, &err)
            }
        };

        Ok(ApiResponse {
            status,
            body,
            duration_ms: start.elapsed().as_secs_f64() * 1000.0,
        })
    }
}

/// Parse a response body as JSON, substituting an `{"error": ...}` object
/// when the bytes are not valid JSON.
pub fn parse_body(status: u16, bytes: &[u8]) -> Value {
    match serde_json::from_slice(bytes) {
        Ok(value) => value,
        Err(err) => {
            let reason = if bytes.is_empty() {
                "empty response body".to_string()
            } else {
                format!("response body is not JSON ({err})")
            };
            json!({ "error": format!("HTTP {status}: {reason}") })
        }
    }
}

fn unreadable_body(status: u16, err: &reqwest::Error) -> Value {
    json!({ "error": format!("HTTP {status}: failed reading response body ({err})") })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn executor(base_url: &str, auth_scheme: Option<&str>) -> HttpExecutor {
        HttpExecutor::new(ExecutorOptions {
            base_url: base_url.to_string(),
            auth_scheme: auth_scheme.map(str::to_string),
            timeout: None,
        })
        .unwrap()
    }

    #[test]
    fn url_for_joins_base_and_path() {
        let exec = executor("https://api.example.com/dev/api/v1/", None);
        assert_eq!(exec.base_url(), "https://api.example.com/dev/api/v1");
        assert_eq!(
            exec.url_for("/tasks/T1"),
            "https://api.example.com/dev/api/v1/tasks/T1"
        );
        assert_eq!(
            exec.url_for("health"),
            "https://api.example.com/dev/api/v1/health"
        );
    }

    #[test]
    fn authorization_value_applies_optional_scheme() {
        let raw = executor("https://example.com", None);
        assert_eq!(raw.authorization_value("tok"), "tok");

        let bearer = executor("https://example.com", Some("Bearer"));
        assert_eq!(bearer.authorization_value("tok"), "Bearer tok");

        let blank = executor("https://example.com", Some("  "));
        assert_eq!(blank.authorization_value("tok"), "tok");
    }

    #[test]
    fn parse_body_keeps_structured_values() {
        let body = parse_body(201, br#"{"data":{"id":"T1","title":"x"}}"#);
        assert_eq!(body["data"]["id"], "T1");
        let keys: Vec<_> = body["data"].as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["id", "title"]);
    }

    #[test]
    fn parse_body_falls_back_to_error_object() {
        let body = parse_body(502, b"<html>Bad Gateway</html>");
        let message = body["error"].as_str().unwrap();
        assert!(message.starts_with("HTTP 502: response body is not JSON"));

        let empty = parse_body(204, b"");
        assert_eq!(empty, json!({ "error": "HTTP 204: empty response body" }));
    }
}
