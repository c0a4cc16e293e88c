//! Resilient outbound HTTP client
//!
//! Executes a single logical outbound operation against an external service
//! with a bounded total latency and a uniform failure vocabulary, hiding
//! transient-failure retry from callers. Connection failures and timeouts are
//! retried per the configured [`RetryPolicy`]; any received HTTP status is
//! terminal and mapped to an [`ErrorKind`] immediately.

use std::time::{Duration, Instant};

use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::retry::RetryPolicy;
use crate::error::ErrorKind;

/// Default per-call timeout for outbound requests
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// A single logical outbound operation: method, path, headers, query, body
#[derive(Debug, Clone)]
pub struct Operation {
    method: Method,
    path: String,
    headers: HeaderMap,
    query: Vec<(String, String)>,
    body: Option<serde_json::Value>,
}

impl Operation {
    /// Create an operation with an explicit method
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: HeaderMap::new(),
            query: Vec::new(),
            body: None,
        }
    }

    /// Create a GET operation
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    /// Attach a header; values that are not valid header text are skipped
    pub fn header(mut self, name: HeaderName, value: &str) -> Self {
        if let Ok(value) = HeaderValue::from_str(value) {
            self.headers.insert(name, value);
        }
        self
    }

    /// Attach a bearer credential in the Authorization header
    pub fn bearer(self, token: &str) -> Self {
        self.header(AUTHORIZATION, &format!("Bearer {}", token))
    }

    /// Attach a query parameter
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Attach a JSON body
    pub fn json(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Request path, for logging
    pub fn path(&self) -> &str {
        &self.path
    }
}

/// Outbound request executor with timeout, retry/backoff and
/// status-to-error-kind mapping
#[derive(Debug, Clone)]
pub struct ResilientClient {
    client: Client,
    base_url: String,
    retry: RetryPolicy,
}

impl ResilientClient {
    /// Create a client for the given base URL with a per-call timeout
    pub fn new(base_url: impl Into<String>, timeout: Duration, retry: RetryPolicy) -> Self {
        let base_url = base_url.into();
        Self {
            client: Client::builder()
                .timeout(timeout)
                .build()
                .expect("Failed to create HTTP client"),
            base_url: base_url.trim_end_matches('/').to_string(),
            retry,
        }
    }

    /// Base URL this client targets
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Execute an operation, returning the success payload or a terminal
    /// error kind
    ///
    /// Retries are silent; no partial results are ever returned.
    pub async fn execute(&self, operation: &Operation) -> Result<Bytes, ErrorKind> {
        let result = self.retry.execute(|| self.attempt(operation)).await;

        match &result {
            Ok(body) => debug!(
                path = operation.path(),
                body_size = body.len(),
                "Outbound call succeeded"
            ),
            Err(kind) => warn!(
                path = operation.path(),
                error_code = kind.code(),
                "Outbound call failed"
            ),
        }

        result
    }

    /// Execute an operation and deserialize the payload as JSON
    pub async fn execute_json<T: DeserializeOwned>(
        &self,
        operation: &Operation,
    ) -> Result<T, ErrorKind> {
        let body = self.execute(operation).await?;
        serde_json::from_slice(&body).map_err(|e| ErrorKind::Upstream {
            status: 200,
            body: format!("invalid response body: {}", e),
        })
    }

    /// Perform one attempt: send the request and map its outcome
    async fn attempt(&self, operation: &Operation) -> Result<Bytes, ErrorKind> {
        let url = format!("{}{}", self.base_url, operation.path);
        let start = Instant::now();

        let mut request = self
            .client
            .request(operation.method.clone(), &url)
            .headers(operation.headers.clone());
        if !operation.query.is_empty() {
            request = request.query(&operation.query);
        }
        if let Some(body) = &operation.body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| {
            let kind = if e.is_timeout() {
                ErrorKind::TimedOut
            } else {
                ErrorKind::Unreachable
            };
            warn!(
                path = operation.path(),
                elapsed_ms = start.elapsed().as_millis() as u64,
                error = %e,
                outcome = kind.code(),
                "Attempt failed before a response was received"
            );
            kind
        })?;

        let status = response.status();
        let retry_after = response
            .headers()
            .get("Retry-After")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok());

        if status.is_success() {
            let body = response.bytes().await.map_err(|_| ErrorKind::Unreachable)?;
            debug!(
                path = operation.path(),
                status = status.as_u16(),
                elapsed_ms = start.elapsed().as_millis() as u64,
                "Attempt succeeded"
            );
            return Ok(body);
        }

        let body = response.text().await.unwrap_or_default();
        let kind = map_error_status(status, retry_after, &body);
        warn!(
            path = operation.path(),
            status = status.as_u16(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            outcome = kind.code(),
            "Attempt received an error status"
        );
        Err(kind)
    }
}

/// Seconds a caller should wait when the upstream rate limits us and sends no
/// Retry-After header
const DEFAULT_RATE_LIMIT_WAIT_SECS: u64 = 60;

/// Map a received error status to its terminal error kind
fn map_error_status(status: StatusCode, retry_after: Option<u64>, body: &str) -> ErrorKind {
    match status {
        StatusCode::UNAUTHORIZED => unauthorized_kind(body),
        StatusCode::FORBIDDEN => {
            ErrorKind::Forbidden("Permission denied - insufficient privileges".to_string())
        }
        StatusCode::NOT_FOUND => ErrorKind::PrincipalNotFound,
        StatusCode::TOO_MANY_REQUESTS => {
            ErrorKind::RateLimited(retry_after.unwrap_or(DEFAULT_RATE_LIMIT_WAIT_SECS))
        }
        status => ErrorKind::Upstream {
            status: status.as_u16(),
            body: body.to_string(),
        },
    }
}

/// Whether a 401 detail text indicates an expired credential
///
/// This inspects free-text server output for the substring "expired"
/// (case-insensitive). There is no structured field to key on; if the
/// identity service changes its wording, disambiguation breaks here and
/// nowhere else.
pub fn detail_indicates_expiry(detail: &str) -> bool {
    detail.to_lowercase().contains("expired")
}

/// Classify a 401 response body as expired or invalid
fn unauthorized_kind(body: &str) -> ErrorKind {
    let detail = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("detail").and_then(|d| d.as_str()).map(String::from))
        .unwrap_or_else(|| body.to_string());

    if detail_indicates_expiry(&detail) {
        ErrorKind::CredentialExpired
    } else {
        ErrorKind::InvalidCredential
    }
}
