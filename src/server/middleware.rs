//! HTTP middleware for hackgate
//!
//! This module provides middleware layers for:
//! - Per-IP rate limiting with informational headers
//! - Authentication against the identity service
//! - Optional authentication for mixed-access routes
//! - Request/response logging

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{header, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use std::net::SocketAddr;
use std::time::Instant;
use uuid::Uuid;

use crate::auth::Credential;
use crate::error::ErrorKind;
use crate::models::{AuthFailureBody, Principal};
use crate::ratelimit::Decision;

use super::router::AppState;

/// Paths that bypass rate limiting
const RATE_LIMIT_SKIP_PATHS: &[&str] = &["/health"];

/// Authenticated principal extension for requests
#[derive(Clone, Debug)]
pub struct AuthenticatedPrincipal(pub Principal);

/// Principal extension for routes where authentication is optional
#[derive(Clone, Debug)]
pub struct MaybePrincipal(pub Option<Principal>);

/// Build the JSON failure response for an error kind
///
/// 401 responses carry `WWW-Authenticate: Bearer`; 429 responses carry
/// `Retry-After`.
pub fn failure_response(kind: &ErrorKind) -> Response {
    failure_response_with_detail(kind, None)
}

/// Build a failure response with an overridden detail message
fn failure_response_with_detail(kind: &ErrorKind, detail: Option<&str>) -> Response {
    let request_id = format!("req_{}", Uuid::new_v4().simple());
    let mut body = AuthFailureBody::from_kind(kind, Some(request_id));
    if let Some(detail) = detail {
        body.detail = detail.to_string();
    }
    let status =
        StatusCode::from_u16(kind.status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    let mut response = (status, Json(body)).into_response();
    match kind {
        ErrorKind::InvalidCredential | ErrorKind::CredentialExpired => {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        ErrorKind::RateLimited(secs) => {
            if let Ok(value) = HeaderValue::from_str(&secs.to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
        }
        _ => {}
    }
    response
}

/// Rate limiting middleware function
///
/// Checks and counts the request against the per-IP limiter before any other
/// processing. Admitted requests get `X-RateLimit-*` headers on their
/// response; rejected requests get a 429 JSON body plus `Retry-After`.
pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path();
    if RATE_LIMIT_SKIP_PATHS.iter().any(|p| path == *p) {
        return next.run(request).await;
    }

    match state.limiter.check(addr.ip()) {
        Decision::Limited {
            retry_after_secs,
            limit,
            reset_secs,
        } => {
            let mut response = failure_response(&ErrorKind::RateLimited(retry_after_secs));
            set_rate_limit_headers(&mut response, limit, 0, reset_secs);
            response
        }
        Decision::Allowed {
            limit,
            remaining,
            reset_secs,
        } => {
            let mut response = next.run(request).await;
            set_rate_limit_headers(&mut response, limit, remaining, reset_secs);
            response
        }
    }
}

fn set_rate_limit_headers(response: &mut Response, limit: u32, remaining: u32, reset_secs: u64) {
    // Reset is advertised as an absolute epoch second
    let reset_at = chrono::Utc::now().timestamp().max(0) as u64 + reset_secs;
    let headers = response.headers_mut();
    for (name, value) in [
        ("x-ratelimit-limit", limit.to_string()),
        ("x-ratelimit-remaining", remaining.to_string()),
        ("x-ratelimit-reset", reset_at.to_string()),
    ] {
        if let Ok(value) = HeaderValue::from_str(&value) {
            headers.insert(axum::http::HeaderName::from_static(name), value);
        }
    }
}

/// Authentication middleware function
///
/// This middleware:
/// 1. Extracts the credential from the request headers
/// 2. Verifies it against the identity service
/// 3. Adds the authenticated principal to the request extensions
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, Response> {
    let Some(credential) = Credential::from_headers(request.headers()) else {
        return Err(failure_response_with_detail(
            &ErrorKind::InvalidCredential,
            Some("Missing authentication credentials"),
        ));
    };

    let principal = state
        .verifier
        .verify(&credential)
        .await
        .map_err(|kind| failure_response(&kind))?;

    request
        .extensions_mut()
        .insert(AuthenticatedPrincipal(principal));
    Ok(next.run(request).await)
}

/// Optional authentication middleware function
///
/// Routes behind this layer see [`MaybePrincipal`]: a verified principal
/// when a valid credential was presented, `None` otherwise. Verification
/// failures of any kind degrade to anonymous access rather than an error.
pub async fn optional_auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let principal = match Credential::from_headers(request.headers()) {
        Some(credential) => state.verifier.verify(&credential).await.ok(),
        None => None,
    };

    request.extensions_mut().insert(MaybePrincipal(principal));
    next.run(request).await
}

/// Logging middleware function
///
/// Logs request and response details including:
/// - Method and path
/// - Status code
/// - Response time
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let uri = request.uri().clone();

    let response = next.run(request).await;

    let elapsed = start.elapsed();
    let status = response.status();

    tracing::info!(
        method = %method,
        path = %uri.path(),
        status = %status.as_u16(),
        duration_ms = %elapsed.as_millis(),
        "Request completed"
    );

    response
}
