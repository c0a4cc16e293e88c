//! HTTP router for hackgate
//!
//! This module defines the axum router that handles all HTTP requests.
//! It provides routes for:
//! - Health checks
//! - The authenticated principal (`/v1/me`) and session probe (`/v1/session`)
//! - Role authorization probes for hackathon resources

use axum::{
    extract::{Path, State},
    middleware,
    response::{IntoResponse, Json, Response},
    routing::get,
    Extension, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::auth::{AuthVerifier, RoleChecker};
use crate::error::ErrorKind;
use crate::models::{Principal, Role};
use crate::ratelimit::RateLimiter;

use super::middleware::{
    auth_middleware, failure_response, logging_middleware, optional_auth_middleware,
    rate_limit_middleware, AuthenticatedPrincipal, MaybePrincipal,
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Credential verification client
    pub verifier: Arc<AuthVerifier>,

    /// Role authorization checker
    pub roles: RoleChecker,

    /// Inbound per-IP rate limiter
    pub limiter: Arc<RateLimiter>,
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Session probe response for optional-auth routes
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionResponse {
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub principal: Option<Principal>,
}

/// Authorization probe response
#[derive(Debug, Serialize, Deserialize)]
pub struct RoleCheckResponse {
    pub authorized: bool,
    pub hackathon_id: String,
    pub role: String,
}

/// Build the main application router
///
/// Middleware ordering, outermost first: request logging, rate limiting,
/// then per-route authentication. `/health` bypasses both rate limiting and
/// authentication.
pub fn build_router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/v1/me", get(me_handler))
        .route(
            "/v1/hackathons/{hackathon_id}/roles/{role}",
            get(role_check_handler),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let optional = Router::new()
        .route("/v1/session", get(session_handler))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            optional_auth_middleware,
        ));

    Router::new()
        .route("/health", get(health_handler))
        .merge(protected)
        .merge(optional)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ))
        .layer(middleware::from_fn(logging_middleware))
        .with_state(state)
}

/// Health check endpoint handler
async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Returns the authenticated principal
async fn me_handler(
    Extension(AuthenticatedPrincipal(principal)): Extension<AuthenticatedPrincipal>,
) -> impl IntoResponse {
    Json(principal)
}

/// Session probe: reports whether a valid credential was presented
async fn session_handler(
    Extension(MaybePrincipal(principal)): Extension<MaybePrincipal>,
) -> impl IntoResponse {
    Json(SessionResponse {
        authenticated: principal.is_some(),
        principal,
    })
}

/// Checks that the authenticated principal holds a role for a hackathon
async fn role_check_handler(
    State(state): State<AppState>,
    Extension(AuthenticatedPrincipal(principal)): Extension<AuthenticatedPrincipal>,
    Path((hackathon_id, role)): Path<(String, String)>,
) -> Result<Json<RoleCheckResponse>, Response> {
    let required_role: Role = role.parse().map_err(|_| {
        failure_response(&ErrorKind::Forbidden(format!("Unknown role: {}", role)))
    })?;

    state
        .roles
        .require_role(&principal.id, &hackathon_id, required_role)
        .await
        .map_err(|kind| failure_response(&kind))?;

    Ok(Json(RoleCheckResponse {
        authorized: true,
        hackathon_id,
        role: required_role.to_string(),
    }))
}
