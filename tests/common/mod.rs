//! Common test utilities and helpers for integration tests

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use hackgate::auth::{AuthVerifier, RoleChecker};
use hackgate::client::{ResilientClient, RetryPolicy};
use hackgate::ratelimit::RateLimiter;
use hackgate::server::{build_router, AppState};
use hackgate::store::StoreClient;

/// API key the test store client authenticates with
pub const STORE_API_KEY: &str = "sk_test_store_key";

/// Project the test store client queries
pub const STORE_PROJECT: &str = "hackathon";

/// Options for building a test application state
pub struct TestStateOptions {
    pub rate_limit_max: u32,
    pub rate_limit_window: Duration,
    pub client_timeout: Duration,
    pub retry_attempts: u32,
}

impl Default for TestStateOptions {
    fn default() -> Self {
        Self {
            rate_limit_max: 100,
            rate_limit_window: Duration::from_secs(60),
            client_timeout: Duration::from_secs(5),
            retry_attempts: 1,
        }
    }
}

/// Create a test application state pointed at mock identity/store servers
pub fn create_test_state(
    identity_url: &str,
    store_url: &str,
    options: TestStateOptions,
) -> AppState {
    let retry = RetryPolicy::new(options.retry_attempts, Duration::ZERO, Duration::ZERO);

    let verifier = AuthVerifier::new(identity_url, options.client_timeout, retry.clone());

    let store_http = ResilientClient::new(store_url, options.client_timeout, retry);
    let store = StoreClient::new(store_http, STORE_API_KEY, STORE_PROJECT);

    AppState {
        verifier: Arc::new(verifier),
        roles: RoleChecker::new(Arc::new(store)),
        limiter: Arc::new(RateLimiter::new(
            options.rate_limit_max,
            options.rate_limit_window,
        )),
    }
}

/// Run a test server in the background and return the address
/// The server will be shut down when the returned shutdown sender is dropped or sent
pub async fn run_test_server(state: AppState) -> (SocketAddr, tokio::sync::oneshot::Sender<()>) {
    use tokio::net::TcpListener;

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test server");
    let addr = listener.local_addr().expect("Failed to get local address");

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();

    let app = build_router(state);

    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(async move {
            let _ = shutdown_rx.await;
        })
        .await
        .expect("Server error");
    });

    // Give the server a moment to start (100ms is sufficient for slow CI systems)
    tokio::time::sleep(Duration::from_millis(100)).await;

    (addr, shutdown_tx)
}

/// Principal JSON the mock identity service answers with
pub const PRINCIPAL_JSON: &str = r#"{
    "id": "c0a80121-7ac0-4e1c-9d55-8a5308f6b2f1",
    "email": "ada@example.com",
    "name": "Ada Lovelace",
    "email_verified": true
}"#;

/// Id of the principal in [`PRINCIPAL_JSON`]
pub const PRINCIPAL_ID: &str = "c0a80121-7ac0-4e1c-9d55-8a5308f6b2f1";
