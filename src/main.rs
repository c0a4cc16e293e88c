//! hackgate - Request-boundary resilience layer for the hackathon platform API
//!
//! This is the main entry point for the hackgate application.

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::signal;
use tracing::info;
use tracing_subscriber::EnvFilter;

use hackgate::auth::{AuthVerifier, RoleChecker};
use hackgate::client::{ResilientClient, RetryPolicy};
use hackgate::config::Config;
use hackgate::ratelimit::RateLimiter;
use hackgate::server::{AppState, Server};
use hackgate::store::StoreClient;

/// hackgate - Request-boundary resilience layer for the hackathon platform API
#[derive(Parser, Debug)]
#[command(name = "hackgate")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, env = "HACKGATE_CONFIG")]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Load configuration
    let config = load_config(&args)?;

    // Initialize tracing/logging
    init_tracing(&config)?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "Starting hackgate"
    );

    let retry = RetryPolicy::from_config(&config.retry);

    // Identity service verification client
    let verifier = AuthVerifier::new(
        config.identity.base_url.clone(),
        Duration::from_secs(config.identity.timeout_secs),
        retry.clone(),
    );
    info!(
        identity_url = %config.identity.base_url,
        timeout_secs = config.identity.timeout_secs,
        "Identity verification client initialized"
    );

    // Remote data store client for role lookups
    let store_http = ResilientClient::new(
        config.store.base_url.clone(),
        Duration::from_secs(config.store.timeout_secs),
        retry,
    );
    let store = StoreClient::new(store_http, config.store.api_key.clone(), config.store.project.clone());
    let roles = RoleChecker::new(Arc::new(store));
    info!(
        store_url = %config.store.base_url,
        project = %config.store.project,
        "Data store client initialized"
    );

    // Inbound per-IP rate limiter
    let limiter = Arc::new(RateLimiter::from_config(&config.rate_limit));
    info!(
        max_requests = config.rate_limit.max_requests,
        window_secs = config.rate_limit.window_secs,
        "Rate limiter initialized"
    );

    // Create application state
    let state = AppState {
        verifier: Arc::new(verifier),
        roles,
        limiter,
    };

    // Create and start the HTTP server
    let server = Server::new(config.server.clone(), state);

    info!(
        host = %config.server.host,
        port = %config.server.port,
        "Starting HTTP server"
    );

    let result = server.run(shutdown_signal()).await;

    info!("hackgate shutdown complete");

    result.map_err(Into::into)
}

/// Load configuration from file or environment
fn load_config(args: &Args) -> anyhow::Result<Config> {
    match &args.config {
        Some(path) => {
            // Use eprintln! since tracing is not yet initialized
            eprintln!("Loading configuration from file: {}", path);
            Config::from_file(path).map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
        }
        None => {
            // Use eprintln! since tracing is not yet initialized
            eprintln!("Loading configuration from environment variables");
            Config::from_env().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
        }
    }
}

/// Initialize the tracing subscriber from the logging configuration
fn init_tracing(config: &Config) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.logging.level.clone()));

    if config.logging.format == "json" {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;
    }
    Ok(())
}

/// Create a future that resolves when a shutdown signal is received
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}
