//! hackgate - Request-boundary resilience layer for the hackathon platform API
//!
//! This crate provides the gateway concerns the platform's API sits behind:
//! a resilient outbound HTTP client with bounded retry, credential
//! verification against the identity service, participant role checks
//! against the remote data store, and per-IP inbound rate limiting.

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod ratelimit;
pub mod server;
pub mod store;
