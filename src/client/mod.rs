//! Resilient outbound HTTP client and retry policy

pub mod http;
pub mod retry;

pub use http::{Operation, ResilientClient, DEFAULT_TIMEOUT};
pub use retry::RetryPolicy;
