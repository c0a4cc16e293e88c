//! Retry policy for transient outbound failures
//!
//! Bounded retry with exponential backoff. Only errors whose
//! [`RetryableError::is_retryable`] returns true are retried; any other
//! outcome terminates the attempt loop immediately.

use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

use crate::config::RetryConfig;
use crate::error::RetryableError;

/// Retry policy with exponential backoff
///
/// The default policy performs 3 total attempts with backoff sleeps of
/// 1 s and 2 s between them (exponential, capped at 4 s).
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    max_attempts: u32,
    /// Backoff before the second attempt
    initial_backoff: Duration,
    /// Multiplier applied per subsequent attempt
    backoff_multiplier: f64,
    /// Upper bound on any single backoff sleep
    max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_secs(1),
            backoff_multiplier: 2.0,
            max_backoff: Duration::from_secs(4),
        }
    }
}

impl RetryPolicy {
    /// Create a retry policy from configuration
    pub fn from_config(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            initial_backoff: Duration::from_secs(config.initial_backoff_secs),
            backoff_multiplier: config.backoff_multiplier,
            max_backoff: Duration::from_secs(config.max_backoff_secs),
        }
    }

    /// Create a policy with explicit attempts and backoff, for tests and
    /// callers that need a single attempt
    pub fn new(max_attempts: u32, initial_backoff: Duration, max_backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_backoff,
            backoff_multiplier: 2.0,
            max_backoff,
        }
    }

    /// Total attempts this policy will make
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Backoff slept after the given failed attempt (1-based)
    ///
    /// Exponential: `initial * multiplier^(attempt-1)`, capped at the
    /// configured maximum.
    pub fn backoff_after(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1);
        let secs =
            self.initial_backoff.as_secs_f64() * self.backoff_multiplier.powi(exponent as i32);
        Duration::from_secs_f64(secs.min(self.max_backoff.as_secs_f64()))
    }

    /// Execute an async operation under this policy
    ///
    /// Retries are silent to the caller; only the final terminal outcome is
    /// surfaced. A successful attempt aborts further retries immediately.
    pub async fn execute<F, Fut, T, E>(&self, operation: F) -> Result<T, E>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: RetryableError + std::fmt::Display,
    {
        let mut attempt = 1u32;

        loop {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(err) => {
                    if !err.is_retryable() {
                        return Err(err);
                    }
                    if attempt >= self.max_attempts {
                        warn!(
                            attempts = attempt,
                            max_attempts = self.max_attempts,
                            error = %err,
                            "Retries exhausted"
                        );
                        return Err(err);
                    }

                    let backoff = self.backoff_after(attempt);
                    debug!(
                        attempt = attempt,
                        max_attempts = self.max_attempts,
                        backoff_ms = backoff.as_millis() as u64,
                        error = %err,
                        "Retrying after transient error"
                    );

                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                }
            }
        }
    }
}
