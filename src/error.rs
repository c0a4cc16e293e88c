//! Application error types for hackgate
//!
//! This module defines the closed failure taxonomy used throughout the
//! request boundary. Every failure path from the resilient client terminates
//! in exactly one `ErrorKind`. All error types use `thiserror`.

use thiserror::Error;

/// Closed failure taxonomy for the request boundary
///
/// Each kind carries a human-readable message (via `Display`), a
/// machine-readable code (via [`ErrorKind::code`]) and a default transport
/// status mapping (via [`ErrorKind::status`]).
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ErrorKind {
    /// Credential is malformed, revoked or unknown
    #[error("Invalid credential")]
    InvalidCredential,

    /// Bearer token has expired
    #[error("Credential has expired")]
    CredentialExpired,

    /// Connection to the upstream service failed after exhausting retries
    #[error("Failed to connect to upstream service")]
    Unreachable,

    /// Request to the upstream service timed out after exhausting retries
    #[error("Request to upstream service timed out")]
    TimedOut,

    /// Rate limit exceeded, either locally or by the upstream service
    #[error("Rate limit exceeded, retry after {0} seconds")]
    RateLimited(u64),

    /// Principal lacks the required role for the resource
    #[error("{0}")]
    Forbidden(String),

    /// Identity service has no principal for the credential
    #[error("Principal not found")]
    PrincipalNotFound,

    /// Any other status received from an upstream service
    #[error("Upstream error: HTTP {status}")]
    Upstream {
        /// HTTP status received from the upstream peer
        status: u16,
        /// Response body as text, for diagnostics
        body: String,
    },
}

impl ErrorKind {
    /// Machine-readable error code for failure response bodies
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::InvalidCredential => "INVALID_CREDENTIAL",
            ErrorKind::CredentialExpired => "CREDENTIAL_EXPIRED",
            ErrorKind::Unreachable => "CONNECTION_ERROR",
            ErrorKind::TimedOut => "TIMEOUT_ERROR",
            ErrorKind::RateLimited(_) => "RATE_LIMIT_EXCEEDED",
            ErrorKind::Forbidden(_) => "FORBIDDEN",
            ErrorKind::PrincipalNotFound => "PRINCIPAL_NOT_FOUND",
            ErrorKind::Upstream { .. } => "UPSTREAM_ERROR",
        }
    }

    /// Default HTTP status for the caller-facing response
    ///
    /// Transport kinds map to 503/504 so callers can distinguish "your
    /// credential is bad" from "we could not reach the identity service".
    pub fn status(&self) -> u16 {
        match self {
            ErrorKind::InvalidCredential => 401,
            ErrorKind::CredentialExpired => 401,
            ErrorKind::Unreachable => 503,
            ErrorKind::TimedOut => 504,
            ErrorKind::RateLimited(_) => 429,
            ErrorKind::Forbidden(_) => 403,
            ErrorKind::PrincipalNotFound => 404,
            ErrorKind::Upstream { .. } => 502,
        }
    }
}

/// Trait for determining if an error is retryable
pub trait RetryableError {
    /// Returns true if the error is retryable
    fn is_retryable(&self) -> bool;
}

impl RetryableError for ErrorKind {
    fn is_retryable(&self) -> bool {
        match self {
            // Only failures where no response was received from the peer
            // are retried. A received HTTP status is terminal.
            ErrorKind::Unreachable => true,
            ErrorKind::TimedOut => true,

            ErrorKind::InvalidCredential => false,
            ErrorKind::CredentialExpired => false,
            ErrorKind::RateLimited(_) => false,
            ErrorKind::Forbidden(_) => false,
            ErrorKind::PrincipalNotFound => false,
            ErrorKind::Upstream { .. } => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Test 1: Error message formatting
    #[test]
    fn test_error_messages() {
        assert_eq!(
            ErrorKind::InvalidCredential.to_string(),
            "Invalid credential"
        );
        assert_eq!(
            ErrorKind::CredentialExpired.to_string(),
            "Credential has expired"
        );
        assert_eq!(
            ErrorKind::RateLimited(60).to_string(),
            "Rate limit exceeded, retry after 60 seconds"
        );
        assert_eq!(
            ErrorKind::Forbidden("Insufficient permissions. Required role: organizer".to_string())
                .to_string(),
            "Insufficient permissions. Required role: organizer"
        );
        assert_eq!(
            ErrorKind::Upstream {
                status: 500,
                body: "internal".to_string()
            }
            .to_string(),
            "Upstream error: HTTP 500"
        );
    }

    // Test 2: Machine-readable codes are stable
    #[test]
    fn test_error_codes() {
        assert_eq!(ErrorKind::InvalidCredential.code(), "INVALID_CREDENTIAL");
        assert_eq!(ErrorKind::CredentialExpired.code(), "CREDENTIAL_EXPIRED");
        assert_eq!(ErrorKind::Unreachable.code(), "CONNECTION_ERROR");
        assert_eq!(ErrorKind::TimedOut.code(), "TIMEOUT_ERROR");
        assert_eq!(ErrorKind::RateLimited(10).code(), "RATE_LIMIT_EXCEEDED");
        assert_eq!(ErrorKind::Forbidden("nope".to_string()).code(), "FORBIDDEN");
        assert_eq!(ErrorKind::PrincipalNotFound.code(), "PRINCIPAL_NOT_FOUND");
    }

    // Test 3: Default transport status mapping
    #[test]
    fn test_status_mapping() {
        assert_eq!(ErrorKind::InvalidCredential.status(), 401);
        assert_eq!(ErrorKind::CredentialExpired.status(), 401);
        assert_eq!(ErrorKind::Unreachable.status(), 503);
        assert_eq!(ErrorKind::TimedOut.status(), 504);
        assert_eq!(ErrorKind::RateLimited(30).status(), 429);
        assert_eq!(ErrorKind::Forbidden("nope".to_string()).status(), 403);
        assert_eq!(ErrorKind::PrincipalNotFound.status(), 404);
        assert_eq!(
            ErrorKind::Upstream {
                status: 500,
                body: String::new()
            }
            .status(),
            502
        );
    }

    // Test 4: Only connection failures and timeouts are retryable
    #[test]
    fn test_retryable_kinds() {
        assert!(ErrorKind::Unreachable.is_retryable());
        assert!(ErrorKind::TimedOut.is_retryable());

        assert!(!ErrorKind::InvalidCredential.is_retryable());
        assert!(!ErrorKind::CredentialExpired.is_retryable());
        assert!(!ErrorKind::RateLimited(60).is_retryable());
        assert!(!ErrorKind::Forbidden("nope".to_string()).is_retryable());
        assert!(!ErrorKind::PrincipalNotFound.is_retryable());
        assert!(!ErrorKind::Upstream {
            status: 503,
            body: String::new()
        }
        .is_retryable());
    }
}
