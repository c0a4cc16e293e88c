//! Credential verification against the identity service
//!
//! Every protected request triggers one verification round trip; nothing is
//! cached here. Both credential forms resolve through the identity service's
//! `/v1/auth/me` endpoint.

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::client::{Operation, ResilientClient, RetryPolicy};
use crate::error::ErrorKind;
use crate::models::Principal;

use super::credentials::{Credential, API_KEY_HEADER};

/// Identity service endpoint resolving a credential to its principal
const ME_PATH: &str = "/v1/auth/me";

/// Verifies credentials by calling the identity service
#[derive(Debug, Clone)]
pub struct AuthVerifier {
    client: ResilientClient,
}

impl AuthVerifier {
    /// Create a verifier for the identity service at the given base URL
    pub fn new(base_url: impl Into<String>, timeout: Duration, retry: RetryPolicy) -> Self {
        Self {
            client: ResilientClient::new(base_url, timeout, retry),
        }
    }

    /// Create a verifier over an existing client
    pub fn with_client(client: ResilientClient) -> Self {
        Self { client }
    }

    /// Verify a credential and resolve its principal
    pub async fn verify(&self, credential: &Credential) -> Result<Principal, ErrorKind> {
        debug!(
            method = credential.method(),
            credential = %credential.redacted(),
            "Verifying credential"
        );

        let result = match credential {
            Credential::Bearer(token) => self.verify_token(token).await,
            Credential::ApiKey(key) => self.verify_api_key(key).await,
        };

        match &result {
            Ok(principal) => info!(
                method = credential.method(),
                principal_id = %principal.id,
                "Authentication successful"
            ),
            Err(kind) => warn!(
                method = credential.method(),
                error_code = kind.code(),
                "Authentication failed"
            ),
        }

        result
    }

    /// Verify a bearer token
    ///
    /// Expired tokens surface as [`ErrorKind::CredentialExpired`] so callers
    /// can tell the caller to re-authenticate rather than retry.
    pub async fn verify_token(&self, token: &str) -> Result<Principal, ErrorKind> {
        let operation = Operation::get(ME_PATH).bearer(token);
        self.client.execute_json(&operation).await
    }

    /// Verify an API key
    ///
    /// API keys have no expiry semantics; any credential-level rejection
    /// (including a 403) collapses to [`ErrorKind::InvalidCredential`].
    pub async fn verify_api_key(&self, key: &str) -> Result<Principal, ErrorKind> {
        let operation = Operation::get(ME_PATH).header(
            reqwest::header::HeaderName::from_static(API_KEY_HEADER),
            key,
        );
        self.client
            .execute_json(&operation)
            .await
            .map_err(|kind| match kind {
                ErrorKind::CredentialExpired | ErrorKind::Forbidden(_) => {
                    ErrorKind::InvalidCredential
                }
                other => other,
            })
    }
}
