//! Data model types for hackgate
//!
//! Request-scoped types exchanged with the identity service and the remote
//! data store, plus the JSON body shape for authentication failures.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ErrorKind;

/// Verified identity resolved from a credential
///
/// Returned by the identity service's `/v1/auth/me` endpoint. Owned by the
/// request that produced it; never cached across requests in this layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Principal {
    /// Principal UUID
    pub id: String,
    /// Email address
    pub email: String,
    /// Display name
    pub name: String,
    /// Email verification status
    pub email_verified: bool,
}

/// Participant role within a hackathon
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Organizer,
    Judge,
    Builder,
}

impl Role {
    /// Role name as stored in the remote data store
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Organizer => "organizer",
            Role::Judge => "judge",
            Role::Builder => "builder",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "organizer" => Ok(Role::Organizer),
            "judge" => Ok(Role::Judge),
            "builder" => Ok(Role::Builder),
            other => Err(format!("unknown role: {}", other)),
        }
    }
}

/// Association between a principal and a permission level for a resource
///
/// Fetched from the `hackathon_participants` table per authorization check;
/// never cached in this layer. The role is kept as a raw string so records
/// with roles this service does not know about still deserialize.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleRecord {
    /// Principal the record belongs to
    #[serde(rename = "user_id")]
    pub participant_id: String,
    /// Resource the role applies to
    #[serde(rename = "hackathon_id")]
    pub resource_id: String,
    /// Role name, e.g. "organizer"
    pub role: String,
}

/// JSON body for authentication and authorization failure responses
///
/// Shape: `{detail, error_code, timestamp, request_id?, retry_after?}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthFailureBody {
    /// Human-readable error message
    pub detail: String,
    /// Machine-readable error code
    pub error_code: String,
    /// Time the failure was produced
    pub timestamp: DateTime<Utc>,
    /// Request id for tracing, if one was assigned
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    /// Seconds until a rate-limited caller may retry
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after: Option<u64>,
}

impl AuthFailureBody {
    /// Build a failure body from an error kind
    pub fn from_kind(kind: &ErrorKind, request_id: Option<String>) -> Self {
        let retry_after = match kind {
            ErrorKind::RateLimited(secs) => Some(*secs),
            _ => None,
        };
        Self {
            detail: kind.to_string(),
            error_code: kind.code().to_string(),
            timestamp: Utc::now(),
            request_id,
            retry_after,
        }
    }
}
