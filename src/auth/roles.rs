//! Role-based authorization for hackathon resources
//!
//! A single lookup against the participant-role table decides access: the
//! principal must hold a record for the hackathon and that record's role
//! must match the required role exactly. Roles carry no hierarchy; an
//! organizer asking for a judge-only operation is refused.

use std::sync::Arc;

use tracing::{info, warn};

use crate::error::ErrorKind;
use crate::models::{Role, RoleRecord};
use crate::store::RoleStore;

/// Authorization checks backed by a role store
#[derive(Clone)]
pub struct RoleChecker {
    store: Arc<dyn RoleStore>,
}

impl RoleChecker {
    /// Create a checker over the given store
    pub fn new(store: Arc<dyn RoleStore>) -> Self {
        Self { store }
    }

    /// Require that a principal holds the given role for a hackathon
    ///
    /// Returns the matching record on success. Store failures propagate
    /// unchanged so transport problems are never reported as denials.
    pub async fn require_role(
        &self,
        principal_id: &str,
        resource_id: &str,
        required_role: Role,
    ) -> Result<RoleRecord, ErrorKind> {
        let record = self
            .store
            .participant_record(principal_id, resource_id)
            .await?;

        let Some(record) = record else {
            warn!(
                principal_id = principal_id,
                resource_id = resource_id,
                "Authorization failed: not a participant"
            );
            return Err(ErrorKind::Forbidden(
                "User is not a participant in this hackathon".to_string(),
            ));
        };

        if record.role != required_role.as_str() {
            warn!(
                principal_id = principal_id,
                resource_id = resource_id,
                held_role = %record.role,
                required_role = %required_role,
                "Authorization failed: insufficient role"
            );
            return Err(ErrorKind::Forbidden(format!(
                "Insufficient permissions. Required role: {}",
                required_role
            )));
        }

        info!(
            principal_id = principal_id,
            resource_id = resource_id,
            role = %required_role,
            "Authorization successful"
        );
        Ok(record)
    }

    /// Require the organizer role
    pub async fn require_organizer(
        &self,
        principal_id: &str,
        resource_id: &str,
    ) -> Result<RoleRecord, ErrorKind> {
        self.require_role(principal_id, resource_id, Role::Organizer)
            .await
    }

    /// Require the judge role
    pub async fn require_judge(
        &self,
        principal_id: &str,
        resource_id: &str,
    ) -> Result<RoleRecord, ErrorKind> {
        self.require_role(principal_id, resource_id, Role::Judge)
            .await
    }

    /// Require the builder role
    pub async fn require_builder(
        &self,
        principal_id: &str,
        resource_id: &str,
    ) -> Result<RoleRecord, ErrorKind> {
        self.require_role(principal_id, resource_id, Role::Builder)
            .await
    }
}
