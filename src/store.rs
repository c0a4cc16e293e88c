//! Remote data store client
//!
//! Row-level access to the platform's hosted data store over its public
//! table API. Only the participant-role lookup needed for authorization is
//! exposed here; the seam is a trait so the authorization logic can be
//! tested without a live store.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::client::{Operation, ResilientClient};
use crate::error::ErrorKind;
use crate::models::RoleRecord;

/// Table holding the participant-role junction records
const PARTICIPANTS_TABLE: &str = "hackathon_participants";

/// Participant-role lookups against the data store
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RoleStore: Send + Sync {
    /// Fetch the role record for a participant in a hackathon, if any
    async fn participant_record(
        &self,
        participant_id: &str,
        resource_id: &str,
    ) -> Result<Option<RoleRecord>, ErrorKind>;
}

/// Row query response envelope from the store's table API
#[derive(Debug, Deserialize)]
struct RowsResponse {
    #[serde(default)]
    rows: Vec<RoleRecord>,
}

/// Data store client backed by the resilient HTTP client
///
/// Authenticates with a service API key as a bearer credential. All calls
/// inherit the client's timeout and retry behavior.
#[derive(Debug, Clone)]
pub struct StoreClient {
    client: ResilientClient,
    api_key: String,
    project: String,
}

impl StoreClient {
    /// Create a store client for the given project
    pub fn new(client: ResilientClient, api_key: impl Into<String>, project: impl Into<String>) -> Self {
        Self {
            client,
            api_key: api_key.into(),
            project: project.into(),
        }
    }

    /// Path of the row query endpoint for a table
    fn rows_path(&self, table: &str) -> String {
        format!(
            "/v1/public/projects/{}/database/tables/{}/rows",
            self.project, table
        )
    }
}

#[async_trait]
impl RoleStore for StoreClient {
    async fn participant_record(
        &self,
        participant_id: &str,
        resource_id: &str,
    ) -> Result<Option<RoleRecord>, ErrorKind> {
        let filter = json!({
            "user_id": participant_id,
            "hackathon_id": resource_id,
        });
        let operation = Operation::get(self.rows_path(PARTICIPANTS_TABLE))
            .bearer(&self.api_key)
            .query("skip", "0")
            .query("limit", "1")
            .query("filter", filter.to_string());

        let response: RowsResponse = self.client.execute_json(&operation).await?;
        debug!(
            participant_id = participant_id,
            resource_id = resource_id,
            found = !response.rows.is_empty(),
            "Participant role lookup"
        );
        Ok(response.rows.into_iter().next())
    }
}
