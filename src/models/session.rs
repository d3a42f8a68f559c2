use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// A stored teaching session as handed back by the session store.
///
/// `snapshot` is the nested envelope JSON. It may have been written by any
/// earlier schema version and is read through alias lists rather than
/// deserialized directly, since no migration is ever run on stored payloads.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseSession {
    pub id: Uuid,
    pub snapshot: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stored_at: Option<DateTime<Utc>>,
}

impl DatabaseSession {
    pub fn new(id: Uuid, snapshot: Value) -> Self {
        Self {
            id,
            snapshot,
            stored_at: None,
        }
    }
}

/// Request body for saving a snapshot over HTTP.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveSnapshotInput {
    pub state: super::ApplicationState,
    /// URL of an externally hosted asset (the generated slide deck).
    #[serde(default)]
    pub asset_url: Option<String>,
}

/// One row of the session listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub id: Uuid,
    pub case_title: String,
    pub session_state: String,
    pub schema_version: u32,
    pub save_type: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
