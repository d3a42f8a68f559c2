use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use super::AppState;
use crate::error::SnapshotError;
use crate::models::*;
use crate::snapshot::{self, DependentSinks, ValidationReport};

// ============================================================
// Error Handling
// ============================================================

/// Log an internal error and return a sanitized response to the client.
fn internal_error(e: impl std::fmt::Display) -> (StatusCode, String) {
    tracing::error!("Internal error: {}", e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal server error".to_string(),
    )
}

/// Engine errors are caused by the request or the stored data, so the
/// message is safe to return.
fn snapshot_error(e: SnapshotError) -> (StatusCode, String) {
    let status = match &e {
        SnapshotError::UnsupportedVersion { .. } => StatusCode::CONFLICT,
        SnapshotError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
    };
    tracing::warn!("Snapshot rejected: {}", e);
    (status, e.to_string())
}

fn session_not_found() -> (StatusCode, String) {
    (StatusCode::NOT_FOUND, "Session not found".to_string())
}

// ============================================================
// Health
// ============================================================

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

// ============================================================
// Sessions
// ============================================================

pub async fn list_sessions(
    State(state): State<AppState>,
) -> Result<Json<Vec<SessionSummary>>, (StatusCode, String)> {
    state.db.list_sessions().map(Json).map_err(internal_error)
}

pub async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, String)> {
    match state.db.delete_session(id) {
        Ok(true) => Ok(StatusCode::NO_CONTENT),
        Ok(false) => Err(session_not_found()),
        Err(e) => Err(internal_error(e)),
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveSnapshotParams {
    pub save_type: Option<SaveType>,
    /// Overrides the server-wide strictness for this write.
    pub strict: Option<bool>,
}

pub async fn save_snapshot(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<SaveSnapshotParams>,
    Json(input): Json<SaveSnapshotInput>,
) -> Result<Json<SnapshotEnvelope>, (StatusCode, String)> {
    let mut options = state.config.conversion_options();
    if let Some(save_type) = params.save_type {
        options = options.with_save_type(save_type);
    }
    if let Some(strict) = params.strict {
        options.strict = strict;
    }

    let envelope = snapshot::to_database(&input.state, input.asset_url.as_deref(), &options)
        .map_err(snapshot_error)?;
    state
        .db
        .save_snapshot(id, &envelope)
        .map_err(internal_error)?;
    Ok(Json(envelope))
}

/// Restore the UI state of a session. Act 2 results are synchronized into the
/// server's dependent containers in the background.
pub async fn get_state(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApplicationState>, (StatusCode, String)> {
    let session = state
        .db
        .load_session(id)
        .map_err(internal_error)?
        .ok_or_else(session_not_found)?;

    let sinks: Arc<dyn DependentSinks> = state.sinks.clone();
    snapshot::to_store(&session, &state.config.conversion_options(), Some(sinks))
        .map(Json)
        .map_err(snapshot_error)
}

pub async fn get_timeline_analysis(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, (StatusCode, String)> {
    state
        .sinks
        .timeline_analysis(&id.to_string())
        .map(Json)
        .ok_or((
            StatusCode::NOT_FOUND,
            "No timeline analysis synchronized for this session".to_string(),
        ))
}

// ============================================================
// Snapshots
// ============================================================

pub async fn validate_snapshot(Json(snapshot): Json<Value>) -> Json<ValidationReport> {
    Json(snapshot::validate(&snapshot))
}
