mod handlers;

use std::sync::Arc;

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::ServerConfig;
use crate::db::Database;
use crate::snapshot::InMemorySinks;

/// Shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    /// Dependent containers that restored sessions are synchronized into.
    pub sinks: Arc<InMemorySinks>,
    pub config: ServerConfig,
}

impl AppState {
    pub fn new(db: Database, config: ServerConfig) -> Self {
        Self {
            db,
            sinks: Arc::new(InMemorySinks::new()),
            config,
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    let api = Router::new()
        // Sessions
        .route("/sessions", get(handlers::list_sessions))
        .route("/sessions/{id}", delete(handlers::delete_session))
        .route("/sessions/{id}/snapshot", put(handlers::save_snapshot))
        .route("/sessions/{id}/state", get(handlers::get_state))
        .route(
            "/sessions/{id}/timeline-analysis",
            get(handlers::get_timeline_analysis),
        )
        // Snapshots
        .route("/snapshots/validate", post(handlers::validate_snapshot))
        // Health
        .route("/health", get(handlers::health));

    Router::new()
        .nest("/api/v1", api)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
