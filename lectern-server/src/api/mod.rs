//! API Module
//!
//! HTTP API layer for the Lectern service.
//! Each submodule handles endpoints for a specific domain.

pub mod definition;
pub mod error;
pub mod run;

use axum::{
    Json,
    Router,
    routing::{get, post, put},
};
use lectern_pipeline::registry::RunRegistry;
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub registry: Arc<RunRegistry>,
}

/// GET /health
/// Liveness probe; reports only that the service is up
async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok", "service": "lectern-server" }))
}

/// Create the main API router with all endpoints
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health_check))
        // Definition endpoints
        .route("/lesson/{id}/pipeline", put(definition::save_definition))
        .route("/lesson/{id}/pipeline", get(definition::get_definition))
        .route("/lesson/{id}/pipeline/start", post(run::start_run))
        // Run endpoints
        .route("/run/{id}", get(run::get_run))
        .route("/run/{id}/cancel", post(run::cancel_run))
        .route("/run/{id}/results", get(run::list_results))
        // Add state and middleware
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
