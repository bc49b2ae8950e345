//! Run API Handlers
//!
//! HTTP endpoints for run lifecycle management. Starting a run returns
//! immediately; the pipeline executes detached and callers poll `GET
//! /run/{id}` for status.

use axum::{
    Json,
    extract::{Path, State},
};
use lectern_core::domain::run::{PipelineRun, StageResult};
use uuid::Uuid;

use crate::api::AppState;
use crate::api::error::{ApiError, ApiResult};
use crate::service::run_service;

fn map_error(e: run_service::RunServiceError) -> ApiError {
    match e {
        run_service::RunServiceError::LessonNotFound(id) => {
            ApiError::NotFound(format!("Lesson {} not found", id))
        }
        run_service::RunServiceError::DefinitionNotFound(id) => {
            ApiError::NotFound(format!("Pipeline definition for lesson {} not found", id))
        }
        run_service::RunServiceError::RunNotFound(id) => {
            ApiError::NotFound(format!("Run {} not found", id))
        }
        run_service::RunServiceError::EngineError(msg) => ApiError::Engine(msg),
        run_service::RunServiceError::DatabaseError(err) => ApiError::DatabaseError(err),
    }
}

/// POST /lesson/{id}/pipeline/start
/// Start a pipeline run for a lesson (idempotent while a run is in progress)
pub async fn start_run(
    State(state): State<AppState>,
    Path(lesson_id): Path<Uuid>,
) -> ApiResult<Json<PipelineRun>> {
    tracing::info!("Starting pipeline run for lesson: {}", lesson_id);

    let run = run_service::start_run(&state.registry, lesson_id)
        .await
        .map_err(map_error)?;

    Ok(Json(run))
}

/// GET /run/{id}
/// Get run status by ID
pub async fn get_run(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<PipelineRun>> {
    tracing::debug!("Getting run: {}", id);

    let run = run_service::get_run(&state.pool, id)
        .await
        .map_err(map_error)?;

    Ok(Json(run))
}

/// POST /run/{id}/cancel
/// Cancel a run; a stale cancel is accepted and returns the run unchanged
pub async fn cancel_run(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<PipelineRun>> {
    tracing::info!("Cancelling run: {}", id);

    let run = run_service::cancel_run(&state.registry, id)
        .await
        .map_err(map_error)?;

    Ok(Json(run))
}

/// GET /run/{id}/results
/// Stage results for a run
pub async fn list_results(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Vec<StageResult>>> {
    tracing::debug!("Listing stage results for run: {}", id);

    let results = run_service::list_results(&state.pool, id)
        .await
        .map_err(map_error)?;

    Ok(Json(results))
}
