//! Definition API Handlers
//!
//! HTTP endpoints for managing a lesson's pipeline definition.

use axum::{
    Json,
    extract::{Path, State},
};
use lectern_core::domain::pipeline::PipelineDefinition;
use lectern_core::dto::pipeline::SaveDefinition;
use uuid::Uuid;

use crate::api::AppState;
use crate::api::error::{ApiError, ApiResult};
use crate::service::definition_service;

fn map_error(e: definition_service::DefinitionError) -> ApiError {
    match e {
        definition_service::DefinitionError::LessonNotFound(id) => {
            ApiError::NotFound(format!("Lesson {} not found", id))
        }
        definition_service::DefinitionError::NotFound(id) => {
            ApiError::NotFound(format!("Pipeline definition for lesson {} not found", id))
        }
        definition_service::DefinitionError::ValidationError(msg) => ApiError::Validation(msg),
        definition_service::DefinitionError::DatabaseError(err) => ApiError::DatabaseError(err),
    }
}

/// PUT /lesson/{id}/pipeline
/// Create or replace the pipeline definition for a lesson
pub async fn save_definition(
    State(state): State<AppState>,
    Path(lesson_id): Path<Uuid>,
    Json(req): Json<SaveDefinition>,
) -> ApiResult<Json<PipelineDefinition>> {
    tracing::info!("Saving pipeline definition for lesson: {}", lesson_id);

    let definition = definition_service::save_definition(&state.pool, lesson_id, req)
        .await
        .map_err(map_error)?;

    Ok(Json(definition))
}

/// GET /lesson/{id}/pipeline
/// Get the pipeline definition for a lesson
pub async fn get_definition(
    State(state): State<AppState>,
    Path(lesson_id): Path<Uuid>,
) -> ApiResult<Json<PipelineDefinition>> {
    tracing::debug!("Getting pipeline definition for lesson: {}", lesson_id);

    let definition = definition_service::get_definition(&state.pool, lesson_id)
        .await
        .map_err(map_error)?;

    Ok(Json(definition))
}
