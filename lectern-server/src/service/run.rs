//! Run Service
//!
//! Business logic for run lifecycle: starting and cancelling runs through
//! the pipeline engine's run registry, and reading run state for callers
//! polling status.

use lectern_core::domain::run::{PipelineRun, StageResult};
use lectern_pipeline::registry::{RunError, RunRegistry};
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

use crate::repository::run_repository;

/// Service error type
#[derive(Debug)]
pub enum RunServiceError {
    LessonNotFound(Uuid),
    DefinitionNotFound(Uuid),
    RunNotFound(Uuid),
    EngineError(String),
    DatabaseError(sqlx::Error),
}

impl From<sqlx::Error> for RunServiceError {
    fn from(err: sqlx::Error) -> Self {
        RunServiceError::DatabaseError(err)
    }
}

impl From<RunError> for RunServiceError {
    fn from(err: RunError) -> Self {
        match err {
            RunError::LessonNotFound(id) => RunServiceError::LessonNotFound(id),
            RunError::DefinitionNotFound(id) => RunServiceError::DefinitionNotFound(id),
            RunError::RunNotFound(id) => RunServiceError::RunNotFound(id),
            RunError::Store(e) => RunServiceError::EngineError(e.to_string()),
        }
    }
}

/// Start a pipeline run for a lesson
///
/// Returns immediately with the run; the pipeline executes detached. When a
/// run is already in progress for the lesson, that run is returned instead
/// of starting a duplicate.
pub async fn start_run(
    registry: &Arc<RunRegistry>,
    lesson_id: Uuid,
) -> Result<PipelineRun, RunServiceError> {
    let run = registry.start_run(lesson_id).await?;

    tracing::info!("Run {} active for lesson {}", run.id, lesson_id);

    Ok(run)
}

/// Cancel a run
pub async fn cancel_run(
    registry: &Arc<RunRegistry>,
    run_id: Uuid,
) -> Result<PipelineRun, RunServiceError> {
    let run = registry.cancel_run(run_id).await?;
    Ok(run)
}

/// Get a run by ID
pub async fn get_run(pool: &PgPool, run_id: Uuid) -> Result<PipelineRun, RunServiceError> {
    let run = run_repository::find_by_id(pool, run_id)
        .await?
        .ok_or(RunServiceError::RunNotFound(run_id))?;

    Ok(run)
}

/// Stage results for a run
///
/// Note that a stage absent from this list either failed or was disabled;
/// the two are indistinguishable here and must be disambiguated via the
/// stage-completed event log or the definition's `enabled` flags.
pub async fn list_results(
    pool: &PgPool,
    run_id: Uuid,
) -> Result<Vec<StageResult>, RunServiceError> {
    // Verify the run exists
    let _run = run_repository::find_by_id(pool, run_id)
        .await?
        .ok_or(RunServiceError::RunNotFound(run_id))?;

    let results = run_repository::list_stage_results(pool, run_id).await?;
    Ok(results)
}
