//! Run Repository
//!
//! Handles all database operations related to pipeline runs and their stage
//! results.

use lectern_core::domain::run::{OutputType, PipelineRun, RunStatus, StageResult};
use sqlx::PgPool;
use uuid::Uuid;

/// Insert a new run row
pub async fn create(pool: &PgPool, run: &PipelineRun) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO pipeline_runs (id, pipeline_id, status, started_at, completed_at)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(run.id)
    .bind(run.pipeline_id)
    .bind(status_to_string(run.status))
    .bind(run.started_at)
    .bind(run.completed_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Find a run by ID
pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<PipelineRun>, sqlx::Error> {
    let row = sqlx::query_as::<_, RunRow>(
        r#"
        SELECT id, pipeline_id, status, started_at, completed_at
        FROM pipeline_runs
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|r| r.into()))
}

/// The RUNNING run for a pipeline, if any
pub async fn find_running(
    pool: &PgPool,
    pipeline_id: Uuid,
) -> Result<Option<PipelineRun>, sqlx::Error> {
    let row = sqlx::query_as::<_, RunRow>(
        r#"
        SELECT id, pipeline_id, status, started_at, completed_at
        FROM pipeline_runs
        WHERE pipeline_id = $1 AND status = 'Running'
        ORDER BY started_at DESC
        LIMIT 1
        "#,
    )
    .bind(pipeline_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|r| r.into()))
}

/// Update a run's status and completion time
///
/// Guarded on the row still being RUNNING: completion, failure and
/// cancellation can race, and the first terminal status written wins.
pub async fn update_status(
    pool: &PgPool,
    id: Uuid,
    status: RunStatus,
    completed_at: Option<chrono::DateTime<chrono::Utc>>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE pipeline_runs
        SET status = $1, completed_at = $2
        WHERE id = $3 AND status = 'Running'
        "#,
    )
    .bind(status_to_string(status))
    .bind(completed_at)
    .bind(id)
    .execute(pool)
    .await?;

    Ok(())
}

/// Insert one stage result row
pub async fn insert_stage_result(pool: &PgPool, result: &StageResult) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO stage_results (run_id, module_name, output_type, output_data, file_url, created_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(result.run_id)
    .bind(&result.module_name)
    .bind(output_type_to_string(result.output_type))
    .bind(&result.output_data)
    .bind(&result.file_url)
    .bind(result.created_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Stage results for a run, in insertion order
pub async fn list_stage_results(
    pool: &PgPool,
    run_id: Uuid,
) -> Result<Vec<StageResult>, sqlx::Error> {
    let rows = sqlx::query_as::<_, StageResultRow>(
        r#"
        SELECT run_id, module_name, output_type, output_data, file_url, created_at
        FROM stage_results
        WHERE run_id = $1
        ORDER BY id ASC
        "#,
    )
    .bind(run_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(|r| r.into()).collect())
}

// =============================================================================
// Helper Functions
// =============================================================================

fn status_to_string(status: RunStatus) -> &'static str {
    match status {
        RunStatus::Running => "Running",
        RunStatus::Completed => "Completed",
        RunStatus::Failed => "Failed",
        RunStatus::Cancelled => "Cancelled",
    }
}

fn string_to_status(s: &str) -> RunStatus {
    match s {
        "Running" => RunStatus::Running,
        "Completed" => RunStatus::Completed,
        "Failed" => RunStatus::Failed,
        "Cancelled" => RunStatus::Cancelled,
        _ => RunStatus::Running,
    }
}

fn output_type_to_string(output_type: OutputType) -> &'static str {
    match output_type {
        OutputType::Text => "Text",
        OutputType::Json => "Json",
        OutputType::File => "File",
    }
}

fn string_to_output_type(s: &str) -> OutputType {
    match s {
        "Text" => OutputType::Text,
        "Json" => OutputType::Json,
        "File" => OutputType::File,
        _ => OutputType::Json,
    }
}

// =============================================================================
// Database Row Types
// =============================================================================

#[derive(sqlx::FromRow)]
struct RunRow {
    id: Uuid,
    pipeline_id: Uuid,
    status: String,
    started_at: chrono::DateTime<chrono::Utc>,
    completed_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl From<RunRow> for PipelineRun {
    fn from(row: RunRow) -> Self {
        PipelineRun {
            id: row.id,
            pipeline_id: row.pipeline_id,
            status: string_to_status(&row.status),
            started_at: row.started_at,
            completed_at: row.completed_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct StageResultRow {
    run_id: Uuid,
    module_name: String,
    output_type: String,
    output_data: serde_json::Value,
    file_url: Option<String>,
    created_at: chrono::DateTime<chrono::Utc>,
}

impl From<StageResultRow> for StageResult {
    fn from(row: StageResultRow) -> Self {
        StageResult {
            run_id: row.run_id,
            module_name: row.module_name,
            output_type: string_to_output_type(&row.output_type),
            output_data: row.output_data,
            file_url: row.file_url,
            created_at: row.created_at,
        }
    }
}
