//! Pipeline Definition Repository
//!
//! Handles all database operations related to pipeline definitions.

use lectern_core::domain::pipeline::{PipelineDefinition, PipelineStatus, StageDescriptor};
use sqlx::PgPool;
use uuid::Uuid;

/// Create a new definition for a lesson
pub async fn create(
    pool: &PgPool,
    lesson_id: Uuid,
    stages: Vec<StageDescriptor>,
) -> Result<PipelineDefinition, sqlx::Error> {
    let now = chrono::Utc::now();

    let definition = PipelineDefinition {
        id: Uuid::new_v4(),
        lesson_id,
        stages,
        status: PipelineStatus::Draft,
        created_at: now,
        updated_at: now,
    };

    sqlx::query(
        r#"
        INSERT INTO pipeline_definitions (id, lesson_id, stages, status, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(definition.id)
    .bind(lesson_id)
    .bind(serde_json::to_value(&definition.stages).unwrap_or_default())
    .bind(status_to_string(definition.status))
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(definition)
}

/// Find the definition owned by a lesson
pub async fn find_by_lesson(
    pool: &PgPool,
    lesson_id: Uuid,
) -> Result<Option<PipelineDefinition>, sqlx::Error> {
    let row = sqlx::query_as::<_, DefinitionRow>(
        r#"
        SELECT id, lesson_id, stages, status, created_at, updated_at
        FROM pipeline_definitions
        WHERE lesson_id = $1
        "#,
    )
    .bind(lesson_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|r| r.into()))
}

/// Replace a definition's stage list in place
pub async fn update_stages(
    pool: &PgPool,
    id: Uuid,
    stages: &[StageDescriptor],
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE pipeline_definitions
        SET stages = $1, updated_at = $2
        WHERE id = $3
        "#,
    )
    .bind(serde_json::to_value(stages).unwrap_or_default())
    .bind(chrono::Utc::now())
    .bind(id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Update a definition's status
pub async fn update_status(
    pool: &PgPool,
    id: Uuid,
    status: PipelineStatus,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE pipeline_definitions SET status = $1, updated_at = $2 WHERE id = $3")
        .bind(status_to_string(status))
        .bind(chrono::Utc::now())
        .bind(id)
        .execute(pool)
        .await?;

    Ok(())
}

// =============================================================================
// Helper Functions
// =============================================================================

fn status_to_string(status: PipelineStatus) -> &'static str {
    match status {
        PipelineStatus::Draft => "Draft",
        PipelineStatus::Running => "Running",
        PipelineStatus::Completed => "Completed",
        PipelineStatus::Failed => "Failed",
    }
}

fn string_to_status(s: &str) -> PipelineStatus {
    match s {
        "Draft" => PipelineStatus::Draft,
        "Running" => PipelineStatus::Running,
        "Completed" => PipelineStatus::Completed,
        "Failed" => PipelineStatus::Failed,
        _ => PipelineStatus::Draft,
    }
}

// =============================================================================
// Database Row Types
// =============================================================================

#[derive(sqlx::FromRow)]
struct DefinitionRow {
    id: Uuid,
    lesson_id: Uuid,
    stages: serde_json::Value,
    status: String,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
}

impl From<DefinitionRow> for PipelineDefinition {
    fn from(row: DefinitionRow) -> Self {
        let stages = serde_json::from_value(row.stages).unwrap_or_default();

        PipelineDefinition {
            id: row.id,
            lesson_id: row.lesson_id,
            stages,
            status: string_to_status(&row.status),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}
