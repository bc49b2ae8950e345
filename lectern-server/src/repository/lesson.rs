//! Lesson Repository
//!
//! Handles all database operations related to lessons.

use lectern_core::domain::lesson::{Lesson, LessonStatus};
use sqlx::PgPool;
use uuid::Uuid;

/// Find a lesson by ID
pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Lesson>, sqlx::Error> {
    let row = sqlx::query_as::<_, LessonRow>(
        r#"
        SELECT id, course_id, tenant_id, status, created_at
        FROM lessons
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|r| r.into()))
}

/// Update a lesson's processing status
pub async fn update_status(
    pool: &PgPool,
    id: Uuid,
    status: LessonStatus,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE lessons SET status = $1 WHERE id = $2")
        .bind(status_to_string(status))
        .bind(id)
        .execute(pool)
        .await?;

    Ok(())
}

// =============================================================================
// Helper Functions
// =============================================================================

fn status_to_string(status: LessonStatus) -> &'static str {
    match status {
        LessonStatus::Pending => "Pending",
        LessonStatus::Processing => "Processing",
        LessonStatus::Ready => "Ready",
    }
}

fn string_to_status(s: &str) -> LessonStatus {
    match s {
        "Pending" => LessonStatus::Pending,
        "Processing" => LessonStatus::Processing,
        "Ready" => LessonStatus::Ready,
        _ => LessonStatus::Pending,
    }
}

// =============================================================================
// Database Row Types
// =============================================================================

#[derive(sqlx::FromRow)]
struct LessonRow {
    id: Uuid,
    course_id: Uuid,
    tenant_id: Uuid,
    status: String,
    created_at: chrono::DateTime<chrono::Utc>,
}

impl From<LessonRow> for Lesson {
    fn from(row: LessonRow) -> Self {
        Lesson {
            id: row.id,
            course_id: row.course_id,
            tenant_id: row.tenant_id,
            status: string_to_status(&row.status),
            created_at: row.created_at,
        }
    }
}
