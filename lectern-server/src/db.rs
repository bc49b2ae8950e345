use async_trait::async_trait;
use lectern_pipeline::lifecycle::{Closable, CloseError};
use sqlx::{PgPool, postgres::PgPoolOptions};
use std::time::Duration;

pub async fn create_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(5))
        .connect(database_url)
        .await
}

pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
    // Create lessons table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS lessons (
            id UUID PRIMARY KEY,
            course_id UUID NOT NULL,
            tenant_id UUID NOT NULL,
            status VARCHAR(50) NOT NULL,
            created_at TIMESTAMPTZ NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Create pipeline definitions table; the stage list lives in a JSONB
    // column since stages are always read and written as a whole
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS pipeline_definitions (
            id UUID PRIMARY KEY,
            lesson_id UUID NOT NULL UNIQUE REFERENCES lessons(id) ON DELETE CASCADE,
            stages JSONB NOT NULL DEFAULT '[]',
            status VARCHAR(50) NOT NULL,
            created_at TIMESTAMPTZ NOT NULL,
            updated_at TIMESTAMPTZ NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Create runs table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS pipeline_runs (
            id UUID PRIMARY KEY,
            pipeline_id UUID NOT NULL REFERENCES pipeline_definitions(id) ON DELETE CASCADE,
            status VARCHAR(50) NOT NULL,
            started_at TIMESTAMPTZ NOT NULL,
            completed_at TIMESTAMPTZ
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Create stage results table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS stage_results (
            id SERIAL PRIMARY KEY,
            run_id UUID NOT NULL REFERENCES pipeline_runs(id) ON DELETE CASCADE,
            module_name VARCHAR(255) NOT NULL,
            output_type VARCHAR(20) NOT NULL,
            output_data JSONB NOT NULL DEFAULT '{}',
            file_url TEXT,
            created_at TIMESTAMPTZ NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Create indexes for better query performance
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_runs_pipeline_status ON pipeline_runs(pipeline_id, status)",
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_runs_started_at ON pipeline_runs(started_at DESC)")
        .execute(pool)
        .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_stage_results_run ON stage_results(run_id, id)")
        .execute(pool)
        .await?;

    tracing::info!("Database migrations completed successfully");
    Ok(())
}

/// Pool handle released by the resource lifecycle manager on shutdown
///
/// `PgPool::close` is idempotent, so repeated shutdown calls are safe.
pub struct PgPoolHandle {
    pool: PgPool,
}

impl PgPoolHandle {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Closable for PgPoolHandle {
    fn name(&self) -> &str {
        "postgres-pool"
    }

    async fn close(&self) -> Result<(), CloseError> {
        self.pool.close().await;
        Ok(())
    }
}
