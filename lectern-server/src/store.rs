//! Postgres-backed implementation of the engine's persistence interface
//!
//! Thin adapter delegating to the repository modules; the pipeline engine
//! receives this as `Arc<dyn PipelineStore>`.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use lectern_core::domain::lesson::{Lesson, LessonStatus};
use lectern_core::domain::pipeline::{PipelineDefinition, PipelineStatus};
use lectern_core::domain::run::{PipelineRun, RunStatus, StageResult};
use lectern_pipeline::store::{PipelineStore, StoreError};

use crate::repository::{definition_repository, lesson_repository, run_repository};

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PipelineStore for PgStore {
    async fn load_lesson(&self, lesson_id: Uuid) -> Result<Option<Lesson>, StoreError> {
        lesson_repository::find_by_id(&self.pool, lesson_id)
            .await
            .map_err(StoreError::backend)
    }

    async fn load_definition(
        &self,
        lesson_id: Uuid,
    ) -> Result<Option<PipelineDefinition>, StoreError> {
        definition_repository::find_by_lesson(&self.pool, lesson_id)
            .await
            .map_err(StoreError::backend)
    }

    async fn find_running_run(
        &self,
        pipeline_id: Uuid,
    ) -> Result<Option<PipelineRun>, StoreError> {
        run_repository::find_running(&self.pool, pipeline_id)
            .await
            .map_err(StoreError::backend)
    }

    async fn insert_run(&self, run: &PipelineRun) -> Result<(), StoreError> {
        run_repository::create(&self.pool, run)
            .await
            .map_err(StoreError::backend)
    }

    async fn get_run(&self, run_id: Uuid) -> Result<Option<PipelineRun>, StoreError> {
        run_repository::find_by_id(&self.pool, run_id)
            .await
            .map_err(StoreError::backend)
    }

    async fn insert_stage_result(&self, result: &StageResult) -> Result<(), StoreError> {
        run_repository::insert_stage_result(&self.pool, result)
            .await
            .map_err(StoreError::backend)
    }

    async fn list_stage_results(&self, run_id: Uuid) -> Result<Vec<StageResult>, StoreError> {
        run_repository::list_stage_results(&self.pool, run_id)
            .await
            .map_err(StoreError::backend)
    }

    async fn update_run_status(
        &self,
        run_id: Uuid,
        status: RunStatus,
        completed_at: Option<chrono::DateTime<chrono::Utc>>,
    ) -> Result<(), StoreError> {
        run_repository::update_status(&self.pool, run_id, status, completed_at)
            .await
            .map_err(StoreError::backend)
    }

    async fn update_definition_status(
        &self,
        pipeline_id: Uuid,
        status: PipelineStatus,
    ) -> Result<(), StoreError> {
        definition_repository::update_status(&self.pool, pipeline_id, status)
            .await
            .map_err(StoreError::backend)
    }

    async fn update_lesson_status(
        &self,
        lesson_id: Uuid,
        status: LessonStatus,
    ) -> Result<(), StoreError> {
        lesson_repository::update_status(&self.pool, lesson_id, status)
            .await
            .map_err(StoreError::backend)
    }
}
