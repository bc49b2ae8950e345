//! Persistence interface consumed by the pipeline engine
//!
//! The engine never talks to a database directly; it receives a
//! [`PipelineStore`] at construction time. Each call is assumed durable and
//! individually atomic; no cross-call transaction is assumed.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use lectern_core::domain::lesson::{Lesson, LessonStatus};
use lectern_core::domain::pipeline::{PipelineDefinition, PipelineStatus};
use lectern_core::domain::run::{PipelineRun, RunStatus, StageResult};

/// Errors surfaced by a storage backend
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage backend error: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn backend(err: impl std::fmt::Display) -> Self {
        StoreError::Backend(err.to_string())
    }
}

/// Storage operations the engine depends on
#[async_trait]
pub trait PipelineStore: Send + Sync {
    async fn load_lesson(&self, lesson_id: Uuid) -> Result<Option<Lesson>, StoreError>;

    async fn load_definition(
        &self,
        lesson_id: Uuid,
    ) -> Result<Option<PipelineDefinition>, StoreError>;

    /// The RUNNING run for a pipeline, if one exists
    async fn find_running_run(&self, pipeline_id: Uuid)
    -> Result<Option<PipelineRun>, StoreError>;

    async fn insert_run(&self, run: &PipelineRun) -> Result<(), StoreError>;

    async fn get_run(&self, run_id: Uuid) -> Result<Option<PipelineRun>, StoreError>;

    async fn insert_stage_result(&self, result: &StageResult) -> Result<(), StoreError>;

    /// Stage results for a run, in insertion order
    async fn list_stage_results(&self, run_id: Uuid) -> Result<Vec<StageResult>, StoreError>;

    /// Flip a run to a new status
    ///
    /// Applies only while the run is still RUNNING: terminal transitions can
    /// race (completion vs cancel vs watchdog), and the first write wins. A
    /// write against an already-terminal run is a silent no-op.
    async fn update_run_status(
        &self,
        run_id: Uuid,
        status: RunStatus,
        completed_at: Option<DateTime<Utc>>,
    ) -> Result<(), StoreError>;

    async fn update_definition_status(
        &self,
        pipeline_id: Uuid,
        status: PipelineStatus,
    ) -> Result<(), StoreError>;

    async fn update_lesson_status(
        &self,
        lesson_id: Uuid,
        status: LessonStatus,
    ) -> Result<(), StoreError>;
}
