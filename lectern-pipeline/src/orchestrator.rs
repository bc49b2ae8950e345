//! Pipeline orchestrator
//!
//! Drives one run from start to terminal status, stage by stage, in order.
//! Stage-level failures are non-fatal: the run still reaches COMPLETED even
//! if every stage failed. Only cancellation or an orchestrator-level error
//! (the definition vanished mid-run, a persistence write failed) produces a
//! different terminal status.

use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use lectern_core::domain::lesson::{Lesson, LessonStatus};
use lectern_core::domain::pipeline::{PipelineStatus, StageDescriptor};
use lectern_core::domain::run::{PipelineRun, RunStatus, StageResult};
use lectern_core::dto::event::{PipelineCompleted, StageCompleted, StageEventStatus};

use crate::cancel::CancelToken;
use crate::context::SharedContext;
use crate::events::EventPublisher;
use crate::executor::{StageExecutor, StageOutcome};
use crate::provider::ProviderRegistry;
use crate::store::{PipelineStore, StoreError};

/// Run-fatal orchestrator errors
///
/// The registry's watchdog maps these to a FAILED run; they never reach an
/// API caller because runs execute detached.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("pipeline definition for lesson {0} not found")]
    DefinitionMissing(Uuid),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Drives pipeline runs against injected persistence, providers and events
pub struct PipelineOrchestrator {
    store: Arc<dyn PipelineStore>,
    events: Arc<dyn EventPublisher>,
    executor: StageExecutor,
}

impl PipelineOrchestrator {
    pub fn new(
        store: Arc<dyn PipelineStore>,
        events: Arc<dyn EventPublisher>,
        providers: ProviderRegistry,
    ) -> Self {
        Self {
            store,
            events,
            executor: StageExecutor::new(providers),
        }
    }

    /// Execute one run to completion
    ///
    /// The cancellation token is consulted before each stage, never within
    /// one: a stage in flight always finishes. When the token fires the
    /// remaining stages are skipped and the terminal status is left to the
    /// cancel path, which already flipped the run to CANCELLED.
    pub async fn run(
        &self,
        lesson: Lesson,
        run: PipelineRun,
        token: CancelToken,
    ) -> Result<(), OrchestratorError> {
        let definition = self
            .store
            .load_definition(lesson.id)
            .await?
            .ok_or(OrchestratorError::DefinitionMissing(lesson.id))?;

        self.store
            .update_definition_status(definition.id, PipelineStatus::Running)
            .await?;

        info!(run_id = %run.id, lesson_id = %lesson.id, "pipeline run started");

        let mut context = SharedContext::new(lesson.id, lesson.tenant_id);

        for stage in definition.enabled_stages() {
            if token.is_cancelled() {
                info!(run_id = %run.id, "run cancelled, skipping remaining stages");
                return Ok(());
            }

            match self.executor.execute(&stage, &context).await {
                StageOutcome::Completed {
                    delta,
                    output_type,
                    output_data,
                    file_url,
                } => {
                    context.apply(delta);
                    let result = StageResult {
                        run_id: run.id,
                        module_name: module_name(&stage),
                        output_type,
                        output_data,
                        file_url,
                        created_at: chrono::Utc::now(),
                    };
                    self.store.insert_stage_result(&result).await?;
                    self.publish_stage(&lesson, &run, &stage, StageEventStatus::Completed)
                        .await;
                }
                StageOutcome::Skipped => {}
                StageOutcome::Failed { error } => {
                    warn!(
                        run_id = %run.id,
                        module = %stage.module,
                        error = %error,
                        "stage failed, continuing with next stage"
                    );
                    self.publish_stage(&lesson, &run, &stage, StageEventStatus::Failed)
                        .await;
                }
            }
        }

        if token.is_cancelled() {
            // Cancel raced the final stage; the cancel path owns the status
            return Ok(());
        }

        self.store
            .update_run_status(run.id, RunStatus::Completed, Some(chrono::Utc::now()))
            .await?;
        self.store
            .update_definition_status(definition.id, PipelineStatus::Completed)
            .await?;
        self.store
            .update_lesson_status(lesson.id, LessonStatus::Ready)
            .await?;

        info!(run_id = %run.id, lesson_id = %lesson.id, "pipeline run completed");

        let event = PipelineCompleted {
            lesson_id: lesson.id,
            course_id: lesson.course_id,
            tenant_id: lesson.tenant_id,
            timestamp: chrono::Utc::now(),
        };
        if let Err(err) = self.events.pipeline_completed(event).await {
            warn!(run_id = %run.id, error = %err, "failed to publish pipeline-completed event");
        }

        Ok(())
    }

    async fn publish_stage(
        &self,
        lesson: &Lesson,
        run: &PipelineRun,
        stage: &StageDescriptor,
        status: StageEventStatus,
    ) {
        let event = StageCompleted {
            lesson_id: lesson.id,
            run_id: run.id,
            module_type: stage.module.clone(),
            module_name: module_name(stage),
            status,
            tenant_id: lesson.tenant_id,
            timestamp: chrono::Utc::now(),
        };
        if let Err(err) = self.events.stage_completed(event).await {
            warn!(run_id = %run.id, error = %err, "failed to publish stage-completed event");
        }
    }
}

/// Display name of a stage: a `name` config entry when present, else the
/// module type string
fn module_name(stage: &StageDescriptor) -> String {
    stage
        .config
        .get("name")
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .unwrap_or_else(|| stage.module.clone())
}
