//! Run registry
//!
//! Single source of truth for "is there already a run in progress for this
//! lesson", and for locating the cancellation token belonging to a run id.
//! Tokens are indexed twice: by run id for targeted cancels, and in a flat
//! active list so shutdown can signal everything without knowing run ids.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tracing::{debug, error, info};
use uuid::Uuid;

use lectern_core::domain::lesson::{Lesson, LessonStatus};
use lectern_core::domain::pipeline::PipelineStatus;
use lectern_core::domain::run::{PipelineRun, RunStatus};

use crate::cancel::CancelToken;
use crate::orchestrator::PipelineOrchestrator;
use crate::store::{PipelineStore, StoreError};
use crate::task::spawn_logged;

/// Default wall-clock budget for one run; a hung provider cannot hold a run
/// open past this window.
pub const DEFAULT_RUN_TIMEOUT: Duration = Duration::from_secs(300);

/// Registry error type
#[derive(Debug)]
pub enum RunError {
    LessonNotFound(Uuid),
    DefinitionNotFound(Uuid),
    RunNotFound(Uuid),
    Store(StoreError),
}

impl From<StoreError> for RunError {
    fn from(err: StoreError) -> Self {
        RunError::Store(err)
    }
}

#[derive(Default)]
struct TokenTable {
    by_run: HashMap<Uuid, CancelToken>,
    active: Vec<CancelToken>,
}

impl TokenTable {
    fn insert(&mut self, run_id: Uuid, token: CancelToken) {
        self.by_run.insert(run_id, token.clone());
        self.active.push(token);
    }

    fn remove(&mut self, run_id: Uuid) -> Option<CancelToken> {
        let token = self.by_run.remove(&run_id)?;
        self.active.retain(|t| !t.same_token(&token));
        Some(token)
    }
}

/// Tracks active runs and enforces the at-most-one-running invariant
pub struct RunRegistry {
    store: Arc<dyn PipelineStore>,
    orchestrator: Arc<PipelineOrchestrator>,
    run_timeout: Duration,
    /// Serializes the existing-run check against the run insert so that
    /// concurrent duplicate starts observe each other
    start_gate: tokio::sync::Mutex<()>,
    tokens: Mutex<TokenTable>,
}

impl RunRegistry {
    pub fn new(store: Arc<dyn PipelineStore>, orchestrator: Arc<PipelineOrchestrator>) -> Self {
        Self::with_timeout(store, orchestrator, DEFAULT_RUN_TIMEOUT)
    }

    pub fn with_timeout(
        store: Arc<dyn PipelineStore>,
        orchestrator: Arc<PipelineOrchestrator>,
        run_timeout: Duration,
    ) -> Self {
        Self {
            store,
            orchestrator,
            run_timeout,
            start_gate: tokio::sync::Mutex::new(()),
            tokens: Mutex::new(TokenTable::default()),
        }
    }

    /// Start a run for a lesson
    ///
    /// Idempotent: when a RUNNING run already exists it is returned
    /// unchanged, with no new token and no re-entry into the orchestrator.
    /// Otherwise the orchestrator is invoked detached and the fresh run is
    /// returned immediately, without waiting for pipeline completion.
    pub async fn start_run(self: &Arc<Self>, lesson_id: Uuid) -> Result<PipelineRun, RunError> {
        let lesson = self
            .store
            .load_lesson(lesson_id)
            .await?
            .ok_or(RunError::LessonNotFound(lesson_id))?;
        let definition = self
            .store
            .load_definition(lesson_id)
            .await?
            .ok_or(RunError::DefinitionNotFound(lesson_id))?;

        let _gate = self.start_gate.lock().await;

        if let Some(existing) = self.store.find_running_run(definition.id).await? {
            debug!(
                run_id = %existing.id,
                lesson_id = %lesson_id,
                "run already in progress, returning existing run"
            );
            return Ok(existing);
        }

        let run = PipelineRun {
            id: Uuid::new_v4(),
            pipeline_id: definition.id,
            status: RunStatus::Running,
            started_at: chrono::Utc::now(),
            completed_at: None,
        };
        self.store.insert_run(&run).await?;
        self.store
            .update_lesson_status(lesson_id, LessonStatus::Processing)
            .await?;

        let token = CancelToken::new();
        self.table().insert(run.id, token.clone());

        info!(run_id = %run.id, lesson_id = %lesson_id, "run created, dispatching pipeline");

        self.dispatch(lesson, run.clone(), token);

        Ok(run)
    }

    /// Detached orchestrator invocation raced against the run timeout
    fn dispatch(self: &Arc<Self>, lesson: Lesson, run: PipelineRun, token: CancelToken) {
        let registry = Arc::clone(self);
        let orchestrator = Arc::clone(&self.orchestrator);
        let timeout = self.run_timeout;

        spawn_logged("pipeline-run", async move {
            let run_id = run.id;
            let outcome =
                tokio::time::timeout(timeout, orchestrator.run(lesson, run, token)).await;

            let result: Result<(), StoreError> = match outcome {
                Ok(Ok(())) => Ok(()),
                Ok(Err(err)) => {
                    error!(run_id = %run_id, error = %err, "pipeline run failed");
                    registry.force_fail(run_id).await
                }
                Err(_elapsed) => {
                    error!(run_id = %run_id, timeout = ?timeout, "pipeline run timed out");
                    registry.force_fail(run_id).await
                }
            };

            registry.release(run_id);
            result
        });
    }

    /// Cancel a run
    ///
    /// Signals the token when the run is still live and flips the row to
    /// CANCELLED. A stale cancel (run already terminal) is a no-op returning
    /// the run unchanged: the cancellation intent has already been
    /// satisfied. A stage in flight is not interrupted; the orchestrator
    /// stops before the next stage.
    ///
    /// The CANCELLED write is conditional on the row still being RUNNING, so
    /// a completion racing this call keeps its terminal status; the returned
    /// run reflects whichever write won.
    pub async fn cancel_run(&self, run_id: Uuid) -> Result<PipelineRun, RunError> {
        let run = self
            .store
            .get_run(run_id)
            .await?
            .ok_or(RunError::RunNotFound(run_id))?;

        if let Some(token) = self.table().remove(run_id) {
            token.cancel();
        }

        if run.status != RunStatus::Running {
            debug!(run_id = %run_id, status = %run.status, "stale cancel, nothing to do");
            return Ok(run);
        }

        self.store
            .update_run_status(run_id, RunStatus::Cancelled, Some(chrono::Utc::now()))
            .await?;

        let run = self
            .store
            .get_run(run_id)
            .await?
            .ok_or(RunError::RunNotFound(run_id))?;

        info!(run_id = %run_id, status = %run.status, "cancel processed");

        Ok(run)
    }

    /// Signal every active token and clear both indexes
    ///
    /// Idempotent; used by shutdown. Returns how many tokens were signaled.
    pub fn cancel_all(&self) -> usize {
        let mut table = self.table();
        let count = table.active.len();
        for token in table.active.drain(..) {
            token.cancel();
        }
        table.by_run.clear();
        count
    }

    /// Whether a token is currently tracked for a run
    pub fn is_active(&self, run_id: Uuid) -> bool {
        self.table().by_run.contains_key(&run_id)
    }

    async fn force_fail(&self, run_id: Uuid) -> Result<(), StoreError> {
        let Some(run) = self.store.get_run(run_id).await? else {
            return Ok(());
        };
        if run.status.is_terminal() {
            // A cancel won the race; the terminal status stands
            return Ok(());
        }
        self.store
            .update_run_status(run_id, RunStatus::Failed, Some(chrono::Utc::now()))
            .await?;
        self.store
            .update_definition_status(run.pipeline_id, PipelineStatus::Failed)
            .await?;
        Ok(())
    }

    fn release(&self, run_id: Uuid) {
        self.table().remove(run_id);
    }

    fn table(&self) -> MutexGuard<'_, TokenTable> {
        // Token bookkeeping stays usable even after a panicked holder
        match self.tokens.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
