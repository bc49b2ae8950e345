//! End-to-end tests for the pipeline engine against in-memory fakes
//!
//! Every component dependency (store, providers, event publisher) is an
//! in-memory substitute, so these tests exercise the real registry,
//! orchestrator and executor wiring without external services.

use async_trait::async_trait;
use serde_json::{Value as JsonValue, json};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use uuid::Uuid;

use lectern_core::domain::lesson::{Lesson, LessonStatus};
use lectern_core::domain::module::ModuleType;
use lectern_core::domain::pipeline::{PipelineDefinition, PipelineStatus, StageDescriptor};
use lectern_core::domain::run::{PipelineRun, RunStatus, StageResult};
use lectern_core::dto::event::{PipelineCompleted, StageCompleted, StageEventStatus};

use lectern_pipeline::events::{EventPublisher, PublishError};
use lectern_pipeline::lifecycle::{Closable, CloseError, ResourceLifecycle};
use lectern_pipeline::orchestrator::PipelineOrchestrator;
use lectern_pipeline::provider::{CapabilityProvider, ProviderError, ProviderRegistry};
use lectern_pipeline::registry::{RunError, RunRegistry};
use lectern_pipeline::store::{PipelineStore, StoreError};

// =============================================================================
// In-memory fakes
// =============================================================================

#[derive(Default)]
struct State {
    lessons: HashMap<Uuid, Lesson>,
    definitions: HashMap<Uuid, PipelineDefinition>,
    runs: HashMap<Uuid, PipelineRun>,
    results: Vec<StageResult>,
}

#[derive(Default)]
struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    fn seed(&self, lesson: Lesson, definition: PipelineDefinition) {
        let mut state = self.state.lock().unwrap();
        state.definitions.insert(lesson.id, definition);
        state.lessons.insert(lesson.id, lesson);
    }

    fn result_modules(&self, run_id: Uuid) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .results
            .iter()
            .filter(|r| r.run_id == run_id)
            .map(|r| r.module_name.clone())
            .collect()
    }

    fn lesson_status(&self, lesson_id: Uuid) -> LessonStatus {
        self.state.lock().unwrap().lessons[&lesson_id].status
    }

    fn definition_status(&self, lesson_id: Uuid) -> PipelineStatus {
        self.state.lock().unwrap().definitions[&lesson_id].status
    }
}

#[async_trait]
impl PipelineStore for MemoryStore {
    async fn load_lesson(&self, lesson_id: Uuid) -> Result<Option<Lesson>, StoreError> {
        Ok(self.state.lock().unwrap().lessons.get(&lesson_id).cloned())
    }

    async fn load_definition(
        &self,
        lesson_id: Uuid,
    ) -> Result<Option<PipelineDefinition>, StoreError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .definitions
            .get(&lesson_id)
            .cloned())
    }

    async fn find_running_run(
        &self,
        pipeline_id: Uuid,
    ) -> Result<Option<PipelineRun>, StoreError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .runs
            .values()
            .find(|r| r.pipeline_id == pipeline_id && r.status == RunStatus::Running)
            .cloned())
    }

    async fn insert_run(&self, run: &PipelineRun) -> Result<(), StoreError> {
        self.state.lock().unwrap().runs.insert(run.id, run.clone());
        Ok(())
    }

    async fn get_run(&self, run_id: Uuid) -> Result<Option<PipelineRun>, StoreError> {
        Ok(self.state.lock().unwrap().runs.get(&run_id).cloned())
    }

    async fn insert_stage_result(&self, result: &StageResult) -> Result<(), StoreError> {
        self.state.lock().unwrap().results.push(result.clone());
        Ok(())
    }

    async fn list_stage_results(&self, run_id: Uuid) -> Result<Vec<StageResult>, StoreError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .results
            .iter()
            .filter(|r| r.run_id == run_id)
            .cloned()
            .collect())
    }

    async fn update_run_status(
        &self,
        run_id: Uuid,
        status: RunStatus,
        completed_at: Option<chrono::DateTime<chrono::Utc>>,
    ) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        if let Some(run) = state.runs.get_mut(&run_id) {
            // Terminal transitions only apply to a RUNNING row, matching the
            // guarded UPDATE of the production store
            if run.status == RunStatus::Running {
                run.status = status;
                run.completed_at = completed_at;
            }
        }
        Ok(())
    }

    async fn update_definition_status(
        &self,
        pipeline_id: Uuid,
        status: PipelineStatus,
    ) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        for definition in state.definitions.values_mut() {
            if definition.id == pipeline_id {
                definition.status = status;
            }
        }
        Ok(())
    }

    async fn update_lesson_status(
        &self,
        lesson_id: Uuid,
        status: LessonStatus,
    ) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        if let Some(lesson) = state.lessons.get_mut(&lesson_id) {
            lesson.status = status;
        }
        Ok(())
    }
}

#[derive(Default)]
struct RecordingPublisher {
    stage_events: Mutex<Vec<StageCompleted>>,
    pipeline_events: Mutex<Vec<PipelineCompleted>>,
}

impl RecordingPublisher {
    fn stage_events(&self) -> Vec<StageCompleted> {
        self.stage_events.lock().unwrap().clone()
    }

    fn pipeline_events(&self) -> Vec<PipelineCompleted> {
        self.pipeline_events.lock().unwrap().clone()
    }
}

#[async_trait]
impl EventPublisher for RecordingPublisher {
    async fn stage_completed(&self, event: StageCompleted) -> Result<(), PublishError> {
        self.stage_events.lock().unwrap().push(event);
        Ok(())
    }

    async fn pipeline_completed(&self, event: PipelineCompleted) -> Result<(), PublishError> {
        self.pipeline_events.lock().unwrap().push(event);
        Ok(())
    }
}

/// Provider returning a fixed output, recording every input it received
struct ScriptedProvider {
    output: JsonValue,
    calls: AtomicUsize,
    inputs: Mutex<Vec<JsonValue>>,
}

impl ScriptedProvider {
    fn new(output: JsonValue) -> Arc<Self> {
        Arc::new(Self {
            output,
            calls: AtomicUsize::new(0),
            inputs: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn inputs(&self) -> Vec<JsonValue> {
        self.inputs.lock().unwrap().clone()
    }
}

#[async_trait]
impl CapabilityProvider for ScriptedProvider {
    async fn run(&self, input: JsonValue) -> Result<JsonValue, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inputs.lock().unwrap().push(input);
        Ok(self.output.clone())
    }
}

/// Provider that always rejects
struct FailingProvider;

#[async_trait]
impl CapabilityProvider for FailingProvider {
    async fn run(&self, _input: JsonValue) -> Result<JsonValue, ProviderError> {
        Err(ProviderError::Request("model backend unavailable".to_string()))
    }
}

/// Provider that signals when entered, then blocks until released
struct BlockingProvider {
    output: JsonValue,
    started: tokio::sync::mpsc::UnboundedSender<()>,
    release: Arc<tokio::sync::Semaphore>,
}

impl BlockingProvider {
    fn new(
        output: JsonValue,
    ) -> (
        Arc<Self>,
        tokio::sync::mpsc::UnboundedReceiver<()>,
        Arc<tokio::sync::Semaphore>,
    ) {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        let release = Arc::new(tokio::sync::Semaphore::new(0));
        let provider = Arc::new(Self {
            output,
            started: tx,
            release: release.clone(),
        });
        (provider, rx, release)
    }
}

#[async_trait]
impl CapabilityProvider for BlockingProvider {
    async fn run(&self, _input: JsonValue) -> Result<JsonValue, ProviderError> {
        let _ = self.started.send(());
        let permit = self
            .release
            .acquire()
            .await
            .map_err(|e| ProviderError::Request(e.to_string()))?;
        permit.forget();
        Ok(self.output.clone())
    }
}

/// Closable counting its close invocations
#[derive(Default)]
struct CountingConnection {
    closes: AtomicUsize,
}

#[async_trait]
impl Closable for CountingConnection {
    fn name(&self) -> &str {
        "counting-connection"
    }

    async fn close(&self) -> Result<(), CloseError> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

// =============================================================================
// Fixtures
// =============================================================================

fn lesson() -> Lesson {
    Lesson {
        id: Uuid::new_v4(),
        course_id: Uuid::new_v4(),
        tenant_id: Uuid::new_v4(),
        status: LessonStatus::Pending,
        created_at: chrono::Utc::now(),
    }
}

fn stage(module: &str, order: i32, enabled: bool) -> StageDescriptor {
    StageDescriptor {
        id: Uuid::new_v4(),
        module: module.to_string(),
        config: HashMap::new(),
        enabled,
        order,
    }
}

fn definition(lesson_id: Uuid, stages: Vec<StageDescriptor>) -> PipelineDefinition {
    PipelineDefinition {
        id: Uuid::new_v4(),
        lesson_id,
        stages,
        status: PipelineStatus::Draft,
        created_at: chrono::Utc::now(),
        updated_at: chrono::Utc::now(),
    }
}

struct World {
    store: Arc<MemoryStore>,
    events: Arc<RecordingPublisher>,
    registry: Arc<RunRegistry>,
}

fn world(providers: ProviderRegistry) -> World {
    world_with_timeout(providers, Duration::from_secs(10))
}

fn world_with_timeout(providers: ProviderRegistry, timeout: Duration) -> World {
    let store = Arc::new(MemoryStore::default());
    let events = Arc::new(RecordingPublisher::default());
    let orchestrator = Arc::new(PipelineOrchestrator::new(
        store.clone(),
        events.clone(),
        providers,
    ));
    let registry = Arc::new(RunRegistry::with_timeout(
        store.clone(),
        orchestrator,
        timeout,
    ));
    World {
        store,
        events,
        registry,
    }
}

async fn wait_for_status(store: &MemoryStore, run_id: Uuid, status: RunStatus) -> PipelineRun {
    for _ in 0..400 {
        if let Some(run) = store.get_run(run_id).await.unwrap() {
            if run.status == status {
                return run;
            }
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("run {run_id} never reached {status:?}");
}

// =============================================================================
// Properties
// =============================================================================

#[tokio::test]
async fn start_run_is_idempotent_while_running() {
    let (blocker, mut started, release) = BlockingProvider::new(json!({"transcript": "t"}));
    let mut providers = ProviderRegistry::new();
    providers.register(ModuleType::Ingestion, blocker);

    let w = world(providers);
    let lesson = lesson();
    w.store
        .seed(lesson.clone(), definition(lesson.id, vec![stage("INGESTION", 1, true)]));

    let first = w.registry.start_run(lesson.id).await.unwrap();
    started.recv().await.unwrap();

    // Second start while the first is mid-stage returns the same run
    let second = w.registry.start_run(lesson.id).await.unwrap();
    assert_eq!(first.id, second.id);

    release.add_permits(1);
    wait_for_status(&w.store, first.id, RunStatus::Completed).await;

    // After completion a fresh start creates a new run
    let third = w.registry.start_run(lesson.id).await.unwrap();
    assert_ne!(first.id, third.id);
    w.registry.cancel_run(third.id).await.unwrap();
}

#[tokio::test]
async fn start_run_unknown_lesson_is_not_found() {
    let w = world(ProviderRegistry::new());
    let missing = Uuid::new_v4();
    match w.registry.start_run(missing).await {
        Err(RunError::LessonNotFound(id)) => assert_eq!(id, missing),
        other => panic!("expected LessonNotFound, got {other:?}"),
    }
}

#[tokio::test]
async fn start_run_without_definition_is_not_found() {
    let w = world(ProviderRegistry::new());
    let lesson = lesson();
    // Seed the lesson only, bypassing the definition
    w.store
        .state
        .lock()
        .unwrap()
        .lessons
        .insert(lesson.id, lesson.clone());

    match w.registry.start_run(lesson.id).await {
        Err(RunError::DefinitionNotFound(id)) => assert_eq!(id, lesson.id),
        other => panic!("expected DefinitionNotFound, got {other:?}"),
    }
}

#[tokio::test]
async fn stages_execute_in_ascending_order() {
    let mut providers = ProviderRegistry::new();
    providers.register(
        ModuleType::Ingestion,
        ScriptedProvider::new(json!({"transcript": "t"})),
    );
    providers.register(
        ModuleType::ContentCleaning,
        ScriptedProvider::new(json!({"cleaned_text": "c"})),
    );
    providers.register(
        ModuleType::Summarization,
        ScriptedProvider::new(json!({"summary": "s"})),
    );

    let w = world(providers);
    let lesson = lesson();
    // Saved out of order on purpose; `order` wins
    w.store.seed(
        lesson.clone(),
        definition(
            lesson.id,
            vec![
                stage("SUMMARIZATION", 3, true),
                stage("INGESTION", 1, true),
                stage("CONTENT_CLEANING", 2, true),
            ],
        ),
    );

    let run = w.registry.start_run(lesson.id).await.unwrap();
    wait_for_status(&w.store, run.id, RunStatus::Completed).await;

    assert_eq!(
        w.store.result_modules(run.id),
        vec!["INGESTION", "CONTENT_CLEANING", "SUMMARIZATION"]
    );
}

#[tokio::test]
async fn disabled_stage_leaves_no_trace() {
    let mut providers = ProviderRegistry::new();
    providers.register(
        ModuleType::Ingestion,
        ScriptedProvider::new(json!({"transcript": "t"})),
    );
    let diagram = ScriptedProvider::new(json!({"diagram_url": "u"}));
    providers.register(ModuleType::Diagram, diagram.clone());

    let w = world(providers);
    let lesson = lesson();
    w.store.seed(
        lesson.clone(),
        definition(
            lesson.id,
            vec![stage("INGESTION", 1, true), stage("DIAGRAM", 2, false)],
        ),
    );

    let run = w.registry.start_run(lesson.id).await.unwrap();
    wait_for_status(&w.store, run.id, RunStatus::Completed).await;

    assert_eq!(diagram.calls(), 0);
    assert_eq!(w.store.result_modules(run.id), vec!["INGESTION"]);
    let events = w.events.stage_events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].module_type, "INGESTION");
}

#[tokio::test]
async fn failed_stage_does_not_abort_the_run() {
    let mut providers = ProviderRegistry::new();
    providers.register(
        ModuleType::Ingestion,
        ScriptedProvider::new(json!({"transcript": "t"})),
    );
    providers.register(ModuleType::Summarization, Arc::new(FailingProvider));
    providers.register(
        ModuleType::EntityRecognition,
        ScriptedProvider::new(json!({"entities": ["Ada Lovelace"]})),
    );

    let w = world(providers);
    let lesson = lesson();
    w.store.seed(
        lesson.clone(),
        definition(
            lesson.id,
            vec![
                stage("INGESTION", 1, true),
                stage("SUMMARIZATION", 2, true),
                stage("ENTITY_RECOGNITION", 3, true),
            ],
        ),
    );

    let run = w.registry.start_run(lesson.id).await.unwrap();
    wait_for_status(&w.store, run.id, RunStatus::Completed).await;

    // Rows exist for the stages that succeeded only
    assert_eq!(
        w.store.result_modules(run.id),
        vec!["INGESTION", "ENTITY_RECOGNITION"]
    );

    // The failure is visible in the event trail
    let statuses: Vec<(String, StageEventStatus)> = w
        .events
        .stage_events()
        .into_iter()
        .map(|e| (e.module_type, e.status))
        .collect();
    assert_eq!(
        statuses,
        vec![
            ("INGESTION".to_string(), StageEventStatus::Completed),
            ("SUMMARIZATION".to_string(), StageEventStatus::Failed),
            ("ENTITY_RECOGNITION".to_string(), StageEventStatus::Completed),
        ]
    );

    assert_eq!(w.store.lesson_status(lesson.id), LessonStatus::Ready);
    assert_eq!(
        w.store.definition_status(lesson.id),
        PipelineStatus::Completed
    );
    assert_eq!(w.events.pipeline_events().len(), 1);
}

#[tokio::test]
async fn cancel_between_stages_skips_the_rest() {
    let (blocker, mut started, release) = BlockingProvider::new(json!({"transcript": "t"}));
    let mut providers = ProviderRegistry::new();
    providers.register(ModuleType::Ingestion, blocker);
    let cleaning = ScriptedProvider::new(json!({"cleaned_text": "c"}));
    let summary = ScriptedProvider::new(json!({"summary": "s"}));
    providers.register(ModuleType::ContentCleaning, cleaning.clone());
    providers.register(ModuleType::Summarization, summary.clone());

    let w = world(providers);
    let lesson = lesson();
    w.store.seed(
        lesson.clone(),
        definition(
            lesson.id,
            vec![
                stage("INGESTION", 1, true),
                stage("CONTENT_CLEANING", 2, true),
                stage("SUMMARIZATION", 3, true),
            ],
        ),
    );

    let run = w.registry.start_run(lesson.id).await.unwrap();
    started.recv().await.unwrap();

    // Cancel while stage 1 is in flight; the stage itself is not interrupted
    let cancelled = w.registry.cancel_run(run.id).await.unwrap();
    assert_eq!(cancelled.status, RunStatus::Cancelled);
    assert!(cancelled.completed_at.is_some());

    release.add_permits(1);

    // Stage 1 finishes and is recorded; stages 2 and 3 never start
    for _ in 0..400 {
        if !w.store.result_modules(run.id).is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(w.store.result_modules(run.id), vec!["INGESTION"]);
    assert_eq!(cleaning.calls(), 0);
    assert_eq!(summary.calls(), 0);

    let run = w.store.get_run(run.id).await.unwrap().unwrap();
    assert_eq!(run.status, RunStatus::Cancelled);
    assert!(w.events.pipeline_events().is_empty());
}

#[tokio::test]
async fn stale_cancel_is_a_no_op() {
    let mut providers = ProviderRegistry::new();
    providers.register(
        ModuleType::Ingestion,
        ScriptedProvider::new(json!({"transcript": "t"})),
    );

    let w = world(providers);
    let lesson = lesson();
    w.store
        .seed(lesson.clone(), definition(lesson.id, vec![stage("INGESTION", 1, true)]));

    let run = w.registry.start_run(lesson.id).await.unwrap();
    wait_for_status(&w.store, run.id, RunStatus::Completed).await;

    // Cancel after completion: accepted, status unchanged
    let after = w.registry.cancel_run(run.id).await.unwrap();
    assert_eq!(after.status, RunStatus::Completed);

    // Cancel of an unknown run is an error
    match w.registry.cancel_run(Uuid::new_v4()).await {
        Err(RunError::RunNotFound(_)) => {}
        other => panic!("expected RunNotFound, got {other:?}"),
    }
}

#[tokio::test]
async fn first_terminal_status_wins() {
    let mut providers = ProviderRegistry::new();
    providers.register(
        ModuleType::Ingestion,
        ScriptedProvider::new(json!({"transcript": "t"})),
    );

    let w = world(providers);
    let lesson = lesson();
    w.store
        .seed(lesson.clone(), definition(lesson.id, vec![stage("INGESTION", 1, true)]));

    let run = w.registry.start_run(lesson.id).await.unwrap();
    wait_for_status(&w.store, run.id, RunStatus::Completed).await;
    let completed_at = w.store.get_run(run.id).await.unwrap().unwrap().completed_at;

    // A CANCELLED write landing after completion (cancel read the run as
    // RUNNING, then lost the race) must not overwrite the terminal row
    w.store
        .update_run_status(run.id, RunStatus::Cancelled, Some(chrono::Utc::now()))
        .await
        .unwrap();

    let after = w.store.get_run(run.id).await.unwrap().unwrap();
    assert_eq!(after.status, RunStatus::Completed);
    assert_eq!(after.completed_at, completed_at);
}

#[tokio::test]
async fn context_threads_between_stages() {
    let mut providers = ProviderRegistry::new();
    providers.register(
        ModuleType::Ingestion,
        ScriptedProvider::new(json!({"transcript": "lecture about rivers"})),
    );
    let summarizer = ScriptedProvider::new(json!({"summary": "rivers, briefly"}));
    providers.register(ModuleType::Summarization, summarizer.clone());

    let w = world(providers);
    let lesson = lesson();
    w.store.seed(
        lesson.clone(),
        definition(
            lesson.id,
            vec![stage("INGESTION", 1, true), stage("SUMMARIZATION", 2, true)],
        ),
    );

    let run = w.registry.start_run(lesson.id).await.unwrap();
    wait_for_status(&w.store, run.id, RunStatus::Completed).await;

    // Stage 2 consumed what stage 1 produced (no cleaning stage: the
    // summarizer fell back to the raw transcript)
    let inputs = summarizer.inputs();
    assert_eq!(inputs.len(), 1);
    assert_eq!(inputs[0]["text"], "lecture about rivers");
    assert_eq!(inputs[0]["lesson_id"], json!(lesson.id));

    let results = w.store.list_stage_results(run.id).await.unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].output_data["transcript"], "lecture about rivers");
    assert_eq!(results[1].output_data["summary"], "rivers, briefly");
}

#[tokio::test]
async fn unknown_module_type_is_skipped_silently() {
    let mut providers = ProviderRegistry::new();
    providers.register(
        ModuleType::Ingestion,
        ScriptedProvider::new(json!({"transcript": "t"})),
    );
    providers.register(
        ModuleType::Summarization,
        ScriptedProvider::new(json!({"summary": "s"})),
    );

    let w = world(providers);
    let lesson = lesson();
    w.store.seed(
        lesson.clone(),
        definition(
            lesson.id,
            vec![
                stage("INGESTION", 1, true),
                stage("NOT_A_REAL_MODULE", 2, true),
                stage("SUMMARIZATION", 3, true),
            ],
        ),
    );

    let run = w.registry.start_run(lesson.id).await.unwrap();
    wait_for_status(&w.store, run.id, RunStatus::Completed).await;

    assert_eq!(
        w.store.result_modules(run.id),
        vec!["INGESTION", "SUMMARIZATION"]
    );
    // No event for the unknown stage either way
    assert!(
        w.events
            .stage_events()
            .iter()
            .all(|e| e.module_type != "NOT_A_REAL_MODULE")
    );
}

#[tokio::test]
async fn hung_provider_is_force_failed_by_the_timeout() {
    let (blocker, mut started, _release) = BlockingProvider::new(json!({"transcript": "t"}));
    let mut providers = ProviderRegistry::new();
    providers.register(ModuleType::Ingestion, blocker);

    let w = world_with_timeout(providers, Duration::from_millis(50));
    let lesson = lesson();
    w.store
        .seed(lesson.clone(), definition(lesson.id, vec![stage("INGESTION", 1, true)]));

    let run = w.registry.start_run(lesson.id).await.unwrap();
    started.recv().await.unwrap();

    let failed = wait_for_status(&w.store, run.id, RunStatus::Failed).await;
    assert!(failed.completed_at.is_some());
    assert_eq!(w.store.definition_status(lesson.id), PipelineStatus::Failed);

    // Token released after the force-fail
    for _ in 0..400 {
        if !w.registry.is_active(run.id) {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert!(!w.registry.is_active(run.id));
}

#[tokio::test]
async fn shutdown_is_idempotent_and_closes_connections() {
    let (blocker, mut started, _release) = BlockingProvider::new(json!({"transcript": "t"}));
    let mut providers = ProviderRegistry::new();
    providers.register(ModuleType::Ingestion, blocker);

    let w = world(providers);
    let lesson = lesson();
    w.store
        .seed(lesson.clone(), definition(lesson.id, vec![stage("INGESTION", 1, true)]));

    let run = w.registry.start_run(lesson.id).await.unwrap();
    started.recv().await.unwrap();
    assert!(w.registry.is_active(run.id));

    let lifecycle = ResourceLifecycle::new(w.registry.clone());
    let connection = Arc::new(CountingConnection::default());
    lifecycle.register(connection.clone());

    lifecycle.shutdown().await;
    assert!(!w.registry.is_active(run.id));
    assert_eq!(connection.closes.load(Ordering::SeqCst), 1);

    // Second shutdown: no panic, close invoked again, nothing double-counted
    lifecycle.shutdown().await;
    assert_eq!(connection.closes.load(Ordering::SeqCst), 2);
}
