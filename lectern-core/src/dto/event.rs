//! Lifecycle events published to the platform event bus
//!
//! Events are published at-least-once and fire-and-forget: a publish failure
//! is logged by the engine and never propagated into the pipeline loop.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Emitted after every executed stage, whether it succeeded or failed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageCompleted {
    pub lesson_id: Uuid,
    pub run_id: Uuid,
    pub module_type: String,
    pub module_name: String,
    pub status: StageEventStatus,
    pub tenant_id: Uuid,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Outcome carried by a [`StageCompleted`] event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StageEventStatus {
    Completed,
    Failed,
}

/// Emitted once when a run finishes iterating all stages
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineCompleted {
    pub lesson_id: Uuid,
    pub course_id: Uuid,
    pub tenant_id: Uuid,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}
