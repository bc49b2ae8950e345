//! Pipeline definition domain types

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Configured stage graph for one lesson
///
/// Structure shared between the HTTP service (persists) and the pipeline
/// engine (executes). Updated in place on save; `status` is mutated only by
/// the orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineDefinition {
    pub id: Uuid,
    pub lesson_id: Uuid,
    pub stages: Vec<StageDescriptor>,
    pub status: PipelineStatus,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl PipelineDefinition {
    /// Enabled stages in execution order
    ///
    /// Sorted ascending by `order` with a stable sort, so stages sharing an
    /// `order` value keep their saved sequence position. Disabled stages are
    /// dropped here and never reach the executor.
    pub fn enabled_stages(&self) -> Vec<StageDescriptor> {
        let mut stages: Vec<StageDescriptor> =
            self.stages.iter().filter(|s| s.enabled).cloned().collect();
        stages.sort_by_key(|s| s.order);
        stages
    }
}

/// One configured unit of work within a pipeline
///
/// `module` holds the raw module-type string (see
/// [`crate::domain::module::ModuleType`]); unknown strings are preserved so a
/// definition can reference modules this engine does not implement yet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageDescriptor {
    pub id: Uuid,
    pub module: String,
    pub config: HashMap<String, serde_json::Value>,
    pub enabled: bool,
    pub order: i32,
}

/// Status of a pipeline definition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PipelineStatus {
    Draft,
    Running,
    Completed,
    Failed,
}

impl std::fmt::Display for PipelineStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelineStatus::Draft => write!(f, "Draft"),
            PipelineStatus::Running => write!(f, "Running"),
            PipelineStatus::Completed => write!(f, "Completed"),
            PipelineStatus::Failed => write!(f, "Failed"),
        }
    }
}
