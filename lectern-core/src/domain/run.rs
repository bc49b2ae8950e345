//! Pipeline run domain types

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One execution attempt of a pipeline definition
///
/// Created RUNNING by the run registry, moved to a terminal status exactly
/// once, never deleted. At most one RUNNING run may exist per pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineRun {
    pub id: Uuid,
    pub pipeline_id: Uuid,
    pub status: RunStatus,
    pub started_at: chrono::DateTime<chrono::Utc>,
    pub completed_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Run execution status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunStatus {
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl RunStatus {
    /// Whether this status is terminal
    pub fn is_terminal(&self) -> bool {
        !matches!(self, RunStatus::Running)
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunStatus::Running => write!(f, "Running"),
            RunStatus::Completed => write!(f, "Completed"),
            RunStatus::Failed => write!(f, "Failed"),
            RunStatus::Cancelled => write!(f, "Cancelled"),
        }
    }
}

/// Durable output of one executed stage within one run
///
/// Written immediately after a stage's provider call succeeds, immutable
/// thereafter. Failed and skipped stages leave no row; their trace lives in
/// the stage-completed event log only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageResult {
    pub run_id: Uuid,
    pub module_name: String,
    pub output_type: OutputType,
    pub output_data: serde_json::Value,
    pub file_url: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Kind of artifact a stage produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputType {
    /// Plain text artifact (transcript, cleaned text, summary)
    Text,

    /// Structured JSON artifact (entities, notes, citations, QA report)
    Json,

    /// Artifact stored out-of-band, referenced by `file_url`
    File,
}

impl std::fmt::Display for OutputType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputType::Text => write!(f, "Text"),
            OutputType::Json => write!(f, "Json"),
            OutputType::File => write!(f, "File"),
        }
    }
}
