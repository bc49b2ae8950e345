//! Event publisher interface
//!
//! Lifecycle events are fire-and-forget: the orchestrator logs and swallows
//! publish failures so a broken event bus never affects a run's outcome.

use async_trait::async_trait;
use thiserror::Error;

use lectern_core::dto::event::{PipelineCompleted, StageCompleted};

/// Errors a publish attempt can surface
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("event publish failed: {0}")]
    Transport(String),
}

/// Sink for pipeline lifecycle events
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn stage_completed(&self, event: StageCompleted) -> Result<(), PublishError>;

    async fn pipeline_completed(&self, event: PipelineCompleted) -> Result<(), PublishError>;
}

/// Publisher that drops every event
///
/// Used by deployments without an event bus configured.
pub struct NullPublisher;

#[async_trait]
impl EventPublisher for NullPublisher {
    async fn stage_completed(&self, _event: StageCompleted) -> Result<(), PublishError> {
        Ok(())
    }

    async fn pipeline_completed(&self, _event: PipelineCompleted) -> Result<(), PublishError> {
        Ok(())
    }
}
