//! HTTP event publisher
//!
//! Bridges pipeline lifecycle events onto the platform event bus over HTTP.
//! The engine treats publishing as fire-and-forget, so failures here only
//! ever surface as log lines.

use async_trait::async_trait;
use lectern_core::dto::event::{PipelineCompleted, StageCompleted};
use lectern_pipeline::events::{EventPublisher, PublishError};
use serde::Serialize;

pub struct HttpEventPublisher {
    client: reqwest::Client,
    base_url: String,
}

impl HttpEventPublisher {
    pub fn new(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn post<T: Serialize>(&self, topic: &str, event: &T) -> Result<(), PublishError> {
        let url = format!("{}/v1/events/{}", self.base_url, topic);

        let response = self
            .client
            .post(&url)
            .json(event)
            .send()
            .await
            .map_err(|e| PublishError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PublishError::Transport(format!(
                "event bus returned {status} for {topic}"
            )));
        }

        Ok(())
    }
}

#[async_trait]
impl EventPublisher for HttpEventPublisher {
    async fn stage_completed(&self, event: StageCompleted) -> Result<(), PublishError> {
        self.post("stage-completed", &event).await
    }

    async fn pipeline_completed(&self, event: PipelineCompleted) -> Result<(), PublishError> {
        self.post("pipeline-completed", &event).await
    }
}
