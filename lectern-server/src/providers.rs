//! HTTP capability providers
//!
//! Every AI module (transcription, cleaning, summarization, ...) is exposed
//! by the module runner service as a JSON-over-HTTP endpoint. One
//! [`HttpProvider`] per module type posts the stage input and returns the
//! response body as the provider output.

use async_trait::async_trait;
use lectern_core::domain::module::ModuleType;
use lectern_pipeline::provider::{CapabilityProvider, ProviderError, ProviderRegistry};
use serde_json::Value as JsonValue;
use std::sync::Arc;

const ALL_MODULES: [ModuleType; 8] = [
    ModuleType::Ingestion,
    ModuleType::ContentCleaning,
    ModuleType::EntityRecognition,
    ModuleType::Summarization,
    ModuleType::NoteGeneration,
    ModuleType::Diagram,
    ModuleType::CitationCheck,
    ModuleType::QaScoring,
];

/// Provider backed by one module runner endpoint
pub struct HttpProvider {
    client: reqwest::Client,
    url: String,
}

impl HttpProvider {
    pub fn new(client: reqwest::Client, url: String) -> Self {
        Self { client, url }
    }
}

#[async_trait]
impl CapabilityProvider for HttpProvider {
    async fn run(&self, input: JsonValue) -> Result<JsonValue, ProviderError> {
        let response = self
            .client
            .post(&self.url)
            .json(&input)
            .send()
            .await
            .map_err(|e| ProviderError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Request(format!(
                "module endpoint returned {status}: {body}"
            )));
        }

        response
            .json::<JsonValue>()
            .await
            .map_err(|e| ProviderError::Malformed(e.to_string()))
    }
}

/// Build the dispatch table for all known modules against one runner service
///
/// Endpoint layout: `{base}/v1/modules/{module}` with the lower-cased module
/// name, e.g. `/v1/modules/summarization`.
pub fn build_registry(client: &reqwest::Client, base_url: &str) -> ProviderRegistry {
    let base = base_url.trim_end_matches('/');
    let mut registry = ProviderRegistry::new();

    for module in ALL_MODULES {
        let url = format!("{}/v1/modules/{}", base, module.as_str().to_lowercase());
        registry.register(module, Arc::new(HttpProvider::new(client.clone(), url)));
    }

    registry
}
