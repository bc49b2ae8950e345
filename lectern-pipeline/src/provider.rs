//! Capability provider interface
//!
//! A capability provider is the external black-box service behind one module
//! type: an AI model wrapper, a speech-to-text engine, a diagram renderer.
//! The executor assembles a JSON input from the shared context and stage
//! config; the provider returns a JSON output. Retries, if any, are the
//! provider's own concern.

use async_trait::async_trait;
use lectern_core::domain::module::ModuleType;
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// Errors a provider call can surface
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The provider call itself failed (network, timeout, non-2xx, model error)
    #[error("provider request failed: {0}")]
    Request(String),

    /// The provider answered but the output is missing an expected field
    #[error("provider returned malformed output: {0}")]
    Malformed(String),
}

/// One external capability invoked by a stage
#[async_trait]
pub trait CapabilityProvider: Send + Sync {
    async fn run(&self, input: JsonValue) -> Result<JsonValue, ProviderError>;
}

/// Module-type to provider dispatch table
///
/// A known module type with no registered provider is a stage failure at
/// execution time, not a registration-time error: definitions may reference
/// capabilities a given deployment does not carry.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    providers: HashMap<ModuleType, Arc<dyn CapabilityProvider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, module: ModuleType, provider: Arc<dyn CapabilityProvider>) {
        self.providers.insert(module, provider);
    }

    pub fn get(&self, module: ModuleType) -> Option<&Arc<dyn CapabilityProvider>> {
        self.providers.get(&module)
    }
}
