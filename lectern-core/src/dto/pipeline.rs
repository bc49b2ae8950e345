//! Pipeline DTOs for the HTTP API

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Request to create or replace a lesson's pipeline definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveDefinition {
    pub stages: Vec<StageInput>,
}

/// One stage within a [`SaveDefinition`] request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageInput {
    /// Stage id; omitted for new stages, kept across saves for existing ones
    pub id: Option<Uuid>,
    pub module: String,
    #[serde(default)]
    pub config: HashMap<String, serde_json::Value>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    pub order: i32,
}

fn default_enabled() -> bool {
    true
}
