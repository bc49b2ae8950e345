//! Stage executor
//!
//! Runs exactly one stage descriptor against the current shared context and
//! reports a typed outcome. Provider failures are caught here and folded
//! into the outcome instead of propagating: one broken module (a diagram
//! renderer timing out, say) must not abort downstream stages that don't
//! depend on its output.

use serde_json::{Value as JsonValue, json};
use tracing::{debug, warn};

use lectern_core::domain::module::ModuleType;
use lectern_core::domain::pipeline::StageDescriptor;
use lectern_core::domain::run::OutputType;

use crate::context::{ContextDelta, ContextKey, SharedContext};
use crate::provider::{ProviderError, ProviderRegistry};

/// Outcome of executing one stage
#[derive(Debug)]
pub enum StageOutcome {
    /// Provider succeeded; the delta is merged and the output persisted
    Completed {
        delta: ContextDelta,
        output_type: OutputType,
        output_data: JsonValue,
        file_url: Option<String>,
    },

    /// Unrecognized module type: nothing ran, nothing is recorded
    ///
    /// Forward-compatible with definitions referencing modules this engine
    /// does not implement yet.
    Skipped,

    /// Provider failed; no delta, no stage result, the run continues
    Failed { error: String },
}

/// Dispatches stages to capability providers
pub struct StageExecutor {
    providers: ProviderRegistry,
}

impl StageExecutor {
    pub fn new(providers: ProviderRegistry) -> Self {
        Self { providers }
    }

    /// Execute one stage against the current context
    ///
    /// Never returns an error: every failure mode is folded into the
    /// returned [`StageOutcome`].
    pub async fn execute(&self, stage: &StageDescriptor, context: &SharedContext) -> StageOutcome {
        let Some(module) = ModuleType::parse(&stage.module) else {
            debug!(module = %stage.module, "unknown module type, treating stage as no-op");
            return StageOutcome::Skipped;
        };

        let Some(provider) = self.providers.get(module) else {
            warn!(module = %module, "no provider registered for module");
            return StageOutcome::Failed {
                error: format!("no provider registered for module {module}"),
            };
        };

        let input = build_input(module, stage, context);

        match provider.run(input).await {
            Ok(output) => match map_output(module, output) {
                Ok(outcome) => outcome,
                Err(err) => {
                    warn!(module = %module, error = %err, "provider output rejected");
                    StageOutcome::Failed {
                        error: err.to_string(),
                    }
                }
            },
            Err(err) => {
                warn!(module = %module, error = %err, "provider call failed");
                StageOutcome::Failed {
                    error: err.to_string(),
                }
            }
        }
    }
}

/// Assemble the provider input for a module from context and stage config
///
/// Text-consuming modules resolve their input with fallbacks (see the table
/// on [`ModuleType`]): when a preferred upstream artifact was never produced
/// the module silently receives the weaker one.
fn build_input(module: ModuleType, stage: &StageDescriptor, context: &SharedContext) -> JsonValue {
    let mut input = json!({
        "lesson_id": context.lesson_id,
        "tenant_id": context.tenant_id,
        "config": &stage.config,
    });

    let text = match module {
        ModuleType::Ingestion => None,
        ModuleType::ContentCleaning => context.first_str(&[ContextKey::Transcript]),
        ModuleType::EntityRecognition | ModuleType::Summarization => {
            context.first_str(&[ContextKey::CleanedText, ContextKey::Transcript])
        }
        ModuleType::NoteGeneration => context.first_str(&[
            ContextKey::Summary,
            ContextKey::CleanedText,
            ContextKey::Transcript,
        ]),
        ModuleType::Diagram => context.first_str(&[ContextKey::Notes, ContextKey::Summary]),
        ModuleType::CitationCheck => context.first_str(&[ContextKey::Summary, ContextKey::Notes]),
        ModuleType::QaScoring => None,
    };

    if let (Some(text), Some(obj)) = (text, input.as_object_mut()) {
        obj.insert("text".to_string(), json!(text));
    }

    if module == ModuleType::QaScoring {
        if let Some(obj) = input.as_object_mut() {
            obj.insert(
                "summary".to_string(),
                context.get(ContextKey::Summary).cloned().unwrap_or(JsonValue::Null),
            );
            obj.insert(
                "notes".to_string(),
                context.get(ContextKey::Notes).cloned().unwrap_or(JsonValue::Null),
            );
        }
    }

    input
}

/// Map a provider's output JSON into a stage outcome
fn map_output(module: ModuleType, output: JsonValue) -> Result<StageOutcome, ProviderError> {
    let (key, field, output_type) = match module {
        ModuleType::Ingestion => (ContextKey::Transcript, "transcript", OutputType::Text),
        ModuleType::ContentCleaning => (ContextKey::CleanedText, "cleaned_text", OutputType::Text),
        ModuleType::EntityRecognition => (ContextKey::Entities, "entities", OutputType::Json),
        ModuleType::Summarization => (ContextKey::Summary, "summary", OutputType::Text),
        ModuleType::NoteGeneration => (ContextKey::Notes, "notes", OutputType::Json),
        ModuleType::Diagram => (ContextKey::DiagramUrl, "diagram_url", OutputType::File),
        ModuleType::CitationCheck => (ContextKey::Citations, "citations", OutputType::Json),
        ModuleType::QaScoring => (ContextKey::QaReport, "qa_report", OutputType::Json),
    };

    let value = output
        .get(field)
        .filter(|v| !v.is_null())
        .cloned()
        .ok_or_else(|| {
            ProviderError::Malformed(format!("missing field '{field}' in {module} output"))
        })?;

    let file_url = match output_type {
        OutputType::File => value.as_str().map(str::to_string),
        _ => None,
    };

    Ok(StageOutcome::Completed {
        delta: ContextDelta::new().with(key, value),
        output_type,
        output_data: output,
        file_url,
    })
}
