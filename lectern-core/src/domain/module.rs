//! Module types for pipeline stages
//!
//! Each stage of a pipeline names a module type which maps to one capability
//! provider. Module type strings are stored as-is in stage descriptors so
//! that definitions referencing not-yet-implemented modules stay loadable;
//! parsing happens at dispatch time.

use serde::{Deserialize, Serialize};

/// Known module types the stage executor can dispatch
///
/// The table below documents which context keys each module consumes and
/// produces. Fallbacks are resolved at execution time: a module silently uses
/// the weaker input when the preferred one was never produced (for example an
/// upstream cleaning stage was disabled or failed).
///
/// | module            | consumes                               | produces       |
/// |-------------------|----------------------------------------|----------------|
/// | Ingestion         | stage config (`source_url`)            | `transcript`   |
/// | ContentCleaning   | `transcript`                           | `cleaned_text` |
/// | EntityRecognition | `cleaned_text`, else `transcript`      | `entities`     |
/// | Summarization     | `cleaned_text`, else `transcript`      | `summary`      |
/// | NoteGeneration    | `summary`, else `cleaned_text`, else `transcript` | `notes` |
/// | Diagram           | `notes`, else `summary`                | `diagram_url`  |
/// | CitationCheck     | `summary`, else `notes`                | `citations`    |
/// | QaScoring         | `summary` and `notes`                  | `qa_report`    |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModuleType {
    Ingestion,
    ContentCleaning,
    EntityRecognition,
    Summarization,
    NoteGeneration,
    Diagram,
    CitationCheck,
    QaScoring,
}

impl ModuleType {
    /// Parse a stored module string
    ///
    /// Returns `None` for unrecognized strings; the executor treats those as
    /// a no-op success so that older engines tolerate newer definitions.
    pub fn parse(s: &str) -> Option<ModuleType> {
        match s {
            "INGESTION" => Some(ModuleType::Ingestion),
            "CONTENT_CLEANING" => Some(ModuleType::ContentCleaning),
            "ENTITY_RECOGNITION" => Some(ModuleType::EntityRecognition),
            "SUMMARIZATION" => Some(ModuleType::Summarization),
            "NOTE_GENERATION" => Some(ModuleType::NoteGeneration),
            "DIAGRAM" => Some(ModuleType::Diagram),
            "CITATION_CHECK" => Some(ModuleType::CitationCheck),
            "QA_SCORING" => Some(ModuleType::QaScoring),
            _ => None,
        }
    }

    /// The wire/storage name of this module type
    pub fn as_str(&self) -> &'static str {
        match self {
            ModuleType::Ingestion => "INGESTION",
            ModuleType::ContentCleaning => "CONTENT_CLEANING",
            ModuleType::EntityRecognition => "ENTITY_RECOGNITION",
            ModuleType::Summarization => "SUMMARIZATION",
            ModuleType::NoteGeneration => "NOTE_GENERATION",
            ModuleType::Diagram => "DIAGRAM",
            ModuleType::CitationCheck => "CITATION_CHECK",
            ModuleType::QaScoring => "QA_SCORING",
        }
    }
}

impl std::fmt::Display for ModuleType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
