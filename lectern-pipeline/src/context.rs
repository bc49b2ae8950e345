//! Shared execution context for pipeline runs
//!
//! The context is the accumulating key-value data threaded between stages
//! within one run. Each stage sees the cumulative merge of all prior stages'
//! output deltas plus the run's seed values (lesson id, tenant id). It is
//! exclusively owned by one run's orchestrator invocation, created fresh at
//! run start and discarded at run end.

use serde_json::Value as JsonValue;
use std::collections::HashMap;
use uuid::Uuid;

/// Well-known context keys the built-in modules produce and consume
///
/// Keeping the key space closed (instead of free-form strings) makes every
/// producer/consumer pairing checkable at compile time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContextKey {
    /// Raw transcript text, produced by ingestion
    Transcript,
    /// Cleaned transcript text, produced by content cleaning
    CleanedText,
    /// Named entities, produced by entity recognition
    Entities,
    /// Lesson summary text, produced by summarization
    Summary,
    /// Structured notes, produced by note generation
    Notes,
    /// URL of a rendered diagram, produced by diagram generation
    DiagramUrl,
    /// Verified citations, produced by citation checking
    Citations,
    /// Quality score report, produced by QA scoring
    QaReport,
}

impl ContextKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContextKey::Transcript => "transcript",
            ContextKey::CleanedText => "cleaned_text",
            ContextKey::Entities => "entities",
            ContextKey::Summary => "summary",
            ContextKey::Notes => "notes",
            ContextKey::DiagramUrl => "diagram_url",
            ContextKey::Citations => "citations",
            ContextKey::QaReport => "qa_report",
        }
    }
}

impl std::fmt::Display for ContextKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Keys a stage produced, merged into the context by the orchestrator
///
/// Later entries overwrite earlier ones of the same key when applied.
#[derive(Debug, Clone, Default)]
pub struct ContextDelta {
    entries: Vec<(ContextKey, JsonValue)>,
}

impl ContextDelta {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: ContextKey, value: JsonValue) -> Self {
        self.entries.push((key, value));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[(ContextKey, JsonValue)] {
        &self.entries
    }
}

/// The shared context threaded through one run's stage sequence
#[derive(Debug, Clone)]
pub struct SharedContext {
    pub lesson_id: Uuid,
    pub tenant_id: Uuid,
    values: HashMap<ContextKey, JsonValue>,
}

impl SharedContext {
    pub fn new(lesson_id: Uuid, tenant_id: Uuid) -> Self {
        Self {
            lesson_id,
            tenant_id,
            values: HashMap::new(),
        }
    }

    pub fn get(&self, key: ContextKey) -> Option<&JsonValue> {
        self.values.get(&key)
    }

    /// String value for `key`, if present and actually a string
    pub fn get_str(&self, key: ContextKey) -> Option<&str> {
        self.values.get(&key).and_then(|v| v.as_str())
    }

    /// First key in `keys` that holds a string value
    ///
    /// This is the fallback resolution the module input contract relies on:
    /// e.g. summarization prefers `cleaned_text` but silently falls back to
    /// the raw `transcript` when no cleaning stage produced one.
    pub fn first_str(&self, keys: &[ContextKey]) -> Option<&str> {
        keys.iter().find_map(|&k| self.get_str(k))
    }

    /// Merge a stage's output delta; same-key entries overwrite
    pub fn apply(&mut self, delta: ContextDelta) {
        for (key, value) in delta.entries {
            self.values.insert(key, value);
        }
    }
}
