//! Definition Service
//!
//! Business logic for managing a lesson's pipeline definition.

use lectern_core::domain::pipeline::{PipelineDefinition, StageDescriptor};
use lectern_core::dto::pipeline::{SaveDefinition, StageInput};
use sqlx::PgPool;
use uuid::Uuid;

use crate::repository::{definition_repository, lesson_repository};

/// Service error type
#[derive(Debug)]
pub enum DefinitionError {
    LessonNotFound(Uuid),
    NotFound(Uuid),
    ValidationError(String),
    DatabaseError(sqlx::Error),
}

impl From<sqlx::Error> for DefinitionError {
    fn from(err: sqlx::Error) -> Self {
        DefinitionError::DatabaseError(err)
    }
}

/// Create or replace the pipeline definition for a lesson
///
/// Definitions are updated in place; there is no versioning. Saving never
/// touches the definition's status, which only the orchestrator mutates.
pub async fn save_definition(
    pool: &PgPool,
    lesson_id: Uuid,
    req: SaveDefinition,
) -> Result<PipelineDefinition, DefinitionError> {
    validate_stages(&req.stages)?;

    // Verify the lesson exists
    let _lesson = lesson_repository::find_by_id(pool, lesson_id)
        .await?
        .ok_or(DefinitionError::LessonNotFound(lesson_id))?;

    let stages: Vec<StageDescriptor> = req.stages.into_iter().map(to_descriptor).collect();

    let definition = match definition_repository::find_by_lesson(pool, lesson_id).await? {
        Some(existing) => {
            let updated =
                definition_repository::update_stages(pool, existing.id, &stages).await?;
            if !updated {
                return Err(DefinitionError::NotFound(lesson_id));
            }
            definition_repository::find_by_lesson(pool, lesson_id)
                .await?
                .ok_or(DefinitionError::NotFound(lesson_id))?
        }
        None => definition_repository::create(pool, lesson_id, stages).await?,
    };

    tracing::info!(
        "Pipeline definition saved for lesson {} ({} stages)",
        lesson_id,
        definition.stages.len()
    );

    Ok(definition)
}

/// Get the pipeline definition for a lesson
pub async fn get_definition(
    pool: &PgPool,
    lesson_id: Uuid,
) -> Result<PipelineDefinition, DefinitionError> {
    let definition = definition_repository::find_by_lesson(pool, lesson_id)
        .await?
        .ok_or(DefinitionError::NotFound(lesson_id))?;

    Ok(definition)
}

fn to_descriptor(input: StageInput) -> StageDescriptor {
    StageDescriptor {
        id: input.id.unwrap_or_else(Uuid::new_v4),
        module: input.module,
        config: input.config,
        enabled: input.enabled,
        order: input.order,
    }
}

// =============================================================================
// Validation
// =============================================================================

fn validate_stages(stages: &[StageInput]) -> Result<(), DefinitionError> {
    if stages.is_empty() {
        return Err(DefinitionError::ValidationError(
            "Pipeline must contain at least one stage".to_string(),
        ));
    }

    for stage in stages {
        if stage.module.trim().is_empty() {
            return Err(DefinitionError::ValidationError(
                "Stage module cannot be empty".to_string(),
            ));
        }

        if stage.order < 0 {
            return Err(DefinitionError::ValidationError(format!(
                "Stage order must be non-negative (got {})",
                stage.order
            )));
        }
    }

    // Unknown module strings are deliberately accepted: the engine skips
    // them, which keeps older deployments compatible with newer definitions.
    Ok(())
}
