//! Lesson domain types
//!
//! A lesson is the target entity the pipeline produces artifacts for.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A lesson within a course, owned by a tenant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lesson {
    pub id: Uuid,
    pub course_id: Uuid,
    pub tenant_id: Uuid,
    pub status: LessonStatus,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Processing status of a lesson's content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LessonStatus {
    /// Raw media uploaded, no pipeline has run yet
    Pending,

    /// A pipeline run is in flight for this lesson
    Processing,

    /// Pipeline artifacts are available for consumption
    Ready,
}

impl std::fmt::Display for LessonStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LessonStatus::Pending => write!(f, "Pending"),
            LessonStatus::Processing => write!(f, "Processing"),
            LessonStatus::Ready => write!(f, "Ready"),
        }
    }
}
