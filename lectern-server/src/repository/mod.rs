//! Repository Module
//!
//! Handles all database operations, one submodule per entity.

pub mod definition;
pub mod lesson;
pub mod run;

// Re-export for convenience
pub use definition as definition_repository;
pub use lesson as lesson_repository;
pub use run as run_repository;
