//! Service Module
//!
//! Business logic layer between the HTTP API and the repositories / pipeline
//! engine.

pub mod definition;
pub mod run;

// Re-export for convenience
pub use definition as definition_service;
pub use run as run_service;
