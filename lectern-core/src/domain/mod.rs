//! Core domain types
//!
//! This module contains the core domain structures used across Lectern
//! services. These types represent the fundamental business entities and are
//! shared between the HTTP service (for persistence) and the pipeline engine
//! (for execution).

pub mod lesson;
pub mod module;
pub mod pipeline;
pub mod run;
