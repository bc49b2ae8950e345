//! Lectern Core
//!
//! Core types for the Lectern lesson content pipeline.
//!
//! This crate contains:
//! - Domain types: Core business entities (Lesson, PipelineDefinition, PipelineRun, etc.)
//! - DTOs: Data transfer objects for the HTTP API and the event bus

pub mod domain;
pub mod dto;
