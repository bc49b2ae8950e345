//! Data Transfer Objects
//!
//! This module contains DTOs used at Lectern's service boundaries: the HTTP
//! API request shapes and the lifecycle events published to the platform
//! event bus. DTOs are lightweight representations of domain entities
//! optimized for network transfer.

pub mod event;
pub mod pipeline;
