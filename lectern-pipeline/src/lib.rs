//! Lectern pipeline engine
//!
//! The lesson content pipeline core: an ordered, cancellable, sequence of
//! pluggable stages that turns raw lesson media into structured educational
//! artifacts (transcript, summary, notes, diagram, citations, QA report).
//!
//! Components:
//! - [`registry::RunRegistry`]: at-most-one-running-run enforcement,
//!   idempotent start, cooperative cancel
//! - [`executor::StageExecutor`]: dispatches one stage to its capability
//!   provider and isolates its failure
//! - [`orchestrator::PipelineOrchestrator`]: drives one run stage by stage
//! - [`lifecycle::ResourceLifecycle`]: cancels outstanding runs and releases
//!   external connections on shutdown
//!
//! Persistence, capability providers and the event bus are injected as trait
//! objects so the engine runs against Postgres in production and in-memory
//! fakes in tests.

pub mod cancel;
pub mod context;
pub mod events;
pub mod executor;
pub mod lifecycle;
pub mod orchestrator;
pub mod provider;
pub mod registry;
pub mod store;
pub mod task;
