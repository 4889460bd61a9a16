//! Competitor-analysis stage execution and orchestration.
//!
//! This crate provides the [`StageExecutor`] that runs a single stage against
//! the generative-text port, the [`RetrySchedule`] that governs re-invocation
//! of transient failures, and the [`PipelineOrchestrator`] that drives the
//! eight-stage chain to a synthesized report.
//!
//! ## Architectural Layer
//!
//! **Orchestration layer.** The orchestrator sequences calls between business
//! logic in the [`pipeline`] crate and the [`pipeline::GenerativeTextClient`]
//! port. It contains no domain rules of its own: stage order, dependencies,
//! prompts, parsing and synthesis all live in [`pipeline`].

pub mod executor;
pub mod orchestrator;
pub mod retry;

pub use executor::{StageExecutor, DEFAULT_STAGE_TIMEOUT};
pub use orchestrator::{AgentResponse, AnalysisRun, OrchestratorConfig, PipelineOrchestrator};
pub use retry::RetrySchedule;
pub use tokio_util::sync::CancellationToken;
