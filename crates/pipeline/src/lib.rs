//! Core domain for the competitor-analysis pipeline.
//!
//! This crate contains every domain concept, newtype identifier, shared value
//! type, and error type used by the eight-stage analysis. Infrastructure crates
//! implement the port traits defined here; they never add domain rules.
//!
//! ## Architectural Layer
//!
//! **Business logic + port definitions.** This crate has no I/O dependencies.
//! It defines *what* is needed; infrastructure crates define *how* to supply it.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`identifiers`] | Newtype identifiers (`CompanyName`, `RunId`, `StageId`, etc.) |
//! | [`types`] | Shared value types (`AnalysisRequest`, `StagePayload`, `AnalysisResult`, etc.) |
//! | [`errors`] | Error taxonomy and retry-policy types |
//! | [`state`] | [`PipelineState`], the per-run accumulator |
//! | [`stages`] | [`StageSpec`] descriptors and the validated [`StagePlan`] |
//! | [`prompts`] | Per-stage prompt builders |
//! | [`parsing`] | Result parsing for generated text |
//! | [`report`] | [`ReportSynthesizer`] |
//! | [`generation`] | The [`GenerativeTextClient`] port |

pub mod errors;
pub mod generation;
pub mod identifiers;
pub mod parsing;
pub mod prompts;
pub mod report;
pub mod stages;
pub mod state;
pub mod types;

// Re-export everything at the crate root for ergonomic usage by downstream crates.
pub use errors::{
    AnalysisError, ErrorBody, GenerationError, RetryPolicy, StageFailure, StageFailureKind,
    StateError, ValidationError,
};
pub use generation::{GenerationRequest, GenerativeTextClient};
pub use identifiers::{CompanyName, CompetitorName, IndustryName, RunId, StageId};
pub use report::ReportSynthesizer;
pub use stages::{PlanError, PromptBuilder, ResultParser, StagePlan, StageSpec};
pub use state::PipelineState;
pub use types::{
    AnalysisInputs, AnalysisRequest, AnalysisResult, StagePayload, StageResult, StageStatus,
    Timestamp,
};
