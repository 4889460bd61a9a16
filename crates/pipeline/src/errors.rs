//! Error taxonomy and retry-policy types for the competitor-analysis domain.
//!
//! Errors are layered:
//!
//! - [`GenerationError`]: what the external generative-text capability reports.
//! - [`StageFailure`]: the single failure value a stage execution produces,
//!   tagged with a [`StageFailureKind`].
//! - [`StateError`]: violations of the [`crate::PipelineState`] invariants.
//! - [`AnalysisError`]: what the caller of a pipeline run receives.
//!
//! [`RetryPolicy`] is a cross-cutting concern: any error type that participates
//! in retry decisions must be able to produce a [`RetryPolicy`].

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{PipelineState, StageId};

// ---------------------------------------------------------------------------
// Retry semantics
// ---------------------------------------------------------------------------

/// Whether an error condition is safe to retry and, if so, after what delay.
///
/// Returned by infrastructure error types to let the orchestrator decide
/// whether to re-invoke a stage without escalating.
///
/// - `Retryable` errors: generation timeouts, transient service faults.
/// - `NonRetryable` errors: refusals (rate limit, content policy), malformed
///   output, ordering violations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RetryPolicy {
    /// The operation may be retried.
    ///
    /// `after` optionally specifies the minimum delay before retrying (e.g.
    /// derived from a `Retry-After` response header).
    Retryable {
        /// Minimum back-off before the next attempt. `None` means apply the
        /// caller's own back-off schedule.
        after: Option<Duration>,
    },
    /// The operation must not be retried; the stage fails.
    NonRetryable,
}

// ---------------------------------------------------------------------------
// Generative-text capability errors
// ---------------------------------------------------------------------------

/// Failure reported by a [`crate::GenerativeTextClient`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GenerationError {
    /// The call did not resolve within its bounded wait.
    #[error("generation timed out: {detail}")]
    Timeout {
        /// Description of where the timeout occurred.
        detail: String,
    },

    /// The capability declined the request (rate limit, content policy,
    /// rejected credentials). Retrying the identical request is expected to
    /// be refused again.
    #[error("generation refused: {detail}")]
    Refused {
        /// Provider-supplied reason, when available.
        detail: String,
    },

    /// Transient service fault.
    #[error("generation unavailable: {detail}")]
    Unavailable {
        /// Description of the fault.
        detail: String,
        /// Server-suggested delay before retrying, if one was given.
        retry_after: Option<Duration>,
    },
}

impl GenerationError {
    /// Returns the retry policy for this failure.
    pub fn retry_policy(&self) -> RetryPolicy {
        match self {
            GenerationError::Timeout { .. } => RetryPolicy::Retryable { after: None },
            GenerationError::Unavailable { retry_after, .. } => RetryPolicy::Retryable {
                after: *retry_after,
            },
            GenerationError::Refused { .. } => RetryPolicy::NonRetryable,
        }
    }

    /// Maps this error onto the stage failure taxonomy.
    pub fn failure_kind(&self) -> StageFailureKind {
        match self {
            GenerationError::Timeout { .. } => StageFailureKind::GenerationTimeout,
            GenerationError::Refused { .. } => StageFailureKind::GenerationRefused,
            GenerationError::Unavailable { .. } => StageFailureKind::GenerationUnavailable,
        }
    }
}

// ---------------------------------------------------------------------------
// Stage failures
// ---------------------------------------------------------------------------

/// Why a single stage execution failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageFailureKind {
    /// A declared dependency had not succeeded. Indicates an orchestration bug.
    DependencyNotSatisfied,
    GenerationTimeout,
    GenerationRefused,
    GenerationUnavailable,
    /// The generated text could not be parsed into the stage's payload.
    MalformedStageOutput,
}

impl StageFailureKind {
    /// Stable snake_case name used on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            StageFailureKind::DependencyNotSatisfied => "dependency_not_satisfied",
            StageFailureKind::GenerationTimeout => "generation_timeout",
            StageFailureKind::GenerationRefused => "generation_refused",
            StageFailureKind::GenerationUnavailable => "generation_unavailable",
            StageFailureKind::MalformedStageOutput => "malformed_stage_output",
        }
    }

    /// Returns `true` for the transient kinds that the retry policy re-invokes.
    pub fn is_retryable(self) -> bool {
        matches!(
            self,
            StageFailureKind::GenerationTimeout | StageFailureKind::GenerationUnavailable
        )
    }
}

impl std::fmt::Display for StageFailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The failure outcome of one stage execution.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[error("stage '{stage}' failed ({kind}): {detail}")]
pub struct StageFailure {
    /// The stage that failed.
    pub stage: StageId,
    /// Failure classification.
    pub kind: StageFailureKind,
    /// Human-readable detail.
    pub detail: String,
    /// Server-suggested back-off, carried through from [`GenerationError::Unavailable`].
    #[serde(skip)]
    pub retry_after: Option<Duration>,
}

impl StageFailure {
    /// Creates a failure with no back-off hint.
    pub fn new(stage: StageId, kind: StageFailureKind, detail: impl Into<String>) -> Self {
        Self {
            stage,
            kind,
            detail: detail.into(),
            retry_after: None,
        }
    }

    /// Creates a failure from a generation error, preserving its back-off hint.
    pub fn from_generation(stage: StageId, error: &GenerationError) -> Self {
        let retry_after = match error.retry_policy() {
            RetryPolicy::Retryable { after } => after,
            RetryPolicy::NonRetryable => None,
        };
        Self {
            stage,
            kind: error.failure_kind(),
            detail: error.to_string(),
            retry_after,
        }
    }
}

// ---------------------------------------------------------------------------
// Input validation
// ---------------------------------------------------------------------------

/// Malformed or missing caller input. Raised before any stage runs.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("invalid '{field}': {message}")]
pub struct ValidationError {
    /// Name of the offending input field.
    pub field: String,
    /// Description of the problem.
    pub message: String,
}

impl ValidationError {
    /// Creates a validation error for `field`.
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// State invariant violations
// ---------------------------------------------------------------------------

/// A mutation that would break a [`crate::PipelineState`] invariant.
///
/// None of these are expected in correct operation.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum StateError {
    /// `stage` was started before `missing` succeeded.
    #[error("stage '{stage}' cannot run: dependency '{missing}' has not succeeded")]
    DependencyNotSatisfied { stage: StageId, missing: StageId },

    /// The stage's current status does not allow the requested move.
    #[error("stage '{stage}' cannot move from {from} to {to}")]
    InvalidTransition {
        stage: StageId,
        from: crate::StageStatus,
        to: crate::StageStatus,
    },

    /// A second output was committed for the same stage.
    #[error("stage '{stage}' already has a committed output")]
    OutputAlreadyWritten { stage: StageId },

    /// The stage is not tracked by this state.
    #[error("stage '{0}' does not belong to this pipeline")]
    UnknownStage(StageId),

    /// Synthesis was attempted before every stage succeeded.
    #[error("report cannot be synthesized: stage '{pending}' has not succeeded")]
    Incomplete { pending: StageId },
}

// ---------------------------------------------------------------------------
// Caller-facing errors
// ---------------------------------------------------------------------------

/// Every non-success outcome of a pipeline run.
///
/// Partial state is carried for diagnostics; a report is never synthesized
/// from it.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Caller input was rejected; no stage ran.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A stage failed permanently and the pipeline halted.
    #[error("{failure} after {attempts} attempt(s)")]
    StageFailed {
        failure: StageFailure,
        /// Total invocations of the failing stage, including the first.
        attempts: u32,
        partial: Box<PipelineState>,
    },

    /// The caller cancelled the run.
    #[error("analysis cancelled before stage '{next_stage}' completed")]
    Cancelled {
        next_stage: StageId,
        partial: Box<PipelineState>,
    },

    /// The orchestrator broke a state invariant. Indicates a bug.
    #[error("pipeline invariant violated: {0}")]
    InvariantViolation(#[from] StateError),
}

impl AnalysisError {
    /// The `{stage, kind, detail}` shape returned to callers.
    pub fn error_body(&self) -> ErrorBody {
        match self {
            AnalysisError::Validation(e) => ErrorBody {
                stage: "input".to_string(),
                kind: "validation_error".to_string(),
                detail: e.to_string(),
            },
            AnalysisError::StageFailed { failure, .. } => ErrorBody {
                stage: failure.stage.as_str().to_string(),
                kind: failure.kind.as_str().to_string(),
                detail: failure.detail.clone(),
            },
            AnalysisError::Cancelled { next_stage, .. } => ErrorBody {
                stage: next_stage.as_str().to_string(),
                kind: "cancelled".to_string(),
                detail: self.to_string(),
            },
            AnalysisError::InvariantViolation(e) => ErrorBody {
                stage: match e {
                    StateError::DependencyNotSatisfied { stage, .. }
                    | StateError::InvalidTransition { stage, .. }
                    | StateError::OutputAlreadyWritten { stage } => stage.as_str().to_string(),
                    StateError::UnknownStage(stage) => stage.as_str().to_string(),
                    StateError::Incomplete { pending } => pending.as_str().to_string(),
                },
                kind: "invariant_violation".to_string(),
                detail: e.to_string(),
            },
        }
    }

    /// Partial pipeline state gathered before the run stopped, if any stage ran.
    pub fn partial_state(&self) -> Option<&PipelineState> {
        match self {
            AnalysisError::StageFailed { partial, .. }
            | AnalysisError::Cancelled { partial, .. } => Some(&**partial),
            AnalysisError::Validation(_) | AnalysisError::InvariantViolation(_) => None,
        }
    }
}

/// Wire shape of a failed invocation: `{"error": {stage, kind, detail}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Wire name of the failing stage, or `"input"` for validation errors.
    pub stage: String,
    /// Failure kind, e.g. `"generation_refused"` or `"cancelled"`.
    pub kind: String,
    /// Human-readable description.
    pub detail: String,
}
