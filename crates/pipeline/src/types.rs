//! Shared value types for the competitor-analysis domain.
//!
//! Unlike the newtype identifiers in [`crate::identifiers`], these types carry
//! meaningful values with invariants (inputs are validated, payloads are
//! non-empty) and flow between the pipeline's components.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{CompanyName, CompetitorName, IndustryName, StageId, ValidationError};

// ---------------------------------------------------------------------------
// Caller input
// ---------------------------------------------------------------------------

/// Raw caller input for a competitor-analysis invocation.
///
/// Deserialised as-is from the caller; validated into [`AnalysisInputs`]
/// before any stage runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub industry: String,
    #[serde(default)]
    pub competitor: String,
}

impl AnalysisRequest {
    /// Creates a request from the three caller fields.
    pub fn new(
        company: impl Into<String>,
        industry: impl Into<String>,
        competitor: impl Into<String>,
    ) -> Self {
        Self {
            company: company.into(),
            industry: industry.into(),
            competitor: competitor.into(),
        }
    }
}

/// Validated, immutable inputs of one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AnalysisInputs {
    pub company: CompanyName,
    pub industry: IndustryName,
    pub competitor: CompetitorName,
}

impl TryFrom<&AnalysisRequest> for AnalysisInputs {
    type Error = ValidationError;

    /// Rejects the first empty (or whitespace-only) field in declaration order.
    fn try_from(request: &AnalysisRequest) -> Result<Self, Self::Error> {
        let company = CompanyName::new(request.company.as_str())
            .ok_or_else(|| ValidationError::new("company", "must not be empty"))?;
        let industry = IndustryName::new(request.industry.as_str())
            .ok_or_else(|| ValidationError::new("industry", "must not be empty"))?;
        let competitor = CompetitorName::new(request.competitor.as_str())
            .ok_or_else(|| ValidationError::new("competitor", "must not be empty"))?;
        Ok(Self {
            company,
            industry,
            competitor,
        })
    }
}

// ---------------------------------------------------------------------------
// Stage status and payloads
// ---------------------------------------------------------------------------

/// Lifecycle of a single stage within one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    /// Not started, or released after cancellation.
    Pending,
    /// A generation call for the stage is in progress.
    Running,
    /// Output committed.
    Succeeded,
    /// Permanently failed; the run halted here.
    Failed,
}

impl std::fmt::Display for StageStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            StageStatus::Pending => "pending",
            StageStatus::Running => "running",
            StageStatus::Succeeded => "succeeded",
            StageStatus::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Parsed result of one stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagePayload {
    /// Cleaned generated text (reasoning blocks removed, trimmed, never empty).
    pub text: String,
    /// List items found in `text`, in order of appearance, with markers removed.
    pub highlights: Vec<String>,
}

/// Successful outcome of one stage execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageResult {
    pub stage: StageId,
    pub payload: StagePayload,
}

// ---------------------------------------------------------------------------
// Final output
// ---------------------------------------------------------------------------

/// The synthesized output of a fully succeeded pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Human-readable report: one section per stage, in execution order.
    pub report: String,
    /// Condensed synthesis of the competitor profile and the recommendations.
    pub analysis_summary: String,
    /// Short findings from the competitive-advantage analysis.
    pub key_insights: Vec<String>,
}

// ---------------------------------------------------------------------------
// Time
// ---------------------------------------------------------------------------

/// A UTC wall-clock timestamp.
///
/// Wraps [`chrono::DateTime<Utc>`] so callers never depend on `chrono` types
/// directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Returns the current UTC time as a [`Timestamp`].
    pub fn now() -> Self {
        Self(Utc::now())
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}
