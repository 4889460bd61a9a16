//! Newtype domain identifiers.
//!
//! Every domain concept that has an identity is represented as a distinct newtype
//! wrapping a primitive. This prevents accidentally interchanging, for example, a
//! [`CompanyName`] with a [`CompetitorName`] even though both are strings under
//! the hood.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Macro for String-wrapped newtypes.
// Generates: struct, new() returning Option<Self>, as_str(), Display.
// ---------------------------------------------------------------------------
macro_rules! string_id {
    (
        $(#[$attr:meta])*
        $name:ident
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier, returning `None` if the value is empty
            /// or contains only whitespace. Surrounding whitespace is trimmed.
            pub fn new(value: impl Into<String>) -> Option<Self> {
                let v = value.into();
                let trimmed = v.trim();
                if trimmed.is_empty() {
                    None
                } else if trimmed.len() == v.len() {
                    Some(Self(v))
                } else {
                    Some(Self(trimmed.to_string()))
                }
            }

            /// Returns the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Identifiers: caller-supplied names
// ---------------------------------------------------------------------------

string_id! {
    /// The company on whose behalf the analysis is produced.
    CompanyName
}

string_id! {
    /// The industry both companies operate in (e.g. `"retail"`, `"Real Estate"`).
    IndustryName
}

string_id! {
    /// The competitor being analysed.
    CompetitorName
}

// ---------------------------------------------------------------------------
// Identifiers: UUID-backed (internally generated)
// ---------------------------------------------------------------------------

/// Identifies a single pipeline run (one analysis invocation).
///
/// Generated fresh for every run; propagated through spans and archive records
/// so all activity from a single run can be correlated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(Uuid);

impl RunId {
    /// Generates a new random run identifier.
    pub fn new_random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Stage identifiers
// ---------------------------------------------------------------------------

static EXECUTION_ORDER: [StageId; 8] = StageId::ALL;

/// One of the eight fixed analytical steps of the competitor-analysis pipeline.
///
/// Variant order is execution order. The dependency chain is linear and
/// cumulative: every stage depends on all stages before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageId {
    /// Which platforms matter in the industry and where the competitor is active.
    PlatformIdentification,
    /// Account sizes, growth, posting cadence and visual identity.
    SocialMediaPresenceAnalysis,
    /// Content pillars, voice and top-performing formats.
    ContentStrategyAnalysis,
    /// Engagement rates, sentiment and community management.
    EngagementMetricsAnalysis,
    /// Summary profile of the competitor. A summary source.
    CompetitorProfiling,
    /// Openings for the company. The source of key insights.
    CompetitiveAdvantageAnalysis,
    /// Timeline of recommended actions. A summary source.
    StrategyRecommendations,
    /// Conclusion and monitoring framework.
    ReportGeneration,
}

impl StageId {
    /// Every stage, in execution order.
    pub const ALL: [StageId; 8] = [
        StageId::PlatformIdentification,
        StageId::SocialMediaPresenceAnalysis,
        StageId::ContentStrategyAnalysis,
        StageId::EngagementMetricsAnalysis,
        StageId::CompetitorProfiling,
        StageId::CompetitiveAdvantageAnalysis,
        StageId::StrategyRecommendations,
        StageId::ReportGeneration,
    ];

    /// Zero-based position of this stage in the execution order.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Stable snake_case name used on the wire and in logs.
    pub fn as_str(self) -> &'static str {
        match self {
            StageId::PlatformIdentification => "platform_identification",
            StageId::SocialMediaPresenceAnalysis => "social_media_presence_analysis",
            StageId::ContentStrategyAnalysis => "content_strategy_analysis",
            StageId::EngagementMetricsAnalysis => "engagement_metrics_analysis",
            StageId::CompetitorProfiling => "competitor_profiling",
            StageId::CompetitiveAdvantageAnalysis => "competitive_advantage_analysis",
            StageId::StrategyRecommendations => "strategy_recommendations",
            StageId::ReportGeneration => "report_generation",
        }
    }

    /// Human-readable heading used in the synthesized report.
    pub fn title(self) -> &'static str {
        match self {
            StageId::PlatformIdentification => "Platform Identification",
            StageId::SocialMediaPresenceAnalysis => "Social Media Presence Analysis",
            StageId::ContentStrategyAnalysis => "Content Strategy Analysis",
            StageId::EngagementMetricsAnalysis => "Engagement Metrics Analysis",
            StageId::CompetitorProfiling => "Competitor Profiling",
            StageId::CompetitiveAdvantageAnalysis => "Competitive Advantage Analysis",
            StageId::StrategyRecommendations => "Strategy Recommendations",
            StageId::ReportGeneration => "Report Generation",
        }
    }

    /// All stages that must have succeeded before this one may run.
    pub fn predecessors(self) -> &'static [StageId] {
        &EXECUTION_ORDER[..self.index()]
    }
}

impl std::fmt::Display for StageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_reject_blank_values() {
        assert!(CompanyName::new("").is_none());
        assert!(IndustryName::new("   \t").is_none());
        assert_eq!(CompetitorName::new("  Globex ").unwrap().as_str(), "Globex");
    }

    #[test]
    fn stage_order_matches_index() {
        for (i, stage) in StageId::ALL.iter().enumerate() {
            assert_eq!(stage.index(), i);
        }
    }

    #[test]
    fn predecessors_are_cumulative() {
        assert!(StageId::PlatformIdentification.predecessors().is_empty());
        assert_eq!(
            StageId::StrategyRecommendations.predecessors(),
            &StageId::ALL[..6]
        );
        assert_eq!(StageId::ReportGeneration.predecessors().len(), 7);
    }

    #[test]
    fn stage_id_serialises_as_wire_name() {
        let json = serde_json::to_string(&StageId::CompetitorProfiling).unwrap();
        assert_eq!(json, "\"competitor_profiling\"");
        assert_eq!(StageId::CompetitorProfiling.to_string(), "competitor_profiling");
    }
}
