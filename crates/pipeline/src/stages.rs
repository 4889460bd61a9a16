//! Static stage descriptors and the validated eight-stage plan.

use std::sync::LazyLock;

use crate::{parsing, prompts, GenerationRequest, PipelineState, StageId, StagePayload};

/// Builds a stage's generation request from the accumulated state.
pub type PromptBuilder = fn(&PipelineState) -> GenerationRequest;

/// Parses raw generated text into a stage payload. The error string becomes
/// the detail of a `MalformedStageOutput` failure.
pub type ResultParser = fn(&str) -> Result<StagePayload, String>;

/// Immutable descriptor binding a stage's dependencies, prompt construction
/// and output parsing.
#[derive(Clone, Copy)]
pub struct StageSpec {
    pub id: StageId,
    pub depends_on: &'static [StageId],
    pub prompt_builder: PromptBuilder,
    pub result_parser: ResultParser,
}

impl StageSpec {
    /// Creates a descriptor depending on every earlier stage.
    pub fn new(id: StageId, prompt_builder: PromptBuilder, result_parser: ResultParser) -> Self {
        Self {
            id,
            depends_on: id.predecessors(),
            prompt_builder,
            result_parser,
        }
    }
}

impl std::fmt::Debug for StageSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StageSpec")
            .field("id", &self.id)
            .field("depends_on", &self.depends_on)
            .finish_non_exhaustive()
    }
}

/// Why a candidate plan was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlanError {
    #[error("plan has {0} stages, expected 8")]
    WrongLength(usize),
    #[error("position {position} holds '{found}', expected '{expected}'")]
    OutOfOrder {
        position: usize,
        expected: StageId,
        found: StageId,
    },
    #[error("stage '{0}' must depend on every earlier stage")]
    IncompleteDependencies(StageId),
}

/// The ordered list of stage descriptors a run executes.
///
/// Every [`StageId`] appears exactly once, in execution order, and depends on
/// all stages before it.
#[derive(Debug, Clone)]
pub struct StagePlan {
    stages: Vec<StageSpec>,
}

static STANDARD: LazyLock<StagePlan> = LazyLock::new(|| StagePlan {
    stages: vec![
        StageSpec::new(
            StageId::PlatformIdentification,
            prompts::platform_identification,
            parsing::parse_findings,
        ),
        StageSpec::new(
            StageId::SocialMediaPresenceAnalysis,
            prompts::social_media_presence,
            parsing::parse_findings,
        ),
        StageSpec::new(
            StageId::ContentStrategyAnalysis,
            prompts::content_strategy,
            parsing::parse_findings,
        ),
        StageSpec::new(
            StageId::EngagementMetricsAnalysis,
            prompts::engagement_metrics,
            parsing::parse_findings,
        ),
        StageSpec::new(
            StageId::CompetitorProfiling,
            prompts::competitor_profiling,
            parsing::parse_findings,
        ),
        StageSpec::new(
            StageId::CompetitiveAdvantageAnalysis,
            prompts::competitive_advantage,
            parsing::parse_findings,
        ),
        StageSpec::new(
            StageId::StrategyRecommendations,
            prompts::strategy_recommendations,
            parsing::parse_findings,
        ),
        StageSpec::new(
            StageId::ReportGeneration,
            prompts::report_generation,
            parsing::parse_findings,
        ),
    ],
});

impl StagePlan {
    /// Validates a custom plan over the fixed stage chain.
    pub fn new(stages: Vec<StageSpec>) -> Result<Self, PlanError> {
        if stages.len() != StageId::ALL.len() {
            return Err(PlanError::WrongLength(stages.len()));
        }
        for (position, (spec, expected)) in stages.iter().zip(StageId::ALL).enumerate() {
            if spec.id != expected {
                return Err(PlanError::OutOfOrder {
                    position,
                    expected,
                    found: spec.id,
                });
            }
            if spec.depends_on != expected.predecessors() {
                return Err(PlanError::IncompleteDependencies(spec.id));
            }
        }
        Ok(Self { stages })
    }

    /// The built-in competitor-analysis plan, constructed once per process.
    pub fn standard() -> &'static StagePlan {
        &STANDARD
    }

    /// Descriptors in execution order.
    pub fn stages(&self) -> &[StageSpec] {
        &self.stages
    }

    /// Descriptor for `stage`.
    pub fn get(&self, stage: StageId) -> &StageSpec {
        &self.stages[stage.index()]
    }

    /// Returns a copy of this plan with `stage`'s parser replaced.
    pub fn with_parser(&self, stage: StageId, parser: ResultParser) -> Self {
        let mut plan = self.clone();
        plan.stages[stage.index()].result_parser = parser;
        plan
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_plan_is_valid() {
        let plan = StagePlan::standard();
        assert!(StagePlan::new(plan.stages().to_vec()).is_ok());
        for spec in plan.stages() {
            assert_eq!(spec.depends_on.len(), spec.id.index());
        }
    }

    #[test]
    fn rejects_reordered_plan() {
        let mut stages = StagePlan::standard().stages().to_vec();
        stages.swap(2, 3);
        assert!(matches!(
            StagePlan::new(stages),
            Err(PlanError::OutOfOrder { position: 2, .. })
        ));
    }

    #[test]
    fn rejects_short_dependency_list() {
        let mut stages = StagePlan::standard().stages().to_vec();
        stages[6].depends_on = StageId::CompetitorProfiling.predecessors();
        assert_eq!(
            StagePlan::new(stages).unwrap_err(),
            PlanError::IncompleteDependencies(StageId::StrategyRecommendations)
        );
    }

    #[test]
    fn rejects_missing_stage() {
        let mut stages = StagePlan::standard().stages().to_vec();
        stages.pop();
        assert_eq!(StagePlan::new(stages).unwrap_err(), PlanError::WrongLength(7));
    }
}
