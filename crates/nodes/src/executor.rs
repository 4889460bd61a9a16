//! Runs one analysis stage against the generative-text capability.

use std::sync::Arc;
use std::time::Duration;

use pipeline::{
    GenerativeTextClient, PipelineState, StageFailure, StageFailureKind, StageResult, StageSpec,
};
use tracing::debug;

/// Default bounded wait for a single generation call.
pub const DEFAULT_STAGE_TIMEOUT: Duration = Duration::from_secs(120);

/// Executes single stages: build prompt, generate, parse.
///
/// The executor never mutates [`PipelineState`]; the orchestrator commits
/// results so the state keeps a single writer.
#[derive(Clone)]
pub struct StageExecutor {
    client: Arc<dyn GenerativeTextClient>,
    timeout: Duration,
}

impl StageExecutor {
    pub fn new(client: Arc<dyn GenerativeTextClient>) -> Self {
        Self {
            client,
            timeout: DEFAULT_STAGE_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Runs `stage` against the accumulated `state`.
    ///
    /// Returns exactly one of a [`StageResult`] or a [`StageFailure`].
    /// A `DependencyNotSatisfied` failure means the caller invoked the stage
    /// out of order.
    pub async fn execute(
        &self,
        stage: &StageSpec,
        state: &PipelineState,
    ) -> Result<StageResult, StageFailure> {
        if let Err(e) = state.check_dependencies(stage.id, stage.depends_on) {
            return Err(StageFailure::new(
                stage.id,
                StageFailureKind::DependencyNotSatisfied,
                e.to_string(),
            ));
        }

        let request = (stage.prompt_builder)(state);
        debug!(
            stage = %stage.id,
            prompt_len = request.prompt.len(),
            context_len = request.context.as_ref().map_or(0, String::len),
            "Invoking generative-text client"
        );

        let raw = match tokio::time::timeout(self.timeout, self.client.generate(&request)).await {
            Ok(Ok(text)) => text,
            Ok(Err(e)) => return Err(StageFailure::from_generation(stage.id, &e)),
            Err(_) => {
                return Err(StageFailure::new(
                    stage.id,
                    StageFailureKind::GenerationTimeout,
                    format!("no response within {:?}", self.timeout),
                ))
            }
        };
        debug!(stage = %stage.id, response_len = raw.len(), "Generation returned");

        match (stage.result_parser)(&raw) {
            Ok(payload) => Ok(StageResult {
                stage: stage.id,
                payload,
            }),
            Err(detail) => Err(StageFailure::new(
                stage.id,
                StageFailureKind::MalformedStageOutput,
                detail,
            )),
        }
    }
}

impl std::fmt::Debug for StageExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StageExecutor")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use pipeline::{
        AnalysisInputs, AnalysisRequest, GenerationError, GenerationRequest, RunId, StageId,
        StagePlan,
    };

    struct Fixed(Result<&'static str, GenerationError>);

    #[async_trait]
    impl GenerativeTextClient for Fixed {
        async fn generate(&self, _request: &GenerationRequest) -> Result<String, GenerationError> {
            self.0.clone().map(str::to_string)
        }
    }

    struct Slow;

    #[async_trait]
    impl GenerativeTextClient for Slow {
        async fn generate(&self, _request: &GenerationRequest) -> Result<String, GenerationError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok("late".into())
        }
    }

    fn state() -> PipelineState {
        let inputs =
            AnalysisInputs::try_from(&AnalysisRequest::new("Acme", "retail", "Globex")).unwrap();
        PipelineState::new(RunId::new_random(), inputs)
    }

    fn first_stage() -> StageSpec {
        *StagePlan::standard().get(StageId::PlatformIdentification)
    }

    #[tokio::test]
    async fn parses_successful_generation() {
        let executor = StageExecutor::new(Arc::new(Fixed(Ok("- Instagram\n- TikTok"))));
        let result = executor.execute(&first_stage(), &state()).await.unwrap();
        assert_eq!(result.stage, StageId::PlatformIdentification);
        assert_eq!(result.payload.highlights, vec!["Instagram", "TikTok"]);
    }

    #[tokio::test]
    async fn rejects_out_of_order_invocation() {
        let executor = StageExecutor::new(Arc::new(Fixed(Ok("unused"))));
        let spec = *StagePlan::standard().get(StageId::EngagementMetricsAnalysis);
        let failure = executor.execute(&spec, &state()).await.unwrap_err();
        assert_eq!(failure.kind, StageFailureKind::DependencyNotSatisfied);
        assert_eq!(failure.stage, StageId::EngagementMetricsAnalysis);
    }

    #[tokio::test]
    async fn maps_generation_errors() {
        let executor = StageExecutor::new(Arc::new(Fixed(Err(GenerationError::Refused {
            detail: "content policy".into(),
        }))));
        let failure = executor.execute(&first_stage(), &state()).await.unwrap_err();
        assert_eq!(failure.kind, StageFailureKind::GenerationRefused);
        assert!(failure.detail.contains("content policy"));
    }

    #[tokio::test]
    async fn empty_output_is_malformed() {
        let executor = StageExecutor::new(Arc::new(Fixed(Ok("<think>hmm</think>"))));
        let failure = executor.execute(&first_stage(), &state()).await.unwrap_err();
        assert_eq!(failure.kind, StageFailureKind::MalformedStageOutput);
    }

    #[tokio::test]
    async fn bounded_wait_yields_timeout() {
        let executor =
            StageExecutor::new(Arc::new(Slow)).with_timeout(Duration::from_millis(20));
        let failure = executor.execute(&first_stage(), &state()).await.unwrap_err();
        assert_eq!(failure.kind, StageFailureKind::GenerationTimeout);
    }
}
