//! Sequencing of the eight analysis stages over one [`PipelineState`].
//!
//! Stages run strictly one after another in dependency order. A stage that
//! fails with a transient error is re-invoked with the same accumulated state
//! until the [`RetrySchedule`] is exhausted; any permanent failure halts the
//! run and no report is synthesized.
//!
//! Cancellation is observed at every stage boundary, during back-off sleeps,
//! and while a generation call is in flight. In the last case the running
//! stage is returned to `pending`, so the partial state never holds a
//! half-finished stage.

use std::sync::Arc;
use std::time::Duration;

use pipeline::{
    AnalysisError, AnalysisInputs, AnalysisRequest, AnalysisResult, ErrorBody,
    GenerativeTextClient, PipelineState, ReportSynthesizer, RunId, StageId, StagePlan,
    StageSpec, StageStatus, ValidationError,
};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{info, info_span, warn, Instrument};

use crate::executor::{StageExecutor, DEFAULT_STAGE_TIMEOUT};
use crate::retry::RetrySchedule;

/// Timeout and retry policy for a pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Bounded wait for each generation call.
    pub stage_timeout: Duration,
    pub retry: RetrySchedule,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            stage_timeout: DEFAULT_STAGE_TIMEOUT,
            retry: RetrySchedule::default(),
        }
    }
}

/// A fully succeeded run: the final state and the synthesized result.
#[derive(Debug, Clone)]
pub struct AnalysisRun {
    pub state: PipelineState,
    pub result: AnalysisResult,
}

/// Caller-facing response: either the result or `{"error": {...}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AgentResponse {
    Success(AnalysisResult),
    Failure { error: ErrorBody },
}

impl From<&Result<AnalysisRun, AnalysisError>> for AgentResponse {
    fn from(outcome: &Result<AnalysisRun, AnalysisError>) -> Self {
        match outcome {
            Ok(run) => AgentResponse::Success(run.result.clone()),
            Err(e) => AgentResponse::Failure {
                error: e.error_body(),
            },
        }
    }
}

/// Drives a [`StagePlan`] to completion for one set of inputs per call.
///
/// The orchestrator holds no per-run state, so a single instance may serve
/// many concurrent runs; each run owns its own [`PipelineState`].
#[derive(Debug, Clone)]
pub struct PipelineOrchestrator {
    executor: StageExecutor,
    plan: StagePlan,
    retry: RetrySchedule,
    synthesizer: ReportSynthesizer,
}

impl PipelineOrchestrator {
    pub fn new(client: Arc<dyn GenerativeTextClient>, config: OrchestratorConfig) -> Self {
        Self {
            executor: StageExecutor::new(client).with_timeout(config.stage_timeout),
            plan: StagePlan::standard().clone(),
            retry: config.retry,
            synthesizer: ReportSynthesizer,
        }
    }

    /// Replaces the stage plan (same fixed chain, different builders/parsers).
    #[must_use]
    pub fn with_plan(mut self, plan: StagePlan) -> Self {
        self.plan = plan;
        self
    }

    /// Validates caller input. All three fields must be non-blank.
    pub fn validate(request: &AnalysisRequest) -> Result<AnalysisInputs, ValidationError> {
        AnalysisInputs::try_from(request)
    }

    /// Runs the full analysis and returns the caller-facing response shape.
    pub async fn invoke(
        &self,
        request: &AnalysisRequest,
        cancel: &CancellationToken,
    ) -> AgentResponse {
        AgentResponse::from(&self.analyze(request, cancel).await)
    }

    /// Runs the full analysis: validate, execute every stage, synthesize.
    pub async fn analyze(
        &self,
        request: &AnalysisRequest,
        cancel: &CancellationToken,
    ) -> Result<AnalysisRun, AnalysisError> {
        let inputs = Self::validate(request)?;
        let run_id = RunId::new_random();
        let span = info_span!(
            "competitor_analysis",
            run_id = %run_id,
            company = %inputs.company,
            industry = %inputs.industry,
            competitor = %inputs.competitor,
        );

        async move {
            let mut state = PipelineState::new(run_id, inputs);
            info!("Starting competitor analysis");

            self.run_stages(&mut state, cancel).await?;
            let result = self.synthesizer.synthesize(&state)?;

            info!(
                key_insights = result.key_insights.len(),
                "Competitor analysis completed"
            );
            Ok(AnalysisRun { state, result })
        }
        .instrument(span)
        .await
    }

    async fn run_stages(
        &self,
        state: &mut PipelineState,
        cancel: &CancellationToken,
    ) -> Result<(), AnalysisError> {
        while let Some(spec) = self.next_runnable(state) {
            if cancel.is_cancelled() {
                return Err(cancelled(spec.id, state));
            }
            self.run_stage(spec, state, cancel).await?;
        }
        Ok(())
    }

    /// The lowest-ordered pending stage whose dependencies have all succeeded.
    fn next_runnable(&self, state: &PipelineState) -> Option<&StageSpec> {
        self.plan.stages().iter().find(|spec| {
            state.status(spec.id) == StageStatus::Pending
                && state.check_dependencies(spec.id, spec.depends_on).is_ok()
        })
    }

    async fn run_stage(
        &self,
        spec: &StageSpec,
        state: &mut PipelineState,
        cancel: &CancellationToken,
    ) -> Result<(), AnalysisError> {
        let span = info_span!("stage", stage = %spec.id);
        state.mark_running(spec.id, spec.depends_on)?;
        let mut attempt: u32 = 1;

        loop {
            let outcome = tokio::select! {
                biased;
                () = cancel.cancelled() => None,
                outcome = self.executor.execute(spec, state).instrument(span.clone()) => {
                    Some(outcome)
                }
            };
            let Some(outcome) = outcome else {
                state.release(spec.id)?;
                return Err(cancelled(spec.id, state));
            };

            match outcome {
                Ok(result) => {
                    state.commit(result)?;
                    span.in_scope(|| info!(attempts = attempt, "Stage succeeded"));
                    return Ok(());
                }
                Err(failure)
                    if failure.kind.is_retryable() && attempt <= self.retry.max_retries =>
                {
                    let delay = self.retry.delay_for(attempt, failure.retry_after);
                    span.in_scope(|| {
                        warn!(
                            attempt,
                            max_retries = self.retry.max_retries,
                            delay_ms = delay.as_millis() as u64,
                            kind = %failure.kind,
                            detail = %failure.detail,
                            "Stage failed with retryable error; retrying"
                        )
                    });

                    let slept = tokio::select! {
                        biased;
                        () = cancel.cancelled() => false,
                        () = tokio::time::sleep(delay) => true,
                    };
                    if !slept {
                        state.release(spec.id)?;
                        return Err(cancelled(spec.id, state));
                    }
                    state.record_retry(spec.id)?;
                    attempt += 1;
                }
                Err(failure) => {
                    span.in_scope(|| {
                        warn!(
                            attempts = attempt,
                            kind = %failure.kind,
                            detail = %failure.detail,
                            "Stage failed permanently; halting pipeline"
                        )
                    });
                    state.mark_failed(failure.clone())?;
                    return Err(AnalysisError::StageFailed {
                        failure,
                        attempts: attempt,
                        partial: Box::new(state.clone()),
                    });
                }
            }
        }
    }
}

fn cancelled(next_stage: StageId, state: &PipelineState) -> AnalysisError {
    info!(next_stage = %next_stage, "Competitor analysis cancelled");
    AnalysisError::Cancelled {
        next_stage,
        partial: Box::new(state.clone()),
    }
}
