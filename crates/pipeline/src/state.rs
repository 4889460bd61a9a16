//! The per-run accumulator threaded through every stage.
//!
//! [`PipelineState`] is exclusively owned by one orchestrator invocation. Its
//! mutators enforce the state invariants and return [`StateError`] rather than
//! panicking:
//!
//! - a stage may only start running once all its dependencies have succeeded;
//! - an output is written once, by its own stage, while that stage is running;
//! - outputs exist only for succeeded stages and are kept in execution order;
//! - `errors` holds an entry only for stages that ultimately failed.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{
    AnalysisInputs, RunId, StageFailure, StageId, StagePayload, StageResult, StageStatus,
    StateError, Timestamp,
};

/// Mutable accumulator of inputs, stage outputs, and stage statuses for one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineState {
    run_id: RunId,
    started_at: Timestamp,
    inputs: AnalysisInputs,
    outputs: Vec<(StageId, StagePayload)>,
    status: BTreeMap<StageId, StageStatus>,
    errors: BTreeMap<StageId, StageFailure>,
    retries: BTreeMap<StageId, u32>,
}

impl PipelineState {
    /// Creates a fresh state with every stage `pending`.
    pub fn new(run_id: RunId, inputs: AnalysisInputs) -> Self {
        Self {
            run_id,
            started_at: Timestamp::now(),
            inputs,
            outputs: Vec::with_capacity(StageId::ALL.len()),
            status: StageId::ALL
                .iter()
                .map(|stage| (*stage, StageStatus::Pending))
                .collect(),
            errors: BTreeMap::new(),
            retries: BTreeMap::new(),
        }
    }

    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    pub fn started_at(&self) -> Timestamp {
        self.started_at
    }

    pub fn inputs(&self) -> &AnalysisInputs {
        &self.inputs
    }

    /// Current status of `stage`.
    pub fn status(&self, stage: StageId) -> StageStatus {
        self.status
            .get(&stage)
            .copied()
            .unwrap_or(StageStatus::Pending)
    }

    /// Committed output of `stage`, if it has succeeded.
    pub fn output(&self, stage: StageId) -> Option<&StagePayload> {
        self.outputs
            .iter()
            .find(|(id, _)| *id == stage)
            .map(|(_, payload)| payload)
    }

    /// All committed outputs in execution order.
    pub fn outputs(&self) -> impl Iterator<Item = (StageId, &StagePayload)> {
        self.outputs.iter().map(|(id, payload)| (*id, payload))
    }

    /// Recorded permanent failures.
    pub fn errors(&self) -> &BTreeMap<StageId, StageFailure> {
        &self.errors
    }

    /// Number of retries (attempts beyond the first) recorded for `stage`.
    pub fn retries(&self, stage: StageId) -> u32 {
        self.retries.get(&stage).copied().unwrap_or(0)
    }

    /// Returns `true` when every stage has succeeded.
    pub fn is_complete(&self) -> bool {
        self.first_unfinished().is_none()
    }

    /// The earliest stage that has not succeeded, if any.
    pub fn first_unfinished(&self) -> Option<StageId> {
        StageId::ALL
            .into_iter()
            .find(|stage| self.status(*stage) != StageStatus::Succeeded)
    }

    /// Checks that every stage in `depends_on` has succeeded.
    pub fn check_dependencies(
        &self,
        stage: StageId,
        depends_on: &[StageId],
    ) -> Result<(), StateError> {
        match depends_on
            .iter()
            .find(|dep| self.status(**dep) != StageStatus::Succeeded)
        {
            Some(missing) => Err(StateError::DependencyNotSatisfied {
                stage,
                missing: *missing,
            }),
            None => Ok(()),
        }
    }

    /// Moves `stage` from `pending` to `running`.
    pub fn mark_running(
        &mut self,
        stage: StageId,
        depends_on: &[StageId],
    ) -> Result<(), StateError> {
        self.expect_status(stage, StageStatus::Pending, StageStatus::Running)?;
        self.check_dependencies(stage, depends_on)?;
        self.status.insert(stage, StageStatus::Running);
        Ok(())
    }

    /// Records one more attempt of a running stage.
    pub fn record_retry(&mut self, stage: StageId) -> Result<(), StateError> {
        self.expect_status(stage, StageStatus::Running, StageStatus::Running)?;
        *self.retries.entry(stage).or_insert(0) += 1;
        Ok(())
    }

    /// Commits a stage result and marks the stage `succeeded`.
    pub fn commit(&mut self, result: StageResult) -> Result<(), StateError> {
        let stage = result.stage;
        self.expect_status(stage, StageStatus::Running, StageStatus::Succeeded)?;
        if self.output(stage).is_some() {
            return Err(StateError::OutputAlreadyWritten { stage });
        }
        self.outputs.push((stage, result.payload));
        self.status.insert(stage, StageStatus::Succeeded);
        Ok(())
    }

    /// Marks a running stage as permanently `failed` and records the reason.
    pub fn mark_failed(&mut self, failure: StageFailure) -> Result<(), StateError> {
        let stage = failure.stage;
        self.expect_status(stage, StageStatus::Running, StageStatus::Failed)?;
        self.status.insert(stage, StageStatus::Failed);
        self.errors.insert(stage, failure);
        Ok(())
    }

    /// Returns a running stage to `pending` without recording anything.
    ///
    /// Used when a run is cancelled while the stage's generation is in flight.
    pub fn release(&mut self, stage: StageId) -> Result<(), StateError> {
        self.expect_status(stage, StageStatus::Running, StageStatus::Pending)?;
        self.status.insert(stage, StageStatus::Pending);
        Ok(())
    }

    fn expect_status(
        &self,
        stage: StageId,
        expected: StageStatus,
        to: StageStatus,
    ) -> Result<(), StateError> {
        if !self.status.contains_key(&stage) {
            return Err(StateError::UnknownStage(stage));
        }
        let from = self.status(stage);
        if from == expected {
            Ok(())
        } else {
            Err(StateError::InvalidTransition { stage, from, to })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AnalysisRequest, StageFailureKind};

    fn state() -> PipelineState {
        let inputs =
            AnalysisInputs::try_from(&AnalysisRequest::new("Acme", "retail", "Globex")).unwrap();
        PipelineState::new(RunId::new_random(), inputs)
    }

    fn payload(text: &str) -> StagePayload {
        StagePayload {
            text: text.into(),
            highlights: Vec::new(),
        }
    }

    fn succeed(state: &mut PipelineState, stage: StageId) {
        state.mark_running(stage, stage.predecessors()).unwrap();
        state
            .commit(StageResult {
                stage,
                payload: payload("ok"),
            })
            .unwrap();
    }

    #[test]
    fn starts_with_every_stage_pending() {
        let state = state();
        for stage in StageId::ALL {
            assert_eq!(state.status(stage), StageStatus::Pending);
        }
        assert_eq!(state.outputs().count(), 0);
        assert_eq!(state.first_unfinished(), Some(StageId::PlatformIdentification));
    }

    #[test]
    fn running_requires_dependencies() {
        let mut state = state();
        let err = state
            .mark_running(
                StageId::ContentStrategyAnalysis,
                StageId::ContentStrategyAnalysis.predecessors(),
            )
            .unwrap_err();
        assert_eq!(
            err,
            StateError::DependencyNotSatisfied {
                stage: StageId::ContentStrategyAnalysis,
                missing: StageId::PlatformIdentification,
            }
        );
        assert_eq!(state.status(StageId::ContentStrategyAnalysis), StageStatus::Pending);
    }

    #[test]
    fn commit_requires_running() {
        let mut state = state();
        let err = state
            .commit(StageResult {
                stage: StageId::PlatformIdentification,
                payload: payload("early"),
            })
            .unwrap_err();
        assert!(matches!(err, StateError::InvalidTransition { .. }));
        assert!(state.output(StageId::PlatformIdentification).is_none());
    }

    #[test]
    fn outputs_are_written_once_in_execution_order() {
        let mut state = state();
        succeed(&mut state, StageId::PlatformIdentification);
        succeed(&mut state, StageId::SocialMediaPresenceAnalysis);

        let err = state
            .commit(StageResult {
                stage: StageId::PlatformIdentification,
                payload: payload("again"),
            })
            .unwrap_err();
        assert!(matches!(err, StateError::InvalidTransition { .. }));

        let order: Vec<_> = state.outputs().map(|(id, _)| id).collect();
        assert_eq!(
            order,
            vec![
                StageId::PlatformIdentification,
                StageId::SocialMediaPresenceAnalysis
            ]
        );
    }

    #[test]
    fn failure_is_recorded_without_output() {
        let mut state = state();
        let stage = StageId::PlatformIdentification;
        state.mark_running(stage, &[]).unwrap();
        state.record_retry(stage).unwrap();
        state
            .mark_failed(StageFailure::new(
                stage,
                StageFailureKind::GenerationRefused,
                "policy",
            ))
            .unwrap();

        assert_eq!(state.status(stage), StageStatus::Failed);
        assert!(state.output(stage).is_none());
        assert_eq!(state.errors()[&stage].kind, StageFailureKind::GenerationRefused);
        assert_eq!(state.retries(stage), 1);
        assert!(!state.is_complete());
    }

    #[test]
    fn release_returns_stage_to_pending() {
        let mut state = state();
        let stage = StageId::PlatformIdentification;
        state.mark_running(stage, &[]).unwrap();
        state.release(stage).unwrap();
        assert_eq!(state.status(stage), StageStatus::Pending);
        assert!(state.release(stage).is_err());
    }

    #[test]
    fn complete_after_all_stages_succeed() {
        let mut state = state();
        for stage in StageId::ALL {
            succeed(&mut state, stage);
        }
        assert!(state.is_complete());
        assert_eq!(state.outputs().count(), 8);
    }
}
