//! The record of one pipeline execution attempt.

use super::Pipeline;
use crate::core::{RunStatus, StageClass, StageOutcome, StageStatus, TeardownOutcome};
use crate::errors::{FailureKind, FailureReason, StageFailure, StagegateError};
use crate::utils::{duration_ms, now_utc, Timestamp};
use serde::Serialize;
use uuid::Uuid;

/// Exit code used when a run fails without a usable command exit code.
pub const GENERIC_FAILURE_EXIT_CODE: i32 = 1;

/// One execution attempt and its aggregated outcome.
///
/// Status moves `pending -> running -> {passed, failed}` and never leaves a
/// terminal state.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineRun {
    id: Uuid,
    pipeline: String,
    status: RunStatus,
    stages: Vec<StageOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    first_failure: Option<StageFailure>,
    #[serde(skip_serializing_if = "Option::is_none")]
    started_at: Option<Timestamp>,
    #[serde(skip_serializing_if = "Option::is_none")]
    ended_at: Option<Timestamp>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    teardown: Vec<TeardownOutcome>,
}

impl PipelineRun {
    /// Creates a pending run with one pending outcome per stage.
    #[must_use]
    pub fn new(pipeline: &Pipeline) -> Self {
        Self {
            id: Uuid::new_v4(),
            pipeline: pipeline.name().to_string(),
            status: RunStatus::Pending,
            stages: pipeline
                .stages()
                .iter()
                .map(|s| StageOutcome::pending(&s.name, s.class))
                .collect(),
            first_failure: None,
            started_at: None,
            ended_at: None,
            teardown: Vec::new(),
        }
    }

    /// Returns the run id.
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// Returns the pipeline name.
    #[must_use]
    pub fn pipeline(&self) -> &str {
        &self.pipeline
    }

    /// Returns the overall status.
    #[must_use]
    pub const fn status(&self) -> RunStatus {
        self.status
    }

    /// Returns per-stage outcomes in declaration order.
    #[must_use]
    pub fn stages(&self) -> &[StageOutcome] {
        &self.stages
    }

    /// Returns the outcome of the named stage.
    #[must_use]
    pub fn stage(&self, name: &str) -> Option<&StageOutcome> {
        self.stages.iter().find(|s| s.name == name)
    }

    /// Returns the first failing stage, if any.
    #[must_use]
    pub const fn first_failure(&self) -> Option<&StageFailure> {
        self.first_failure.as_ref()
    }

    /// Returns teardown outcomes.
    #[must_use]
    pub fn teardown(&self) -> &[TeardownOutcome] {
        &self.teardown
    }

    /// Names of the stages whose commands were invoked, in order.
    #[must_use]
    pub fn invoked_stages(&self) -> Vec<&str> {
        self.stages
            .iter()
            .filter(|s| s.status.was_invoked())
            .map(|s| s.name.as_str())
            .collect()
    }

    /// Returns true if a launch stage was invoked, so an instance may exist.
    #[must_use]
    pub fn launched(&self) -> bool {
        self.stages
            .iter()
            .any(|s| s.class == StageClass::Launch && s.status.was_invoked())
    }

    /// Total wall-clock duration in milliseconds, once the run has ended.
    #[must_use]
    pub fn duration_ms(&self) -> Option<u64> {
        match (self.started_at, self.ended_at) {
            (Some(start), Some(end)) => Some(duration_ms(start, end)),
            _ => None,
        }
    }

    /// Process exit code for this run.
    ///
    /// Zero iff the run passed. Otherwise the failing command's own exit code
    /// when it produced a non-zero one, else [`GENERIC_FAILURE_EXIT_CODE`].
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        if self.status == RunStatus::Passed {
            return 0;
        }
        self.first_failure
            .as_ref()
            .and_then(|f| f.reason.exit_code())
            .filter(|code| *code != 0)
            .unwrap_or(GENERIC_FAILURE_EXIT_CODE)
    }

    /// Moves the run from `pending` to `running`.
    ///
    /// # Errors
    ///
    /// Returns `StagegateError::InvalidTransition` if the run already started.
    pub fn start(&mut self) -> Result<(), StagegateError> {
        self.transition(RunStatus::Running)?;
        self.started_at = Some(now_utc());
        Ok(())
    }

    /// Moves the run to its terminal status.
    ///
    /// The run is `failed` if a stage failure was recorded, else `passed`.
    ///
    /// # Errors
    ///
    /// Returns `StagegateError::InvalidTransition` if the run is not running.
    pub fn finish(&mut self) -> Result<RunStatus, StagegateError> {
        let next = if self.first_failure.is_some() {
            RunStatus::Failed
        } else {
            RunStatus::Passed
        };
        self.transition(next)?;
        self.ended_at = Some(now_utc());
        Ok(next)
    }

    pub(crate) fn stage_mut(&mut self, index: usize) -> Option<&mut StageOutcome> {
        self.stages.get_mut(index)
    }

    /// Records a stage failure; only the first one is kept.
    pub(crate) fn record_failure(&mut self, index: usize, reason: FailureReason) {
        if self.first_failure.is_some() {
            return;
        }
        if let Some(outcome) = self.stages.get(index) {
            self.first_failure = Some(StageFailure {
                index,
                stage: outcome.name.clone(),
                kind: FailureKind::from(outcome.class),
                reason,
            });
        }
    }

    /// Marks every still-pending stage as skipped.
    pub(crate) fn skip_remaining(&mut self) -> Vec<String> {
        self.stages
            .iter_mut()
            .filter(|s| s.status == StageStatus::Pending)
            .map(|s| {
                s.skip();
                s.name.clone()
            })
            .collect()
    }

    pub(crate) fn push_teardown(&mut self, outcome: TeardownOutcome) {
        self.teardown.push(outcome);
    }

    fn transition(&mut self, next: RunStatus) -> Result<(), StagegateError> {
        if !self.status.can_transition_to(next) {
            return Err(StagegateError::InvalidTransition {
                from: self.status.to_string(),
                to: next.to_string(),
            });
        }
        self.status = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{CommandLine, PipelineBuilder, StageSpec};

    fn pipeline() -> Pipeline {
        let cmd = || CommandLine::new("true", Vec::<String>::new());
        PipelineBuilder::new("ci")
            .stage(StageSpec::setup(cmd()))
            .unwrap()
            .stage(StageSpec::build(cmd()))
            .unwrap()
            .stage(StageSpec::launch(cmd()))
            .unwrap()
            .build()
            .unwrap()
    }

    #[test]
    fn test_new_run_is_pending() {
        let run = PipelineRun::new(&pipeline());
        assert_eq!(run.status(), RunStatus::Pending);
        assert_eq!(run.stages().len(), 3);
        assert!(run.stages().iter().all(|s| s.status == StageStatus::Pending));
        assert!(run.first_failure().is_none());
        assert!(run.invoked_stages().is_empty());
        assert!(!run.launched());
    }

    #[test]
    fn test_finish_without_failure_passes() {
        let mut run = PipelineRun::new(&pipeline());
        run.start().unwrap();
        assert_eq!(run.status(), RunStatus::Running);
        assert_eq!(run.finish().unwrap(), RunStatus::Passed);
        assert_eq!(run.exit_code(), 0);
        assert!(run.duration_ms().is_some());
    }

    #[test]
    fn test_finish_with_failure_fails() {
        let mut run = PipelineRun::new(&pipeline());
        run.start().unwrap();
        run.record_failure(1, FailureReason::ExitCode { code: 125 });
        run.record_failure(2, FailureReason::Terminated);

        assert_eq!(run.finish().unwrap(), RunStatus::Failed);
        let failure = run.first_failure().unwrap();
        assert_eq!(failure.stage, "build");
        assert_eq!(failure.kind, FailureKind::BuildFailure);
        assert_eq!(run.exit_code(), 125);
    }

    #[test]
    fn test_exit_code_without_command_code() {
        let mut run = PipelineRun::new(&pipeline());
        run.start().unwrap();
        run.record_failure(0, FailureReason::Terminated);
        run.finish().unwrap();
        assert_eq!(run.exit_code(), GENERIC_FAILURE_EXIT_CODE);
    }

    #[test]
    fn test_illegal_transitions_rejected() {
        let mut run = PipelineRun::new(&pipeline());
        assert!(matches!(
            run.finish(),
            Err(StagegateError::InvalidTransition { .. })
        ));

        run.start().unwrap();
        assert!(run.start().is_err());
        run.finish().unwrap();
        assert!(run.finish().is_err());
        assert!(run.start().is_err());
        assert_eq!(run.status(), RunStatus::Passed);
    }

    #[test]
    fn test_pending_run_exit_code_is_failure() {
        let run = PipelineRun::new(&pipeline());
        assert_eq!(run.exit_code(), GENERIC_FAILURE_EXIT_CODE);
    }

    #[test]
    fn test_skip_remaining() {
        let mut run = PipelineRun::new(&pipeline());
        run.stage_mut(0).unwrap().start();
        run.stage_mut(0).unwrap().pass(Some(0), 1);

        let skipped = run.skip_remaining();
        assert_eq!(skipped, vec!["build".to_string(), "launch".to_string()]);
        assert_eq!(run.stage("launch").unwrap().status, StageStatus::Skipped);
        assert_eq!(run.invoked_stages(), vec!["setup"]);
    }
}
