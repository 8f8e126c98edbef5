//! Per-stage outcome records.

use super::{StageClass, StageStatus};
use crate::errors::FailureReason;
use crate::utils::{duration_ms, now_utc, Timestamp};
use serde::{Deserialize, Serialize};

/// What happened to one stage during a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageOutcome {
    /// Stage name.
    pub name: String,
    /// Stage class.
    pub class: StageClass,
    /// Current status.
    pub status: StageStatus,
    /// Exit code of the last attempt, when the process produced one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    /// Number of times the command was invoked.
    pub attempts: u32,
    /// When the stage started.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<Timestamp>,
    /// When the stage ended.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<Timestamp>,
    /// Failure reason, set only when the stage failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureReason>,
}

impl StageOutcome {
    /// Creates a pending outcome for a stage.
    #[must_use]
    pub fn pending(name: impl Into<String>, class: StageClass) -> Self {
        Self {
            name: name.into(),
            class,
            status: StageStatus::Pending,
            exit_code: None,
            attempts: 0,
            started_at: None,
            ended_at: None,
            failure: None,
        }
    }

    /// Marks the stage as running.
    pub fn start(&mut self) {
        self.status = StageStatus::Running;
        self.started_at = Some(now_utc());
    }

    /// Marks the stage as passed.
    pub fn pass(&mut self, exit_code: Option<i32>, attempts: u32) {
        self.status = StageStatus::Passed;
        self.exit_code = exit_code;
        self.attempts = attempts;
        self.ended_at = Some(now_utc());
    }

    /// Marks the stage as failed.
    pub fn fail(&mut self, exit_code: Option<i32>, attempts: u32, reason: FailureReason) {
        self.status = StageStatus::Failed;
        self.exit_code = exit_code;
        self.attempts = attempts;
        self.failure = Some(reason);
        self.ended_at = Some(now_utc());
    }

    /// Marks the stage as skipped; it was never invoked.
    pub fn skip(&mut self) {
        self.status = StageStatus::Skipped;
    }

    /// Returns the wall-clock duration in milliseconds, if the stage finished.
    #[must_use]
    pub fn duration_ms(&self) -> Option<u64> {
        match (self.started_at, self.ended_at) {
            (Some(start), Some(end)) => Some(duration_ms(start, end)),
            _ => None,
        }
    }
}

/// The result of one best-effort teardown command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeardownOutcome {
    /// Rendered command line.
    pub command: String,
    /// Exit code, when the process produced one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    /// Error text when the command could not run or exited non-zero.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TeardownOutcome {
    /// Returns true if the teardown command succeeded.
    #[must_use]
    pub const fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_lifecycle_pass() {
        let mut outcome = StageOutcome::pending("build", StageClass::Build);
        assert_eq!(outcome.status, StageStatus::Pending);
        assert_eq!(outcome.duration_ms(), None);

        outcome.start();
        assert_eq!(outcome.status, StageStatus::Running);

        outcome.pass(Some(0), 1);
        assert_eq!(outcome.status, StageStatus::Passed);
        assert_eq!(outcome.attempts, 1);
        assert!(outcome.duration_ms().is_some());
        assert!(outcome.failure.is_none());
    }

    #[test]
    fn test_outcome_fail_records_reason() {
        let mut outcome = StageOutcome::pending("gate(lint)", StageClass::Gate);
        outcome.start();
        outcome.fail(Some(4), 1, FailureReason::ExitCode { code: 4 });

        assert_eq!(outcome.status, StageStatus::Failed);
        assert_eq!(outcome.exit_code, Some(4));
        assert_eq!(outcome.failure, Some(FailureReason::ExitCode { code: 4 }));
    }

    #[test]
    fn test_skipped_outcome_has_no_timestamps() {
        let mut outcome = StageOutcome::pending("gate(tests)", StageClass::Gate);
        outcome.skip();

        assert_eq!(outcome.status, StageStatus::Skipped);
        assert_eq!(outcome.attempts, 0);
        assert!(outcome.started_at.is_none());

        let json = serde_json::to_value(&outcome).unwrap();
        assert!(json.get("started_at").is_none());
        assert_eq!(json["status"], "skipped");
    }
}
