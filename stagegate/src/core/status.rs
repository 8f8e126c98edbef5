//! Stage class and status enums.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The role a stage plays in a deployment-validation pipeline.
///
/// Classes are ranked; a pipeline lists them in non-decreasing rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageClass {
    /// Installs dependencies needed by later stages.
    Setup,
    /// Produces the container image.
    Build,
    /// Starts a detached container from the image.
    Launch,
    /// Confirms the container is present among running containers.
    Healthcheck,
    /// A verification command (format, types, lint, tests).
    Gate,
}

impl StageClass {
    /// Returns the ordering rank of this class.
    #[must_use]
    pub const fn rank(self) -> u8 {
        match self {
            Self::Setup => 0,
            Self::Build => 1,
            Self::Launch => 2,
            Self::Healthcheck => 3,
            Self::Gate => 4,
        }
    }
}

impl fmt::Display for StageClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Setup => write!(f, "setup"),
            Self::Build => write!(f, "build"),
            Self::Launch => write!(f, "launch"),
            Self::Healthcheck => write!(f, "healthcheck"),
            Self::Gate => write!(f, "gate"),
        }
    }
}

/// The execution status of a single stage within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    /// Stage has not started yet.
    #[default]
    Pending,
    /// Stage is currently running.
    Running,
    /// Stage command exited successfully.
    Passed,
    /// Stage command failed.
    Failed,
    /// Stage was never invoked because an earlier stage failed.
    Skipped,
}

impl fmt::Display for StageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Running => write!(f, "running"),
            Self::Passed => write!(f, "passed"),
            Self::Failed => write!(f, "failed"),
            Self::Skipped => write!(f, "skipped"),
        }
    }
}

impl StageStatus {
    /// Returns true if the status represents a terminal state.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Passed | Self::Failed | Self::Skipped)
    }

    /// Returns true if the stage was actually invoked.
    #[must_use]
    pub const fn was_invoked(&self) -> bool {
        matches!(self, Self::Running | Self::Passed | Self::Failed)
    }
}

/// The aggregate status of a pipeline run.
///
/// Transitions are `pending -> running -> {passed, failed}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// The run has been created but not started.
    #[default]
    Pending,
    /// Stages are executing.
    Running,
    /// Every stage passed.
    Passed,
    /// A stage failed.
    Failed,
}

impl RunStatus {
    /// Returns true if no further transition is allowed.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Passed | Self::Failed)
    }

    /// Returns true if moving from `self` to `next` is a legal transition.
    #[must_use]
    pub const fn can_transition_to(&self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Running) | (Self::Running, Self::Passed | Self::Failed)
        )
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Running => write!(f, "running"),
            Self::Passed => write!(f, "passed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_class_display() {
        assert_eq!(StageClass::Setup.to_string(), "setup");
        assert_eq!(StageClass::Healthcheck.to_string(), "healthcheck");
        assert_eq!(StageClass::Gate.to_string(), "gate");
    }

    #[test]
    fn test_stage_class_rank_order() {
        assert!(StageClass::Setup.rank() < StageClass::Build.rank());
        assert!(StageClass::Build.rank() < StageClass::Launch.rank());
        assert!(StageClass::Launch.rank() < StageClass::Healthcheck.rank());
        assert!(StageClass::Healthcheck.rank() < StageClass::Gate.rank());
    }

    #[test]
    fn test_stage_status_is_terminal() {
        assert!(StageStatus::Passed.is_terminal());
        assert!(StageStatus::Failed.is_terminal());
        assert!(StageStatus::Skipped.is_terminal());
        assert!(!StageStatus::Pending.is_terminal());
        assert!(!StageStatus::Running.is_terminal());
    }

    #[test]
    fn test_skipped_stage_was_not_invoked() {
        assert!(!StageStatus::Skipped.was_invoked());
        assert!(!StageStatus::Pending.is_terminal() && !StageStatus::Pending.was_invoked());
        assert!(StageStatus::Failed.was_invoked());
    }

    #[test]
    fn test_run_status_transitions() {
        assert!(RunStatus::Pending.can_transition_to(RunStatus::Running));
        assert!(RunStatus::Running.can_transition_to(RunStatus::Passed));
        assert!(RunStatus::Running.can_transition_to(RunStatus::Failed));
        assert!(!RunStatus::Pending.can_transition_to(RunStatus::Passed));
        assert!(!RunStatus::Passed.can_transition_to(RunStatus::Failed));
        assert!(!RunStatus::Failed.can_transition_to(RunStatus::Running));
    }

    #[test]
    fn test_status_serialize() {
        let json = serde_json::to_string(&RunStatus::Failed).unwrap();
        assert_eq!(json, r#""failed""#);

        let class: StageClass = serde_json::from_str(r#""healthcheck""#).unwrap();
        assert_eq!(class, StageClass::Healthcheck);
    }
}
