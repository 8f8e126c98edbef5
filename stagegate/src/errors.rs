//! Error types for stagegate.
//!
//! Two families live here. Operational errors (`StagegateError` and friends)
//! are returned as `Err` when the runner cannot be set up or a report cannot
//! be written. Stage failures (`StageFailure`) are ordinary run outcomes and
//! are recorded on the `PipelineRun` instead of being propagated.

use crate::core::StageClass;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// The main error type for stagegate operations.
#[derive(Debug, Error)]
pub enum StagegateError {
    /// A pipeline validation error occurred.
    #[error("{0}")]
    Validation(#[from] PipelineValidationError),

    /// Configuration could not be loaded.
    #[error("{0}")]
    Config(#[from] ConfigError),

    /// An illegal run state transition was attempted.
    #[error("Invalid run transition from '{from}' to '{to}'")]
    InvalidTransition {
        /// The current status.
        from: String,
        /// The requested status.
        to: String,
    },

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Error raised when pipeline validation fails.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct PipelineValidationError {
    /// Stable error code (e.g., "PIPELINE-EMPTY").
    pub code: &'static str,
    /// The error message.
    pub message: String,
    /// The stages involved in the error.
    pub stages: Vec<String>,
}

impl PipelineValidationError {
    /// Creates a new pipeline validation error.
    #[must_use]
    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            stages: Vec::new(),
        }
    }

    /// Sets the stages involved.
    #[must_use]
    pub fn with_stages(mut self, stages: Vec<String>) -> Self {
        self.stages = stages;
        self
    }
}

/// Errors raised while loading a pipeline configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("Failed to read config '{}': {source}", path.display())]
    Read {
        /// Path that was read.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid TOML for this schema.
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// The configuration could not be rendered.
    #[error("Failed to render config: {0}")]
    Render(#[from] toml::ser::Error),

    /// A field holds a value the pipeline cannot use.
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Errors raised by an executor when a command cannot produce an exit status.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecError {
    /// The process could not be started.
    #[error("failed to spawn '{program}': {message}")]
    Spawn {
        /// The program that failed to start.
        program: String,
        /// OS error text.
        message: String,
    },

    /// The process did not exit within its timeout and was killed.
    #[error("timed out after {}s", .0.as_secs_f64())]
    TimedOut(Duration),

    /// Waiting on the process failed.
    #[error("failed waiting on process: {0}")]
    Wait(String),
}

/// The pipeline-level classification of a stage failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FailureKind {
    /// Dependency installation failed; nothing was built.
    SetupFailure,
    /// The image build failed; no instance was launched.
    BuildFailure,
    /// The container failed to start; no healthcheck was performed.
    LaunchFailure,
    /// The running instance was not observed; no gates ran.
    HealthcheckFailure,
    /// A verification gate failed; later gates were skipped.
    GateFailure,
}

impl From<StageClass> for FailureKind {
    fn from(class: StageClass) -> Self {
        match class {
            StageClass::Setup => Self::SetupFailure,
            StageClass::Build => Self::BuildFailure,
            StageClass::Launch => Self::LaunchFailure,
            StageClass::Healthcheck => Self::HealthcheckFailure,
            StageClass::Gate => Self::GateFailure,
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::SetupFailure => "setup failure",
            Self::BuildFailure => "build failure",
            Self::LaunchFailure => "launch failure",
            Self::HealthcheckFailure => "healthcheck failure",
            Self::GateFailure => "gate failure",
        };
        f.write_str(label)
    }
}

/// Why a stage did not pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum FailureReason {
    /// The command exited with a non-zero status.
    #[error("exited with status {code}")]
    ExitCode {
        /// The exit code.
        code: i32,
    },

    /// The command was terminated without an exit code (e.g. by a signal).
    #[error("terminated without an exit status")]
    Terminated,

    /// The command exited zero but the expected instance was not listed.
    #[error("instance '{instance}' is not running")]
    InstanceNotFound {
        /// The instance name that was expected.
        instance: String,
    },

    /// The command could not be run at all.
    #[error("{message}")]
    Exec {
        /// Executor error text.
        message: String,
    },

    /// The command exceeded its timeout.
    #[error("timed out after {timeout_ms}ms")]
    TimedOut {
        /// The timeout that elapsed.
        timeout_ms: u64,
    },
}

impl FailureReason {
    /// Returns the command's own exit code, if it produced a non-zero one.
    #[must_use]
    pub const fn exit_code(&self) -> Option<i32> {
        match self {
            Self::ExitCode { code } => Some(*code),
            _ => None,
        }
    }
}

impl From<ExecError> for FailureReason {
    fn from(err: ExecError) -> Self {
        match err {
            ExecError::TimedOut(after) => Self::TimedOut {
                timeout_ms: u64::try_from(after.as_millis()).unwrap_or(u64::MAX),
            },
            other => Self::Exec {
                message: other.to_string(),
            },
        }
    }
}

/// The first failing stage of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("{kind} at stage '{stage}': {reason}")]
pub struct StageFailure {
    /// Position of the stage in the pipeline.
    pub index: usize,
    /// Name of the failing stage.
    pub stage: String,
    /// Failure classification, derived from the stage class.
    pub kind: FailureKind,
    /// Why the stage failed.
    pub reason: FailureReason,
}
