//! Executors that run stage commands.
//!
//! The runner never spawns processes itself; it hands each stage command to an
//! [`Executor`]. Production code uses [`ProcessExecutor`], tests use fakes
//! from `crate::testing`.

mod process;

pub use process::ProcessExecutor;

use crate::errors::ExecError;
use crate::pipeline::CommandLine;
use async_trait::async_trait;
use std::fmt::Debug;
use std::path::PathBuf;
use std::time::Duration;

/// One request to run a command to completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// The command to run.
    pub command: CommandLine,
    /// Directory the command runs in; inherits the runner's when `None`.
    pub working_dir: Option<PathBuf>,
    /// Capture stdout instead of passing it through.
    pub capture_stdout: bool,
    /// Kill the process after this long.
    pub timeout: Option<Duration>,
}

impl Invocation {
    /// Creates an invocation that passes output through and never times out.
    #[must_use]
    pub const fn new(command: CommandLine) -> Self {
        Self {
            command,
            working_dir: None,
            capture_stdout: false,
            timeout: None,
        }
    }

    /// Sets the working directory.
    #[must_use]
    pub fn in_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.working_dir = dir;
        self
    }

    /// Captures stdout.
    #[must_use]
    pub const fn capturing(mut self) -> Self {
        self.capture_stdout = true;
        self
    }

    /// Sets the timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

/// How a process ended.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutcome {
    /// Exit code; `None` when the process was terminated by a signal.
    pub code: Option<i32>,
    /// Captured stdout, empty unless the invocation asked for it.
    pub stdout: String,
}

impl ProcessOutcome {
    /// An outcome with the given exit code and no output.
    #[must_use]
    pub const fn exited(code: i32) -> Self {
        Self {
            code: Some(code),
            stdout: String::new(),
        }
    }

    /// Sets captured stdout.
    #[must_use]
    pub fn with_stdout(mut self, stdout: impl Into<String>) -> Self {
        self.stdout = stdout.into();
        self
    }

    /// Returns true if the process exited with status zero.
    #[must_use]
    pub const fn success(&self) -> bool {
        matches!(self.code, Some(0))
    }
}

/// Runs commands on behalf of the pipeline runner.
///
/// `execute` blocks (asynchronously) until the process has exited.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Executor: Send + Sync + Debug {
    /// Runs a command to completion.
    ///
    /// A non-zero exit is an `Ok` outcome; `Err` means no exit status was
    /// obtained at all.
    async fn execute(&self, invocation: &Invocation) -> Result<ProcessOutcome, ExecError>;
}
