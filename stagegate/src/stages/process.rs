//! Child-process executor backed by `tokio::process`.

use super::{Executor, Invocation, ProcessOutcome};
use crate::errors::ExecError;
use async_trait::async_trait;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

/// Runs each invocation as a child process.
///
/// Stderr is always inherited so a failing command's diagnostics reach the
/// operator unchanged. Stdout is inherited unless the invocation captures it.
/// Children are killed when their future is dropped, which is how timeouts
/// take effect.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessExecutor;

impl ProcessExecutor {
    /// Creates a new process executor.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Executor for ProcessExecutor {
    async fn execute(&self, invocation: &Invocation) -> Result<ProcessOutcome, ExecError> {
        let command_line = &invocation.command;
        let mut cmd = Command::new(&command_line.program);
        cmd.args(&command_line.args)
            .stdin(Stdio::null())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);

        if invocation.capture_stdout {
            cmd.stdout(Stdio::piped());
        } else {
            cmd.stdout(Stdio::inherit());
        }

        if let Some(dir) = &invocation.working_dir {
            cmd.current_dir(dir);
        }

        debug!(command = %command_line, cwd = ?invocation.working_dir, "Spawning process");

        let child = cmd.spawn().map_err(|e| ExecError::Spawn {
            program: command_line.program.clone(),
            message: e.to_string(),
        })?;

        let wait = child.wait_with_output();
        let output = match invocation.timeout {
            Some(limit) => tokio::time::timeout(limit, wait)
                .await
                .map_err(|_| ExecError::TimedOut(limit))?,
            None => wait.await,
        }
        .map_err(|e| ExecError::Wait(e.to_string()))?;

        let code = output.status.code();
        debug!(command = %command_line, exit_code = ?code, "Process exited");

        Ok(ProcessOutcome {
            code,
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        })
    }
}
