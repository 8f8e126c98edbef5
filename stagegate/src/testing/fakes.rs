//! Instrumented fake executor.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use crate::errors::ExecError;
use crate::stages::{Executor, Invocation, ProcessOutcome};

/// A canned response for one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptedResponse {
    /// Exit with this code and stdout.
    Exit {
        /// Exit code.
        code: i32,
        /// Stdout returned when the invocation captures it.
        stdout: String,
    },
    /// Terminated by a signal.
    Killed,
    /// Never produced an exit status.
    Error(ExecError),
}

impl ScriptedResponse {
    /// Exit zero with no output.
    #[must_use]
    pub const fn pass() -> Self {
        Self::Exit {
            code: 0,
            stdout: String::new(),
        }
    }

    /// Exit with a non-zero code.
    #[must_use]
    pub const fn fail(code: i32) -> Self {
        Self::Exit {
            code,
            stdout: String::new(),
        }
    }

    /// Exit zero with the given stdout.
    #[must_use]
    pub fn stdout(stdout: impl Into<String>) -> Self {
        Self::Exit {
            code: 0,
            stdout: stdout.into(),
        }
    }

    /// Time out after the given duration.
    #[must_use]
    pub const fn timeout(after: Duration) -> Self {
        Self::Error(ExecError::TimedOut(after))
    }
}

/// An executor that answers from a script and records every invocation.
///
/// Responses are keyed by the rendered command line. Each key holds a queue;
/// the last response in a queue repeats once the queue drains. Commands with
/// no script exit zero.
#[derive(Debug, Default)]
pub struct ScriptedExecutor {
    script: Mutex<HashMap<String, VecDeque<ScriptedResponse>>>,
    invocations: Mutex<Vec<Invocation>>,
}

impl ScriptedExecutor {
    /// Creates an executor where every command passes.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a response for `command`.
    #[must_use]
    pub fn respond(self, command: &str, response: ScriptedResponse) -> Self {
        self.script
            .lock()
            .entry(command.to_string())
            .or_default()
            .push_back(response);
        self
    }

    /// Returns every invocation in order.
    #[must_use]
    pub fn invocations(&self) -> Vec<Invocation> {
        self.invocations.lock().clone()
    }

    /// Returns every rendered command line in order.
    #[must_use]
    pub fn commands(&self) -> Vec<String> {
        self.invocations
            .lock()
            .iter()
            .map(|i| i.command.to_string())
            .collect()
    }

    /// Returns how many times `command` was invoked.
    #[must_use]
    pub fn call_count(&self, command: &str) -> usize {
        self.invocations
            .lock()
            .iter()
            .filter(|i| i.command.to_string() == command)
            .count()
    }

    fn next_response(&self, command: &str) -> ScriptedResponse {
        let mut script = self.script.lock();
        match script.get_mut(command) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap_or_else(ScriptedResponse::pass),
            Some(queue) => queue.front().cloned().unwrap_or_else(ScriptedResponse::pass),
            None => ScriptedResponse::pass(),
        }
    }
}

#[async_trait]
impl Executor for ScriptedExecutor {
    async fn execute(&self, invocation: &Invocation) -> Result<ProcessOutcome, ExecError> {
        self.invocations.lock().push(invocation.clone());
        let response = self.next_response(&invocation.command.to_string());

        match response {
            ScriptedResponse::Exit { code, stdout } => {
                let outcome = ProcessOutcome::exited(code);
                if invocation.capture_stdout {
                    Ok(outcome.with_stdout(stdout))
                } else {
                    Ok(outcome)
                }
            }
            ScriptedResponse::Killed => Ok(ProcessOutcome::default()),
            ScriptedResponse::Error(err) => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::CommandLine;

    fn invocation(line: &str) -> Invocation {
        Invocation::new(CommandLine::parse(line).unwrap())
    }

    #[tokio::test]
    async fn test_unscripted_commands_pass() {
        let executor = ScriptedExecutor::new();
        let outcome = executor.execute(&invocation("make all")).await.unwrap();
        assert!(outcome.success());
        assert_eq!(executor.commands(), vec!["make all"]);
    }

    #[tokio::test]
    async fn test_queue_drains_then_repeats_last() {
        let executor = ScriptedExecutor::new()
            .respond("docker ps", ScriptedResponse::stdout(""))
            .respond("docker ps", ScriptedResponse::stdout("standup\n"));

        let listing = invocation("docker ps").capturing();
        assert_eq!(executor.execute(&listing).await.unwrap().stdout, "");
        assert_eq!(executor.execute(&listing).await.unwrap().stdout, "standup\n");
        assert_eq!(executor.execute(&listing).await.unwrap().stdout, "standup\n");
        assert_eq!(executor.call_count("docker ps"), 3);
    }

    #[tokio::test]
    async fn test_stdout_only_when_captured() {
        let executor =
            ScriptedExecutor::new().respond("echo hi", ScriptedResponse::stdout("hi\n"));
        let outcome = executor.execute(&invocation("echo hi")).await.unwrap();
        assert!(outcome.stdout.is_empty());
    }

    #[tokio::test]
    async fn test_killed_and_error_responses() {
        let executor = ScriptedExecutor::new()
            .respond("a", ScriptedResponse::Killed)
            .respond("b", ScriptedResponse::timeout(Duration::from_secs(1)));

        assert_eq!(executor.execute(&invocation("a")).await.unwrap().code, None);
        assert_eq!(
            executor.execute(&invocation("b")).await.unwrap_err(),
            ExecError::TimedOut(Duration::from_secs(1))
        );
    }
}
