//! Stage specifications.

use crate::core::{Instance, StageClass};
use crate::errors::PipelineValidationError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// A program and its arguments.
///
/// Serialized as a flat array, e.g. `["docker", "build", "-t", "standup", "."]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct CommandLine {
    /// The program to execute.
    pub program: String,
    /// Arguments passed to the program.
    pub args: Vec<String>,
}

impl CommandLine {
    /// Creates a new command line.
    #[must_use]
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Splits a command on whitespace. No shell quoting is interpreted.
    ///
    /// Returns `None` for blank input.
    #[must_use]
    pub fn parse(line: &str) -> Option<Self> {
        let mut parts = line.split_whitespace();
        let program = parts.next()?;
        Some(Self::new(program, parts))
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

impl TryFrom<Vec<String>> for CommandLine {
    type Error = String;

    fn try_from(mut argv: Vec<String>) -> Result<Self, Self::Error> {
        if argv.is_empty() || argv[0].trim().is_empty() {
            return Err("command must name a program".to_string());
        }
        let program = argv.remove(0);
        Ok(Self {
            program,
            args: argv,
        })
    }
}

impl From<CommandLine> for Vec<String> {
    fn from(command: CommandLine) -> Self {
        std::iter::once(command.program).chain(command.args).collect()
    }
}

/// What a stage's command must produce for the stage to pass.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Expectation {
    /// The command exits with status zero.
    #[default]
    ExitSuccess,
    /// The command exits zero and its output lists the instance.
    InstanceListed {
        /// The instance that must be listed.
        instance: Instance,
    },
}

/// How many times a healthcheck queries before giving up.
///
/// The default is a single query with no retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollPolicy {
    /// Total number of queries, including the first. At least 1.
    pub attempts: u32,
    /// Fixed delay between queries.
    pub delay: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self::single()
    }
}

impl PollPolicy {
    /// A single query, no retry.
    #[must_use]
    pub const fn single() -> Self {
        Self {
            attempts: 1,
            delay: Duration::ZERO,
        }
    }

    /// A bounded poll with a fixed delay.
    #[must_use]
    pub const fn bounded(attempts: u32, delay: Duration) -> Self {
        Self { attempts, delay }
    }

    /// Returns true if more than one query may be made.
    #[must_use]
    pub const fn retries(&self) -> bool {
        self.attempts > 1
    }
}

/// Specification for a single stage in a pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageSpec {
    /// The unique name of the stage.
    pub name: String,
    /// The class of stage.
    pub class: StageClass,
    /// The command to execute.
    pub command: CommandLine,
    /// What the command must produce to pass.
    #[serde(default)]
    pub expectation: Expectation,
    /// Kill the command and fail the stage after this long.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<Duration>,
    /// Poll policy; only healthchecks may retry.
    #[serde(default)]
    pub poll: PollPolicy,
}

impl StageSpec {
    /// Creates a new stage specification.
    #[must_use]
    pub fn new(name: impl Into<String>, class: StageClass, command: CommandLine) -> Self {
        Self {
            name: name.into(),
            class,
            command,
            expectation: Expectation::ExitSuccess,
            timeout: None,
            poll: PollPolicy::single(),
        }
    }

    /// Creates the `setup` stage.
    #[must_use]
    pub fn setup(command: CommandLine) -> Self {
        Self::new("setup", StageClass::Setup, command)
    }

    /// Creates the `build` stage.
    #[must_use]
    pub fn build(command: CommandLine) -> Self {
        Self::new("build", StageClass::Build, command)
    }

    /// Creates the `launch` stage.
    #[must_use]
    pub fn launch(command: CommandLine) -> Self {
        Self::new("launch", StageClass::Launch, command)
    }

    /// Creates the `healthcheck` stage, which must see `instance` listed.
    #[must_use]
    pub fn healthcheck(command: CommandLine, instance: Instance) -> Self {
        Self::new("healthcheck", StageClass::Healthcheck, command)
            .with_expectation(Expectation::InstanceListed { instance })
    }

    /// Creates a gate stage named `gate(<label>)`.
    #[must_use]
    pub fn gate(label: &str, command: CommandLine) -> Self {
        Self::new(format!("gate({label})"), StageClass::Gate, command)
    }

    /// Sets the expectation.
    #[must_use]
    pub fn with_expectation(mut self, expectation: Expectation) -> Self {
        self.expectation = expectation;
        self
    }

    /// Sets the timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the poll policy.
    #[must_use]
    pub const fn with_poll(mut self, poll: PollPolicy) -> Self {
        self.poll = poll;
        self
    }

    /// Validates the stage specification.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is blank, the poll policy has zero
    /// attempts, or a non-healthcheck stage asks to retry.
    pub fn validate(&self) -> Result<(), PipelineValidationError> {
        if self.name.trim().is_empty() {
            return Err(PipelineValidationError::new(
                "STAGE-EMPTY-NAME",
                "Stage name cannot be empty or whitespace-only",
            ));
        }

        if self.poll.attempts == 0 {
            return Err(PipelineValidationError::new(
                "STAGE-ZERO-ATTEMPTS",
                format!("Stage '{}' must be attempted at least once", self.name),
            )
            .with_stages(vec![self.name.clone()]));
        }

        if self.poll.retries() && self.class != StageClass::Healthcheck {
            return Err(PipelineValidationError::new(
                "STAGE-RETRY-NOT-ALLOWED",
                format!(
                    "Stage '{}' is a {} stage; only healthchecks may poll",
                    self.name, self.class
                ),
            )
            .with_stages(vec![self.name.clone()]));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cmd(line: &str) -> CommandLine {
        CommandLine::parse(line).unwrap()
    }

    #[test]
    fn test_command_line_parse_and_display() {
        let command = cmd("docker  run -d --name standup standup:latest");
        assert_eq!(command.program, "docker");
        assert_eq!(command.args.len(), 5);
        assert_eq!(
            command.to_string(),
            "docker run -d --name standup standup:latest"
        );
        assert!(CommandLine::parse("   ").is_none());
    }

    #[test]
    fn test_command_line_serializes_as_array() {
        let command = cmd("poetry run pytest");
        let json = serde_json::to_value(&command).unwrap();
        assert_eq!(json, serde_json::json!(["poetry", "run", "pytest"]));

        let back: CommandLine = serde_json::from_value(json).unwrap();
        assert_eq!(back, command);
    }

    #[test]
    fn test_command_line_rejects_empty_array() {
        let result: Result<CommandLine, _> = serde_json::from_value(serde_json::json!([]));
        assert!(result.is_err());
    }

    #[test]
    fn test_named_constructors() {
        assert_eq!(StageSpec::setup(cmd("poetry install")).class, StageClass::Setup);
        let gate = StageSpec::gate("lint", cmd("pylint standup"));
        assert_eq!(gate.name, "gate(lint)");
        assert_eq!(gate.class, StageClass::Gate);

        let health = StageSpec::healthcheck(cmd("docker ps"), Instance::new("standup"));
        assert_eq!(
            health.expectation,
            Expectation::InstanceListed {
                instance: Instance::new("standup")
            }
        );
        assert!(!health.poll.retries());
    }

    #[test]
    fn test_validate_rejects_blank_name() {
        let spec = StageSpec::new("  ", StageClass::Gate, cmd("true"));
        assert_eq!(spec.validate().unwrap_err().code, "STAGE-EMPTY-NAME");
    }

    #[test]
    fn test_validate_rejects_retry_outside_healthcheck() {
        let spec = StageSpec::build(cmd("docker build ."))
            .with_poll(PollPolicy::bounded(3, Duration::from_millis(10)));
        assert_eq!(spec.validate().unwrap_err().code, "STAGE-RETRY-NOT-ALLOWED");

        let spec = StageSpec::healthcheck(cmd("docker ps"), Instance::new("standup"))
            .with_poll(PollPolicy::bounded(3, Duration::from_millis(10)));
        assert!(spec.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_attempts() {
        let spec = StageSpec::healthcheck(cmd("docker ps"), Instance::new("standup"))
            .with_poll(PollPolicy::bounded(0, Duration::ZERO));
        assert_eq!(spec.validate().unwrap_err().code, "STAGE-ZERO-ATTEMPTS");
    }
}
