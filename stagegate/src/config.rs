//! Pipeline configuration.
//!
//! Every field has a default, so an empty file (or no file) yields the
//! standard `standup` pipeline. CLI flags override individual fields after
//! loading.

use crate::core::{Artifact, Instance};
use crate::errors::ConfigError;
use crate::pipeline::CommandLine;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// File name looked up in the current directory when no config is given.
pub const DEFAULT_CONFIG_FILE: &str = "stagegate.toml";

/// Top-level pipeline configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Pipeline name used in logs and reports.
    #[serde(default = "default_name")]
    pub name: String,
    /// Directory every stage command runs in. Relative paths in a loaded
    /// file are taken from the file's directory.
    #[serde(default = "default_project_dir")]
    pub project_dir: PathBuf,
    /// Dependency installation command.
    #[serde(default = "default_install")]
    pub install: CommandLine,
    /// Per-stage timeout in seconds. No timeout when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage_timeout_secs: Option<u64>,
    /// Remove the launched container once the run is over.
    #[serde(default)]
    pub teardown: bool,
    /// Container runtime settings.
    #[serde(default)]
    pub container: ContainerConfig,
    /// Healthcheck poll settings.
    #[serde(default)]
    pub healthcheck: HealthcheckConfig,
    /// Quality gates, in execution order.
    #[serde(default = "default_gates")]
    pub gates: Vec<GateConfig>,
}

fn default_name() -> String {
    "standup-ci".to_string()
}

fn default_project_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_install() -> CommandLine {
    CommandLine::new("poetry", ["install"])
}

fn default_gates() -> Vec<GateConfig> {
    vec![
        GateConfig::new("format", CommandLine::new("poetry", ["run", "black", "--check", "."])),
        GateConfig::new(
            "types",
            CommandLine::new(
                "poetry",
                ["run", "mypy", "--ignore-missing-imports", "standup", "tests"],
            ),
        ),
        GateConfig::new("lint", CommandLine::new("poetry", ["run", "pylint", "standup"])),
        GateConfig::new("tests", CommandLine::new("poetry", ["run", "pytest"])),
    ]
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            project_dir: default_project_dir(),
            install: default_install(),
            stage_timeout_secs: None,
            teardown: false,
            container: ContainerConfig::default(),
            healthcheck: HealthcheckConfig::default(),
            gates: default_gates(),
        }
    }
}

impl PipelineConfig {
    /// Loads a configuration file.
    ///
    /// A relative `project_dir` is resolved against the file's directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or validated.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "Loaded pipeline config");
        let mut config = Self::from_toml_str(&raw)?;
        if config.project_dir.is_relative() {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                config.project_dir = parent.join(&config.project_dir);
            }
        }
        Ok(config)
    }

    /// Loads `explicit` if given, else `stagegate.toml` from `cwd` if it
    /// exists, else the defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if a chosen file cannot be read, parsed, or validated.
    pub fn discover(explicit: Option<&Path>, cwd: &Path) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::load(path);
        }

        let candidate = cwd.join(DEFAULT_CONFIG_FILE);
        if candidate.is_file() {
            Self::load(&candidate)
        } else {
            debug!("No config file found, using defaults");
            Ok(Self::default())
        }
    }

    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// Returns an error if the document is malformed or invalid.
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Renders the configuration as TOML.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Checks field values the schema cannot express.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` naming the first bad field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::Invalid("name cannot be empty".to_string()));
        }
        if self.container.runtime.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "container.runtime cannot be empty".to_string(),
            ));
        }
        if self.container.instance.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "container.instance cannot be empty".to_string(),
            ));
        }
        if self.container.image.trim().is_empty() || self.container.tag.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "container.image and container.tag cannot be empty".to_string(),
            ));
        }
        if self.healthcheck.attempts == 0 {
            return Err(ConfigError::Invalid(
                "healthcheck.attempts must be at least 1".to_string(),
            ));
        }
        if self.stage_timeout_secs == Some(0) {
            return Err(ConfigError::Invalid(
                "stage_timeout_secs must be positive".to_string(),
            ));
        }
        if let Some(gate) = self.gates.iter().find(|g| g.label.trim().is_empty()) {
            return Err(ConfigError::Invalid(format!(
                "gate '{}' needs a label",
                gate.command
            )));
        }
        Ok(())
    }

    /// The image the build stage produces.
    #[must_use]
    pub fn artifact(&self) -> Artifact {
        Artifact::new(&self.container.image, &self.container.tag)
    }

    /// The container the launch stage starts.
    #[must_use]
    pub fn instance(&self) -> Instance {
        Instance::new(&self.container.instance)
    }

    /// Gets the per-stage timeout as a Duration.
    #[must_use]
    pub fn stage_timeout(&self) -> Option<Duration> {
        self.stage_timeout_secs.map(Duration::from_secs)
    }
}

/// Container runtime settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerConfig {
    /// Runtime binary (e.g. `docker`, `podman`).
    #[serde(default = "default_runtime")]
    pub runtime: String,
    /// Image name to build.
    #[serde(default = "default_service")]
    pub image: String,
    /// Image tag.
    #[serde(default = "default_tag")]
    pub tag: String,
    /// Name given to the launched container.
    #[serde(default = "default_service")]
    pub instance: String,
    /// Build context, relative to the project directory.
    #[serde(default = "default_context")]
    pub context: String,
}

fn default_runtime() -> String {
    "docker".to_string()
}

fn default_service() -> String {
    "standup".to_string()
}

fn default_tag() -> String {
    "latest".to_string()
}

fn default_context() -> String {
    ".".to_string()
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            runtime: default_runtime(),
            image: default_service(),
            tag: default_tag(),
            instance: default_service(),
            context: default_context(),
        }
    }
}

/// Healthcheck poll settings.
///
/// One attempt means a single query that fails immediately if the
/// container is absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthcheckConfig {
    /// Number of queries before failing.
    #[serde(default = "default_attempts")]
    pub attempts: u32,
    /// Delay between queries in milliseconds.
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,
}

const fn default_attempts() -> u32 {
    1
}

const fn default_delay_ms() -> u64 {
    1000
}

impl Default for HealthcheckConfig {
    fn default() -> Self {
        Self {
            attempts: default_attempts(),
            delay_ms: default_delay_ms(),
        }
    }
}

impl HealthcheckConfig {
    /// Gets the delay as a Duration.
    #[must_use]
    pub const fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

/// One quality gate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateConfig {
    /// Short label; the stage is named `gate(<label>)`.
    pub label: String,
    /// Command to run.
    pub command: CommandLine,
}

impl GateConfig {
    /// Creates a new gate.
    #[must_use]
    pub fn new(label: impl Into<String>, command: CommandLine) -> Self {
        Self {
            label: label.into(),
            command,
        }
    }
}
