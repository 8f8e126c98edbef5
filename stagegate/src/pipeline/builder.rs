//! Pipeline builder with validation.

use super::{CommandLine, StageSpec};
use crate::core::StageClass;
use crate::errors::PipelineValidationError;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// A validated, ordered sequence of stages.
///
/// Only [`PipelineBuilder::build`] constructs one, so every `Pipeline` is
/// non-empty, has unique stage names, lists stage classes in non-decreasing
/// rank, builds and launches at most once, and healthchecks a launched
/// instance before any gate.
#[derive(Debug, Clone, Serialize)]
pub struct Pipeline {
    name: String,
    stages: Vec<StageSpec>,
    working_dir: Option<PathBuf>,
    teardown: Vec<CommandLine>,
}

impl Pipeline {
    /// Returns the pipeline name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the stages in execution order.
    #[must_use]
    pub fn stages(&self) -> &[StageSpec] {
        &self.stages
    }

    /// Returns the number of stages.
    #[must_use]
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    /// Directory stage commands run in.
    #[must_use]
    pub fn working_dir(&self) -> Option<&Path> {
        self.working_dir.as_deref()
    }

    /// Commands run after a run that launched an instance.
    #[must_use]
    pub fn teardown(&self) -> &[CommandLine] {
        &self.teardown
    }
}

/// Builder for creating validated pipelines.
#[derive(Debug, Clone)]
pub struct PipelineBuilder {
    name: String,
    stages: Vec<StageSpec>,
    working_dir: Option<PathBuf>,
    teardown: Vec<CommandLine>,
}

impl PipelineBuilder {
    /// Creates a new pipeline builder.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            stages: Vec::new(),
            working_dir: None,
            teardown: Vec::new(),
        }
    }

    /// Appends a stage to the pipeline.
    ///
    /// # Errors
    ///
    /// Returns an error if the stage is invalid, its name is already used,
    /// its class ranks below the previous stage's class, it repeats a build,
    /// launch or healthcheck stage, or it is a gate following a launch that
    /// no healthcheck verified.
    pub fn stage(mut self, spec: StageSpec) -> Result<Self, PipelineValidationError> {
        self.add_stage(spec)?;
        Ok(self)
    }

    /// Appends a stage in place.
    ///
    /// # Errors
    ///
    /// See [`PipelineBuilder::stage`].
    pub fn add_stage(&mut self, spec: StageSpec) -> Result<(), PipelineValidationError> {
        spec.validate()?;

        if self.stages.iter().any(|s| s.name == spec.name) {
            return Err(PipelineValidationError::new(
                "PIPELINE-DUPLICATE-STAGE",
                format!("Stage '{}' is declared more than once", spec.name),
            )
            .with_stages(vec![spec.name.clone()]));
        }

        if let Some(previous) = self.stages.last() {
            if spec.class.rank() < previous.class.rank() {
                return Err(PipelineValidationError::new(
                    "PIPELINE-OUT-OF-ORDER",
                    format!(
                        "Stage '{}' ({}) cannot follow stage '{}' ({})",
                        spec.name, spec.class, previous.name, previous.class
                    ),
                )
                .with_stages(vec![previous.name.clone(), spec.name.clone()]));
            }
        }

        if matches!(
            spec.class,
            StageClass::Build | StageClass::Launch | StageClass::Healthcheck
        ) {
            if let Some(existing) = self.stages.iter().find(|s| s.class == spec.class) {
                return Err(PipelineValidationError::new(
                    "PIPELINE-DUPLICATE-CLASS",
                    format!(
                        "Stage '{}' is a second {} stage after '{}'",
                        spec.name, spec.class, existing.name
                    ),
                )
                .with_stages(vec![existing.name.clone(), spec.name.clone()]));
            }
        }

        if spec.class == StageClass::Gate {
            let launch = self.stages.iter().find(|s| s.class == StageClass::Launch);
            let verified = self.stages.iter().any(|s| s.class == StageClass::Healthcheck);
            if let (Some(launch), false) = (launch, verified) {
                return Err(PipelineValidationError::new(
                    "PIPELINE-UNVERIFIED-LAUNCH",
                    format!(
                        "Gate '{}' follows launch stage '{}' without a healthcheck",
                        spec.name, launch.name
                    ),
                )
                .with_stages(vec![launch.name.clone(), spec.name.clone()]));
            }
        }

        self.stages.push(spec);
        Ok(())
    }

    /// Sets the directory stage commands run in.
    #[must_use]
    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Adds a teardown command.
    #[must_use]
    pub fn teardown(mut self, command: CommandLine) -> Self {
        self.teardown.push(command);
        self
    }

    /// Builds the pipeline.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is blank or the builder has no stages.
    pub fn build(self) -> Result<Pipeline, PipelineValidationError> {
        if self.name.trim().is_empty() {
            return Err(PipelineValidationError::new(
                "PIPELINE-EMPTY-NAME",
                "Pipeline name cannot be empty or whitespace-only",
            ));
        }

        if self.stages.is_empty() {
            return Err(PipelineValidationError::new(
                "PIPELINE-EMPTY",
                "Pipeline has no stages",
            ));
        }

        Ok(Pipeline {
            name: self.name,
            stages: self.stages,
            working_dir: self.working_dir,
            teardown: self.teardown,
        })
    }

    /// Returns the pipeline name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the number of stages.
    #[must_use]
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }
}
