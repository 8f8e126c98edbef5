//! The standard deployment-validation pipeline.

use super::{CommandLine, Pipeline, PipelineBuilder, PollPolicy, StageSpec};
use crate::config::PipelineConfig;
use crate::errors::PipelineValidationError;

/// Builds the declared pipeline from a configuration.
///
/// Stages, in order: `setup`, `build`, `launch`, `healthcheck`, then one
/// `gate(<label>)` per configured gate. Every stage runs in the configured
/// project directory.
///
/// # Errors
///
/// Returns an error if the resulting stage list fails validation (for
/// example, two gates with the same label).
pub fn standard_pipeline(config: &PipelineConfig) -> Result<Pipeline, PipelineValidationError> {
    let runtime = config.container.runtime.as_str();
    let artifact = config.artifact();
    let instance = config.instance();
    let timeout = config.stage_timeout();

    let with_timeout = |spec: StageSpec| match timeout {
        Some(limit) => spec.with_timeout(limit),
        None => spec,
    };

    let mut builder = PipelineBuilder::new(&config.name).working_dir(&config.project_dir);

    builder.add_stage(with_timeout(StageSpec::setup(config.install.clone())))?;
    builder.add_stage(with_timeout(StageSpec::build(CommandLine::new(
        runtime,
        [
            "build".to_string(),
            "-t".to_string(),
            artifact.reference(),
            config.container.context.clone(),
        ],
    ))))?;
    builder.add_stage(with_timeout(StageSpec::launch(CommandLine::new(
        runtime,
        [
            "run".to_string(),
            "-d".to_string(),
            "--name".to_string(),
            instance.name.clone(),
            artifact.reference(),
        ],
    ))))?;
    builder.add_stage(with_timeout(
        StageSpec::healthcheck(
            CommandLine::new(runtime, ["ps", "--format", "{{.Names}}"]),
            instance.clone(),
        )
        .with_poll(PollPolicy::bounded(
            config.healthcheck.attempts,
            config.healthcheck.delay(),
        )),
    ))?;

    for gate in &config.gates {
        builder.add_stage(with_timeout(StageSpec::gate(&gate.label, gate.command.clone())))?;
    }

    if config.teardown {
        builder = builder.teardown(CommandLine::new(
            runtime,
            ["rm".to_string(), "-f".to_string(), instance.name],
        ));
    }

    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GateConfig;
    use crate::core::StageClass;
    use crate::pipeline::Expectation;
    use pretty_assertions::assert_eq;
    use std::path::Path;
    use std::time::Duration;

    fn rendered(pipeline: &Pipeline) -> Vec<(String, String)> {
        pipeline
            .stages()
            .iter()
            .map(|s| (s.name.clone(), s.command.to_string()))
            .collect()
    }

    #[test]
    fn test_default_pipeline_declares_eight_stages() {
        let pipeline = standard_pipeline(&PipelineConfig::default()).unwrap();

        let expected = vec![
            ("setup", "poetry install"),
            ("build", "docker build -t standup:latest ."),
            ("launch", "docker run -d --name standup standup:latest"),
            ("healthcheck", "docker ps --format {{.Names}}"),
            ("gate(format)", "poetry run black --check ."),
            ("gate(types)", "poetry run mypy --ignore-missing-imports standup tests"),
            ("gate(lint)", "poetry run pylint standup"),
            ("gate(tests)", "poetry run pytest"),
        ];
        let expected: Vec<(String, String)> = expected
            .into_iter()
            .map(|(a, b)| (a.to_string(), b.to_string()))
            .collect();

        assert_eq!(rendered(&pipeline), expected);
        assert_eq!(pipeline.name(), "standup-ci");
        assert_eq!(pipeline.working_dir(), Some(Path::new(".")));
        assert!(pipeline.teardown().is_empty());
    }

    #[test]
    fn test_default_healthcheck_is_single_shot() {
        let pipeline = standard_pipeline(&PipelineConfig::default()).unwrap();
        let health = &pipeline.stages()[3];

        assert_eq!(health.class, StageClass::Healthcheck);
        assert_eq!(health.poll.attempts, 1);
        assert!(matches!(
            health.expectation,
            Expectation::InstanceListed { ref instance } if instance.name == "standup"
        ));
        assert!(pipeline.stages().iter().all(|s| s.timeout.is_none()));
    }

    #[test]
    fn test_config_extensions_applied() {
        let mut config = PipelineConfig::default();
        config.container.runtime = "podman".to_string();
        config.healthcheck.attempts = 4;
        config.healthcheck.delay_ms = 250;
        config.stage_timeout_secs = Some(900);
        config.teardown = true;

        let pipeline = standard_pipeline(&config).unwrap();

        assert_eq!(pipeline.stages()[3].poll, PollPolicy::bounded(4, Duration::from_millis(250)));
        assert!(pipeline
            .stages()
            .iter()
            .all(|s| s.timeout == Some(Duration::from_secs(900))));
        assert_eq!(pipeline.teardown().len(), 1);
        assert_eq!(pipeline.teardown()[0].to_string(), "podman rm -f standup");
    }

    #[test]
    fn test_duplicate_gate_labels_rejected() {
        let mut config = PipelineConfig::default();
        config
            .gates
            .push(GateConfig::new("lint", CommandLine::new("ruff", ["check"])));

        let err = standard_pipeline(&config).unwrap_err();
        assert_eq!(err.code, "PIPELINE-DUPLICATE-STAGE");
    }

    #[test]
    fn test_no_gates_still_builds() {
        let mut config = PipelineConfig::default();
        config.gates.clear();
        let pipeline = standard_pipeline(&config).unwrap();
        assert_eq!(pipeline.stage_count(), 4);
    }
}
