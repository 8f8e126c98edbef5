//! Human and JSON renderings of plans and runs.

use crate::core::StageStatus;
use crate::errors::StagegateError;
use crate::pipeline::{Expectation, Pipeline, PipelineRun};
use std::fmt::Write as _;
use std::path::Path;
use tracing::info;

/// Renders the stages a pipeline would execute, one per line.
#[must_use]
pub fn render_plan(pipeline: &Pipeline) -> String {
    let width = name_width(pipeline.stages().iter().map(|s| s.name.as_str()));
    let mut out = format!("Pipeline '{}'\n", pipeline.name());

    for (index, stage) in pipeline.stages().iter().enumerate() {
        let _ = write!(
            out,
            "{:>2}. {:<width$}  {:<11}  {}",
            index + 1,
            stage.name,
            stage.class.to_string(),
            stage.command,
        );
        if let Expectation::InstanceListed { instance } = &stage.expectation {
            let _ = write!(out, "  (expects '{instance}'");
            if stage.poll.retries() {
                let _ = write!(
                    out,
                    ", {} attempts every {}ms",
                    stage.poll.attempts,
                    stage.poll.delay.as_millis()
                );
            }
            out.push(')');
        }
        out.push('\n');
    }

    for command in pipeline.teardown() {
        let _ = writeln!(out, "    teardown: {command}");
    }
    out
}

/// Renders a run as a summary table followed by the verdict.
#[must_use]
pub fn render_summary(run: &PipelineRun) -> String {
    let width = name_width(run.stages().iter().map(|s| s.name.as_str()));
    let mut out = format!("Pipeline '{}' run {}\n", run.pipeline(), run.id());

    for stage in run.stages() {
        let marker = match stage.status {
            StageStatus::Passed => "ok",
            StageStatus::Failed => "FAIL",
            StageStatus::Skipped => "skip",
            StageStatus::Pending | StageStatus::Running => "..",
        };
        let _ = write!(out, "  [{marker:>4}] {:<width$}", stage.name);
        if let Some(ms) = stage.duration_ms() {
            let _ = write!(out, "  {ms}ms");
        }
        if let Some(reason) = &stage.failure {
            let _ = write!(out, "  {reason}");
        }
        out.push('\n');
    }

    for teardown in run.teardown() {
        match &teardown.error {
            None => {
                let _ = writeln!(out, "  teardown '{}' ok", teardown.command);
            }
            Some(error) => {
                let _ = writeln!(out, "  teardown '{}' failed: {error}", teardown.command);
            }
        }
    }

    match run.first_failure() {
        None => {
            let _ = writeln!(out, "Result: {}", run.status());
        }
        Some(failure) => {
            let _ = writeln!(out, "Result: {} ({failure})", run.status());
        }
    }
    out
}

/// Serializes a run as pretty JSON.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn to_json(run: &PipelineRun) -> Result<String, StagegateError> {
    Ok(serde_json::to_string_pretty(run)?)
}

/// Writes a JSON run report to `path`.
///
/// # Errors
///
/// Returns an error if serialization or the write fails.
pub fn write_json_report(run: &PipelineRun, path: &Path) -> Result<(), StagegateError> {
    std::fs::write(path, to_json(run)?)?;
    info!(path = %path.display(), "Wrote run report");
    Ok(())
}

fn name_width<'a>(names: impl Iterator<Item = &'a str>) -> usize {
    names.map(str::len).max().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineConfig;
    use crate::pipeline::{standard_pipeline, PipelineRunner};
    use crate::testing::{ScriptedExecutor, ScriptedResponse};
    use std::sync::Arc;

    async fn failed_run() -> PipelineRun {
        let executor = ScriptedExecutor::new()
            .respond("docker ps --format {{.Names}}", ScriptedResponse::stdout("standup"))
            .respond("poetry run pylint standup", ScriptedResponse::fail(16));
        let pipeline = standard_pipeline(&PipelineConfig::default()).unwrap();
        PipelineRunner::new(Arc::new(executor))
            .run(&pipeline)
            .await
            .unwrap()
    }

    #[test]
    fn test_render_plan_lists_stages_in_order() {
        let mut config = PipelineConfig::default();
        config.healthcheck.attempts = 3;
        config.teardown = true;
        let plan = render_plan(&standard_pipeline(&config).unwrap());

        let lines: Vec<&str> = plan.lines().collect();
        assert_eq!(lines[0], "Pipeline 'standup-ci'");
        assert!(lines[1].starts_with(" 1. setup"));
        assert!(lines[4].contains("expects 'standup', 3 attempts every 1000ms"));
        assert!(lines[8].contains("poetry run pytest"));
        assert_eq!(lines[9], "    teardown: docker rm -f standup");
    }

    #[tokio::test]
    async fn test_render_summary_marks_failure_and_skips() {
        let summary = render_summary(&failed_run().await);

        assert!(summary.contains("[FAIL] gate(lint)"));
        assert!(summary.contains("exited with status 16"));
        assert!(summary.contains("[skip] gate(tests)"));
        assert!(summary
            .lines()
            .last()
            .unwrap()
            .starts_with("Result: failed (gate failure at stage 'gate(lint)'"));
    }

    #[tokio::test]
    async fn test_write_json_report() {
        let run = failed_run().await;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.json");

        write_json_report(&run, &path).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["pipeline"], "standup-ci");
        assert_eq!(value["id"], run.id().to_string());
        assert_eq!(value["first_failure"]["reason"]["code"], 16);
    }
}
