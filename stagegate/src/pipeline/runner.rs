//! Sequential fail-fast pipeline execution.

use super::{Expectation, Pipeline, PipelineRun, StageSpec};
use crate::core::{PipelineEvent, TeardownOutcome};
use crate::errors::{FailureReason, StagegateError};
use crate::events::{EventSink, NoOpEventSink};
use crate::stages::{Executor, Invocation};
use std::sync::Arc;
use tracing::debug;

/// What one stage execution produced.
#[derive(Debug)]
struct Verdict {
    exit_code: Option<i32>,
    attempts: u32,
    result: Result<(), FailureReason>,
}

/// Executes pipelines one stage at a time, stopping at the first failure.
///
/// The runner's own tracing output is `DEBUG` detail; user-facing progress
/// goes through the configured [`EventSink`].
///
/// Each stage's command runs to completion before the next stage starts.
/// Side effects of completed stages are never rolled back.
#[derive(Clone)]
pub struct PipelineRunner {
    executor: Arc<dyn Executor>,
    sink: Arc<dyn EventSink>,
}

impl std::fmt::Debug for PipelineRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineRunner")
            .field("executor", &self.executor)
            .finish_non_exhaustive()
    }
}

impl PipelineRunner {
    /// Creates a runner that discards events.
    #[must_use]
    pub fn new(executor: Arc<dyn Executor>) -> Self {
        Self {
            executor,
            sink: Arc::new(NoOpEventSink),
        }
    }

    /// Sets the event sink.
    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Runs every stage of `pipeline` in order.
    ///
    /// A stage passes iff its command exits zero (and, for healthchecks, the
    /// instance is listed). On the first failure the remaining stages are
    /// skipped without being invoked and the run fails.
    ///
    /// # Errors
    ///
    /// Returns an error only if the run record rejects a state transition,
    /// which a freshly created run never does. Stage failures are reported
    /// through the returned run, not as `Err`.
    pub async fn run(&self, pipeline: &Pipeline) -> Result<PipelineRun, StagegateError> {
        let mut run = PipelineRun::new(pipeline);
        run.start()?;

        let run_id = run.id().to_string();
        debug!(
            pipeline = %pipeline.name(),
            run_id = %run_id,
            stages = pipeline.stage_count(),
            "Pipeline started"
        );
        self.sink
            .emit(&PipelineEvent::pipeline_started(
                pipeline.name(),
                &run_id,
                pipeline.stage_count(),
            ))
            .await;

        for (index, spec) in pipeline.stages().iter().enumerate() {
            if let Some(outcome) = run.stage_mut(index) {
                outcome.start();
            }
            debug!(stage = %spec.name, class = %spec.class, command = %spec.command, "Stage started");
            self.sink
                .emit(&PipelineEvent::stage_started(&spec.name, &spec.class.to_string()))
                .await;

            let verdict = self.execute_stage(pipeline, spec).await;

            match verdict.result {
                Ok(()) => {
                    let mut elapsed = 0;
                    if let Some(outcome) = run.stage_mut(index) {
                        outcome.pass(verdict.exit_code, verdict.attempts);
                        elapsed = outcome.duration_ms().unwrap_or_default();
                    }
                    debug!(stage = %spec.name, duration_ms = elapsed, "Stage passed");
                    self.sink
                        .emit(&PipelineEvent::stage_passed(&spec.name, elapsed))
                        .await;
                }
                Err(reason) => {
                    debug!(stage = %spec.name, class = %spec.class, reason = %reason, "Stage failed");
                    self.sink
                        .emit(&PipelineEvent::stage_failed(&spec.name, &reason.to_string()))
                        .await;
                    if let Some(outcome) = run.stage_mut(index) {
                        outcome.fail(verdict.exit_code, verdict.attempts, reason.clone());
                    }
                    run.record_failure(index, reason);
                    break;
                }
            }
        }

        let skipped = run.skip_remaining();
        if !skipped.is_empty() {
            debug!(count = skipped.len(), stages = ?skipped, "Skipping remaining stages");
        }
        for name in &skipped {
            self.sink
                .emit(&PipelineEvent::stage_skipped(name, "an earlier stage failed"))
                .await;
        }

        let status = run.finish()?;
        let failed_stage = run.first_failure().map(|f| f.stage.clone());
        debug!(
            pipeline = %pipeline.name(),
            status = %status,
            failed_stage = ?failed_stage,
            duration_ms = run.duration_ms().unwrap_or_default(),
            "Pipeline completed"
        );
        self.sink
            .emit(&PipelineEvent::pipeline_completed(
                pipeline.name(),
                &status.to_string(),
                failed_stage.as_deref(),
            ))
            .await;

        if run.launched() {
            self.teardown(pipeline, &mut run).await;
        }

        Ok(run)
    }

    /// Runs a stage, polling healthchecks up to their attempt limit.
    async fn execute_stage(&self, pipeline: &Pipeline, spec: &StageSpec) -> Verdict {
        let attempts = spec.poll.attempts.max(1);
        let mut attempt = 1;

        loop {
            let (exit_code, result) = self.attempt(pipeline, spec).await;

            if result.is_ok() || attempt >= attempts {
                return Verdict {
                    exit_code,
                    attempts: attempt,
                    result,
                };
            }

            let delay = spec.poll.delay;
            debug!(
                stage = %spec.name,
                attempt,
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                "Healthcheck not satisfied, polling again"
            );
            self.sink
                .emit(&PipelineEvent::stage_retrying(
                    &spec.name,
                    attempt,
                    u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                ))
                .await;
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }

    /// Invokes the stage command once and judges the result.
    async fn attempt(
        &self,
        pipeline: &Pipeline,
        spec: &StageSpec,
    ) -> (Option<i32>, Result<(), FailureReason>) {
        let mut invocation = Invocation::new(spec.command.clone())
            .in_dir(pipeline.working_dir().map(std::path::Path::to_path_buf))
            .with_timeout(spec.timeout);
        if matches!(spec.expectation, Expectation::InstanceListed { .. }) {
            invocation = invocation.capturing();
        }

        let outcome = match self.executor.execute(&invocation).await {
            Ok(outcome) => outcome,
            Err(err) => return (None, Err(err.into())),
        };

        let result = match (outcome.code, &spec.expectation) {
            (Some(0), Expectation::ExitSuccess) => Ok(()),
            (Some(0), Expectation::InstanceListed { instance }) => {
                if instance.is_listed_in(&outcome.stdout) {
                    Ok(())
                } else {
                    Err(FailureReason::InstanceNotFound {
                        instance: instance.name.clone(),
                    })
                }
            }
            (Some(code), _) => Err(FailureReason::ExitCode { code }),
            (None, _) => Err(FailureReason::Terminated),
        };

        (outcome.code, result)
    }

    /// Runs teardown commands best-effort; failures are recorded, not fatal.
    async fn teardown(&self, pipeline: &Pipeline, run: &mut PipelineRun) {
        for command in pipeline.teardown() {
            let invocation = Invocation::new(command.clone())
                .in_dir(pipeline.working_dir().map(std::path::Path::to_path_buf));

            let outcome = match self.executor.execute(&invocation).await {
                Ok(outcome) if outcome.success() => TeardownOutcome {
                    command: command.to_string(),
                    exit_code: outcome.code,
                    error: None,
                },
                Ok(outcome) => TeardownOutcome {
                    command: command.to_string(),
                    exit_code: outcome.code,
                    error: Some(match outcome.code {
                        Some(code) => FailureReason::ExitCode { code }.to_string(),
                        None => FailureReason::Terminated.to_string(),
                    }),
                },
                Err(err) => TeardownOutcome {
                    command: command.to_string(),
                    exit_code: None,
                    error: Some(err.to_string()),
                },
            };

            if let Some(error) = &outcome.error {
                debug!(command = %command, error = %error, "Teardown command failed");
            } else {
                debug!(command = %command, "Teardown command completed");
            }
            self.sink
                .emit(&PipelineEvent::teardown_completed(
                    &outcome.command,
                    outcome.succeeded(),
                ))
                .await;
            run.push_teardown(outcome);
        }
    }
}
