//! Test assertions for pipeline runs.

use crate::core::{RunStatus, StageStatus};
use crate::errors::FailureKind;
use crate::pipeline::PipelineRun;

/// Asserts that the run passed.
pub fn assert_run_passed(run: &PipelineRun) {
    assert_eq!(
        run.status(),
        RunStatus::Passed,
        "Expected run to pass, first failure: {:?}",
        run.first_failure()
    );
}

/// Asserts that the run failed first at `stage` with the given kind.
pub fn assert_run_failed_at(run: &PipelineRun, stage: &str, kind: FailureKind) {
    assert_eq!(run.status(), RunStatus::Failed, "Expected run to fail");
    let failure = run
        .first_failure()
        .unwrap_or_else(|| panic!("Failed run has no recorded failure"));
    assert_eq!(failure.stage, stage, "Unexpected first failing stage");
    assert_eq!(failure.kind, kind, "Unexpected failure kind");
}

/// Asserts that exactly `expected` stages were invoked, in this order.
pub fn assert_invoked_in_order(run: &PipelineRun, expected: &[&str]) {
    assert_eq!(
        run.invoked_stages(),
        expected,
        "Unexpected invoked stages"
    );
}

/// Asserts that `stage` was skipped and never invoked.
pub fn assert_never_invoked(run: &PipelineRun, stage: &str) {
    let outcome = run
        .stage(stage)
        .unwrap_or_else(|| panic!("No stage named '{stage}' in run"));
    assert_eq!(
        outcome.status,
        StageStatus::Skipped,
        "Expected stage '{stage}' to be skipped, got {:?}",
        outcome.status
    );
    assert_eq!(outcome.attempts, 0, "Skipped stage '{stage}' recorded attempts");
}
