//! Pipeline lifecycle events.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// An event emitted by the runner during a pipeline run.
///
/// Events are consumed by event sinks for logging, monitoring, or tests
/// that assert on the order of lifecycle transitions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineEvent {
    /// The event type (e.g., "stage.started", "pipeline.completed").
    #[serde(rename = "type")]
    pub event_type: String,

    /// When the event occurred (ISO 8601).
    pub timestamp: String,

    /// The event payload data.
    #[serde(default)]
    pub data: BTreeMap<String, serde_json::Value>,
}

impl PipelineEvent {
    /// Creates a new event.
    #[must_use]
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            timestamp: crate::utils::iso_timestamp(),
            data: BTreeMap::new(),
        }
    }

    /// Adds a data field to the event.
    #[must_use]
    pub fn add_data(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.data.insert(key.into(), value);
        self
    }

    /// Returns the `stage` field, if the event concerns a stage.
    #[must_use]
    pub fn stage(&self) -> Option<&str> {
        self.data.get("stage").and_then(serde_json::Value::as_str)
    }

    /// Creates a "pipeline.started" event.
    #[must_use]
    pub fn pipeline_started(pipeline: &str, run_id: &str, stage_count: usize) -> Self {
        Self::new("pipeline.started")
            .add_data("pipeline", serde_json::json!(pipeline))
            .add_data("run_id", serde_json::json!(run_id))
            .add_data("stage_count", serde_json::json!(stage_count))
    }

    /// Creates a "pipeline.completed" event.
    #[must_use]
    pub fn pipeline_completed(pipeline: &str, status: &str, failed_stage: Option<&str>) -> Self {
        Self::new("pipeline.completed")
            .add_data("pipeline", serde_json::json!(pipeline))
            .add_data("status", serde_json::json!(status))
            .add_data("failed_stage", serde_json::json!(failed_stage))
    }

    /// Creates a "stage.started" event.
    #[must_use]
    pub fn stage_started(stage_name: &str, class: &str) -> Self {
        Self::new("stage.started")
            .add_data("stage", serde_json::json!(stage_name))
            .add_data("class", serde_json::json!(class))
    }

    /// Creates a "stage.passed" event.
    #[must_use]
    pub fn stage_passed(stage_name: &str, duration_ms: u64) -> Self {
        Self::new("stage.passed")
            .add_data("stage", serde_json::json!(stage_name))
            .add_data("duration_ms", serde_json::json!(duration_ms))
    }

    /// Creates a "stage.failed" event.
    #[must_use]
    pub fn stage_failed(stage_name: &str, error: &str) -> Self {
        Self::new("stage.failed")
            .add_data("stage", serde_json::json!(stage_name))
            .add_data("error", serde_json::json!(error))
    }

    /// Creates a "stage.retrying" event for a healthcheck poll.
    #[must_use]
    pub fn stage_retrying(stage_name: &str, attempt: u32, delay_ms: u64) -> Self {
        Self::new("stage.retrying")
            .add_data("stage", serde_json::json!(stage_name))
            .add_data("attempt", serde_json::json!(attempt))
            .add_data("delay_ms", serde_json::json!(delay_ms))
    }

    /// Creates a "stage.skipped" event.
    #[must_use]
    pub fn stage_skipped(stage_name: &str, reason: &str) -> Self {
        Self::new("stage.skipped")
            .add_data("stage", serde_json::json!(stage_name))
            .add_data("reason", serde_json::json!(reason))
    }

    /// Creates a "teardown.completed" event.
    #[must_use]
    pub fn teardown_completed(command: &str, succeeded: bool) -> Self {
        Self::new("teardown.completed")
            .add_data("command", serde_json::json!(command))
            .add_data("succeeded", serde_json::json!(succeeded))
    }
}
