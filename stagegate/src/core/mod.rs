//! Core domain model types for stagegate.
//!
//! This module contains the fundamental types used throughout the crate:
//! - Stage class and status enums
//! - Per-stage outcomes
//! - Pipeline lifecycle events
//! - The artifact and instance a pipeline targets

mod event;
mod outcome;
mod status;
mod target;

pub use event::PipelineEvent;
pub use outcome::{StageOutcome, TeardownOutcome};
pub use status::{RunStatus, StageClass, StageStatus};
pub use target::{Artifact, Instance};
