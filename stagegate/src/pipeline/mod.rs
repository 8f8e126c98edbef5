//! Pipeline building and execution.
//!
//! This module provides:
//! - Stage specifications
//! - Pipeline builder with validation
//! - The sequential fail-fast runner and its run record
//! - The standard build, launch, healthcheck and gate pipeline

mod builder;
mod run;
mod runner;
mod spec;
mod standard;

pub use builder::{Pipeline, PipelineBuilder};
pub use run::{PipelineRun, GENERIC_FAILURE_EXIT_CODE};
pub use runner::PipelineRunner;
pub use spec::{CommandLine, Expectation, PollPolicy, StageSpec};
pub use standard::standard_pipeline;
