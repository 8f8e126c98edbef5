//! # Stagegate
//!
//! A gated build-launch-verify pipeline for a containerized service.
//!
//! Stagegate runs a fixed sequence of stages:
//!
//! - **Setup**: install project dependencies
//! - **Build**: build the container image
//! - **Launch**: start a detached container instance
//! - **Healthcheck**: confirm the instance is listed as running
//! - **Gates**: formatting, type checking, linting, and tests
//!
//! Each stage runs only if every stage before it passed. The first failure
//! stops the run and becomes the run's verdict.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use stagegate::prelude::*;
//! use std::sync::Arc;
//!
//! let config = PipelineConfig::discover(None, &std::env::current_dir()?)?;
//! let pipeline = standard_pipeline(&config)?;
//!
//! let run = PipelineRunner::new(Arc::new(ProcessExecutor::new()))
//!     .run(&pipeline)
//!     .await?;
//! std::process::exit(run.exit_code());
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod cli;
pub mod config;
pub mod core;
pub mod errors;
pub mod events;
pub mod observability;
pub mod pipeline;
pub mod report;
pub mod stages;
pub mod testing;
pub mod utils;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::{GateConfig, PipelineConfig};
    pub use crate::core::{Artifact, Instance, RunStatus, StageClass, StageStatus};
    pub use crate::errors::{
        FailureKind, FailureReason, PipelineValidationError, StageFailure, StagegateError,
    };
    pub use crate::events::{EventSink, LoggingEventSink, NoOpEventSink};
    pub use crate::pipeline::{
        standard_pipeline, CommandLine, Expectation, Pipeline, PipelineBuilder, PipelineRun,
        PipelineRunner, PollPolicy, StageSpec,
    };
    pub use crate::stages::{Executor, ProcessExecutor};
    pub use crate::utils::{iso_timestamp, Timestamp};
}
