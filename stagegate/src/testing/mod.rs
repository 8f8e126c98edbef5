//! Testing utilities for stagegate pipelines.
//!
//! This module provides:
//! - A scripted executor that records every invocation
//! - Assertions over pipeline runs

mod assertions;
mod fakes;

pub use assertions::{
    assert_invoked_in_order, assert_never_invoked, assert_run_failed_at, assert_run_passed,
};
pub use fakes::{ScriptedExecutor, ScriptedResponse};
