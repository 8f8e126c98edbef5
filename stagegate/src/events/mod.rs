//! Event sink system for observability.
//!
//! Sinks are injected into the runner; there is no process-wide sink.

mod sink;

pub use sink::{CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink};
