//! Observability utilities.

mod logging;

pub use logging::{build_subscriber, init_tracing, LogFormat};
