//! Utility functions for stagegate.

mod timestamps;

pub use timestamps::{duration_ms, iso_timestamp, now_utc, Timestamp};
