//! Application configuration and constants.
//!
//! This module provides:
//! - Configuration constants (timeouts, retry parameters, batch presets, limits)
//! - CLI option types and parsing

mod constants;
mod types;

// Re-export all constants
pub use constants::*;
pub use types::{trace_concurrency, trace_timeout_ms, Config, LogFormat, LogLevel, Opt, RunMode};
