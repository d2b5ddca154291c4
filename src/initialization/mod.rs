//! Shared resource setup: logger and DNS resolver.
//!
//! All initialization functions return [`InitializationError`](crate::error_handling::InitializationError)
//! rather than panicking.

mod logger;
mod resolver;

pub use logger::init_logger_with;
pub use resolver::init_resolver;
