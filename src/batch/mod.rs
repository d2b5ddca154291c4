//! Bounded-concurrency batch execution.
//!
//! This module provides the building blocks shared by bulk DNS lookups and
//! chain tracing:
//! - [`ConcurrencyLimiter`]: FIFO counting semaphore with RAII permits
//! - [`retry`] / [`retry_with`]: bounded retries with fixed or exponential backoff
//! - [`BatchProcessor`]: sequential batches, bounded fan-out inside each batch
//!
//! Everything inside a batch runs on the calling task; concurrency comes from
//! interleaving at await points, not from spawned tasks.

mod limiter;
mod processor;
mod retry;

pub use limiter::{ConcurrencyLimiter, LimiterPermit};
pub use processor::{BatchConfig, BatchFailure, BatchProcessor, BatchResult};
pub use retry::{retry, retry_with, Backoff, RetryPolicy};
