//! Counting semaphore that bounds in-flight operations.

use std::sync::Arc;

use tokio::sync::{AcquireError, OwnedSemaphorePermit, Semaphore};

/// Bounded-permit limiter.
///
/// Waiters are served in FIFO order: a released permit goes to the oldest
/// waiter before it becomes available to new callers. A limiter built with
/// zero permits never admits anyone.
///
/// Cloning shares the same permit pool.
#[derive(Debug, Clone)]
pub struct ConcurrencyLimiter {
    semaphore: Arc<Semaphore>,
    capacity: usize,
}

/// A held permit. Dropping it releases the permit, so every acquire is paired
/// with exactly one release on all paths, including errors and cancellation.
#[derive(Debug)]
pub struct LimiterPermit {
    _permit: OwnedSemaphorePermit,
}

impl ConcurrencyLimiter {
    /// Creates a limiter with `permits` slots.
    pub fn new(permits: usize) -> Self {
        let capacity = permits.min(Semaphore::MAX_PERMITS);
        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    /// Waits for a free slot.
    ///
    /// # Errors
    ///
    /// Only fails if the underlying semaphore was closed, which this type never
    /// does; the error is surfaced rather than hidden.
    pub async fn acquire(&self) -> Result<LimiterPermit, AcquireError> {
        let permit = Arc::clone(&self.semaphore).acquire_owned().await?;
        Ok(LimiterPermit { _permit: permit })
    }

    /// Takes a slot only if one is free right now.
    pub fn try_acquire(&self) -> Option<LimiterPermit> {
        Arc::clone(&self.semaphore)
            .try_acquire_owned()
            .ok()
            .map(|permit| LimiterPermit { _permit: permit })
    }

    /// Slots currently free.
    pub fn available_permits(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Total slots this limiter was created with.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
