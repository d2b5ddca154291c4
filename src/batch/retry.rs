//! Bounded retry with fixed or exponential backoff.

use std::future::Future;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use crate::config::{RETRY_INITIAL_DELAY_MS, RETRY_MAX_ATTEMPTS};
use crate::error_handling::RetryError;

/// Delay growth between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backoff {
    /// The same delay before every retry.
    Fixed,
    /// `delay * 2^i` before retry `i` (starting at 0).
    #[default]
    Exponential,
}

/// How many times to run an operation and how long to wait in between.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, the initial one included. Zero means the operation is
    /// never invoked and [`RetryError::NoAttempts`] is returned.
    pub max_attempts: u32,
    /// Base delay. `Duration::ZERO` retries without waiting.
    pub delay: Duration,
    pub backoff: Backoff,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: RETRY_MAX_ATTEMPTS,
            delay: Duration::from_millis(RETRY_INITIAL_DELAY_MS),
            backoff: Backoff::Exponential,
        }
    }
}

impl RetryPolicy {
    pub fn fixed(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
            backoff: Backoff::Fixed,
        }
    }

    pub fn exponential(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
            backoff: Backoff::Exponential,
        }
    }

    /// The waits between attempts, one fewer than `max_attempts`.
    pub fn delays(&self) -> impl Iterator<Item = Duration> {
        BackoffDelays {
            current: self.delay,
            backoff: self.backoff,
        }
        .take(self.max_attempts.saturating_sub(1) as usize)
    }
}

/// Unbounded delay sequence; [`RetryPolicy::delays`] bounds it.
#[derive(Debug, Clone)]
struct BackoffDelays {
    current: Duration,
    backoff: Backoff,
}

impl Iterator for BackoffDelays {
    type Item = Duration;

    fn next(&mut self) -> Option<Duration> {
        let delay = self.current;
        if self.backoff == Backoff::Exponential {
            self.current = self.current.saturating_mul(2);
        }
        Some(delay)
    }
}

/// Runs `operation` under `policy`, retrying every error.
///
/// # Errors
///
/// Returns the last error once attempts are exhausted, or
/// [`RetryError::NoAttempts`] when `max_attempts` is zero.
pub async fn retry<T, E, Op, Fut>(policy: &RetryPolicy, operation: Op) -> Result<T, RetryError<E>>
where
    Op: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    retry_with(policy, operation, |_: &E| true, |_, _: &E| {}).await
}

/// Runs `operation` under `policy`.
///
/// * `is_retryable` - a `false` answer returns the error immediately.
/// * `on_retry` - called with the 1-based number of the failed attempt,
///   only when another attempt will follow.
///
/// # Errors
///
/// Returns the last error unchanged, or [`RetryError::NoAttempts`] when
/// `max_attempts` is zero.
pub async fn retry_with<T, E, Op, Fut, C, N>(
    policy: &RetryPolicy,
    operation: Op,
    mut is_retryable: C,
    mut on_retry: N,
) -> Result<T, RetryError<E>>
where
    Op: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    C: FnMut(&E) -> bool,
    N: FnMut(u32, &E),
{
    if policy.max_attempts == 0 {
        return Err(RetryError::NoAttempts);
    }

    // Attempt counter shared by the action and the condition
    let attempts = AtomicU32::new(0);
    let mut operation = operation;

    let action = || {
        attempts.fetch_add(1, Ordering::SeqCst);
        operation()
    };

    let condition = |err: &E| {
        if !is_retryable(err) {
            return false;
        }
        let attempt = attempts.load(Ordering::SeqCst);
        if attempt < policy.max_attempts {
            log::debug!("Attempt {attempt}/{} failed, retrying", policy.max_attempts);
            on_retry(attempt, err);
        }
        true
    };

    tokio_retry::RetryIf::spawn(policy.delays(), action, condition)
        .await
        .map_err(RetryError::Operation)
}
