//! Two-level batch executor: sequential batches, bounded concurrency inside
//! each batch, retry per item.

use std::future::Future;
use std::time::{Duration, Instant};

use anyhow::Error;
use futures::future::join_all;

use super::limiter::ConcurrencyLimiter;
use super::retry::{retry, RetryPolicy};
use crate::config::{
    BATCH_CONCURRENCY, BATCH_SIZE, CSV_BATCH_CONCURRENCY, CSV_BATCH_RETRIES,
    CSV_BATCH_RETRY_DELAY_MS, CSV_BATCH_SIZE, DNS_BATCH_CONCURRENCY, DNS_BATCH_RETRIES,
    DNS_BATCH_RETRY_DELAY_MS, DNS_BATCH_SIZE, LOGGING_INTERVAL, RETRY_INITIAL_DELAY_MS,
    RETRY_MAX_ATTEMPTS,
};
use crate::error_handling::RetryError;

/// Batch sizing and per-item retry settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchConfig {
    /// Items per batch. Batches run one after another.
    pub batch_size: usize,
    /// Items of one batch allowed in flight at once.
    pub concurrency: usize,
    /// Total attempts per item (not additional retries). Zero fails every item
    /// without invoking the processor.
    pub retries: u32,
    /// Base delay for the exponential backoff between attempts.
    pub retry_delay: Duration,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            batch_size: BATCH_SIZE,
            concurrency: BATCH_CONCURRENCY,
            retries: RETRY_MAX_ATTEMPTS,
            retry_delay: Duration::from_millis(RETRY_INITIAL_DELAY_MS),
        }
    }
}

impl BatchConfig {
    /// Preset for network-bound DNS lookups.
    pub fn for_dns() -> Self {
        Self {
            batch_size: DNS_BATCH_SIZE,
            concurrency: DNS_BATCH_CONCURRENCY,
            retries: DNS_BATCH_RETRIES,
            retry_delay: Duration::from_millis(DNS_BATCH_RETRY_DELAY_MS),
        }
    }

    /// Preset for CPU-bound CSV row processing.
    pub fn for_csv() -> Self {
        Self {
            batch_size: CSV_BATCH_SIZE,
            concurrency: CSV_BATCH_CONCURRENCY,
            retries: CSV_BATCH_RETRIES,
            retry_delay: Duration::from_millis(CSV_BATCH_RETRY_DELAY_MS),
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::exponential(self.retries, self.retry_delay)
    }
}

/// An item whose processing failed after all attempts.
#[derive(Debug)]
pub struct BatchFailure<T> {
    pub item: T,
    pub error: Error,
}

/// Aggregate outcome of one [`BatchProcessor::process`] call.
///
/// `successful.len() + failed.len() == total_processed`. Both vectors keep
/// the relative input order of their items.
#[derive(Debug)]
pub struct BatchResult<T, R> {
    pub successful: Vec<R>,
    pub failed: Vec<BatchFailure<T>>,
    pub total_processed: usize,
    pub duration: Duration,
}

impl<T, R> BatchResult<T, R> {
    pub fn duration_ms(&self) -> f64 {
        self.duration.as_secs_f64() * 1000.0
    }
}

type ProgressCallback = Box<dyn Fn(usize, usize) + Send + Sync>;
type ErrorCallback<T> = Box<dyn Fn(&Error, &T) + Send + Sync>;

/// Runs a processor over many items with bounded concurrency and retries.
///
/// Items are split into batches of `batch_size`. Inside a batch, every item
/// waits on a [`ConcurrencyLimiter`] of `concurrency` permits, so peak
/// parallelism never exceeds `concurrency` even when `batch_size` is larger.
pub struct BatchProcessor<T> {
    config: BatchConfig,
    on_progress: Option<ProgressCallback>,
    on_error: Option<ErrorCallback<T>>,
}

impl<T: Clone> BatchProcessor<T> {
    pub fn new(config: BatchConfig) -> Self {
        Self {
            config,
            on_progress: None,
            on_error: None,
        }
    }

    /// Called once after each batch with `(processed, total)`.
    pub fn with_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(usize, usize) + Send + Sync + 'static,
    {
        self.on_progress = Some(Box::new(callback));
        self
    }

    /// Called for every item that exhausted its attempts.
    pub fn with_error_handler<F>(mut self, callback: F) -> Self
    where
        F: Fn(&Error, &T) + Send + Sync + 'static,
    {
        self.on_error = Some(Box::new(callback));
        self
    }

    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    /// Processes every item. Failures are collected, never propagated.
    pub async fn process<R, F, Fut>(&self, items: Vec<T>, processor: F) -> BatchResult<T, R>
    where
        F: Fn(T) -> Fut,
        Fut: Future<Output = Result<R, Error>>,
    {
        let start = Instant::now();
        let total = items.len();
        // A zero-permit limiter would never admit anything
        let limiter = ConcurrencyLimiter::new(self.config.concurrency.max(1));
        let policy = self.config.retry_policy();
        let batch_size = self.config.batch_size.max(1);

        let mut successful = Vec::with_capacity(total);
        let mut failed = Vec::new();
        let mut processed = 0usize;
        let mut batch_index = 0usize;

        let mut remaining = items.into_iter();
        loop {
            let batch: Vec<T> = remaining.by_ref().take(batch_size).collect();
            if batch.is_empty() {
                break;
            }
            let batch_len = batch.len();

            let outcomes = join_all(batch.into_iter().map(|item| {
                let limiter = &limiter;
                let policy = &policy;
                let processor = &processor;
                async move {
                    let outcome = match limiter.acquire().await {
                        Ok(permit) => {
                            let result = retry(policy, || processor(item.clone()))
                                .await
                                .map_err(RetryError::into_anyhow);
                            drop(permit);
                            result
                        }
                        Err(e) => Err(Error::new(e).context("Concurrency limiter closed")),
                    };
                    (item, outcome)
                }
            }))
            .await;

            for (item, outcome) in outcomes {
                match outcome {
                    Ok(value) => successful.push(value),
                    Err(error) => {
                        log::debug!("Batch item failed after retries: {error}");
                        if let Some(on_error) = &self.on_error {
                            on_error(&error, &item);
                        }
                        failed.push(BatchFailure { item, error });
                    }
                }
            }

            processed += batch_len;
            batch_index += 1;
            if batch_index % LOGGING_INTERVAL == 0 {
                log::debug!("Batch progress: {processed}/{total} items");
            }
            if let Some(on_progress) = &self.on_progress {
                on_progress(processed, total);
            }
        }

        BatchResult {
            successful,
            failed,
            total_processed: processed,
            duration: start.elapsed(),
        }
    }
}
