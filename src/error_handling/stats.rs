//! Processing statistics tracking.
//!
//! This module provides thread-safe error counters for a resolution run.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use strum::IntoEnumIterator;

use super::types::ErrorType;

/// Thread-safe processing statistics tracker.
///
/// One atomic counter per [`ErrorType`], all initialized to zero. Share it
/// across tasks with `Arc`.
pub struct ProcessingStats {
    errors: HashMap<ErrorType, AtomicUsize>,
}

impl Default for ProcessingStats {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessingStats {
    pub fn new() -> Self {
        let mut errors = HashMap::new();
        for error in ErrorType::iter() {
            errors.insert(error, AtomicUsize::new(0));
        }
        ProcessingStats { errors }
    }

    /// Increment an error counter.
    pub fn increment_error(&self, error: ErrorType) {
        if let Some(counter) = self.errors.get(&error) {
            counter.fetch_add(1, Ordering::Relaxed);
        } else {
            log::error!(
                "Attempted to increment error counter for {:?} which is not in the map. \
                 This indicates a bug in ProcessingStats initialization.",
                error
            );
        }
    }

    pub fn get_error_count(&self, error: ErrorType) -> usize {
        self.errors
            .get(&error)
            .map(|c| c.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    pub fn total_errors(&self) -> usize {
        self.errors.values().map(|c| c.load(Ordering::Relaxed)).sum()
    }

    /// Logs every non-zero counter.
    pub fn log_summary(&self) {
        let total = self.total_errors();
        if total == 0 {
            return;
        }
        log::info!("Error Counts ({} total):", total);
        for error_type in ErrorType::iter() {
            let count = self.get_error_count(error_type);
            if count > 0 {
                log::info!("   {}: {}", error_type.as_str(), count);
            }
        }
    }
}
