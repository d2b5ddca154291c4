//! Error handling and processing statistics.
//!
//! This module provides:
//! - Error type definitions (initialization, lookup and retry errors)
//! - The failure taxonomy used for per-run counters
//! - Processing statistics tracking
//!
//! Single-item failures are captured in results and counted here; they never
//! abort a batch.

mod stats;
mod types;

// Re-export public API
pub use stats::ProcessingStats;
pub use types::{ErrorType, InitializationError, LookupError, RetryError};

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use strum::IntoEnumIterator;

    #[test]
    fn test_processing_stats_initialization() {
        let stats = ProcessingStats::new();
        for error_type in ErrorType::iter() {
            assert_eq!(stats.get_error_count(error_type), 0);
        }
        assert_eq!(stats.total_errors(), 0);
    }

    #[test]
    fn test_processing_stats_increment() {
        let stats = ProcessingStats::new();
        stats.increment_error(ErrorType::Timeout);
        stats.increment_error(ErrorType::Timeout);
        stats.increment_error(ErrorType::LoopDetected);
        assert_eq!(stats.get_error_count(ErrorType::Timeout), 2);
        assert_eq!(stats.get_error_count(ErrorType::LoopDetected), 1);
        assert_eq!(stats.total_errors(), 3);
    }

    #[tokio::test]
    async fn test_processing_stats_concurrent_increments() {
        let stats = Arc::new(ProcessingStats::new());
        let mut handles = Vec::new();
        for _ in 0..10 {
            let stats = Arc::clone(&stats);
            handles.push(tokio::spawn(async move {
                for _ in 0..100 {
                    stats.increment_error(ErrorType::NetworkError);
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(stats.get_error_count(ErrorType::NetworkError), 1000);
    }
}
