//! Configuration constants.
//!
//! This module defines the defaults used throughout the crate: DNS timeouts,
//! retry parameters, batch presets, chain-tracing limits and ingestion sample
//! sizes.

// DNS resolution
/// Default per-query DNS timeout in milliseconds.
pub const DNS_TIMEOUT_MS: u64 = 5000;
/// Number of attempts the underlying hickory resolver makes per name server.
/// Kept low because the batch layer retries on its own.
pub const DNS_RESOLVER_ATTEMPTS: usize = 1;
/// Port used for custom name servers.
pub const DNS_SERVER_PORT: u16 = 53;

// Retry strategy
/// Default total attempts per item (initial attempt included).
pub const RETRY_MAX_ATTEMPTS: u32 = 3;
/// Default delay before the first retry in milliseconds.
pub const RETRY_INITIAL_DELAY_MS: u64 = 1000;

// Batch presets
/// General purpose batch size.
pub const BATCH_SIZE: usize = 50;
/// General purpose in-batch concurrency.
pub const BATCH_CONCURRENCY: usize = 10;

/// DNS batches are network bound: wide fan-out and a short retry delay.
pub const DNS_BATCH_SIZE: usize = 100;
pub const DNS_BATCH_CONCURRENCY: usize = 50;
pub const DNS_BATCH_RETRIES: u32 = 2;
pub const DNS_BATCH_RETRY_DELAY_MS: u64 = 100;

/// CSV batches are CPU bound: large batches, little parallelism.
pub const CSV_BATCH_SIZE: usize = 1000;
pub const CSV_BATCH_CONCURRENCY: usize = 5;
pub const CSV_BATCH_RETRIES: u32 = 1;
pub const CSV_BATCH_RETRY_DELAY_MS: u64 = 500;

// CNAME chain tracing
/// Maximum number of entries recorded in a chain.
pub const CNAME_MAX_DEPTH: usize = 10;
/// Per-step CNAME lookup timeout in milliseconds.
pub const CNAME_TIMEOUT_MS: u64 = 5000;
/// Concurrent traces in `trace_multiple`.
pub const CNAME_CONCURRENCY: usize = 5;
/// Chains with more entries than this are flagged as long.
pub const LONG_CHAIN_THRESHOLD: usize = 5;
/// Traces slower than this get a performance recommendation.
pub const SLOW_TRACE_THRESHOLD_MS: f64 = 1000.0;

// Health score penalties (weighted by the share of affected chains)
pub const HEALTH_LOOP_PENALTY: f64 = 50.0;
pub const HEALTH_MAX_DEPTH_PENALTY: f64 = 30.0;
pub const HEALTH_LONG_CHAIN_PENALTY: f64 = 20.0;

// Encoding detection
/// Bytes fed to the statistical detector.
pub const DETECTION_SAMPLE_BYTES: usize = 64 * 1024;
/// Confidence reported when the detector cannot make a guess.
pub const FALLBACK_CONFIDENCE: u8 = 50;
/// Maximum number of alternative encodings reported.
pub const MAX_ALTERNATIVES: usize = 3;
/// Confidence at or above which a detection is considered reliable.
pub const HIGH_CONFIDENCE: u8 = 80;

// CSV sniffing
/// Non-empty lines sampled when sniffing delimiters.
pub const CSV_SAMPLE_LINES: usize = 10;
/// Candidate delimiters, in tie-break order.
pub const CSV_DELIMITERS: [u8; 4] = [b',', b';', b'\t', b'|'];

// Domain normalization
/// Maximum length of a domain name in presentation format.
pub const MAX_DOMAIN_LENGTH: usize = 253;
/// Maximum length of a single label.
pub const MAX_LABEL_LENGTH: usize = 63;

/// Progress is logged every this many completed batches.
pub const LOGGING_INTERVAL: usize = 5;
