//! Error type definitions.
//!
//! This module defines the error enums and the error taxonomy used throughout
//! the crate.

use log::SetLoggerError;
use strum_macros::EnumIter as EnumIterMacro;
use thiserror::Error;

/// Error types for initialization failures.
#[derive(Error, Debug)]
#[allow(clippy::enum_variant_names)] // All variants end with "Error" by convention
pub enum InitializationError {
    /// Error initializing the logger.
    #[error("Logger initialization error: {0}")]
    LoggerError(#[from] SetLoggerError),

    /// Error initializing the DNS resolver.
    #[error("DNS resolver initialization error: {0}")]
    DnsResolverError(String),
}

/// Failure of a single lookup against a DNS backend.
///
/// Backends map their native errors into this enum so that the resolver and
/// the chain tracer can classify failures without string matching.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    /// The name does not exist (NXDOMAIN).
    #[error("Domain not found: {0}")]
    NotFound(String),

    /// The name exists but has no records of the requested type.
    #[error("No {record_type} records found for {domain}")]
    NoData {
        domain: String,
        record_type: String,
    },

    /// The backend gave up waiting for an answer.
    #[error("DNS query timed out for {0}")]
    Timeout(String),

    /// The input could not be turned into a query (bad name, bad address).
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// Any other resolver failure.
    #[error("{0}")]
    Network(String),
}

impl LookupError {
    /// Maps the lookup failure onto the error taxonomy.
    pub fn error_type(&self) -> ErrorType {
        match self {
            LookupError::NotFound(_) => ErrorType::DomainNotFound,
            LookupError::Timeout(_) => ErrorType::Timeout,
            LookupError::NoData { .. }
            | LookupError::InvalidQuery(_)
            | LookupError::Network(_) => ErrorType::NetworkError,
        }
    }

    /// Whether retrying the same query could plausibly give a different answer.
    ///
    /// NXDOMAIN and malformed input are permanent; timeouts and transport
    /// failures are transient.
    pub fn is_retriable(&self) -> bool {
        matches!(self, LookupError::Timeout(_) | LookupError::Network(_))
    }
}

/// Error returned by [`retry`](crate::batch::retry).
#[derive(Error, Debug)]
pub enum RetryError<E> {
    /// `max_attempts` was zero, so the operation never ran.
    #[error("no attempts were made (max_attempts is 0)")]
    NoAttempts,

    /// The last error produced by the operation, unchanged.
    #[error("{0}")]
    Operation(E),
}

impl<E> RetryError<E> {
    /// Returns the operation's error, if the operation ran at all.
    pub fn into_inner(self) -> Option<E> {
        match self {
            RetryError::NoAttempts => None,
            RetryError::Operation(e) => Some(e),
        }
    }
}

impl RetryError<anyhow::Error> {
    /// Unwraps the operation's error, or describes the zero-attempt case.
    pub fn into_anyhow(self) -> anyhow::Error {
        match self {
            RetryError::NoAttempts => anyhow::anyhow!("no attempts were made (max_attempts is 0)"),
            RetryError::Operation(e) => e,
        }
    }
}

/// Categories of failures tracked during a run.
///
/// `LoopDetected` and `MaxDepthReached` are never raised as errors; they are
/// encoded in chain results and only counted here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIterMacro)]
pub enum ErrorType {
    UnsupportedRecordType,
    DomainNotFound,
    Timeout,
    NetworkError,
    LoopDetected,
    MaxDepthReached,
    EncodingDetectionFailure,
}

impl std::fmt::Display for ErrorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ErrorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorType::UnsupportedRecordType => "Unsupported record type",
            ErrorType::DomainNotFound => "Domain not found",
            ErrorType::Timeout => "DNS timeout",
            ErrorType::NetworkError => "DNS network error",
            ErrorType::LoopDetected => "CNAME loop detected",
            ErrorType::MaxDepthReached => "CNAME max depth reached",
            ErrorType::EncodingDetectionFailure => "Encoding detection failure",
        }
    }
}
