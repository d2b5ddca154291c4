//! Configuration types and CLI options.
//!
//! This module defines enums and structs used for command-line argument parsing
//! and configuration.

use std::net::IpAddr;
use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::config::constants::{
    CNAME_CONCURRENCY, CNAME_MAX_DEPTH, CNAME_TIMEOUT_MS, DNS_BATCH_CONCURRENCY, DNS_TIMEOUT_MS,
};
use crate::dns::RecordType;

/// Logging level for the application.
///
/// Controls the verbosity of log output, from most restrictive (Error) to most
/// verbose (Trace).
#[derive(Clone, Debug, ValueEnum)]
pub enum LogLevel {
    /// Only error messages
    Error,
    /// Error and warning messages
    Warn,
    /// Error, warning, and informational messages
    Info,
    /// All messages except trace
    Debug,
    /// All messages including trace
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Log output format.
///
/// - `Plain`: Human-readable format with colors (default)
/// - `Json`: Structured JSON format for machine parsing
#[derive(Clone, Debug, ValueEnum)]
pub enum LogFormat {
    /// Human-readable format with colors (default)
    Plain,
    /// Structured JSON format for machine parsing
    Json,
}

/// What a run does with the ingested domain list.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum RunMode {
    /// Resolve one record type for every domain
    Resolve,
    /// Trace the CNAME chain of every domain
    Trace,
}

/// Library configuration (no CLI dependencies).
///
/// # Examples
///
/// ```no_run
/// use domain_trace::Config;
/// use std::path::PathBuf;
///
/// let config = Config {
///     file: PathBuf::from("domains.csv"),
///     concurrency: 100,
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// CSV or plain-text file to read domains from
    pub file: PathBuf,

    /// Log level
    pub log_level: LogLevel,

    /// Log format
    pub log_format: LogFormat,

    /// Resolve records or trace CNAME chains
    pub mode: RunMode,

    /// Record type queried in `Resolve` mode
    pub record_type: RecordType,

    /// Maximum concurrent lookups
    pub concurrency: usize,

    /// Per-query timeout in milliseconds
    pub timeout_ms: u64,

    /// Maximum CNAME chain entries in `Trace` mode
    pub max_depth: usize,

    /// Custom name servers (system configuration when empty)
    pub servers: Vec<IpAddr>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            file: PathBuf::from("domains.csv"),
            log_level: LogLevel::Info,
            log_format: LogFormat::Plain,
            mode: RunMode::Resolve,
            record_type: RecordType::A,
            concurrency: DNS_BATCH_CONCURRENCY,
            timeout_ms: DNS_TIMEOUT_MS,
            max_depth: CNAME_MAX_DEPTH,
            servers: Vec::new(),
        }
    }
}

impl Config {
    /// Checks the configuration for values that would stall or break a run.
    ///
    /// # Errors
    ///
    /// Returns a description of the first invalid setting.
    pub fn validate(&self) -> Result<(), String> {
        if self.concurrency == 0 {
            return Err("concurrency must be at least 1".to_string());
        }
        if self.timeout_ms == 0 {
            return Err("timeout must be greater than 0 ms".to_string());
        }
        if self.max_depth == 0 {
            return Err("max depth must be at least 1".to_string());
        }
        Ok(())
    }
}

/// Command-line options.
///
/// # Examples
///
/// ```bash
/// # Resolve A records for every domain in a CSV export
/// domain_trace domains.csv
///
/// # Trace CNAME chains through a specific resolver
/// domain_trace domains.csv --mode trace --server 1.1.1.1
/// ```
#[derive(Debug, Parser)]
#[command(
    name = "domain_trace",
    about = "Resolves a list of domains and traces their CNAME chains."
)]
pub struct Opt {
    /// File to read
    #[arg(value_parser)]
    pub file: PathBuf,

    /// Log level: error|warn|info|debug|trace
    #[arg(long, value_enum, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,

    /// Log format: plain|json
    #[arg(long, value_enum, default_value_t = LogFormat::Plain)]
    pub log_format: LogFormat,

    /// Run mode: resolve|trace
    #[arg(long, value_enum, default_value_t = RunMode::Resolve)]
    pub mode: RunMode,

    /// Record type queried in resolve mode
    #[arg(long, default_value = "A")]
    pub record_type: RecordType,

    /// Maximum concurrent lookups
    #[arg(long, default_value_t = DNS_BATCH_CONCURRENCY)]
    pub concurrency: usize,

    /// Per-query timeout in milliseconds
    #[arg(long, default_value_t = DNS_TIMEOUT_MS)]
    pub timeout_ms: u64,

    /// Maximum CNAME chain entries in trace mode
    #[arg(long, default_value_t = CNAME_MAX_DEPTH)]
    pub max_depth: usize,

    /// Name server to query (repeatable)
    #[arg(long = "server")]
    pub servers: Vec<IpAddr>,
}

impl From<Opt> for Config {
    fn from(opt: Opt) -> Self {
        Self {
            file: opt.file,
            log_level: opt.log_level,
            log_format: opt.log_format,
            mode: opt.mode,
            record_type: opt.record_type,
            concurrency: opt.concurrency,
            timeout_ms: opt.timeout_ms,
            max_depth: opt.max_depth,
            servers: opt.servers,
        }
    }
}

/// Trace-mode concurrency is capped separately: each trace issues several
/// sequential lookups, so fewer chains run at once.
pub fn trace_concurrency(config: &Config) -> usize {
    config.concurrency.min(CNAME_CONCURRENCY.max(config.concurrency / 10))
}

/// Per-step timeout used in trace mode.
pub fn trace_timeout_ms(config: &Config) -> u64 {
    config.timeout_ms.min(CNAME_TIMEOUT_MS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_conversion() {
        assert_eq!(
            log::LevelFilter::from(LogLevel::Error),
            log::LevelFilter::Error
        );
        assert_eq!(
            log::LevelFilter::from(LogLevel::Warn),
            log::LevelFilter::Warn
        );
        assert_eq!(
            log::LevelFilter::from(LogLevel::Info),
            log::LevelFilter::Info
        );
        assert_eq!(
            log::LevelFilter::from(LogLevel::Debug),
            log::LevelFilter::Debug
        );
        assert_eq!(
            log::LevelFilter::from(LogLevel::Trace),
            log::LevelFilter::Trace
        );
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_concurrency() {
        let config = Config {
            concurrency: 0,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.contains("concurrency"));
    }

    #[test]
    fn test_validate_rejects_zero_timeout_and_depth() {
        let config = Config {
            timeout_ms: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = Config {
            max_depth: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_opt_parses_into_config() {
        let opt = Opt::parse_from([
            "domain_trace",
            "input.csv",
            "--mode",
            "trace",
            "--record-type",
            "mx",
            "--server",
            "1.1.1.1",
            "--server",
            "8.8.8.8",
        ]);
        let config = Config::from(opt);
        assert_eq!(config.file, PathBuf::from("input.csv"));
        assert_eq!(config.mode, RunMode::Trace);
        assert_eq!(config.record_type, RecordType::MX);
        assert_eq!(config.servers.len(), 2);
    }

    #[test]
    fn test_trace_concurrency_never_exceeds_configured() {
        let config = Config {
            concurrency: 2,
            ..Default::default()
        };
        assert_eq!(trace_concurrency(&config), 2);

        let config = Config {
            concurrency: 200,
            ..Default::default()
        };
        assert_eq!(trace_concurrency(&config), 20);
    }
}
