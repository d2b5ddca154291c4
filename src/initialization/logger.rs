//! Logger initialization.
//!
//! Plain output is meant for a terminal watching a run; JSON output is one
//! object per line with the emitting component split out, so a log shipper can
//! group resolver, tracer and ingestion messages without parsing targets.

use std::io::{IsTerminal, Write};

use chrono::{DateTime, SecondsFormat, Utc};
use colored::{ColoredString, Colorize};
use log::{Level, LevelFilter};
use serde::Serialize;

use crate::config::LogFormat;
use crate::error_handling::InitializationError;

const CRATE_TARGET: &str = "domain_trace";

/// Caps for chatty dependencies, applied on top of the requested level.
const DEPENDENCY_FILTERS: &[(&str, LevelFilter)] = &[
    // Truncated UDP answers are retried over TCP and only add noise
    ("hickory_proto", LevelFilter::Error),
    ("hickory_resolver", LevelFilter::Warn),
];

/// One JSON log line.
#[derive(Debug, Serialize)]
struct JsonLine<'a> {
    ts: String,
    level: &'a str,
    component: &'a str,
    message: String,
}

/// Module path relative to this crate (`cname::tracer`), or the full target
/// for dependencies.
fn component(target: &str) -> &str {
    match target.strip_prefix(CRATE_TARGET) {
        Some("") => "main",
        Some(rest) => rest.strip_prefix("::").unwrap_or(rest),
        None => target,
    }
}

fn json_line(now: DateTime<Utc>, level: Level, target: &str, message: String) -> String {
    let line = JsonLine {
        ts: now.to_rfc3339_opts(SecondsFormat::Millis, true),
        level: level.as_str(),
        component: component(target),
        message,
    };
    serde_json::to_string(&line)
        .unwrap_or_else(|e| format!("{{\"message\":\"unserializable log line: {e}\"}}"))
}

fn level_label(level: Level) -> ColoredString {
    let label = format!("{:<5}", level.as_str());
    match level {
        Level::Error => label.red().bold(),
        Level::Warn => label.yellow(),
        Level::Info => label.green(),
        Level::Debug | Level::Trace => label.dimmed(),
    }
}

/// Installs the process-wide logger.
///
/// `RUST_LOG` is read first so per-module directives still work, then `level`
/// is applied globally and to this crate, which makes `--log-level` win over a
/// bare `RUST_LOG=debug`. Colour is only used when stderr is a terminal.
///
/// # Errors
///
/// Returns `InitializationError::LoggerError` if a logger is already installed.
///
/// # Examples
///
/// ```bash
/// # Trace chains with debug output for this crate only
/// RUST_LOG=domain_trace=debug domain_trace domains.csv --mode trace
///
/// # CLI level wins over RUST_LOG
/// RUST_LOG=debug domain_trace domains.csv --log-level warn
/// ```
pub fn init_logger_with(level: LevelFilter, format: LogFormat) -> Result<(), InitializationError> {
    let mut builder = env_logger::Builder::from_default_env();
    builder.filter_level(level);
    for (module, cap) in DEPENDENCY_FILTERS {
        builder.filter_module(module, level.min(*cap));
    }
    builder.filter_module(CRATE_TARGET, level);

    match format {
        LogFormat::Json => {
            builder.format(|buf, record| {
                let line = json_line(
                    Utc::now(),
                    record.level(),
                    record.target(),
                    record.args().to_string(),
                );
                writeln!(buf, "{line}")
            });
        }
        LogFormat::Plain => {
            colored::control::set_override(std::io::stderr().is_terminal());
            builder.format(|buf, record| {
                writeln!(
                    buf,
                    "{} {} {}: {}",
                    Utc::now().format("%H:%M:%S%.3f").to_string().dimmed(),
                    level_label(record.level()),
                    component(record.target()).cyan(),
                    record.args()
                )
            });
        }
    }

    builder.try_init()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_component_strips_crate_prefix() {
        assert_eq!(component("domain_trace::cname::tracer"), "cname::tracer");
        assert_eq!(component("domain_trace"), "main");
        assert_eq!(component("hickory_proto::udp"), "hickory_proto::udp");
    }

    #[test]
    fn test_json_line_fields() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap();
        let line = json_line(
            now,
            Level::Warn,
            "domain_trace::dns::resolver",
            "Failed to resolve A \"bad.example\"".to_string(),
        );

        let value: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(value["ts"], "2024-05-01T12:30:00.000Z");
        assert_eq!(value["level"], "WARN");
        assert_eq!(value["component"], "dns::resolver");
        assert_eq!(value["message"], "Failed to resolve A \"bad.example\"");
        assert!(!line.contains('\n'));
    }

    // env_logger installs once per process, so only the second call of a
    // pair is guaranteed to fail.
    #[test]
    fn test_second_init_reports_logger_error() {
        let _ = init_logger_with(LevelFilter::Warn, LogFormat::Json);
        let second = init_logger_with(LevelFilter::Warn, LogFormat::Plain);
        assert!(matches!(second, Err(InitializationError::LoggerError(_))));
    }
}
