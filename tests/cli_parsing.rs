//! Tests for CLI option parsing.

use clap::Parser;
use domain_trace::dns::RecordType;
use domain_trace::{Config, Opt, RunMode};

#[test]
fn test_defaults() {
    let config: Config = Opt::try_parse_from(["domain_trace", "domains.csv"])
        .unwrap()
        .into();
    assert_eq!(config.file.to_str(), Some("domains.csv"));
    assert_eq!(config.mode, RunMode::Resolve);
    assert_eq!(config.record_type, RecordType::A);
    assert!(config.servers.is_empty());
    assert!(config.validate().is_ok());
}

#[test]
fn test_trace_mode_with_servers() {
    let opt = Opt::try_parse_from([
        "domain_trace",
        "domains.csv",
        "--mode",
        "trace",
        "--max-depth",
        "4",
        "--server",
        "1.1.1.1",
        "--server",
        "2606:4700:4700::1111",
    ])
    .unwrap();
    let config = Config::from(opt);
    assert_eq!(config.mode, RunMode::Trace);
    assert_eq!(config.max_depth, 4);
    assert_eq!(config.servers.len(), 2);
}

#[test]
fn test_record_type_is_case_insensitive() {
    let opt = Opt::try_parse_from(["domain_trace", "d.csv", "--record-type", "aaaa"]).unwrap();
    assert_eq!(opt.record_type, RecordType::AAAA);
}

#[test]
fn test_rejects_bad_values() {
    assert!(Opt::try_parse_from(["domain_trace", "d.csv", "--record-type", "HINFO"]).is_err());
    assert!(Opt::try_parse_from(["domain_trace", "d.csv", "--server", "not-an-ip"]).is_err());
    assert!(Opt::try_parse_from(["domain_trace", "d.csv", "--mode", "scan"]).is_err());
    assert!(Opt::try_parse_from(["domain_trace"]).is_err());
}

#[test]
fn test_zero_concurrency_parses_but_fails_validation() {
    let config: Config =
        Opt::try_parse_from(["domain_trace", "d.csv", "--concurrency", "0"])
            .unwrap()
            .into();
    assert!(config.validate().is_err());
}
