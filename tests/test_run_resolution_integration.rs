//! Full runs through `run_resolution_with` using an in-memory zone.

mod helpers;

use domain_trace::{run_resolution, run_resolution_with, Config, RunMode};
use helpers::{shared_zone, write_input};

#[tokio::test]
async fn test_resolve_run_counts_outcomes() {
    let file = write_input(b"domain\nexample.com\nexample.org\nmissing.example\nbad entry\nexample.com\n");
    let config = Config {
        file: file.path().to_path_buf(),
        ..Default::default()
    };

    let report = run_resolution_with(&config, shared_zone()).await.unwrap();
    assert_eq!(report.mode, RunMode::Resolve);
    assert_eq!(report.total_domains, 3);
    assert_eq!(report.successful, 2);
    assert_eq!(report.failed, 1);
    assert_eq!(report.skipped_inputs, 1);
    assert_eq!(report.resolutions.len(), 3);
    assert_eq!(report.resolutions[0].query.domain, "example.com");
    assert!(report.chain_stats.is_none());
}

#[tokio::test]
async fn test_trace_run_reports_chain_health() {
    let file = write_input(b"www.example.com\nloop-a.example\nexample.com\n");
    let config = Config {
        file: file.path().to_path_buf(),
        mode: RunMode::Trace,
        ..Default::default()
    };

    let report = run_resolution_with(&config, shared_zone()).await.unwrap();
    assert_eq!(report.total_domains, 3);
    assert_eq!(report.failed, 1);
    assert_eq!(report.successful, 2);
    assert_eq!(report.chains.len(), 3);
    assert!(report.chains["loop-a.example"].has_loop);

    let stats = report.chain_stats.unwrap();
    assert_eq!(stats.loop_count, 1);
    assert!(stats.health_score < 100.0);
}

#[tokio::test]
async fn test_invalid_config_is_rejected() {
    let file = write_input(b"example.com\n");
    let config = Config {
        file: file.path().to_path_buf(),
        concurrency: 0,
        ..Default::default()
    };

    let err = run_resolution_with(&config, shared_zone()).await.unwrap_err();
    assert!(format!("{:#}", err).contains("concurrency"));
}

#[tokio::test]
async fn test_missing_input_file() {
    let config = Config {
        file: "/nonexistent/input.csv".into(),
        ..Default::default()
    };

    let err = run_resolution(config).await.unwrap_err();
    assert!(format!("{:#}", err).contains("Failed to load domain list"));
}
