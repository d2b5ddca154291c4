//! CNAME module tests.

use super::*;
use crate::dns::StaticBackend;
use crate::error_handling::{ErrorType, LookupError, ProcessingStats};
use std::sync::Arc;
use std::time::Duration;

fn tracer(backend: StaticBackend) -> CnameChainTracer<StaticBackend> {
    CnameChainTracer::new(Arc::new(backend))
}

fn options(max_depth: usize) -> TraceOptions {
    TraceOptions {
        max_depth,
        timeout: Duration::from_millis(200),
        follow_to_end: true,
    }
}

fn chain_result(chain: &[&str], has_loop: bool, max_depth_reached: bool) -> CnameChainResult {
    CnameChainResult {
        chain: chain.iter().map(|s| s.to_string()).collect(),
        final_target: if has_loop { None } else { chain.last().map(|s| s.to_string()) },
        has_loop,
        max_depth_reached,
        resolution_time_ms: 10.0,
        termination: if has_loop {
            ChainTermination::LoopDetected
        } else if max_depth_reached {
            ChainTermination::MaxDepthReached
        } else {
            ChainTermination::NoAlias
        },
    }
}

#[tokio::test]
async fn test_trace_follows_chain_to_end() {
    let tracer = tracer(
        StaticBackend::new()
            .with_cname("www.example.com", "cdn.example.net")
            .with_cname("cdn.example.net", "edge.provider.com")
            .with_a("edge.provider.com", "203.0.113.7"),
    );

    let result = tracer.trace("www.example.com", &TraceOptions::default()).await;
    assert_eq!(
        result.chain,
        vec!["www.example.com", "cdn.example.net", "edge.provider.com"]
    );
    assert_eq!(result.final_target.as_deref(), Some("edge.provider.com"));
    assert!(!result.has_loop);
    assert!(!result.max_depth_reached);
    assert_eq!(result.termination, ChainTermination::NoAlias);
}

#[tokio::test]
async fn test_trace_without_alias() {
    let tracer = tracer(StaticBackend::new().with_a("example.com", "192.0.2.1"));

    let result = tracer.trace("example.com", &TraceOptions::default()).await;
    assert_eq!(result.chain, vec!["example.com"]);
    assert_eq!(result.final_target, None);
    assert_eq!(result.termination, ChainTermination::NoAlias);
}

#[tokio::test]
async fn test_trace_stops_at_max_depth() {
    let stats = Arc::new(ProcessingStats::new());
    let tracer = tracer(
        StaticBackend::new()
            .with_cname("domain1", "domain2")
            .with_cname("domain2", "domain3")
            .with_cname("domain3", "domain4")
            .with_cname("domain4", "domain5"),
    )
    .with_stats(stats.clone());

    let result = tracer.trace("domain1", &options(3)).await;
    assert_eq!(result.chain.len(), 3);
    assert!(result.max_depth_reached);
    assert_eq!(result.final_target.as_deref(), Some("domain4"));
    assert_eq!(result.termination, ChainTermination::MaxDepthReached);
    assert_eq!(stats.get_error_count(ErrorType::MaxDepthReached), 1);
}

#[tokio::test]
async fn test_trace_detects_loop() {
    let stats = Arc::new(ProcessingStats::new());
    let tracer = tracer(
        StaticBackend::new()
            .with_cname("a.example", "b.example")
            .with_cname("b.example", "a.example"),
    )
    .with_stats(stats.clone());

    let result = tracer.trace("a.example", &TraceOptions::default()).await;
    assert!(result.has_loop);
    assert_eq!(result.final_target, None);
    assert_eq!(result.chain, vec!["a.example", "b.example"]);
    assert_eq!(stats.get_error_count(ErrorType::LoopDetected), 1);
}

#[tokio::test]
async fn test_trace_detects_self_loop() {
    let tracer = tracer(StaticBackend::new().with_cname("self.example", "self.example."));

    let result = tracer.trace("self.example", &TraceOptions::default()).await;
    assert!(result.has_loop);
    assert_eq!(result.chain, vec!["self.example"]);
}

#[tokio::test]
async fn test_trace_normalizes_case_and_trailing_dot() {
    let tracer = tracer(
        StaticBackend::new()
            .with_cname("www.example.com", "CDN.Example.NET.")
            .with_a("cdn.example.net", "198.51.100.1"),
    );

    let result = tracer.trace("WWW.Example.COM.", &TraceOptions::default()).await;
    assert_eq!(result.chain, vec!["www.example.com", "cdn.example.net"]);
    assert_eq!(result.final_target.as_deref(), Some("cdn.example.net"));
}

#[tokio::test]
async fn test_trace_single_step() {
    let tracer = tracer(
        StaticBackend::new()
            .with_cname("www.example.com", "cdn.example.net")
            .with_cname("cdn.example.net", "edge.provider.com"),
    );
    let opts = TraceOptions {
        follow_to_end: false,
        ..TraceOptions::default()
    };

    let result = tracer.trace("www.example.com", &opts).await;
    assert_eq!(result.chain, vec!["www.example.com"]);
    assert_eq!(result.final_target.as_deref(), Some("cdn.example.net"));
    assert_eq!(result.termination, ChainTermination::SingleStep);
}

#[tokio::test]
async fn test_trace_dangling_alias_keeps_last_target() {
    let tracer = tracer(StaticBackend::new().with_cname("old.example.com", "gone.example.net"));

    let result = tracer.trace("old.example.com", &TraceOptions::default()).await;
    assert_eq!(result.chain, vec!["old.example.com", "gone.example.net"]);
    assert_eq!(result.final_target.as_deref(), Some("gone.example.net"));
    assert!(matches!(
        result.termination,
        ChainTermination::LookupFailed { .. }
    ));

    let validation = validate_cname_chain(&result);
    assert!(!validation.is_valid);
    assert!(validation.issues.iter().any(|i| i.contains("Dangling")));
}

#[tokio::test]
async fn test_trace_step_timeout() {
    let tracer = tracer(
        StaticBackend::new()
            .with_cname("slow.example", "target.example")
            .with_delay("slow.example", Duration::from_secs(5)),
    );

    let result = tracer.trace("slow.example", &options(10)).await;
    assert_eq!(result.termination, ChainTermination::TimedOut);
    assert_eq!(result.final_target, None);
}

#[tokio::test]
async fn test_trace_multiple_keys_by_input() {
    let tracer = tracer(
        StaticBackend::new()
            .with_cname("www.one.example", "one.example")
            .with_a("one.example", "192.0.2.1")
            .with_a("two.example", "192.0.2.2"),
    );
    let domains = vec!["WWW.One.Example".to_string(), "two.example".to_string()];

    let results = tracer
        .trace_multiple(&domains, &MultiTraceOptions::default())
        .await;
    assert_eq!(results.len(), 2);
    let first = &results["WWW.One.Example"];
    assert_eq!(first.chain, vec!["www.one.example", "one.example"]);
    let second = &results["two.example"];
    assert_eq!(second.chain, vec!["two.example"]);
    assert_eq!(second.final_target.as_deref(), Some("two.example"));
    assert_eq!(second.termination, ChainTermination::NoAlias);
}

#[tokio::test]
async fn test_trace_multiple_reports_unaliased_name_as_its_own_target() {
    let tracer = tracer(StaticBackend::new().with_a("plain.example", "192.0.2.10"));
    let domains = vec!["plain.example".to_string()];

    let results = tracer
        .trace_multiple(&domains, &MultiTraceOptions::default())
        .await;

    let plain = &results["plain.example"];
    assert_eq!(plain.chain, vec!["plain.example"]);
    assert_eq!(plain.final_target.as_deref(), Some("plain.example"));
    assert_eq!(plain.termination, ChainTermination::NoAlias);
    assert!(!plain.first_step_failed());
    assert!(plain.ended_at_start());

    // A single trace keeps the raw outcome
    let single = tracer
        .trace("plain.example", &TraceOptions::default())
        .await;
    assert_eq!(single.final_target, None);
}

#[tokio::test]
async fn test_trace_multiple_degrades_first_step_failures() {
    let tracer = tracer(
        StaticBackend::new()
            .with_cname("ok.example", "target.example")
            .with_failure(
                "broken.example",
                LookupError::Network("connection refused".into()),
            ),
    );
    let domains = vec![
        "ok.example".to_string(),
        "broken.example".to_string(),
        "missing.example".to_string(),
    ];

    let results = tracer
        .trace_multiple(&domains, &MultiTraceOptions::default())
        .await;

    let broken = &results["broken.example"];
    assert_eq!(broken.chain, vec!["broken.example"]);
    assert_eq!(broken.final_target.as_deref(), Some("broken.example"));
    assert!(matches!(
        broken.termination,
        ChainTermination::LookupFailed { .. }
    ));

    let missing = &results["missing.example"];
    assert_eq!(missing.final_target.as_deref(), Some("missing.example"));

    assert_eq!(
        results["ok.example"].final_target.as_deref(),
        Some("target.example")
    );
}

#[tokio::test]
async fn test_trace_multiple_empty() {
    let tracer = tracer(StaticBackend::new());
    assert!(tracer
        .trace_multiple(&[], &MultiTraceOptions::default())
        .await
        .is_empty());
}

#[test]
fn test_stats_empty_is_healthy() {
    let stats = get_cname_chain_stats(&[]);
    assert_eq!(stats.total_chains, 0);
    assert_eq!(stats.health_score, 100.0);
}

#[test]
fn test_stats_one_loop_in_two() {
    let results = vec![
        chain_result(&["a", "b"], true, false),
        chain_result(&["c", "d"], false, false),
    ];
    let stats = get_cname_chain_stats(&results);
    assert_eq!(stats.total_chains, 2);
    assert_eq!(stats.loop_count, 1);
    assert_eq!(stats.health_score, 75.0);
    assert_eq!(stats.average_depth, 2.0);
    assert_eq!(stats.max_depth, 2);
    assert_eq!(stats.average_resolution_time_ms, 10.0);
}

#[test]
fn test_stats_penalties_combine() {
    let long: Vec<&str> = vec!["1", "2", "3", "4", "5", "6"];
    let results = vec![
        chain_result(&long, false, false),
        chain_result(&["x", "y", "z"], false, true),
    ];
    let stats = get_cname_chain_stats(&results);
    assert_eq!(stats.long_chain_count, 1);
    assert_eq!(stats.depth_limited_count, 1);
    // 100 - 30 * 0.5 - 20 * 0.5
    assert_eq!(stats.health_score, 75.0);
    assert_eq!(stats.max_depth, 6);
}

#[test]
fn test_validate_healthy_chain() {
    let validation = validate_cname_chain(&chain_result(&["www.a.com", "a.com"], false, false));
    assert!(validation.is_valid);
    assert!(validation.issues.is_empty());
    assert!(validation.recommendations.is_empty());
}

#[test]
fn test_validate_loop_and_depth() {
    let looped = validate_cname_chain(&chain_result(&["a", "b"], true, false));
    assert!(!looped.is_valid);
    assert!(looped.issues[0].contains("loop"));

    let capped = validate_cname_chain(&chain_result(&["a", "b", "c"], false, true));
    assert!(!capped.is_valid);
    assert_eq!(capped.issues.len(), capped.recommendations.len());
}

#[test]
fn test_validate_slow_chain() {
    let mut result = chain_result(&["a"], false, false);
    result.resolution_time_ms = 2500.0;
    let validation = validate_cname_chain(&result);
    assert!(!validation.is_valid);
    assert!(validation.issues[0].contains("Slow"));
}
