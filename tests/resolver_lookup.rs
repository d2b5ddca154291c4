//! Resolver behavior against an in-memory zone.

mod helpers;

use std::sync::Arc;
use std::time::Duration;

use domain_trace::batch::BatchConfig;
use domain_trace::dns::{DnsResolver, RecordType, ResolutionStatus, ResolverOptions, StaticBackend};
use domain_trace::error_handling::{ErrorType, LookupError, ProcessingStats};
use helpers::shared_zone;

fn fast_options() -> ResolverOptions {
    ResolverOptions {
        timeout: Duration::from_millis(250),
        batch: BatchConfig {
            retry_delay: Duration::from_millis(1),
            ..BatchConfig::for_dns()
        },
    }
}

#[tokio::test]
async fn test_record_types_from_zone() {
    let resolver = DnsResolver::new(shared_zone(), fast_options());

    let mx = resolver.resolve_named("example.com", "mx").await;
    assert!(mx.is_success());
    assert_eq!(mx.records[0].value, "mail.example.com");
    assert_eq!(mx.records[0].priority, Some(10));

    let txt = resolver.resolve("example.com", RecordType::TXT).await;
    assert_eq!(txt.records[0].value, "v=spf1 -all");

    let cname = resolver.resolve("www.example.com", RecordType::CNAME).await;
    assert_eq!(cname.records[0].value, "cdn.example.net");

    let caa = resolver.resolve("example.com", RecordType::CAA).await;
    assert!(caa.is_success());
    assert!(caa.records.is_empty());
}

#[tokio::test]
async fn test_lookup_multiple_isolates_failures() {
    let stats = Arc::new(ProcessingStats::new());
    let resolver = DnsResolver::new(shared_zone(), fast_options()).with_stats(Arc::clone(&stats));
    let domains: Vec<String> = ["example.com", "missing.example", "example.org", "edge.cdn.example"]
        .iter()
        .map(|d| d.to_string())
        .collect();

    let results = resolver.lookup_multiple(&domains, RecordType::A).await;
    let statuses: Vec<ResolutionStatus> = results.iter().map(|r| r.status).collect();
    assert_eq!(
        statuses,
        vec![
            ResolutionStatus::Success,
            ResolutionStatus::Error,
            ResolutionStatus::Success,
            ResolutionStatus::Success,
        ]
    );
    assert_eq!(results[2].records[0].value, "93.184.216.35");
    assert_eq!(stats.get_error_count(ErrorType::DomainNotFound), 1);
}

#[tokio::test]
async fn test_lookup_multiple_bounded_by_timeout() {
    let backend = Arc::new(
        StaticBackend::new()
            .with_a("fast.example", "192.0.2.1")
            .with_a("slow.example", "192.0.2.2")
            .with_delay("slow.example", Duration::from_secs(10)),
    );
    let options = ResolverOptions {
        timeout: Duration::from_millis(100),
        batch: BatchConfig {
            batch_size: 10,
            concurrency: 10,
            retries: 1,
            retry_delay: Duration::ZERO,
        },
    };
    let resolver = DnsResolver::new(backend, options);
    let domains = vec!["slow.example".to_string(), "fast.example".to_string()];

    let start = std::time::Instant::now();
    let results = resolver.lookup_multiple(&domains, RecordType::A).await;
    assert!(start.elapsed() < Duration::from_secs(2));
    assert_eq!(results[0].status, ResolutionStatus::Timeout);
    assert!(results[1].is_success());
}

#[tokio::test]
async fn test_transport_errors_are_retried_then_reported() {
    let backend = Arc::new(StaticBackend::new().with_failure(
        "broken.example",
        LookupError::Network("connection refused".into()),
    ));
    let resolver = DnsResolver::new(Arc::clone(&backend), fast_options());

    let results = resolver
        .lookup_multiple(&["broken.example".to_string()], RecordType::A)
        .await;
    assert_eq!(results[0].status, ResolutionStatus::Error);
    assert_eq!(
        backend.query_count() as u32,
        BatchConfig::for_dns().retries
    );
}

#[tokio::test]
async fn test_reverse_lookup_from_zone() {
    let backend = Arc::new(StaticBackend::new().with_ptr("2001:db8::1", "host.example"));
    let resolver = DnsResolver::new(backend, fast_options());

    let result = resolver.reverse_lookup("2001:db8::1").await;
    assert!(result.is_success());
    assert_eq!(result.records[0].value, "host.example");
}
