//! Run orchestration: load a domain list, resolve or trace it, report.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use log::{info, warn};

use crate::batch::BatchConfig;
use crate::cname::{
    get_cname_chain_stats, validate_cname_chain, ChainStats, ChainTermination, CnameChainResult,
    CnameChainTracer, MultiTraceOptions, TraceOptions,
};
use crate::config::{trace_concurrency, trace_timeout_ms, Config, RunMode};
use crate::dns::{DnsBackend, DnsResolver, HickoryBackend, ResolutionResult, ResolverOptions};
use crate::error_handling::{ErrorType, ProcessingStats};
use crate::ingest::{evaluate_detection_reliability, load_domains, ReliabilityLevel};
use crate::initialization::init_resolver;

/// Results of a run.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Distinct domains read from the input
    pub total_domains: usize,
    /// Domains that resolved, or whose chain ended cleanly
    pub successful: usize,
    /// Domains with an error, a timeout or a looping chain
    pub failed: usize,
    /// Input rows that were not usable domains
    pub skipped_inputs: usize,
    pub elapsed_seconds: f64,
    pub mode: RunMode,
    /// One entry per domain in `Resolve` mode, in input order
    pub resolutions: Vec<ResolutionResult>,
    /// Chains keyed by domain in `Trace` mode
    pub chains: HashMap<String, CnameChainResult>,
    /// Aggregate chain health in `Trace` mode
    pub chain_stats: Option<ChainStats>,
}

/// Runs a resolution job against the configured name servers.
///
/// # Errors
///
/// Returns an error if the configuration is invalid, the input file cannot
/// be read, or the resolver cannot be built. Per-domain failures are counted
/// in the report, never returned.
pub async fn run_resolution(config: Config) -> Result<RunReport> {
    config
        .validate()
        .map_err(anyhow::Error::msg)
        .context("Invalid configuration")?;

    let resolver = init_resolver(Duration::from_millis(config.timeout_ms), &config.servers)
        .context("Failed to initialize DNS resolver")?;
    run_resolution_with(&config, Arc::new(HickoryBackend::new(resolver))).await
}

/// Runs a resolution job against `backend`.
///
/// # Errors
///
/// See [`run_resolution`].
pub async fn run_resolution_with<B: DnsBackend>(config: &Config, backend: Arc<B>) -> Result<RunReport> {
    config
        .validate()
        .map_err(anyhow::Error::msg)
        .context("Invalid configuration")?;

    let start_time = Instant::now();
    let list = load_domains(&config.file)
        .await
        .context("Failed to load domain list")?;

    let stats = Arc::new(ProcessingStats::new());
    if let Some(detection) = &list.detection {
        if detection.fallback_used {
            stats.increment_error(ErrorType::EncodingDetectionFailure);
        }
        let reliability = evaluate_detection_reliability(detection);
        if reliability.level != ReliabilityLevel::High {
            warn!(
                "Encoding of {} is uncertain ({}%): {}",
                config.file.display(),
                detection.confidence,
                reliability.recommendation
            );
        }
    }

    info!(
        "Starting {:?} run over {} domains",
        config.mode,
        list.domains.len()
    );

    let mut report = RunReport {
        total_domains: list.domains.len(),
        successful: 0,
        failed: 0,
        skipped_inputs: list.skipped,
        elapsed_seconds: 0.0,
        mode: config.mode,
        resolutions: Vec::new(),
        chains: HashMap::new(),
        chain_stats: None,
    };

    match config.mode {
        RunMode::Resolve => {
            let options = ResolverOptions {
                timeout: Duration::from_millis(config.timeout_ms),
                batch: BatchConfig::for_dns().with_concurrency(config.concurrency),
            };
            let resolver = DnsResolver::new(backend, options).with_stats(Arc::clone(&stats));
            let results = resolver
                .lookup_multiple(&list.domains, config.record_type)
                .await;

            for result in results.iter().filter(|r| !r.is_success()) {
                warn!(
                    "Failed to resolve {} {}: {}",
                    result.query.record_type,
                    result.query.domain,
                    result.error.as_deref().unwrap_or("unknown error")
                );
            }
            report.successful = results.iter().filter(|r| r.is_success()).count();
            report.failed = results.len() - report.successful;
            report.resolutions = results;
        }
        RunMode::Trace => {
            let tracer = CnameChainTracer::new(backend).with_stats(Arc::clone(&stats));
            let options = MultiTraceOptions {
                trace: TraceOptions {
                    max_depth: config.max_depth,
                    timeout: Duration::from_millis(trace_timeout_ms(config)),
                    follow_to_end: true,
                },
                concurrency: trace_concurrency(config),
            };
            let chains = tracer.trace_multiple(&list.domains, &options).await;

            for (domain, chain) in &chains {
                let validation = validate_cname_chain(chain);
                if !validation.is_valid {
                    warn!("{domain}: {}", validation.issues.join("; "));
                }
            }
            report.failed = chains.values().filter(|c| chain_failed(c)).count();
            report.successful = chains.len() - report.failed;

            let results: Vec<CnameChainResult> = chains.values().cloned().collect();
            let chain_stats = get_cname_chain_stats(&results);
            info!(
                "Chain health {:.1}/100: {} chains, average depth {:.2}, {} loops",
                chain_stats.health_score,
                chain_stats.total_chains,
                chain_stats.average_depth,
                chain_stats.loop_count
            );
            report.chain_stats = Some(chain_stats);
            report.chains = chains;
        }
    }

    report.elapsed_seconds = start_time.elapsed().as_secs_f64();
    let rate = if report.elapsed_seconds > 0.0 {
        report.total_domains as f64 / report.elapsed_seconds
    } else {
        0.0
    };
    info!(
        "Processed {} domains in {:.2} seconds (~{:.2} domains/sec)",
        report.total_domains, report.elapsed_seconds, rate
    );
    stats.log_summary();

    Ok(report)
}

fn chain_failed(chain: &CnameChainResult) -> bool {
    chain.has_loop
        || matches!(
            chain.termination,
            ChainTermination::LookupFailed { .. } | ChainTermination::TimedOut
        )
}
