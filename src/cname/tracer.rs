//! CNAME chain walking.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::batch::{BatchConfig, BatchProcessor};
use crate::config::{CNAME_CONCURRENCY, CNAME_MAX_DEPTH, CNAME_TIMEOUT_MS, SLOW_TRACE_THRESHOLD_MS};
use crate::dns::{DnsBackend, DnsResolver, RecordType};
use crate::error_handling::{ErrorType, LookupError, ProcessingStats};

/// Options for a single trace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceOptions {
    /// Maximum chain length, the start name included. Values below 1 act as 1.
    pub max_depth: usize,
    /// Timeout for each CNAME lookup, not for the whole walk.
    pub timeout: Duration,
    /// When false, only the first hop is resolved.
    pub follow_to_end: bool,
}

impl Default for TraceOptions {
    fn default() -> Self {
        Self {
            max_depth: CNAME_MAX_DEPTH,
            timeout: Duration::from_millis(CNAME_TIMEOUT_MS),
            follow_to_end: true,
        }
    }
}

/// Options for [`CnameChainTracer::trace_multiple`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultiTraceOptions {
    pub trace: TraceOptions,
    /// Chains traced at once.
    pub concurrency: usize,
}

impl Default for MultiTraceOptions {
    fn default() -> Self {
        Self {
            trace: TraceOptions::default(),
            concurrency: CNAME_CONCURRENCY,
        }
    }
}

/// Why a walk stopped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum ChainTermination {
    /// The last name has no CNAME.
    NoAlias,
    LoopDetected,
    MaxDepthReached,
    /// `follow_to_end` was off and one hop was resolved.
    SingleStep,
    /// A lookup failed (NXDOMAIN, transport error, invalid name).
    LookupFailed { message: String },
    TimedOut,
}

/// Outcome of tracing one name.
///
/// `has_loop` implies `final_target == None`. `chain` never holds more than
/// `max_depth` names and never holds the same name twice.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CnameChainResult {
    pub chain: Vec<String>,
    pub final_target: Option<String>,
    pub has_loop: bool,
    pub max_depth_reached: bool,
    pub resolution_time_ms: f64,
    pub termination: ChainTermination,
}

impl CnameChainResult {
    /// Number of names in the chain.
    pub fn depth(&self) -> usize {
        self.chain.len()
    }

    /// Whether the walk stopped because the first lookup itself failed.
    pub fn first_step_failed(&self) -> bool {
        self.chain.len() == 1
            && matches!(
                self.termination,
                ChainTermination::LookupFailed { .. } | ChainTermination::TimedOut
            )
    }

    /// Whether the walk never left the start name, either because it has no
    /// CNAME or because its first lookup failed.
    pub fn ended_at_start(&self) -> bool {
        self.chain.len() == 1
            && matches!(
                self.termination,
                ChainTermination::NoAlias
                    | ChainTermination::LookupFailed { .. }
                    | ChainTermination::TimedOut
            )
    }
}

/// One CNAME hop.
enum Hop {
    Target(String),
    NoAlias,
    Failed(LookupError),
    TimedOut,
}

/// Follows CNAME records from a name to its canonical target.
pub struct CnameChainTracer<B> {
    backend: Arc<B>,
    stats: Option<Arc<ProcessingStats>>,
}

impl<B: DnsBackend> CnameChainTracer<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self {
            backend,
            stats: None,
        }
    }

    /// A tracer sharing `resolver`'s backend.
    pub fn from_resolver(resolver: &DnsResolver<B>) -> Self {
        Self::new(Arc::clone(resolver.backend()))
    }

    /// Counts loops, depth caps and failed hops in `stats`.
    pub fn with_stats(mut self, stats: Arc<ProcessingStats>) -> Self {
        self.stats = Some(stats);
        self
    }

    /// Walks the CNAME chain starting at `domain`.
    ///
    /// Names are lower-cased and stripped of the trailing dot before
    /// comparison, so `WWW.Example.COM.` and `www.example.com` are the same
    /// node. Lookup failures end the walk; they are reported through
    /// [`CnameChainResult::termination`], never as an error.
    pub async fn trace(&self, domain: &str, options: &TraceOptions) -> CnameChainResult {
        let start = Instant::now();
        let max_depth = options.max_depth.max(1);
        let mut chain = vec![normalize_name(domain)];
        let mut final_target: Option<String> = None;
        let mut has_loop = false;
        let mut max_depth_reached = false;

        let termination = loop {
            let Some(current) = chain.last() else {
                break ChainTermination::NoAlias;
            };
            let target = match self.resolve_hop(current, options.timeout).await {
                Hop::Target(target) => target,
                Hop::NoAlias => break ChainTermination::NoAlias,
                Hop::TimedOut => {
                    self.count(ErrorType::Timeout);
                    break ChainTermination::TimedOut;
                }
                Hop::Failed(e) => {
                    self.count(e.error_type());
                    break ChainTermination::LookupFailed {
                        message: e.to_string(),
                    };
                }
            };

            if chain.contains(&target) {
                log::warn!("CNAME loop detected: {} -> {}", chain.join(" -> "), target);
                self.count(ErrorType::LoopDetected);
                has_loop = true;
                final_target = None;
                break ChainTermination::LoopDetected;
            }

            if !options.follow_to_end {
                final_target = Some(target);
                break ChainTermination::SingleStep;
            }

            if chain.len() + 1 > max_depth {
                log::debug!(
                    "CNAME chain for {} reached max depth {}",
                    chain[0],
                    max_depth
                );
                self.count(ErrorType::MaxDepthReached);
                max_depth_reached = true;
                final_target = Some(target);
                break ChainTermination::MaxDepthReached;
            }

            final_target = Some(target.clone());
            chain.push(target);
        };

        let resolution_time_ms = start.elapsed().as_secs_f64() * 1000.0;
        if resolution_time_ms > SLOW_TRACE_THRESHOLD_MS {
            log::warn!(
                "Slow CNAME trace for {}: {:.0}ms over {} hops",
                chain[0],
                resolution_time_ms,
                chain.len()
            );
        }

        CnameChainResult {
            chain,
            final_target,
            has_loop,
            max_depth_reached,
            resolution_time_ms,
            termination,
        }
    }

    /// Traces many names with bounded concurrency.
    ///
    /// The map is keyed by the input strings as given. A name without a CNAME,
    /// or whose very first lookup failed or timed out, is reported as its own
    /// final target; `termination` tells the two cases apart.
    pub async fn trace_multiple(
        &self,
        domains: &[String],
        options: &MultiTraceOptions,
    ) -> HashMap<String, CnameChainResult> {
        let config = BatchConfig {
            batch_size: domains.len().max(1),
            concurrency: options.concurrency.max(1),
            retries: 1,
            retry_delay: Duration::ZERO,
        };
        let trace_options = &options.trace;

        let outcome = BatchProcessor::new(config)
            .process(domains.to_vec(), |domain| async move {
                let mut result = self.trace(&domain, trace_options).await;
                if result.ended_at_start() {
                    result.final_target = Some(result.chain[0].clone());
                }
                Ok::<_, anyhow::Error>((domain, result))
            })
            .await;

        log::debug!(
            "Traced {} CNAME chains in {:.0}ms",
            outcome.total_processed,
            outcome.duration_ms()
        );
        outcome.successful.into_iter().collect()
    }

    async fn resolve_hop(&self, name: &str, timeout: Duration) -> Hop {
        match tokio::time::timeout(timeout, self.backend.lookup(name, RecordType::CNAME)).await {
            Err(_) | Ok(Err(LookupError::Timeout(_))) => Hop::TimedOut,
            Ok(Err(LookupError::NoData { .. })) => Hop::NoAlias,
            Ok(Err(e)) => Hop::Failed(e),
            // Only the first of several targets is followed
            Ok(Ok(records)) => match records.into_iter().next() {
                Some(record) => Hop::Target(normalize_name(&record.value)),
                None => Hop::NoAlias,
            },
        }
    }

    fn count(&self, error_type: ErrorType) {
        if let Some(stats) = &self.stats {
            stats.increment_error(error_type);
        }
    }
}

/// Lower-cases and strips surrounding whitespace and the trailing dot.
pub fn normalize_name(name: &str) -> String {
    name.trim().trim_end_matches('.').to_lowercase()
}
