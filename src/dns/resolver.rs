//! Record resolution with timeouts, bulk lookups and failure accounting.

use std::net::IpAddr;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::batch::{BatchConfig, BatchProcessor};
use crate::config::DNS_TIMEOUT_MS;
use crate::error_handling::{ErrorType, InitializationError, LookupError, ProcessingStats};
use crate::initialization::init_resolver;

use super::backend::{DnsBackend, HickoryBackend};
use super::types::{DnsQuery, RecordType, ResolutionResult};

/// Per-resolver settings.
#[derive(Debug, Clone)]
pub struct ResolverOptions {
    /// Upper bound for a single query, enforced on top of the backend's own.
    pub timeout: Duration,
    /// Batching used by [`DnsResolver::lookup_multiple`].
    pub batch: BatchConfig,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(DNS_TIMEOUT_MS),
            batch: BatchConfig::for_dns(),
        }
    }
}

/// Resolves queries into [`ResolutionResult`]s.
///
/// Resolution never returns `Err`: NXDOMAIN, timeouts and transport failures
/// are all encoded in the result's status and message.
pub struct DnsResolver<B> {
    backend: Arc<B>,
    options: ResolverOptions,
    stats: Option<Arc<ProcessingStats>>,
}

impl DnsResolver<HickoryBackend> {
    /// A resolver backed by hickory.
    ///
    /// `servers` is fixed for the resolver's lifetime; an empty slice means
    /// the system configuration.
    pub fn with_servers(
        servers: &[IpAddr],
        options: ResolverOptions,
    ) -> Result<Self, InitializationError> {
        let resolver = init_resolver(options.timeout, servers)?;
        Ok(Self::new(Arc::new(HickoryBackend::new(resolver)), options))
    }
}

impl<B: DnsBackend> DnsResolver<B> {
    pub fn new(backend: Arc<B>, options: ResolverOptions) -> Self {
        Self {
            backend,
            options,
            stats: None,
        }
    }

    /// Counts every failed resolution in `stats`.
    pub fn with_stats(mut self, stats: Arc<ProcessingStats>) -> Self {
        self.stats = Some(stats);
        self
    }

    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }

    pub fn options(&self) -> &ResolverOptions {
        &self.options
    }

    /// Resolves `domain` for `record_type` within the resolver's timeout.
    ///
    /// `CAA` is answered locally with a successful empty result.
    pub async fn resolve(&self, domain: &str, record_type: RecordType) -> ResolutionResult {
        self.resolve_with(domain, record_type, self.options.timeout)
            .await
    }

    /// Like [`resolve`](Self::resolve), bounded by `timeout` for this call only.
    pub async fn resolve_with(
        &self,
        domain: &str,
        record_type: RecordType,
        timeout: Duration,
    ) -> ResolutionResult {
        let query = DnsQuery::new(domain, record_type);
        let start = Instant::now();

        if record_type == RecordType::CAA {
            return ResolutionResult::success(query, Vec::new(), elapsed_ms(start));
        }

        let outcome = tokio::time::timeout(timeout, self.backend.lookup(domain, record_type)).await;

        let result = match outcome {
            Ok(Ok(records)) => ResolutionResult::success(query, records, elapsed_ms(start)),
            Ok(Err(LookupError::Timeout(_))) | Err(_) => ResolutionResult::failure(
                query,
                ErrorType::Timeout,
                format!("DNS query timed out after {}ms", timeout.as_millis()),
                true,
                elapsed_ms(start),
            ),
            Ok(Err(e)) => ResolutionResult::failure(
                query,
                e.error_type(),
                e.to_string(),
                e.is_retriable(),
                elapsed_ms(start),
            ),
        };

        if !result.is_success() {
            log::debug!(
                "{} lookup failed for {}: {}",
                record_type,
                domain,
                result.error.as_deref().unwrap_or("unknown error")
            );
            self.record_failure(&result);
        }
        result
    }

    /// Like [`resolve`](Self::resolve), with the record type given by name.
    ///
    /// An unknown name yields an error result without touching the network.
    /// Its `query.record_type` is only a placeholder (`A`); the name as given
    /// is kept in `requested_type`.
    pub async fn resolve_named(&self, domain: &str, record_type: &str) -> ResolutionResult {
        let start = Instant::now();
        match RecordType::from_str(record_type) {
            Ok(rt) => self.resolve(domain, rt).await,
            Err(_) => {
                let mut result = ResolutionResult::failure(
                    DnsQuery::new(domain, RecordType::A),
                    ErrorType::UnsupportedRecordType,
                    format!("Unsupported record type: {record_type}"),
                    false,
                    elapsed_ms(start),
                );
                result.requested_type = Some(record_type.to_string());
                self.record_failure(&result);
                result
            }
        }
    }

    /// Looks up PTR records for a textual IPv4 or IPv6 address.
    pub async fn reverse_lookup(&self, ip: &str) -> ResolutionResult {
        let query = DnsQuery::new(ip, RecordType::PTR);
        let start = Instant::now();

        let addr = match ip.trim().parse::<IpAddr>() {
            Ok(addr) => addr,
            Err(_) => {
                let result = ResolutionResult::failure(
                    query,
                    ErrorType::NetworkError,
                    LookupError::InvalidQuery(format!("not an IP address: {ip}")).to_string(),
                    false,
                    elapsed_ms(start),
                );
                self.record_failure(&result);
                return result;
            }
        };

        let outcome = tokio::time::timeout(self.options.timeout, self.backend.reverse(addr)).await;
        let result = match outcome {
            Ok(Ok(records)) => ResolutionResult::success(query, records, elapsed_ms(start)),
            Ok(Err(LookupError::Timeout(_))) | Err(_) => ResolutionResult::failure(
                query,
                ErrorType::Timeout,
                format!(
                    "Reverse lookup timed out after {}ms",
                    self.options.timeout.as_millis()
                ),
                true,
                elapsed_ms(start),
            ),
            Ok(Err(e)) => ResolutionResult::failure(
                query,
                e.error_type(),
                e.to_string(),
                e.is_retriable(),
                elapsed_ms(start),
            ),
        };

        if !result.is_success() {
            self.record_failure(&result);
        }
        result
    }

    /// Resolves many domains for one record type.
    ///
    /// Returns exactly one result per input, in input order. Transient
    /// failures (timeouts, transport errors) are retried per the batch
    /// configuration; the last attempt's result is kept.
    pub async fn lookup_multiple(
        &self,
        domains: &[String],
        record_type: RecordType,
    ) -> Vec<ResolutionResult> {
        let items: Vec<(usize, String)> = domains.iter().cloned().enumerate().collect();
        let processor = BatchProcessor::new(self.options.batch.clone());

        let outcome = processor
            .process(items, |(index, domain)| async move {
                let result = self.resolve(&domain, record_type).await;
                if result.retriable {
                    Err(anyhow::Error::new(TransientFailure(result)))
                } else {
                    Ok((index, result))
                }
            })
            .await;

        let mut slots: Vec<Option<ResolutionResult>> = vec![None; domains.len()];
        for (index, result) in outcome.successful {
            slots[index] = Some(result);
        }
        for failure in outcome.failed {
            let (index, domain) = failure.item;
            let result = match failure.error.downcast::<TransientFailure>() {
                Ok(TransientFailure(result)) => result,
                Err(error) => ResolutionResult::failure(
                    DnsQuery::new(domain, record_type),
                    ErrorType::NetworkError,
                    error.to_string(),
                    false,
                    0.0,
                ),
            };
            slots[index] = Some(result);
        }

        slots
            .into_iter()
            .zip(domains)
            .map(|(slot, domain)| {
                slot.unwrap_or_else(|| {
                    ResolutionResult::failure(
                        DnsQuery::new(domain.as_str(), record_type),
                        ErrorType::NetworkError,
                        "lookup was not performed",
                        false,
                        0.0,
                    )
                })
            })
            .collect()
    }

    fn record_failure(&self, result: &ResolutionResult) {
        if let (Some(stats), Some(error_type)) = (&self.stats, result.error_type) {
            stats.increment_error(error_type);
        }
    }
}

/// Carries a retriable result through the batch processor's error channel.
#[derive(Debug, thiserror::Error)]
#[error("{}", .0.error.as_deref().unwrap_or("transient DNS failure"))]
struct TransientFailure(ResolutionResult);

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}
