//! In-memory DNS backend for offline runs and tests.

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use super::backend::DnsBackend;
use super::types::{DnsRecord, RecordType};
use crate::error_handling::LookupError;

/// A fixed zone answered from memory.
///
/// Names are matched case-insensitively and without the trailing dot. A name
/// with records of some other type answers `NoData`; an unknown name answers
/// `NotFound`.
#[derive(Debug, Default)]
pub struct StaticBackend {
    records: HashMap<(String, RecordType), Vec<DnsRecord>>,
    failures: HashMap<String, LookupError>,
    transient: Mutex<HashMap<String, (u32, LookupError)>>,
    delays: HashMap<String, Duration>,
    queries: AtomicUsize,
}

fn normalize(name: &str) -> String {
    name.trim().trim_end_matches('.').to_lowercase()
}

impl StaticBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_record(mut self, name: &str, record: DnsRecord) -> Self {
        self.records
            .entry((normalize(name), record.record_type))
            .or_default()
            .push(record);
        self
    }

    pub fn with_a(self, name: &str, ip: &str) -> Self {
        self.with_record(name, DnsRecord::new(RecordType::A, ip, 300))
    }

    pub fn with_cname(self, name: &str, target: &str) -> Self {
        self.with_record(name, DnsRecord::new(RecordType::CNAME, target, 300))
    }

    pub fn with_ptr(self, ip: &str, host: &str) -> Self {
        self.with_record(ip, DnsRecord::new(RecordType::PTR, host, 300))
    }

    /// Every lookup of `name` fails with `error`.
    pub fn with_failure(mut self, name: &str, error: LookupError) -> Self {
        self.failures.insert(normalize(name), error);
        self
    }

    /// The first `times` lookups of `name` fail with `error`.
    pub fn with_transient_failure(self, name: &str, times: u32, error: LookupError) -> Self {
        if let Ok(mut transient) = self.transient.lock() {
            transient.insert(normalize(name), (times, error));
        }
        self
    }

    /// Lookups of `name` wait `delay` before answering.
    pub fn with_delay(mut self, name: &str, delay: Duration) -> Self {
        self.delays.insert(normalize(name), delay);
        self
    }

    /// Number of lookups served so far, reverse lookups included.
    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    fn take_transient(&self, name: &str) -> Option<LookupError> {
        let mut transient = self.transient.lock().ok()?;
        let (remaining, error) = transient.get_mut(name)?;
        if *remaining == 0 {
            return None;
        }
        *remaining -= 1;
        Some(error.clone())
    }

    async fn answer(&self, name: &str, record_type: RecordType) -> Result<Vec<DnsRecord>, LookupError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        let key = normalize(name);
        if key.is_empty() {
            return Err(LookupError::InvalidQuery("empty domain name".to_string()));
        }

        if let Some(delay) = self.delays.get(&key) {
            tokio::time::sleep(*delay).await;
        }
        if let Some(error) = self.failures.get(&key) {
            return Err(error.clone());
        }
        if let Some(error) = self.take_transient(&key) {
            return Err(error);
        }

        if let Some(records) = self.records.get(&(key.clone(), record_type)) {
            return Ok(records.clone());
        }
        if self.records.keys().any(|(owner, _)| *owner == key) {
            Err(LookupError::NoData {
                domain: name.to_string(),
                record_type: record_type.to_string(),
            })
        } else {
            Err(LookupError::NotFound(name.to_string()))
        }
    }
}

#[async_trait]
impl DnsBackend for StaticBackend {
    async fn lookup(
        &self,
        name: &str,
        record_type: RecordType,
    ) -> Result<Vec<DnsRecord>, LookupError> {
        self.answer(name, record_type).await
    }

    async fn reverse(&self, ip: IpAddr) -> Result<Vec<DnsRecord>, LookupError> {
        self.answer(&ip.to_string(), RecordType::PTR).await
    }
}
