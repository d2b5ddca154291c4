//! DNS backends.
//!
//! The resolver and the chain tracer talk to DNS through [`DnsBackend`], so
//! bulk runs use hickory while tests plug in fixed zones.

use std::net::IpAddr;
use std::sync::Arc;

use async_trait::async_trait;
use hickory_resolver::error::{ResolveError, ResolveErrorKind};
use hickory_resolver::proto::op::ResponseCode;
use hickory_resolver::proto::rr::{RData, Record};
use hickory_resolver::{Name, TokioAsyncResolver};

use super::types::{DnsRecord, RecordType};
use crate::error_handling::LookupError;

/// Source of DNS answers.
#[async_trait]
pub trait DnsBackend: Send + Sync {
    /// Returns the records of `record_type` owned by `name`.
    async fn lookup(&self, name: &str, record_type: RecordType)
        -> Result<Vec<DnsRecord>, LookupError>;

    /// Returns the PTR records for `ip`.
    async fn reverse(&self, ip: IpAddr) -> Result<Vec<DnsRecord>, LookupError>;
}

#[async_trait]
impl<B: DnsBackend + ?Sized> DnsBackend for Arc<B> {
    async fn lookup(
        &self,
        name: &str,
        record_type: RecordType,
    ) -> Result<Vec<DnsRecord>, LookupError> {
        (**self).lookup(name, record_type).await
    }

    async fn reverse(&self, ip: IpAddr) -> Result<Vec<DnsRecord>, LookupError> {
        (**self).reverse(ip).await
    }
}

/// Backend using `hickory-resolver`.
#[derive(Clone)]
pub struct HickoryBackend {
    resolver: Arc<TokioAsyncResolver>,
}

impl HickoryBackend {
    pub fn new(resolver: Arc<TokioAsyncResolver>) -> Self {
        Self { resolver }
    }
}

#[async_trait]
impl DnsBackend for HickoryBackend {
    async fn lookup(
        &self,
        name: &str,
        record_type: RecordType,
    ) -> Result<Vec<DnsRecord>, LookupError> {
        if name.trim().is_empty() {
            return Err(LookupError::InvalidQuery("empty domain name".to_string()));
        }
        let wanted = record_type.to_hickory();
        let lookup = self
            .resolver
            .lookup(name, wanted)
            .await
            .map_err(|e| map_resolve_error(name, record_type, &e))?;

        // Answers for A/AAAA may carry the CNAME records that led to them
        Ok(lookup
            .record_iter()
            .filter(|record| record.record_type() == wanted)
            .filter_map(convert_record)
            .collect())
    }

    async fn reverse(&self, ip: IpAddr) -> Result<Vec<DnsRecord>, LookupError> {
        let lookup = self
            .resolver
            .reverse_lookup(ip)
            .await
            .map_err(|e| map_resolve_error(&ip.to_string(), RecordType::PTR, &e))?;
        Ok(lookup
            .as_lookup()
            .record_iter()
            .filter_map(convert_record)
            .collect())
    }
}

/// Classifies a hickory failure.
fn map_resolve_error(name: &str, record_type: RecordType, err: &ResolveError) -> LookupError {
    match err.kind() {
        ResolveErrorKind::NoRecordsFound { response_code, .. }
            if *response_code == ResponseCode::NXDomain =>
        {
            LookupError::NotFound(name.to_string())
        }
        ResolveErrorKind::NoRecordsFound { .. } => LookupError::NoData {
            domain: name.to_string(),
            record_type: record_type.to_string(),
        },
        ResolveErrorKind::Timeout => LookupError::Timeout(name.to_string()),
        _ => {
            let error_msg = err.to_string();
            // Transport timeouts surface as protocol errors
            if error_msg.contains("timed out") || error_msg.contains("timeout") {
                log::warn!("{record_type} lookup timed out for {name}: {err}");
                LookupError::Timeout(name.to_string())
            } else {
                log::warn!("Failed to lookup {record_type} records for {name}: {err}");
                LookupError::Network(error_msg)
            }
        }
    }
}

fn name_to_string(name: &Name) -> String {
    name.to_utf8().trim_end_matches('.').to_string()
}

fn convert_record(record: &Record) -> Option<DnsRecord> {
    let ttl = record.ttl();
    let record = match record.data()? {
        RData::A(a) => DnsRecord::new(RecordType::A, a.to_string(), ttl),
        RData::AAAA(aaaa) => DnsRecord::new(RecordType::AAAA, aaaa.to_string(), ttl),
        RData::CNAME(cname) => DnsRecord::new(RecordType::CNAME, name_to_string(cname), ttl),
        RData::NS(ns) => DnsRecord::new(RecordType::NS, name_to_string(ns), ttl),
        RData::PTR(ptr) => DnsRecord::new(RecordType::PTR, name_to_string(ptr), ttl),
        RData::MX(mx) => DnsRecord::mx(name_to_string(mx.exchange()), mx.preference(), ttl),
        RData::TXT(txt) => {
            // TXT records can contain multiple strings - join them
            let text = txt
                .iter()
                .map(|bytes| String::from_utf8_lossy(bytes).to_string())
                .collect::<Vec<String>>()
                .join("");
            DnsRecord::new(RecordType::TXT, text, ttl)
        }
        RData::SRV(srv) => DnsRecord::srv(
            name_to_string(srv.target()),
            srv.priority(),
            srv.weight(),
            srv.port(),
            ttl,
        ),
        RData::SOA(soa) => DnsRecord::new(
            RecordType::SOA,
            format!(
                "{} {} {} {} {} {} {}",
                name_to_string(soa.mname()),
                name_to_string(soa.rname()),
                soa.serial(),
                soa.refresh(),
                soa.retry(),
                soa.expire(),
                soa.minimum()
            ),
            ttl,
        ),
        _ => return None,
    };
    Some(record)
}
