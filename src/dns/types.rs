//! DNS query and result types.

use serde::Serialize;
use strum_macros::{Display, EnumIter, EnumString};

use crate::error_handling::ErrorType;

/// Record types the resolver understands.
///
/// Parsing is case-insensitive (`"mx"`, `"MX"`). `CAA` is accepted but never
/// queried: it always resolves to a successful, empty answer.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, EnumIter, EnumString,
)]
#[strum(ascii_case_insensitive)]
#[allow(clippy::upper_case_acronyms)]
pub enum RecordType {
    A,
    AAAA,
    CNAME,
    MX,
    TXT,
    NS,
    PTR,
    SRV,
    SOA,
    CAA,
}

impl RecordType {
    pub(crate) fn to_hickory(self) -> hickory_resolver::proto::rr::RecordType {
        use hickory_resolver::proto::rr::RecordType as Hickory;
        match self {
            RecordType::A => Hickory::A,
            RecordType::AAAA => Hickory::AAAA,
            RecordType::CNAME => Hickory::CNAME,
            RecordType::MX => Hickory::MX,
            RecordType::TXT => Hickory::TXT,
            RecordType::NS => Hickory::NS,
            RecordType::PTR => Hickory::PTR,
            RecordType::SRV => Hickory::SRV,
            RecordType::SOA => Hickory::SOA,
            RecordType::CAA => Hickory::CAA,
        }
    }
}

/// One resolution request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct DnsQuery {
    pub domain: String,
    pub record_type: RecordType,
}

impl DnsQuery {
    pub fn new(domain: impl Into<String>, record_type: RecordType) -> Self {
        Self {
            domain: domain.into(),
            record_type,
        }
    }
}

/// A single normalized answer record.
///
/// `priority` is set for MX and SRV; `weight` and `port` for SRV only. Names
/// are rendered without the trailing root dot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DnsRecord {
    pub record_type: RecordType,
    pub value: String,
    pub ttl: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
}

impl DnsRecord {
    pub fn new(record_type: RecordType, value: impl Into<String>, ttl: u32) -> Self {
        Self {
            record_type,
            value: value.into(),
            ttl,
            priority: None,
            weight: None,
            port: None,
        }
    }

    pub fn mx(exchange: impl Into<String>, preference: u16, ttl: u32) -> Self {
        Self {
            priority: Some(preference),
            ..Self::new(RecordType::MX, exchange, ttl)
        }
    }

    pub fn srv(target: impl Into<String>, priority: u16, weight: u16, port: u16, ttl: u32) -> Self {
        Self {
            priority: Some(priority),
            weight: Some(weight),
            port: Some(port),
            ..Self::new(RecordType::SRV, target, ttl)
        }
    }
}

/// Outcome class of a resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolutionStatus {
    Success,
    Error,
    Timeout,
}

/// Result of resolving one [`DnsQuery`].
///
/// `records` is empty whenever `status` is not `Success`; a successful result
/// may also be empty (CAA). `response_time_ms` is always set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolutionResult {
    pub query: DnsQuery,
    pub status: ResolutionStatus,
    pub records: Vec<DnsRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub response_time_ms: f64,
    /// Failure category, for statistics.
    #[serde(skip)]
    pub error_type: Option<ErrorType>,
    /// Whether the same query might succeed if repeated.
    #[serde(skip)]
    pub retriable: bool,
    /// The record type name as given, when it did not parse.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requested_type: Option<String>,
}

impl ResolutionResult {
    pub fn success(query: DnsQuery, records: Vec<DnsRecord>, response_time_ms: f64) -> Self {
        Self {
            query,
            status: ResolutionStatus::Success,
            records,
            error: None,
            response_time_ms,
            error_type: None,
            retriable: false,
            requested_type: None,
        }
    }

    pub fn failure(
        query: DnsQuery,
        error_type: ErrorType,
        message: impl Into<String>,
        retriable: bool,
        response_time_ms: f64,
    ) -> Self {
        let status = if error_type == ErrorType::Timeout {
            ResolutionStatus::Timeout
        } else {
            ResolutionStatus::Error
        };
        Self {
            query,
            status,
            records: Vec::new(),
            error: Some(message.into()),
            response_time_ms,
            error_type: Some(error_type),
            retriable,
            requested_type: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ResolutionStatus::Success
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn test_record_type_parsing_is_case_insensitive() {
        assert_eq!(RecordType::from_str("mx").unwrap(), RecordType::MX);
        assert_eq!(RecordType::from_str("Cname").unwrap(), RecordType::CNAME);
        assert_eq!(RecordType::from_str("AAAA").unwrap(), RecordType::AAAA);
        assert!(RecordType::from_str("HINFO").is_err());
    }

    #[test]
    fn test_record_type_display_round_trips() {
        for rt in RecordType::iter() {
            assert_eq!(RecordType::from_str(&rt.to_string()).unwrap(), rt);
        }
    }

    #[test]
    fn test_failure_status_follows_error_type() {
        let q = DnsQuery::new("example.com", RecordType::A);
        let timeout = ResolutionResult::failure(q.clone(), ErrorType::Timeout, "t", true, 5.0);
        assert_eq!(timeout.status, ResolutionStatus::Timeout);
        assert!(timeout.records.is_empty());

        let error = ResolutionResult::failure(q, ErrorType::DomainNotFound, "nx", false, 5.0);
        assert_eq!(error.status, ResolutionStatus::Error);
        assert!(!error.is_success());
    }

    #[test]
    fn test_serialized_shape() {
        let result = ResolutionResult::success(
            DnsQuery::new("example.com", RecordType::MX),
            vec![DnsRecord::mx("mail.example.com", 10, 300)],
            12.5,
        );
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["status"], "success");
        assert_eq!(json["query"]["record_type"], "MX");
        assert_eq!(json["records"][0]["priority"], 10);
        assert!(json["records"][0].get("port").is_none());
        assert!(json.get("error").is_none());
        assert!(json.get("retriable").is_none());
    }
}
