// Shared test helpers: in-memory DNS zones and input files.
//
// This module provides common utilities used across multiple test files to reduce duplication.

use std::io::Write;
use std::sync::Arc;

use domain_trace::dns::{DnsRecord, RecordType, StaticBackend};
use tempfile::NamedTempFile;

/// A small zone with a clean chain, a loop, a deep chain and a dangling alias.
///
/// - `www.example.com -> cdn.example.net -> edge.cdn.example` (A record at the end)
/// - `loop-a.example -> loop-b.example -> loop-a.example`
/// - `hop1.example -> hop2.example -> ... -> hop12.example`
/// - `old.example.com -> retired.example.net` (NXDOMAIN)
/// - `example.com` with A, MX and TXT records
#[allow(dead_code)] // Used by other test files
pub fn test_zone() -> StaticBackend {
    let mut zone = StaticBackend::new()
        .with_cname("www.example.com", "cdn.example.net")
        .with_cname("cdn.example.net", "edge.cdn.example")
        .with_a("edge.cdn.example", "203.0.113.10")
        .with_cname("loop-a.example", "loop-b.example")
        .with_cname("loop-b.example", "loop-a.example")
        .with_cname("old.example.com", "retired.example.net")
        .with_a("example.com", "93.184.216.34")
        .with_record("example.com", DnsRecord::mx("mail.example.com", 10, 3600))
        .with_record(
            "example.com",
            DnsRecord::new(RecordType::TXT, "v=spf1 -all", 3600),
        )
        .with_a("example.org", "93.184.216.35");

    for i in 1..12 {
        zone = zone.with_cname(&format!("hop{i}.example"), &format!("hop{}.example", i + 1));
    }
    zone.with_a("hop12.example", "198.51.100.12")
}

#[allow(dead_code)] // Used by other test files
pub fn shared_zone() -> Arc<StaticBackend> {
    Arc::new(test_zone())
}

/// Writes `bytes` to a temporary file that lives as long as the handle.
#[allow(dead_code)] // Used by other test files
pub fn write_input(bytes: &[u8]) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    file.write_all(bytes).expect("Failed to write temp file");
    file.flush().expect("Failed to flush temp file");
    file
}

/// Encodes `text` as UTF-16LE with a byte-order mark.
#[allow(dead_code)] // Used by other test files
pub fn utf16le_with_bom(text: &str) -> Vec<u8> {
    let mut bytes = vec![0xFF, 0xFE];
    bytes.extend(text.encode_utf16().flat_map(|unit| unit.to_le_bytes()));
    bytes
}
