//! Domain list extraction from CSV or plain-text input.

use std::collections::HashSet;
use std::path::Path;

use anyhow::Result;
use serde::Serialize;
use url::{Host, Url};

use super::encoding::EncodingDetectionResult;
use super::file::{consistent_delimiters, read_file_with_detected_encoding, sample_lines};
use crate::config::{MAX_DOMAIN_LENGTH, MAX_LABEL_LENGTH};

/// Header names that mark the domain column.
const DOMAIN_HEADERS: &[&str] = &["domain", "hostname", "host", "fqdn", "url", "name"];

/// Normalized, de-duplicated domains ready for resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DomainList {
    /// In order of first appearance.
    pub domains: Vec<String>,
    /// Rows whose value was not a usable domain.
    pub skipped: usize,
    /// Repeats of an earlier domain.
    pub duplicates: usize,
    /// The field delimiter, or `None` for single-column input.
    pub delimiter: Option<char>,
    /// Set when the list was read from a file.
    pub detection: Option<EncodingDetectionResult>,
}

impl DomainList {
    pub fn len(&self) -> usize {
        self.domains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }
}

/// Reduces `raw` to a lower-case host name, or `None` when it is not one.
///
/// Accepts bare names, names with a port or path, and URLs. IP addresses,
/// single labels and names with invalid characters are rejected.
pub fn normalize_domain(raw: &str) -> Option<String> {
    let raw = raw.trim().trim_matches('"');
    if raw.is_empty() {
        return None;
    }

    let parsed = if raw.contains("://") {
        Url::parse(raw)
    } else {
        Url::parse(&format!("http://{raw}"))
    }
    .ok()?;

    let host = match parsed.host()? {
        Host::Domain(domain) => domain.trim_end_matches('.').to_lowercase(),
        Host::Ipv4(_) | Host::Ipv6(_) => return None,
    };

    is_valid_domain(&host).then_some(host)
}

fn is_valid_domain(domain: &str) -> bool {
    if domain.is_empty() || domain.len() > MAX_DOMAIN_LENGTH {
        return false;
    }
    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 {
        return false;
    }
    labels.iter().all(|label| {
        !label.is_empty()
            && label.len() <= MAX_LABEL_LENGTH
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    })
}

/// Extracts domains from CSV or one-per-line text.
///
/// Without an explicit `delimiter`, one is sniffed from the first lines; input
/// with no consistent delimiter is read as a single column. If the first row
/// names a domain column (`domain`, `hostname`, `host`, `fqdn`, `url`,
/// `name`) that column is used, otherwise the first. Blank lines and lines
/// starting with `#` are ignored; unusable values are counted in `skipped`.
pub fn extract_domains(content: &str, delimiter: Option<u8>) -> DomainList {
    let delimiter = delimiter.or_else(|| {
        let lines: Vec<String> = sample_lines(content)
            .into_iter()
            .filter(|line| !line.trim_start().starts_with('#'))
            .collect();
        consistent_delimiters(&lines).first().copied()
    });

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .delimiter(delimiter.unwrap_or(b','))
        .from_reader(content.as_bytes());

    let mut domains = Vec::new();
    let mut seen = HashSet::new();
    let mut skipped = 0usize;
    let mut duplicates = 0usize;
    let mut column: Option<usize> = None;

    for record in reader.records() {
        let record = match record {
            Ok(record) => record,
            Err(e) => {
                log::debug!("Skipping unreadable row: {e}");
                skipped += 1;
                continue;
            }
        };
        if record.iter().all(str::is_empty) {
            continue;
        }
        if record.get(0).is_some_and(|first| first.starts_with('#')) {
            continue;
        }

        let index = match column {
            Some(index) => index,
            None => {
                let header = record.iter().position(|field| {
                    DOMAIN_HEADERS.contains(&field.to_ascii_lowercase().as_str())
                });
                column = Some(header.unwrap_or(0));
                if header.is_some() {
                    continue;
                }
                0
            }
        };

        let Some(value) = record.get(index) else {
            skipped += 1;
            continue;
        };
        match normalize_domain(value) {
            Some(domain) => {
                if seen.insert(domain.clone()) {
                    domains.push(domain);
                } else {
                    duplicates += 1;
                }
            }
            None => {
                log::debug!("Skipping invalid domain entry: {value:?}");
                skipped += 1;
            }
        }
    }

    DomainList {
        domains,
        skipped,
        duplicates,
        delimiter: delimiter.map(char::from),
        detection: None,
    }
}

/// Reads, decodes and extracts the domain list at `path`.
pub async fn load_domains(path: &Path) -> Result<DomainList> {
    let decoded = read_file_with_detected_encoding(path).await?;
    let mut list = extract_domains(&decoded.content, None);
    log::info!(
        "Loaded {} domains from {} ({} skipped, {} duplicates, encoding {})",
        list.len(),
        path.display(),
        list.skipped,
        list.duplicates,
        decoded.detection.encoding_name()
    );
    list.detection = Some(decoded.detection);
    Ok(list)
}
