//! Encoding-aware file reading.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use tokio::io::AsyncReadExt;

use super::encoding::{decode_buffer, detect_buffer_encoding, EncodingDetectionResult};
use crate::config::{CSV_DELIMITERS, CSV_SAMPLE_LINES, DETECTION_SAMPLE_BYTES};

/// File contents decoded with the detected encoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecodedFile {
    pub content: String,
    pub detection: EncodingDetectionResult,
}

/// Encoding detection plus a first look at the CSV shape of a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CsvEncodingInfo {
    #[serde(flatten)]
    pub detection: EncodingDetectionResult,
    pub looks_like_csv: bool,
    /// Up to `CSV_SAMPLE_LINES` non-empty lines from the start of the file.
    pub sample_lines: Vec<String>,
    /// Delimiters present in every sampled line, in preference order.
    pub potential_delimiters: Vec<char>,
}

/// Detects the encoding of the file at `path` from its first bytes.
pub async fn detect_file_encoding(path: &Path) -> Result<EncodingDetectionResult> {
    let file = tokio::fs::File::open(path)
        .await
        .with_context(|| format!("Failed to open {}", path.display()))?;

    // A few bytes past the sample tell the detector the sample was cut short
    let mut head = Vec::with_capacity(DETECTION_SAMPLE_BYTES + 8);
    file.take((DETECTION_SAMPLE_BYTES + 8) as u64)
        .read_to_end(&mut head)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;

    Ok(detect_buffer_encoding(&head))
}

/// Reads and decodes the whole file at `path`.
pub async fn read_file_with_detected_encoding(path: &Path) -> Result<DecodedFile> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let detection = detect_buffer_encoding(&bytes);
    log::debug!(
        "Detected {} ({}% confidence) for {}",
        detection.encoding_name(),
        detection.confidence,
        path.display()
    );
    let content = decode_buffer(&bytes, detection.encoding);
    Ok(DecodedFile { content, detection })
}

/// Detects the encoding of the file at `path` and sniffs its delimiter.
pub async fn detect_csv_encoding(path: &Path) -> Result<CsvEncodingInfo> {
    let decoded = read_file_with_detected_encoding(path).await?;
    let sample_lines = sample_lines(&decoded.content);
    let potential_delimiters = consistent_delimiters(&sample_lines)
        .into_iter()
        .map(char::from)
        .collect::<Vec<_>>();

    Ok(CsvEncodingInfo {
        detection: decoded.detection,
        looks_like_csv: !potential_delimiters.is_empty(),
        sample_lines,
        potential_delimiters,
    })
}

pub(crate) fn sample_lines(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim_end)
        .filter(|line| !line.trim().is_empty())
        .take(CSV_SAMPLE_LINES)
        .map(String::from)
        .collect()
}

/// Delimiters that occur in every line, most frequent first.
pub(crate) fn consistent_delimiters<S: AsRef<str>>(lines: &[S]) -> Vec<u8> {
    if lines.is_empty() {
        return Vec::new();
    }
    let mut found: Vec<(u8, usize)> = CSV_DELIMITERS
        .iter()
        .filter_map(|&delimiter| {
            let counts = lines
                .iter()
                .map(|line| line.as_ref().bytes().filter(|b| *b == delimiter).count());
            let mut min = usize::MAX;
            let mut total = 0;
            for count in counts {
                min = min.min(count);
                total += count;
            }
            (min > 0).then_some((delimiter, total))
        })
        .collect();
    found.sort_by(|a, b| b.1.cmp(&a.1));
    found.into_iter().map(|(delimiter, _)| delimiter).collect()
}
