//! Byte-order marks, charset guessing and decoding.

use encoding_rs::{Encoding, UTF_16BE, UTF_16LE, UTF_8, WINDOWS_1252};
use serde::{Serialize, Serializer};

use crate::config::{DETECTION_SAMPLE_BYTES, FALLBACK_CONFIDENCE, HIGH_CONFIDENCE, MAX_ALTERNATIVES};

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];
const UTF16LE_BOM: &[u8] = &[0xFF, 0xFE];
const UTF16BE_BOM: &[u8] = &[0xFE, 0xFF];
const UTF32LE_BOM: &[u8] = &[0xFF, 0xFE, 0x00, 0x00];
const UTF32BE_BOM: &[u8] = &[0x00, 0x00, 0xFE, 0xFF];

fn serialize_encoding<S: Serializer>(encoding: &&'static Encoding, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(encoding.name())
}

fn serialize_optional_encoding<S: Serializer>(
    encoding: &Option<&'static Encoding>,
    s: S,
) -> Result<S::Ok, S::Error> {
    match encoding {
        Some(e) => s.serialize_some(e.name()),
        None => s.serialize_none(),
    }
}

/// A byte-order mark found at the start of a buffer.
///
/// UTF-32 marks are recognized so that they are not mistaken for UTF-16, but
/// carry no encoding because none is available for decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BomDetection {
    #[serde(serialize_with = "serialize_optional_encoding")]
    pub encoding: Option<&'static Encoding>,
    pub bom_length: usize,
}

impl BomDetection {
    const NONE: BomDetection = BomDetection {
        encoding: None,
        bom_length: 0,
    };

    pub fn is_present(&self) -> bool {
        self.bom_length > 0
    }
}

pub fn detect_bom(bytes: &[u8]) -> BomDetection {
    // UTF-32LE starts with the UTF-16LE mark, so the 4-byte marks go first
    if bytes.starts_with(UTF32LE_BOM) || bytes.starts_with(UTF32BE_BOM) {
        return BomDetection {
            encoding: None,
            bom_length: 4,
        };
    }
    if bytes.starts_with(UTF8_BOM) {
        return BomDetection {
            encoding: Some(UTF_8),
            bom_length: 3,
        };
    }
    if bytes.starts_with(UTF16LE_BOM) {
        return BomDetection {
            encoding: Some(UTF_16LE),
            bom_length: 2,
        };
    }
    if bytes.starts_with(UTF16BE_BOM) {
        return BomDetection {
            encoding: Some(UTF_16BE),
            bom_length: 2,
        };
    }
    BomDetection::NONE
}

/// A scored candidate encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EncodingCandidate {
    #[serde(serialize_with = "serialize_encoding")]
    pub encoding: &'static Encoding,
    /// 0 to 100.
    pub confidence: u8,
}

/// Outcome of charset detection.
///
/// `confidence` is 100 exactly when a BOM decided the encoding.
/// `alternatives` holds at most three runners-up, best first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EncodingDetectionResult {
    #[serde(serialize_with = "serialize_encoding")]
    pub encoding: &'static Encoding,
    pub confidence: u8,
    pub bom_present: bool,
    pub alternatives: Vec<EncodingCandidate>,
    /// Set when detection had nothing to go on and UTF-8 was assumed.
    pub fallback_used: bool,
}

impl EncodingDetectionResult {
    fn fallback() -> Self {
        Self {
            encoding: UTF_8,
            confidence: FALLBACK_CONFIDENCE,
            bom_present: false,
            alternatives: Vec::new(),
            fallback_used: true,
        }
    }

    pub fn encoding_name(&self) -> &'static str {
        self.encoding.name()
    }
}

/// Detects the encoding of `bytes`.
///
/// A UTF-8 or UTF-16 BOM is authoritative. Otherwise the first
/// `DETECTION_SAMPLE_BYTES` are scored against UTF-8, both UTF-16 byte
/// orders, the `chardetng` guess and windows-1252. Empty input falls back to
/// UTF-8 at confidence 50 with `fallback_used` set.
pub fn detect_buffer_encoding(bytes: &[u8]) -> EncodingDetectionResult {
    let bom = detect_bom(bytes);
    if let Some(encoding) = bom.encoding {
        return EncodingDetectionResult {
            encoding,
            confidence: 100,
            bom_present: true,
            alternatives: Vec::new(),
            fallback_used: false,
        };
    }
    if bom.is_present() {
        log::warn!("UTF-32 byte-order mark found; UTF-32 is not supported, guessing instead");
    }

    let body = &bytes[bom.bom_length..];
    let sample = &body[..body.len().min(DETECTION_SAMPLE_BYTES)];
    if sample.is_empty() {
        log::debug!("Nothing to detect an encoding from, assuming UTF-8");
        return EncodingDetectionResult::fallback();
    }

    let mut candidates = score_candidates(sample, sample.len() < body.len());
    if candidates.is_empty() {
        log::warn!("No candidate encoding decodes the input, assuming UTF-8");
        return EncodingDetectionResult::fallback();
    }

    // Stable sort keeps the insertion order (UTF-8 first) on ties
    candidates.sort_by(|a, b| b.confidence.cmp(&a.confidence));
    let best = candidates.remove(0);
    candidates.truncate(MAX_ALTERNATIVES);

    EncodingDetectionResult {
        encoding: best.encoding,
        confidence: best.confidence,
        bom_present: false,
        alternatives: candidates,
        fallback_used: false,
    }
}

fn score_candidates(sample: &[u8], truncated: bool) -> Vec<EncodingCandidate> {
    let mut candidates: Vec<EncodingCandidate> = Vec::new();
    let mut push = |encoding: &'static Encoding, confidence: u8| {
        if confidence > 0 && !candidates.iter().any(|c| c.encoding == encoding) {
            candidates.push(EncodingCandidate {
                encoding,
                confidence,
            });
        }
    };

    let ascii_only = sample.is_ascii();
    let (even_zeros, odd_zeros) = zero_byte_ratios(sample);

    // NUL-heavy text is almost certainly UTF-16 even though it is valid UTF-8
    let utf8_penalty = ((even_zeros.max(odd_zeros)) * 60.0) as u8;
    if is_valid_utf8(sample, truncated) {
        let base: u8 = if ascii_only { 90 } else { 95 };
        push(UTF_8, base.saturating_sub(utf8_penalty));
    }

    if sample.len() >= 2 {
        // ASCII text in UTF-16LE has a zero in every odd byte
        if odd_zeros >= 0.3 && decodes_cleanly(UTF_16LE, sample, truncated) {
            push(UTF_16LE, (60.0 + odd_zeros * 35.0) as u8);
        }
        if even_zeros >= 0.3 && decodes_cleanly(UTF_16BE, sample, truncated) {
            push(UTF_16BE, (60.0 + even_zeros * 35.0) as u8);
        }
    }

    if !ascii_only {
        let mut detector = chardetng::EncodingDetector::new();
        detector.feed(sample, !truncated);
        let guess = detector.guess(None, true);
        if guess != UTF_8 && decodes_cleanly(guess, sample, truncated) {
            push(guess, 75);
        }
    }

    // Single-byte fallback that decodes anything
    push(WINDOWS_1252, if ascii_only { 80 } else { 40 });
    candidates
}

/// Fractions of zero bytes at even and odd offsets, relative to half the
/// sample each.
fn zero_byte_ratios(sample: &[u8]) -> (f64, f64) {
    let half = (sample.len() / 2).max(1) as f64;
    let even = sample.iter().step_by(2).filter(|b| **b == 0).count() as f64;
    let odd = sample.iter().skip(1).step_by(2).filter(|b| **b == 0).count() as f64;
    ((even / half).min(1.0), (odd / half).min(1.0))
}

fn is_valid_utf8(sample: &[u8], truncated: bool) -> bool {
    match std::str::from_utf8(sample) {
        Ok(_) => true,
        // A sequence cut by the sample boundary is not an error
        Err(e) => truncated && e.error_len().is_none(),
    }
}

fn decodes_cleanly(encoding: &'static Encoding, sample: &[u8], truncated: bool) -> bool {
    let sample = if truncated && !encoding.is_single_byte() {
        // Leave room for a multi-byte sequence cut at the boundary
        &sample[..sample.len().saturating_sub(4)]
    } else {
        sample
    };
    let (_, had_errors) = encoding.decode_without_bom_handling(sample);
    !had_errors
}

/// Decodes `bytes` as `encoding` after removing any leading BOM.
///
/// The BOM is stripped whichever encoding it marks, so a caller-chosen
/// `encoding` never sees it. Malformed sequences become U+FFFD; decoding never
/// fails.
pub fn decode_buffer(bytes: &[u8], encoding: &'static Encoding) -> String {
    let bom = detect_bom(bytes);
    if let Some(marked) = bom.encoding.filter(|marked| *marked != encoding) {
        log::debug!(
            "Stripping a {} byte-order mark before decoding as {}",
            marked.name(),
            encoding.name()
        );
    }
    let (text, had_errors) = encoding.decode_without_bom_handling(&bytes[bom.bom_length..]);
    if had_errors {
        log::debug!(
            "Input contained sequences that are malformed in {}",
            encoding.name()
        );
    }
    text.into_owned()
}

/// Looks up an encoding by WHATWG label (`"latin1"`, `"utf-16le"`, `"sjis"`).
pub fn encoding_from_label(label: &str) -> Option<&'static Encoding> {
    Encoding::for_label(label.trim().as_bytes())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReliabilityLevel {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DetectionReliability {
    pub level: ReliabilityLevel,
    pub recommendation: String,
}

pub fn evaluate_detection_reliability(result: &EncodingDetectionResult) -> DetectionReliability {
    if result.bom_present || result.confidence >= HIGH_CONFIDENCE {
        return DetectionReliability {
            level: ReliabilityLevel::High,
            recommendation: format!("Use {} as detected", result.encoding_name()),
        };
    }
    if result.confidence >= FALLBACK_CONFIDENCE {
        let recommendation = match result.alternatives.first() {
            Some(alt) => format!(
                "Verify the output; if characters look wrong, try {} ({}% confidence)",
                alt.encoding.name(),
                alt.confidence
            ),
            None => "Verify the output; no alternative encoding was found".to_string(),
        };
        return DetectionReliability {
            level: ReliabilityLevel::Medium,
            recommendation,
        };
    }
    DetectionReliability {
        level: ReliabilityLevel::Low,
        recommendation: "Specify the file encoding manually".to_string(),
    }
}
