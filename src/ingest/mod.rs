//! Encoding-aware ingestion of domain lists.
//!
//! Files are decoded with a detected encoding (BOM first, then statistical
//! guessing), then parsed as CSV or one-name-per-line text and normalized.

mod domains;
mod encoding;
mod file;

pub use domains::{extract_domains, load_domains, normalize_domain, DomainList};
pub use encoding::{
    decode_buffer, detect_bom, detect_buffer_encoding, encoding_from_label,
    evaluate_detection_reliability, BomDetection, DetectionReliability, EncodingCandidate,
    EncodingDetectionResult, ReliabilityLevel,
};
pub use file::{
    detect_csv_encoding, detect_file_encoding, read_file_with_detected_encoding, CsvEncodingInfo,
    DecodedFile,
};
