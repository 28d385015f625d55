//! Packaging of the final bytes into an [`EncodeResult`].

use crate::fingerprint::fingerprint;
use crate::types::{EncodeAttempt, EncodeResult, OutputFormat};

/// Build the result for the winning attempt.
///
/// `original` is the untouched upload, used only for the size statistics.
pub fn assemble(
    original: &[u8],
    format: OutputFormat,
    bytes: Vec<u8>,
    attempts: Vec<EncodeAttempt>,
) -> EncodeResult {
    let original_size = original.len() as u64;
    let final_size = bytes.len() as u64;

    EncodeResult {
        digest: fingerprint(&bytes),
        bytes,
        format,
        final_size,
        original_size,
        compression_ratio_percent: compression_ratio_percent(original_size, final_size),
        attempts,
    }
}

/// `(original - final) / original * 100`, or 0 for an empty original.
pub fn compression_ratio_percent(original_size: u64, final_size: u64) -> f64 {
    if original_size == 0 {
        return 0.0;
    }
    (original_size as f64 - final_size as f64) / original_size as f64 * 100.0
}
