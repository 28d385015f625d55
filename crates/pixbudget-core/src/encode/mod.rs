//! Output encoding for the transcoding engine.
//!
//! This module provides functionality for:
//! - Encoding to progressive JPEG (mozjpeg) with a 1-100 quality scale
//! - Encoding to lossless PNG with quality mapped to compression effort
//! - Encoding to lossy WebP (libwebp) at a fixed high effort
//!
//! # Architecture
//!
//! Each output format has one [`FormatEncoder`] implementation. The engine
//! picks the encoder once per request with [`encoder_for`] and reuses it for
//! every attempt of the reduction loop.
//!
//! # Examples
//!
//! ```ignore
//! use pixbudget_core::encode::{encoder_for, encode_scaled};
//!
//! let encoder = encoder_for(OutputFormat::Webp);
//! let out = encode_scaled(&source, 640, 480, encoder, 75, FilterType::Lanczos3)?;
//! println!("Encoded {}x{} in {} bytes", out.width, out.height, out.bytes.len());
//! ```

mod jpeg;
mod png;
mod webp;

use image::DynamicImage;
use thiserror::Error;

use crate::decode::{decode_source, resize_to_fit, FilterType};
use crate::types::{EngineError, OutputFormat};

pub use self::jpeg::{encode_jpeg, JpegCodec};
pub use self::png::{compression_for_quality, encode_png, PngCodec};
pub use self::webp::{encode_webp, WebpCodec, WEBP_METHOD};

/// Errors that can occur in the codec layer.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// Pixel data length doesn't match expected dimensions
    #[error("Invalid pixel data: expected {expected} bytes (width * height * 3), got {actual}")]
    InvalidPixelData { expected: usize, actual: usize },

    /// Width or height is zero
    #[error("Invalid dimensions: width ({width}) and height ({height}) must be non-zero")]
    InvalidDimensions { width: u32, height: u32 },

    /// The underlying codec rejected the input
    #[error("{format} encoding failed: {message}")]
    EncodingFailed {
        format: OutputFormat,
        message: String,
    },
}

/// Uniform encode capability, one implementation per output format.
pub trait FormatEncoder: Send + Sync {
    /// The format this encoder produces.
    fn format(&self) -> OutputFormat;

    /// Encode pixels at their current dimensions.
    fn encode(&self, image: &DynamicImage, quality: u8) -> Result<Vec<u8>, EncodeError>;
}

/// Select the encoder for an output format.
pub fn encoder_for(format: OutputFormat) -> &'static dyn FormatEncoder {
    match format {
        OutputFormat::Jpeg => &JpegCodec,
        OutputFormat::Png => &PngCodec,
        OutputFormat::Webp => &WebpCodec,
    }
}

/// Bytes produced by one attempt plus the dimensions actually encoded.
#[derive(Debug, Clone)]
pub struct Encoded {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Resize `source` to fit inside the box and encode the result.
///
/// `source` must be the decode of the original upload; the box is never used
/// to enlarge it.
///
/// # Errors
///
/// Returns `EncodeError::InvalidDimensions` if either box edge is zero, or
/// whatever the selected codec reports.
pub fn encode_scaled(
    source: &DynamicImage,
    box_width: u32,
    box_height: u32,
    encoder: &dyn FormatEncoder,
    quality: u8,
    filter: FilterType,
) -> Result<Encoded, EncodeError> {
    if box_width == 0 || box_height == 0 {
        return Err(EncodeError::InvalidDimensions {
            width: box_width,
            height: box_height,
        });
    }

    let resized =
        resize_to_fit(source, box_width, box_height, filter).map_err(|e| {
            EncodeError::EncodingFailed {
                format: encoder.format(),
                message: e.to_string(),
            }
        })?;

    let bytes = encoder.encode(&resized, quality)?;
    Ok(Encoded {
        bytes,
        width: resized.width(),
        height: resized.height(),
    })
}

/// Encode the original upload into `format` inside a `width x height` box.
///
/// Decodes `raw_bytes` afresh on every call, so repeated calls never compound
/// lossy artifacts.
pub fn encode(
    raw_bytes: &[u8],
    width: u32,
    height: u32,
    format: OutputFormat,
    quality: u8,
) -> Result<Vec<u8>, EngineError> {
    let source = decode_source(raw_bytes, true)?;
    let encoded = encode_scaled(
        &source,
        width,
        height,
        encoder_for(format),
        quality,
        FilterType::default(),
    )?;
    Ok(encoded.bytes)
}
