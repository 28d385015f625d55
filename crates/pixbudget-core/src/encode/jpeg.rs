//! Progressive JPEG encoding.
//!
//! Uses mozjpeg with progressive scans and optimized Huffman tables, which
//! gives smaller files than baseline JPEG at equal perceptual quality.

use image::DynamicImage;
use mozjpeg::{ColorSpace, Compress};

use super::{EncodeError, FormatEncoder};
use crate::types::OutputFormat;

/// JPEG encoder: quality maps directly onto the 1-100 lossy scale.
#[derive(Debug, Clone, Copy, Default)]
pub struct JpegCodec;

impl FormatEncoder for JpegCodec {
    fn format(&self) -> OutputFormat {
        OutputFormat::Jpeg
    }

    fn encode(&self, image: &DynamicImage, quality: u8) -> Result<Vec<u8>, EncodeError> {
        let rgb = image.to_rgb8();
        encode_jpeg(rgb.as_raw(), rgb.width(), rgb.height(), quality)
    }
}

/// Encode RGB pixel data to progressive JPEG bytes.
///
/// # Arguments
///
/// * `pixels` - RGB pixel data (3 bytes per pixel, row-major order)
/// * `width` - Image width in pixels
/// * `height` - Image height in pixels
/// * `quality` - JPEG quality (1-100, clamped)
pub fn encode_jpeg(
    pixels: &[u8],
    width: u32,
    height: u32,
    quality: u8,
) -> Result<Vec<u8>, EncodeError> {
    if width == 0 || height == 0 {
        return Err(EncodeError::InvalidDimensions { width, height });
    }

    let expected_len = (width as usize) * (height as usize) * 3;
    if pixels.len() != expected_len {
        return Err(EncodeError::InvalidPixelData {
            expected: expected_len,
            actual: pixels.len(),
        });
    }

    let quality = quality.clamp(1, 100);

    let mut comp = Compress::new(ColorSpace::JCS_RGB);
    comp.set_size(width as usize, height as usize);
    comp.set_quality(quality as f32);
    comp.set_progressive_mode();
    comp.set_optimize_coding(true);

    // ~10% of raw size is typical
    let estimated_size = (expected_len / 10).max(1024);
    let mut started = comp
        .start_compress(Vec::with_capacity(estimated_size))
        .map_err(failed)?;
    started.write_scanlines(pixels).map_err(failed)?;
    started.finish().map_err(failed)
}

fn failed(err: std::io::Error) -> EncodeError {
    EncodeError::EncodingFailed {
        format: OutputFormat::Jpeg,
        message: format!("mozjpeg: {err}"),
    }
}
