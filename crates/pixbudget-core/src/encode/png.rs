//! Lossless PNG encoding.
//!
//! PNG keeps every pixel regardless of quality, so the quality value only
//! selects deflate effort. Real size reduction for PNG comes from the
//! resolution knob of the reduction loop.

use std::borrow::Cow;

use image::codecs::png::{CompressionType, FilterType as PngFilter, PngEncoder};
use image::{DynamicImage, ExtendedColorType, ImageEncoder};

use super::{EncodeError, FormatEncoder};
use crate::types::OutputFormat;

/// PNG encoder: higher quality means more compression effort.
#[derive(Debug, Clone, Copy, Default)]
pub struct PngCodec;

impl FormatEncoder for PngCodec {
    fn format(&self) -> OutputFormat {
        OutputFormat::Png
    }

    fn encode(&self, image: &DynamicImage, quality: u8) -> Result<Vec<u8>, EncodeError> {
        encode_png(image, quality)
    }
}

/// Map a 1-100 quality onto deflate effort.
pub fn compression_for_quality(quality: u8) -> CompressionType {
    match quality {
        0..=33 => CompressionType::Fast,
        34..=66 => CompressionType::Default,
        _ => CompressionType::Best,
    }
}

/// Encode an image to PNG, keeping greyscale and alpha layouts where present.
pub fn encode_png(image: &DynamicImage, quality: u8) -> Result<Vec<u8>, EncodeError> {
    let (width, height) = (image.width(), image.height());
    if width == 0 || height == 0 {
        return Err(EncodeError::InvalidDimensions { width, height });
    }

    let (pixels, color): (Cow<'_, [u8]>, ExtendedColorType) = match image {
        DynamicImage::ImageLuma8(buf) => (Cow::Borrowed(buf.as_raw()), ExtendedColorType::L8),
        DynamicImage::ImageLumaA8(buf) => (Cow::Borrowed(buf.as_raw()), ExtendedColorType::La8),
        DynamicImage::ImageRgb8(buf) => (Cow::Borrowed(buf.as_raw()), ExtendedColorType::Rgb8),
        DynamicImage::ImageRgba8(buf) => (Cow::Borrowed(buf.as_raw()), ExtendedColorType::Rgba8),
        other if other.color().has_alpha() => (
            Cow::Owned(other.to_rgba8().into_raw()),
            ExtendedColorType::Rgba8,
        ),
        other => (Cow::Owned(other.to_rgb8().into_raw()), ExtendedColorType::Rgb8),
    };

    let mut buffer = Vec::new();
    let encoder = PngEncoder::new_with_quality(
        &mut buffer,
        compression_for_quality(quality),
        PngFilter::Adaptive,
    );
    encoder
        .write_image(&pixels, width, height, color)
        .map_err(|e| EncodeError::EncodingFailed {
            format: OutputFormat::Png,
            message: e.to_string(),
        })?;

    Ok(buffer)
}
