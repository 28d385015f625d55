//! Lossy WebP encoding through libwebp.

use ::webp::{Encoder, WebPConfig, WebPMemory};
use image::DynamicImage;

use super::{EncodeError, FormatEncoder};
use crate::types::OutputFormat;

/// libwebp `method`: 0 is fastest, 6 is slowest and smallest.
pub const WEBP_METHOD: i32 = 6;

/// WebP encoder: quality maps directly onto the 1-100 lossy scale.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebpCodec;

impl FormatEncoder for WebpCodec {
    fn format(&self) -> OutputFormat {
        OutputFormat::Webp
    }

    fn encode(&self, image: &DynamicImage, quality: u8) -> Result<Vec<u8>, EncodeError> {
        encode_webp(image, quality)
    }
}

/// Encode an image to lossy WebP, keeping alpha when the source has it.
pub fn encode_webp(image: &DynamicImage, quality: u8) -> Result<Vec<u8>, EncodeError> {
    let (width, height) = (image.width(), image.height());
    if width == 0 || height == 0 {
        return Err(EncodeError::InvalidDimensions { width, height });
    }

    let mut config = WebPConfig::new().map_err(|_| failed("failed to create WebPConfig".into()))?;
    config.lossless = 0;
    config.quality = quality.clamp(1, 100) as f32;
    config.method = WEBP_METHOD;

    let memory: WebPMemory = if image.color().has_alpha() {
        let rgba = image.to_rgba8();
        Encoder::from_rgba(rgba.as_raw(), width, height).encode_advanced(&config)
    } else {
        let rgb = image.to_rgb8();
        Encoder::from_rgb(rgb.as_raw(), width, height).encode_advanced(&config)
    }
    .map_err(|e| failed(format!("{e:?}")))?;

    Ok(memory.to_vec())
}

fn failed(message: String) -> EncodeError {
    EncodeError::EncodingFailed {
        format: OutputFormat::Webp,
        message,
    }
}
