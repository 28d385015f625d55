//! Metadata probing of the original upload.
//!
//! Reads only container headers: format signature, dimensions and EXIF
//! orientation. No pixel data is decoded.

use std::io::Cursor;

use image::ImageReader;
use tracing::debug;

use crate::decode::get_orientation;
use crate::types::{EngineError, ImageMetadata, SourceFormat};

/// Inspect raw bytes and return their dimensions and source format.
///
/// # Errors
///
/// Returns `EngineError::UnsupportedFormat` when the signature is not JPEG,
/// PNG, WebP or GIF, and `EngineError::CorruptImage` when the format is known
/// but its dimensions cannot be read.
pub fn probe(raw_bytes: &[u8]) -> Result<ImageMetadata, EngineError> {
    let reader = ImageReader::new(Cursor::new(raw_bytes))
        .with_guessed_format()
        .map_err(|e| EngineError::CorruptImage(e.to_string()))?;

    let format = reader.format().ok_or_else(|| {
        EngineError::UnsupportedFormat("unrecognized image signature".to_string())
    })?;
    let source_format = SourceFormat::from_image_format(format)
        .ok_or_else(|| EngineError::UnsupportedFormat(format!("{format:?}")))?;

    let (width, height) = reader
        .into_dimensions()
        .map_err(|e| EngineError::CorruptImage(e.to_string()))?;
    if width == 0 || height == 0 {
        return Err(EngineError::CorruptImage(format!(
            "zero-sized image: {width}x{height}"
        )));
    }

    let orientation = if source_format == SourceFormat::Gif {
        Default::default()
    } else {
        get_orientation(raw_bytes)
    };

    debug!(
        width,
        height,
        format = %source_format,
        ?orientation,
        size = raw_bytes.len(),
        "Probed source image"
    );

    Ok(ImageMetadata {
        width,
        height,
        source_format,
        orientation,
    })
}
