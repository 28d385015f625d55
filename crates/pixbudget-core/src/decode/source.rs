//! Source image decoding with EXIF orientation handling.
//!
//! The source is decoded exactly once per request. Every reduction attempt
//! resizes from this pristine decode, so no attempt ever sees the output of a
//! previous lossy encode.

use std::io::Cursor;

use exif::{In, Reader, Tag};
use image::{DynamicImage, ImageReader};

use super::{DecodeError, Orientation};

/// Decode the original upload into pixels.
///
/// GIF sources yield their first frame. With `auto_orient` the EXIF
/// orientation (if any) is applied so the result is upright.
///
/// # Errors
///
/// Returns `DecodeError::InvalidFormat` if no decoder recognises the bytes.
/// Returns `DecodeError::CorruptedFile` if decoding fails part way.
pub fn decode_source(bytes: &[u8], auto_orient: bool) -> Result<DynamicImage, DecodeError> {
    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| DecodeError::CorruptedFile(e.to_string()))?;

    if reader.format().is_none() {
        return Err(DecodeError::InvalidFormat);
    }

    let img = reader
        .decode()
        .map_err(|e| DecodeError::CorruptedFile(e.to_string()))?;

    if auto_orient {
        Ok(apply_orientation(img, extract_orientation(bytes)))
    } else {
        Ok(img)
    }
}

/// Extract EXIF orientation from container bytes.
///
/// Returns `Orientation::Normal` if no EXIF data is found or orientation
/// cannot be determined.
fn extract_orientation(bytes: &[u8]) -> Orientation {
    let exif_reader = Reader::new();
    let mut cursor = Cursor::new(bytes);

    match exif_reader.read_from_container(&mut cursor) {
        Ok(exif) => exif
            .get_field(Tag::Orientation, In::PRIMARY)
            .and_then(|field| field.value.get_uint(0))
            .map(Orientation::from)
            .unwrap_or_default(),
        Err(_) => Orientation::Normal,
    }
}

/// Apply EXIF orientation transformation to an image.
fn apply_orientation(img: DynamicImage, orientation: Orientation) -> DynamicImage {
    match orientation {
        Orientation::Normal => img,
        Orientation::FlipHorizontal => img.fliph(),
        Orientation::Rotate180 => img.rotate180(),
        Orientation::FlipVertical => img.flipv(),
        Orientation::Transpose => img.rotate90().fliph(),
        Orientation::Rotate90CW => img.rotate90(),
        Orientation::Transverse => img.rotate270().fliph(),
        Orientation::Rotate270CW => img.rotate270(),
    }
}

/// Extract EXIF orientation value from container bytes (for external use).
pub fn get_orientation(bytes: &[u8]) -> Orientation {
    extract_orientation(bytes)
}
