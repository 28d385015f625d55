//! Fit-inside resizing used by every reduction attempt.
//!
//! Images are only ever shrunk: a bounding box larger than the source leaves
//! it at its original size. Aspect ratio is always preserved.

use std::borrow::Cow;

use image::DynamicImage;

use super::{DecodeError, FilterType};

/// Resize an image to fit inside a `box_width x box_height` bounding box.
///
/// Borrows the source unchanged when it already fits.
///
/// # Errors
///
/// Returns `DecodeError::InvalidDimensions` if either box edge is zero.
pub fn resize_to_fit<'a>(
    image: &'a DynamicImage,
    box_width: u32,
    box_height: u32,
    filter: FilterType,
) -> Result<Cow<'a, DynamicImage>, DecodeError> {
    if box_width == 0 || box_height == 0 {
        return Err(DecodeError::InvalidDimensions {
            width: box_width,
            height: box_height,
        });
    }

    let (new_width, new_height) =
        fit_inside(image.width(), image.height(), box_width, box_height);

    if new_width == image.width() && new_height == image.height() {
        return Ok(Cow::Borrowed(image));
    }

    Ok(Cow::Owned(image.resize_exact(
        new_width,
        new_height,
        filter.to_image_filter(),
    )))
}

/// Calculate the largest size that fits inside the box without enlarging.
///
/// Each output edge is at least one pixel and at most the matching box edge.
pub fn fit_inside(width: u32, height: u32, box_width: u32, box_height: u32) -> (u32, u32) {
    if width == 0 || height == 0 || box_width == 0 || box_height == 0 {
        return (0, 0);
    }

    if width <= box_width && height <= box_height {
        return (width, height);
    }

    let scale = (box_width as f64 / width as f64).min(box_height as f64 / height as f64);

    let new_width = ((width as f64 * scale).round() as u32).clamp(1, box_width);
    let new_height = ((height as f64 * scale).round() as u32).clamp(1, box_height);
    (new_width, new_height)
}
