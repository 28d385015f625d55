//! Source decoding for the transcoding engine.
//!
//! This module provides functionality for:
//! - Decoding the original upload (JPEG, PNG, WebP, first frame of GIF)
//! - Applying EXIF orientation so the source is upright
//! - Fit-inside resizing for each reduction attempt
//!
//! # Architecture
//!
//! The source is decoded once per request and never mutated. Attempts borrow
//! it and produce fresh, attempt-local resized copies.

mod resize;
mod source;
mod types;

pub use resize::{fit_inside, resize_to_fit};
pub use source::{decode_source, get_orientation};
pub use types::{DecodeError, FilterType, Orientation};
