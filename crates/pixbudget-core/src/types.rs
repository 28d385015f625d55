//! Shared data model and error taxonomy for the transcoding engine.

use std::fmt;
use std::str::FromStr;

use enough::StopReason;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::EngineConfig;
use crate::decode::{DecodeError, Orientation};
use crate::encode::EncodeError;
use crate::fingerprint::Digest;

/// Errors returned from the engine's entry points.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The bytes are not one of the supported source formats.
    #[error("Unsupported image format: {0}")]
    UnsupportedFormat(String),

    /// The format was recognised but its structure could not be read.
    #[error("Corrupt image: {0}")]
    CorruptImage(String),

    /// The request failed validation before any work started.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The codec layer rejected the parameters.
    #[error(transparent)]
    Encoding(#[from] EncodeError),

    /// Every scheduled attempt finished above the byte budget.
    #[error(
        "Unable to reach byte budget: closest achievable size is {}, budget is {}",
        kilobytes(.best_size),
        kilobytes(.budget)
    )]
    TargetUnreachable {
        /// Smallest encoded size seen across all attempts.
        best_size: u64,
        /// The requested byte budget.
        budget: u64,
        /// Full attempt history, baseline first.
        attempts: Vec<EncodeAttempt>,
    },

    /// A cancellation was observed between attempts.
    #[error("Operation cancelled: {0:?}")]
    Cancelled(StopReason),

    /// The offloaded worker task did not complete.
    #[error("Worker task failed: {0}")]
    Worker(String),
}

impl From<StopReason> for EngineError {
    fn from(reason: StopReason) -> Self {
        EngineError::Cancelled(reason)
    }
}

impl From<DecodeError> for EngineError {
    fn from(err: DecodeError) -> Self {
        match err {
            DecodeError::InvalidFormat => EngineError::UnsupportedFormat(err.to_string()),
            DecodeError::CorruptedFile(msg) => EngineError::CorruptImage(msg),
            DecodeError::InvalidDimensions { .. } => EngineError::CorruptImage(err.to_string()),
        }
    }
}

fn kilobytes(bytes: &u64) -> String {
    format!("{:.1}KB", *bytes as f64 / 1024.0)
}

/// Source encodings accepted by the prober.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    Jpeg,
    Png,
    Webp,
    /// Only the first frame is used.
    Gif,
}

impl SourceFormat {
    /// All accepted source formats.
    pub const ALL: [SourceFormat; 4] = [
        SourceFormat::Jpeg,
        SourceFormat::Png,
        SourceFormat::Webp,
        SourceFormat::Gif,
    ];

    /// Map from the image crate's format, if it is one we accept.
    pub fn from_image_format(format: image::ImageFormat) -> Option<Self> {
        match format {
            image::ImageFormat::Jpeg => Some(SourceFormat::Jpeg),
            image::ImageFormat::Png => Some(SourceFormat::Png),
            image::ImageFormat::WebP => Some(SourceFormat::Webp),
            image::ImageFormat::Gif => Some(SourceFormat::Gif),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            SourceFormat::Jpeg => "jpeg",
            SourceFormat::Png => "png",
            SourceFormat::Webp => "webp",
            SourceFormat::Gif => "gif",
        }
    }
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Output encodings the engine can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Jpeg,
    Png,
    Webp,
}

impl OutputFormat {
    /// All supported output formats.
    pub const ALL: [OutputFormat; 3] = [OutputFormat::Jpeg, OutputFormat::Png, OutputFormat::Webp];

    pub fn name(self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "jpeg",
            OutputFormat::Png => "png",
            OutputFormat::Webp => "webp",
        }
    }

    /// Conventional file extension.
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "jpg",
            OutputFormat::Png => "png",
            OutputFormat::Webp => "webp",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "image/jpeg",
            OutputFormat::Png => "image/png",
            OutputFormat::Webp => "image/webp",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for OutputFormat {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "jpeg" | "jpg" => Ok(OutputFormat::Jpeg),
            "png" => Ok(OutputFormat::Png),
            "webp" => Ok(OutputFormat::Webp),
            other => Err(EngineError::InvalidRequest(format!(
                "unsupported output format '{other}' (expected jpeg, png or webp)"
            ))),
        }
    }
}

/// Dimensions and encoding of the original upload.
///
/// Width and height are as stored, before any orientation correction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageMetadata {
    pub width: u32,
    pub height: u32,
    pub source_format: SourceFormat,
    pub orientation: Orientation,
}

impl ImageMetadata {
    /// Get the effective dimensions after orientation correction.
    pub fn oriented_dimensions(&self) -> (u32, u32) {
        if self.orientation.swaps_dimensions() {
            (self.height, self.width)
        } else {
            (self.width, self.height)
        }
    }
}

/// Caller parameters for one transcoding call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodeRequest {
    /// Maximum encoded size in bytes.
    pub target_bytes: u64,
    /// Quality for the baseline attempt (1-100).
    pub initial_quality: u8,
    pub output_format: OutputFormat,
}

impl EncodeRequest {
    pub fn new(target_bytes: u64, initial_quality: u8, output_format: OutputFormat) -> Self {
        Self {
            target_bytes,
            initial_quality,
            output_format,
        }
    }

    /// Build a request from optional caller fields, falling back to the
    /// configured defaults for anything missing.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::InvalidRequest` for an unknown format name.
    pub fn from_options(
        target_bytes: Option<u64>,
        quality: Option<u8>,
        format: Option<&str>,
        config: &EngineConfig,
    ) -> Result<Self, EngineError> {
        let output_format = match format {
            Some(name) => name.parse()?,
            None => config.default_format,
        };
        Ok(Self {
            target_bytes: target_bytes.unwrap_or(config.default_target_bytes),
            initial_quality: quality.unwrap_or(config.default_quality),
            output_format,
        })
    }

    /// Reject requests that cannot be honoured before any work begins.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.target_bytes == 0 {
            return Err(EngineError::InvalidRequest(
                "target byte budget must be greater than zero".to_string(),
            ));
        }
        if !(1..=100).contains(&self.initial_quality) {
            return Err(EngineError::InvalidRequest(format!(
                "initial quality {} is outside 1-100",
                self.initial_quality
            )));
        }
        Ok(())
    }
}

/// One encode-and-measure cycle of the reduction loop.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EncodeAttempt {
    /// 0 is the baseline at original dimensions.
    pub index: u32,
    pub scale: f64,
    pub quality: u8,
    /// Dimensions actually encoded after fit-inside resizing.
    pub width: u32,
    pub height: u32,
    /// Encoded size in bytes.
    pub size: u64,
}

/// The terminal artifact of a successful call.
#[derive(Debug, Clone, Serialize)]
pub struct EncodeResult {
    #[serde(skip)]
    pub bytes: Vec<u8>,
    pub format: OutputFormat,
    pub final_size: u64,
    pub digest: Digest,
    pub original_size: u64,
    /// Negative when the output is larger than the upload.
    pub compression_ratio_percent: f64,
    pub attempts: Vec<EncodeAttempt>,
}

impl EncodeResult {
    /// The ratio rendered with two decimals, e.g. `"87.50%"`.
    pub fn compression_ratio_label(&self) -> String {
        format!("{:.2}%", self.compression_ratio_percent)
    }

    /// The attempt whose bytes were returned.
    pub fn final_attempt(&self) -> Option<&EncodeAttempt> {
        self.attempts.last()
    }
}
