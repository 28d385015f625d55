//! Pixbudget Core - size-constrained image transcoding
//!
//! This crate re-encodes an arbitrary raster image (JPEG, PNG, WebP, or the
//! first frame of a GIF) into JPEG, PNG or WebP so that the output fits a
//! strict byte budget. A successful result is always at or under budget; if
//! the budget cannot be met within the bounded attempt schedule the call
//! fails with [`EngineError::TargetUnreachable`].
//!
//! # Pipeline
//!
//! raw bytes -> [`probe`] -> [`decode`] (once) -> [`reduce`] driving
//! [`encode`] -> [`fingerprint`] -> [`assemble`]
//!
//! # Usage
//!
//! ```ignore
//! use pixbudget_core::{Engine, EncodeRequest, OutputFormat};
//!
//! let raw = std::fs::read("photo.jpg")?;
//! let request = EncodeRequest::new(10 * 1024, 80, OutputFormat::Webp);
//! let result = Engine::default().transcode(&raw, &request)?;
//! println!("{} bytes, sha256 {}", result.final_size, result.digest);
//! ```

pub mod assemble;
pub mod config;
pub mod decode;
pub mod encode;
pub mod engine;
pub mod fingerprint;
pub mod probe;
pub mod reduce;
pub mod types;

pub use assemble::assemble;
pub use config::{EngineConfig, DEFAULT_QUALITY, DEFAULT_TARGET_BYTES};
pub use decode::{FilterType, Orientation};
pub use encode::{encode, encoder_for, EncodeError, FormatEncoder};
pub use engine::{Capabilities, Engine};
pub use fingerprint::{fingerprint, Digest};
pub use probe::probe;
pub use reduce::{reduce_to_target, ReductionPolicy, SizeReducer};
pub use types::{
    EncodeAttempt, EncodeRequest, EncodeResult, EngineError, ImageMetadata, OutputFormat,
    SourceFormat,
};

pub use enough::{Stop, StopReason, Unstoppable};
