//! Size-reduction controller.
//!
//! Drives repeated encode attempts from the pristine source decode until one
//! fits the byte budget:
//!
//! 1. Attempt 0 encodes at original dimensions and the requested quality.
//! 2. Attempts 1..=max_attempts shrink both edges geometrically and step the
//!    quality down to a floor (see [`ReductionPolicy::params`]).
//! 3. The first attempt at or under budget wins. If none does, the call fails
//!    with [`EngineError::TargetUnreachable`]; an over-budget result is never
//!    returned.
//!
//! Attempts run strictly in sequence. Cancellation is checked before each
//! attempt, never inside one.

mod schedule;

use enough::{Stop, Unstoppable};
use image::DynamicImage;
use tracing::{debug, info, warn};

use crate::assemble::assemble;
use crate::decode::{decode_source, FilterType};
use crate::encode::{encode_scaled, encoder_for, FormatEncoder};
use crate::types::{EncodeAttempt, EncodeRequest, EncodeResult, EngineError, ImageMetadata};

pub use schedule::{AttemptParams, ReductionPolicy};

/// Winning bytes plus the attempt history that produced them.
#[derive(Debug, Clone)]
pub struct Reduction {
    pub bytes: Vec<u8>,
    pub attempts: Vec<EncodeAttempt>,
}

/// Runs the reduction loop for one request. Holds no per-request state.
#[derive(Debug, Clone, Copy)]
pub struct SizeReducer<'a> {
    policy: &'a ReductionPolicy,
    filter: FilterType,
}

impl<'a> SizeReducer<'a> {
    pub fn new(policy: &'a ReductionPolicy, filter: FilterType) -> Self {
        Self { policy, filter }
    }

    /// Reduce `source` with the encoder selected by the request's format.
    pub fn run(
        &self,
        source: &DynamicImage,
        request: &EncodeRequest,
        stop: &dyn Stop,
    ) -> Result<Reduction, EngineError> {
        self.run_with(source, request, encoder_for(request.output_format), stop)
    }

    /// Reduce `source` with an explicit encoder.
    ///
    /// An encoder failure on the baseline is returned as is. A failure on a
    /// later attempt is logged and that attempt is skipped.
    pub fn run_with(
        &self,
        source: &DynamicImage,
        request: &EncodeRequest,
        encoder: &dyn FormatEncoder,
        stop: &dyn Stop,
    ) -> Result<Reduction, EngineError> {
        let (width, height) = (source.width(), source.height());
        let budget = request.target_bytes;
        let mut attempts = Vec::with_capacity(self.policy.total_attempts() as usize);

        for params in self.policy.schedule(request.initial_quality) {
            stop.check()?;

            let (box_width, box_height) = params.target_box(width, height);
            let encoded = match encode_scaled(
                source,
                box_width,
                box_height,
                encoder,
                params.quality,
                self.filter,
            ) {
                Ok(encoded) => encoded,
                Err(err) if params.index > 0 => {
                    warn!(
                        attempt = params.index,
                        scale = params.scale,
                        quality = params.quality,
                        error = %err,
                        "Skipping attempt after encoder failure"
                    );
                    continue;
                }
                Err(err) => return Err(err.into()),
            };

            let attempt = EncodeAttempt {
                index: params.index,
                scale: params.scale,
                quality: params.quality,
                width: encoded.width,
                height: encoded.height,
                size: encoded.bytes.len() as u64,
            };
            debug!(
                attempt = attempt.index,
                scale = attempt.scale,
                quality = attempt.quality,
                width = attempt.width,
                height = attempt.height,
                size = attempt.size,
                budget,
                "Encode attempt"
            );
            attempts.push(attempt);

            if attempt.size <= budget {
                info!(
                    format = %encoder.format(),
                    size = attempt.size,
                    budget,
                    attempts = attempts.len(),
                    "Image fits byte budget"
                );
                return Ok(Reduction {
                    bytes: encoded.bytes,
                    attempts,
                });
            }
        }

        let best_size = attempts.iter().map(|a| a.size).min().unwrap_or_default();
        warn!(
            best_size,
            budget,
            attempts = attempts.len(),
            "Byte budget unreachable"
        );
        Err(EngineError::TargetUnreachable {
            best_size,
            budget,
            attempts,
        })
    }
}

/// Reduce the original upload to fit `request` using the default policy.
///
/// `metadata` must come from probing `raw_bytes`; it is checked against the
/// decoded source.
pub fn reduce_to_target(
    raw_bytes: &[u8],
    metadata: &ImageMetadata,
    request: &EncodeRequest,
) -> Result<EncodeResult, EngineError> {
    request.validate()?;
    let source = decode_source(raw_bytes, true)?;

    if (source.width(), source.height()) != metadata.oriented_dimensions() {
        return Err(EngineError::CorruptImage(format!(
            "decoded {}x{} but probed {}x{}",
            source.width(),
            source.height(),
            metadata.width,
            metadata.height
        )));
    }

    let policy = ReductionPolicy::default();
    let reduction =
        SizeReducer::new(&policy, FilterType::default()).run(&source, request, &Unstoppable)?;
    Ok(assemble(
        raw_bytes,
        request.output_format,
        reduction.bytes,
        reduction.attempts,
    ))
}
