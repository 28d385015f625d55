//! The attempt schedule as a pure function of the attempt index.

use serde::{Deserialize, Serialize};

use crate::types::EngineError;

/// Decay constants for the size-reduction loop.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReductionPolicy {
    /// Linear scale multiplier applied once per reduction attempt.
    pub scale_decay: f64,
    /// Quality subtracted per reduction attempt after the first.
    pub quality_step: u8,
    /// Quality is never pushed below this during reduction.
    pub min_quality: u8,
    /// Reduction attempts after the baseline.
    pub max_attempts: u32,
}

impl Default for ReductionPolicy {
    fn default() -> Self {
        Self {
            scale_decay: 0.9,
            quality_step: 10,
            min_quality: 20,
            max_attempts: 10,
        }
    }
}

/// Parameters for one attempt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttemptParams {
    pub index: u32,
    pub scale: f64,
    pub quality: u8,
}

impl AttemptParams {
    /// Bounding box for this attempt: each edge scaled and floored.
    pub fn target_box(&self, width: u32, height: u32) -> (u32, u32) {
        (
            (width as f64 * self.scale).floor() as u32,
            (height as f64 * self.scale).floor() as u32,
        )
    }
}

impl ReductionPolicy {
    pub fn validate(&self) -> Result<(), EngineError> {
        if !(self.scale_decay > 0.0 && self.scale_decay < 1.0) {
            return Err(EngineError::InvalidRequest(format!(
                "scale decay {} must lie strictly between 0 and 1",
                self.scale_decay
            )));
        }
        if !(1..=100).contains(&self.min_quality) {
            return Err(EngineError::InvalidRequest(format!(
                "minimum quality {} is outside 1-100",
                self.min_quality
            )));
        }
        if self.max_attempts == 0 {
            return Err(EngineError::InvalidRequest(
                "at least one reduction attempt is required".to_string(),
            ));
        }
        Ok(())
    }

    /// Total attempts including the baseline.
    pub fn total_attempts(&self) -> u32 {
        self.max_attempts + 1
    }

    /// Parameters for attempt `index`; 0 is the baseline.
    ///
    /// Attempt `i >= 1` uses scale `decay^i` and quality
    /// `max(min_quality, initial - step * (i - 1))`. The baseline keeps the
    /// requested quality even when it sits below the floor; reduction attempts
    /// never do.
    pub fn params(&self, index: u32, initial_quality: u8) -> AttemptParams {
        if index == 0 {
            return AttemptParams {
                index,
                scale: 1.0,
                quality: initial_quality,
            };
        }

        let floor = self.min_quality as i64;
        let reduced = initial_quality as i64 - self.quality_step as i64 * (index as i64 - 1);
        AttemptParams {
            index,
            scale: self.scale_decay.powi(index as i32),
            quality: reduced.max(floor) as u8,
        }
    }

    /// Every attempt in order, baseline first.
    pub fn schedule(&self, initial_quality: u8) -> impl Iterator<Item = AttemptParams> + '_ {
        (0..self.total_attempts()).map(move |index| self.params(index, initial_quality))
    }
}
