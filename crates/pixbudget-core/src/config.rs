//! Engine configuration.
//!
//! Every field has a default, so partial documents deserialize cleanly:
//!
//! ```json
//! { "default_target_bytes": 4096, "policy": { "max_attempts": 6 } }
//! ```

use serde::{Deserialize, Serialize};

use crate::decode::FilterType;
use crate::reduce::ReductionPolicy;
use crate::types::{EngineError, OutputFormat};

/// Default byte budget: 10KB, sized for an on-chain metadata slot.
pub const DEFAULT_TARGET_BYTES: u64 = 10 * 1024;

/// Default baseline quality.
pub const DEFAULT_QUALITY: u8 = 80;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub policy: ReductionPolicy,
    /// Budget used when a request does not name one.
    pub default_target_bytes: u64,
    /// Quality used when a request does not name one.
    pub default_quality: u8,
    /// Format used when a request does not name one.
    pub default_format: OutputFormat,
    /// Resampling filter for reduction attempts.
    pub filter: FilterType,
    /// Apply EXIF orientation before scaling.
    pub auto_orient: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            policy: ReductionPolicy::default(),
            default_target_bytes: DEFAULT_TARGET_BYTES,
            default_quality: DEFAULT_QUALITY,
            default_format: OutputFormat::Jpeg,
            filter: FilterType::Lanczos3,
            auto_orient: true,
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(mut self, policy: ReductionPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_filter(mut self, filter: FilterType) -> Self {
        self.filter = filter;
        self
    }

    /// Load from a JSON document.
    pub fn from_json(text: &str) -> Result<Self, EngineError> {
        let config: Self = serde_json::from_str(text)
            .map_err(|e| EngineError::InvalidRequest(format!("invalid engine config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        self.policy.validate()?;
        if self.default_target_bytes == 0 {
            return Err(EngineError::InvalidRequest(
                "default target bytes must be greater than zero".to_string(),
            ));
        }
        if !(1..=100).contains(&self.default_quality) {
            return Err(EngineError::InvalidRequest(format!(
                "default quality {} is outside 1-100",
                self.default_quality
            )));
        }
        Ok(())
    }
}
