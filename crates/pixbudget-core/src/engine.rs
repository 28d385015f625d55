//! The stateless transcoding entry point.
//!
//! An [`Engine`] holds only its configuration. Every call is self-contained:
//! probe, decode once, reduce, fingerprint, assemble. Engines can be cloned
//! freely and shared across threads.

use enough::{Stop, Unstoppable};
use serde::Serialize;
use tracing::{debug, info_span};

use crate::assemble::assemble;
use crate::config::EngineConfig;
use crate::decode::decode_source;
use crate::probe::probe;
use crate::reduce::{ReductionPolicy, SizeReducer};
use crate::types::{EncodeRequest, EncodeResult, EngineError, OutputFormat, SourceFormat};

/// What the engine accepts and produces.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Capabilities {
    pub default_target_bytes: u64,
    pub default_quality: u8,
    pub source_formats: Vec<SourceFormat>,
    pub output_formats: Vec<OutputFormat>,
    pub policy: ReductionPolicy,
}

#[derive(Debug, Clone, Default)]
pub struct Engine {
    config: EngineConfig,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn capabilities(&self) -> Capabilities {
        Capabilities {
            default_target_bytes: self.config.default_target_bytes,
            default_quality: self.config.default_quality,
            source_formats: SourceFormat::ALL.to_vec(),
            output_formats: OutputFormat::ALL.to_vec(),
            policy: self.config.policy,
        }
    }

    /// Re-encode `raw_bytes` so the output fits `request.target_bytes`.
    pub fn transcode(
        &self,
        raw_bytes: &[u8],
        request: &EncodeRequest,
    ) -> Result<EncodeResult, EngineError> {
        self.transcode_with_stop(raw_bytes, request, &Unstoppable)
    }

    /// Like [`Engine::transcode`], checking `stop` before every attempt.
    ///
    /// # Errors
    ///
    /// Request and policy validation happen before the bytes are looked at.
    /// Probe and decode failures surface before any encode attempt runs.
    pub fn transcode_with_stop(
        &self,
        raw_bytes: &[u8],
        request: &EncodeRequest,
        stop: &dyn Stop,
    ) -> Result<EncodeResult, EngineError> {
        request.validate()?;
        self.config.policy.validate()?;

        let span = info_span!(
            "transcode",
            budget = request.target_bytes,
            format = %request.output_format,
            quality = request.initial_quality
        );
        let _guard = span.enter();

        let metadata = probe(raw_bytes)?;
        let source = decode_source(raw_bytes, self.config.auto_orient)?;
        debug!(
            width = source.width(),
            height = source.height(),
            source_format = %metadata.source_format,
            "Decoded source"
        );

        let reduction =
            SizeReducer::new(&self.config.policy, self.config.filter).run(&source, request, stop)?;

        Ok(assemble(
            raw_bytes,
            request.output_format,
            reduction.bytes,
            reduction.attempts,
        ))
    }

    /// Run [`Engine::transcode`] on tokio's blocking pool.
    #[cfg(feature = "tokio")]
    pub async fn transcode_offloaded(
        &self,
        raw_bytes: Vec<u8>,
        request: EncodeRequest,
    ) -> Result<EncodeResult, EngineError> {
        let engine = self.clone();
        tokio::task::spawn_blocking(move || engine.transcode(&raw_bytes, &request))
            .await
            .map_err(|e| EngineError::Worker(e.to_string()))?
    }
}
