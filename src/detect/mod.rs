//! Deepfake voice detection module
//!
//! Classification itself is an opaque remote service: audio goes out as a
//! multipart upload, a verdict comes back. This module defines the trait
//! the monitoring loop works against and the remote implementation.

pub mod remote;

use crate::config::DetectorConfig;
use crate::error::DetectError;
use crate::monitor::AudioChunk;
use std::sync::Arc;

/// Classification result for one audio chunk
#[derive(Debug, Clone, PartialEq)]
pub struct Verdict {
    /// Whether the audio was classified as synthetic (deepfake)
    pub is_synthetic: bool,
    /// Confidence score in [0, 100]
    pub confidence: f32,
    /// Raw message returned by the detection service
    pub raw_message: String,
}

/// Trait for deepfake detection implementations
///
/// Implementations are stateless across calls and never retry internally;
/// retry and back-pressure policy belong to the dispatch pipeline.
pub trait Detector: Send + Sync {
    /// Classify a sealed audio chunk
    fn detect(&self, chunk: &AudioChunk) -> Result<Verdict, DetectError>;
}

/// Factory function to create the configured detector
pub fn create_detector(config: &DetectorConfig) -> Result<Arc<dyn Detector>, DetectError> {
    Ok(Arc::new(remote::RemoteDetector::new(config)?))
}
