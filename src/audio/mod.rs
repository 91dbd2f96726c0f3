//! Audio capture module
//!
//! Owns the lifecycle of the live audio source. Capture uses cpal, which
//! works with PipeWire, PulseAudio, and ALSA backends; the monitoring
//! loop only sees an `AudioCapture` implementation.

pub mod cpal_capture;

use crate::config::AudioConfig;
use crate::error::AudioError;
use tokio::sync::mpsc;

/// Trait for audio capture sessions
///
/// `open` acquires the source and starts delivering samples (f32, mono,
/// at the configured rate) over the returned channel. `close` releases
/// all resources and is idempotent: closing an already-closed session is
/// a no-op.
#[async_trait::async_trait]
pub trait AudioCapture: Send + Sync {
    /// Acquire the audio source and begin capturing.
    /// Fails with an acquisition error when no source is available.
    async fn open(&mut self) -> Result<mpsc::Receiver<Vec<f32>>, AudioError>;

    /// Release the audio source. Idempotent.
    async fn close(&mut self) -> Result<(), AudioError>;
}

/// Factory function to create audio capture
pub fn create_capture(config: &AudioConfig) -> Result<Box<dyn AudioCapture>, AudioError> {
    Ok(Box::new(cpal_capture::CpalCapture::new(config)?))
}
