//! Error types for voxguard
//!
//! Uses thiserror for ergonomic error definitions with clear messages
//! that guide users toward fixing common issues.

use thiserror::Error;

/// Top-level error type for the voxguard application
#[derive(Error, Debug)]
pub enum VoxguardError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Audio capture error: {0}")]
    Audio(#[from] AudioError),

    #[error("Detection error: {0}")]
    Detect(#[from] DetectError),

    #[error("Monitoring error: {0}")]
    Monitor(#[from] MonitorError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors related to acquiring and reading the audio source
#[derive(Error, Debug)]
pub enum AudioError {
    #[error("Audio connection failed: {0}")]
    Connection(String),

    #[error("Audio device not found: '{0}'. List devices with: pactl list sources short")]
    DeviceNotFound(String),

    #[error("Audio device not found: '{requested}'\n{available}")]
    DeviceNotFoundWithList { requested: String, available: String },

    #[error("Audio stream error: {0}")]
    StreamError(String),
}

/// Errors from a single chunk's classification call.
///
/// None of these abort the monitoring session; each is delivered to result
/// subscribers tagged with the failing chunk's sequence number.
#[derive(Error, Debug, Clone)]
pub enum DetectError {
    #[error("Invalid audio input: {0}")]
    InvalidInput(String),

    #[error("Detection server error: {0}")]
    Server(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Detection request timed out after {0}s")]
    Timeout(u64),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Errors from monitoring session lifecycle operations
#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("Cannot acquire audio source: {0}")]
    Acquisition(#[from] AudioError),

    #[error("Audio source teardown failed: {0}")]
    Teardown(AudioError),
}

/// Result type alias using VoxguardError
pub type Result<T> = std::result::Result<T, VoxguardError>;
