//! Configuration loading and types for voxguard
//!
//! Configuration is loaded in layers:
//! 1. Built-in defaults
//! 2. Config file (~/.config/voxguard/config.toml)
//! 3. Environment variables (VOXGUARD_*)
//! 4. CLI arguments (highest priority)

use crate::error::VoxguardError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default configuration file content
pub const DEFAULT_CONFIG: &str = r#"# Voxguard Configuration
#
# Location: ~/.config/voxguard/config.toml
# All settings can be overridden via CLI flags

[audio]
# Audio input device ("default" uses system default)
# List devices with: pactl list sources short
device = "default"

# Sample rate in Hz for captured audio
sample_rate = 16000

[monitor]
# Duration of each analysis window in milliseconds.
# Each window is sealed into one chunk and sent for classification.
window_ms = 5000

# Label attached to the session info shown to subscribers
source_label = "Live Call"

# What to do with classifications still in flight when monitoring stops:
# - "drain": let them complete; their results are still delivered
# - "cancel": discard them; no result events fire after stop
stop_policy = "drain"

[detector]
# Deepfake detection endpoint (expects multipart POST with an "audio" field)
endpoint = "https://arshtandon-deepfake-detection-api-2.hf.space/detect"

# Request timeout in seconds
timeout_secs = 30

# Optional API key, sent as "Authorization: Bearer <key>"
# Can also be set via the VOXGUARD_API_KEY environment variable.
# api_key = ""
"#;

/// Audio capture configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Audio input device name ("default" for system default)
    pub device: String,
    /// Sample rate in Hz
    pub sample_rate: u32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            device: "default".to_string(),
            sample_rate: 16000,
        }
    }
}

/// Policy for in-flight classification requests at stop time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StopPolicy {
    /// Let in-flight requests complete and deliver their results
    Drain,
    /// Abort in-flight requests; no result events fire after stop
    Cancel,
}

/// Monitoring loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Analysis window size in milliseconds (must be > 0)
    pub window_ms: u64,
    /// Label describing the monitored source
    pub source_label: String,
    /// Policy for in-flight requests when stopping
    pub stop_policy: StopPolicy,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            window_ms: 5000,
            source_label: "Live Call".to_string(),
            stop_policy: StopPolicy::Drain,
        }
    }
}

/// Remote detection endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Endpoint URL for the detection service
    pub endpoint: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Optional API key for authentication
    pub api_key: Option<String>,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://arshtandon-deepfake-detection-api-2.hf.space/detect".to_string(),
            timeout_secs: 30,
            api_key: None,
        }
    }
}

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub audio: AudioConfig,
    pub monitor: MonitorConfig,
    pub detector: DetectorConfig,
}

impl Config {
    /// Load configuration from the default location or a custom path
    pub fn load(custom_path: Option<&Path>) -> Result<Self, VoxguardError> {
        let path = match custom_path {
            Some(p) => p.to_path_buf(),
            None => Self::default_path()?,
        };

        let mut config = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            toml::from_str(&content)
                .map_err(|e| VoxguardError::Config(format!("{}: {}", path.display(), e)))?
        } else {
            tracing::debug!("No config file at {}, using defaults", path.display());
            Config::default()
        };

        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Default config file path: ~/.config/voxguard/config.toml
    pub fn default_path() -> Result<PathBuf, VoxguardError> {
        let dirs = directories::ProjectDirs::from("", "", "voxguard")
            .ok_or_else(|| VoxguardError::Config("Cannot determine config directory".into()))?;
        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Apply VOXGUARD_* environment variable overrides
    fn apply_env(&mut self) {
        if let Ok(endpoint) = std::env::var("VOXGUARD_ENDPOINT") {
            self.detector.endpoint = endpoint;
        }
        if let Ok(key) = std::env::var("VOXGUARD_API_KEY") {
            self.detector.api_key = Some(key);
        }
        if let Ok(device) = std::env::var("VOXGUARD_DEVICE") {
            self.audio.device = device;
        }
        if let Ok(window) = std::env::var("VOXGUARD_WINDOW_MS") {
            match window.parse() {
                Ok(ms) => self.monitor.window_ms = ms,
                Err(_) => tracing::warn!("Ignoring invalid VOXGUARD_WINDOW_MS: {}", window),
            }
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), VoxguardError> {
        if self.monitor.window_ms == 0 {
            return Err(VoxguardError::Config(
                "monitor.window_ms must be a positive number of milliseconds".into(),
            ));
        }
        if self.audio.sample_rate == 0 {
            return Err(VoxguardError::Config("audio.sample_rate must be > 0".into()));
        }
        if !self.detector.endpoint.starts_with("http://")
            && !self.detector.endpoint.starts_with("https://")
        {
            return Err(VoxguardError::Config(format!(
                "detector.endpoint must start with http:// or https://, got: {}",
                self.detector.endpoint
            )));
        }
        Ok(())
    }
}
