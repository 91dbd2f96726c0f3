//! Remote deepfake detection via HTTP
//!
//! Sends audio chunks to a detection endpoint as a multipart upload and
//! parses the JSON verdict. The client is stateless and performs no retry;
//! a failed call surfaces as a typed per-chunk error.

use super::{Detector, Verdict};
use crate::config::DetectorConfig;
use crate::error::DetectError;
use crate::monitor::AudioChunk;
use std::time::Duration;

/// Remote detector posting chunks to a deepfake-detection API
#[derive(Debug)]
pub struct RemoteDetector {
    /// Endpoint URL (e.g., "https://example.com/detect")
    endpoint: String,
    /// Optional API key for authentication
    api_key: Option<String>,
    /// Request timeout
    timeout: Duration,
}

impl RemoteDetector {
    /// Create a new remote detector from config
    pub fn new(config: &DetectorConfig) -> Result<Self, DetectError> {
        let endpoint = config.endpoint.clone();

        if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
            return Err(DetectError::Config(format!(
                "endpoint must start with http:// or https://, got: {}",
                endpoint
            )));
        }

        if endpoint.starts_with("http://")
            && !endpoint.contains("localhost")
            && !endpoint.contains("127.0.0.1")
            && !endpoint.contains("[::1]")
        {
            tracing::warn!(
                "Detection endpoint uses HTTP without TLS. Audio data will be transmitted unencrypted!"
            );
        }

        // Check for API key in config or environment
        let api_key = config
            .api_key
            .clone()
            .or_else(|| std::env::var("VOXGUARD_API_KEY").ok());

        let timeout = Duration::from_secs(config.timeout_secs);

        tracing::info!(
            "Configured remote detector: endpoint={}, timeout={}s",
            endpoint,
            timeout.as_secs()
        );

        Ok(Self {
            endpoint,
            api_key,
            timeout,
        })
    }

    /// Build the multipart form body carrying the chunk's audio
    fn build_multipart_body(&self, chunk: &AudioChunk) -> (String, Vec<u8>) {
        let boundary = format!(
            "----VoxguardBoundary{}",
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_nanos()
        );

        let filename = format!("chunk-{}.wav", chunk.seq);

        let mut body = Vec::new();
        body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"audio\"; filename=\"{}\"\r\n",
                filename
            )
            .as_bytes(),
        );
        body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", chunk.mime).as_bytes());
        body.extend_from_slice(&chunk.data);
        body.extend_from_slice(b"\r\n");
        body.extend_from_slice(format!("--{}--\r\n", boundary).as_bytes());

        (boundary, body)
    }
}

impl Detector for RemoteDetector {
    fn detect(&self, chunk: &AudioChunk) -> Result<Verdict, DetectError> {
        if chunk.data.is_empty() {
            return Err(DetectError::InvalidInput("Empty audio chunk".into()));
        }

        tracing::debug!(
            "Sending chunk {} for analysis ({} bytes, {})",
            chunk.seq,
            chunk.data.len(),
            chunk.mime
        );

        let start = std::time::Instant::now();
        let (boundary, body) = self.build_multipart_body(chunk);

        let mut request = ureq::post(&self.endpoint).timeout(self.timeout).set(
            "Content-Type",
            &format!("multipart/form-data; boundary={}", boundary),
        );

        if let Some(ref key) = self.api_key {
            request = request.set("Authorization", &format!("Bearer {}", key));
        }

        let response = request
            .send_bytes(&body)
            .map_err(|e| map_request_error(e, self.timeout))?;

        let json: serde_json::Value = response
            .into_json()
            .map_err(|e| DetectError::Server(format!("Failed to parse response: {}", e)))?;

        let verdict = parse_verdict(&json)?;

        tracing::info!(
            "Chunk {} analyzed in {:.2}s: {} ({:.1}% confidence)",
            chunk.seq,
            start.elapsed().as_secs_f32(),
            if verdict.is_synthetic {
                "SYNTHETIC"
            } else {
                "authentic"
            },
            verdict.confidence
        );

        Ok(verdict)
    }
}

/// Map a ureq error to the per-chunk error taxonomy
///
/// 4xx means the service rejected the audio, 5xx is a remote-side failure,
/// and transport errors are network failures. ureq reports timeouts as
/// transport errors, so those are recognized by message.
fn map_request_error(error: ureq::Error, timeout: Duration) -> DetectError {
    match error {
        ureq::Error::Status(code, resp) => {
            let body = resp.into_string().unwrap_or_default();
            if (400..500).contains(&code) {
                DetectError::InvalidInput(format!("Server rejected audio ({}): {}", code, body))
            } else {
                DetectError::Server(format!("Server returned {}: {}", code, body))
            }
        }
        ureq::Error::Transport(t) => {
            let msg = t.to_string();
            if msg.contains("timed out") || msg.contains("timeout") {
                DetectError::Timeout(timeout.as_secs())
            } else {
                DetectError::Network(format!("Request failed: {}", msg))
            }
        }
    }
}

/// Extract a verdict from the endpoint's JSON response
///
/// Expected fields: `isDeepfake` (bool), `confidence` (0-100), `message`.
fn parse_verdict(json: &serde_json::Value) -> Result<Verdict, DetectError> {
    let is_synthetic = json
        .get("isDeepfake")
        .and_then(|v| v.as_bool())
        .ok_or_else(|| {
            DetectError::Server(format!("Response missing 'isDeepfake' field: {}", json))
        })?;

    let confidence = json
        .get("confidence")
        .and_then(|v| v.as_f64())
        .ok_or_else(|| {
            DetectError::Server(format!("Response missing 'confidence' field: {}", json))
        })? as f32;

    let raw_message = json
        .get("message")
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string();

    Ok(Verdict {
        is_synthetic,
        confidence: confidence.clamp(0.0, 100.0),
        raw_message,
    })
}
