//! Audio chunk buffering and sealing
//!
//! The capture session appends raw samples to a `ChunkBuffer`; on each
//! scheduler tick the buffer is sealed into an immutable `AudioChunk`
//! (WAV-encoded bytes plus sequence number) and a fresh window begins.

use crate::error::DetectError;
use std::io::Cursor;

/// A sealed, immutable window of captured audio
///
/// Owned exclusively by the dispatch pipeline once sealed; never mutated.
#[derive(Debug, Clone)]
pub struct AudioChunk {
    /// Sequence number, strictly increasing within a session, starting at 0
    pub seq: u64,
    /// Encoded audio bytes
    pub data: Vec<u8>,
    /// Mime type of the encoded audio
    pub mime: String,
    /// Capture-start timestamp in epoch milliseconds
    pub captured_at_ms: i64,
}

impl AudioChunk {
    /// Duration of the encoded audio in milliseconds, derived from the
    /// WAV payload size (16-bit mono)
    pub fn duration_ms(&self, sample_rate: u32) -> u64 {
        let payload = self.data.len().saturating_sub(44);
        (payload as u64 / 2) * 1000 / sample_rate.max(1) as u64
    }
}

/// Accumulates samples for the window currently being captured
#[derive(Debug)]
pub struct ChunkBuffer {
    /// Audio samples (mono, f32)
    samples: Vec<f32>,
    /// Sample rate of the incoming audio
    sample_rate: u32,
    /// Epoch milliseconds when this window started
    started_at_ms: i64,
}

impl ChunkBuffer {
    /// Create a new empty buffer
    pub fn new(sample_rate: u32) -> Self {
        Self {
            // Pre-allocate for a 5-second window
            samples: Vec::with_capacity(sample_rate as usize * 5),
            sample_rate,
            started_at_ms: chrono::Utc::now().timestamp_millis(),
        }
    }

    /// Append incoming samples. The only mutation allowed until sealing.
    pub fn add_samples(&mut self, samples: &[f32]) {
        self.samples.extend_from_slice(samples);
    }

    /// Check if the buffer holds any audio
    pub fn has_audio(&self) -> bool {
        !self.samples.is_empty()
    }

    /// Duration of buffered audio in seconds
    pub fn duration_secs(&self) -> f32 {
        self.samples.len() as f32 / self.sample_rate.max(1) as f32
    }

    /// Seal the current window into an immutable chunk and start the next.
    ///
    /// The swap is atomic from the buffer's point of view: samples are
    /// taken out, the start timestamp rolls over, and no sample can land
    /// in the sealed chunk afterwards.
    pub fn seal(&mut self, seq: u64) -> Result<AudioChunk, DetectError> {
        let samples = std::mem::take(&mut self.samples);
        let captured_at_ms = self.started_at_ms;
        self.started_at_ms = chrono::Utc::now().timestamp_millis();

        let data = encode_wav(&samples, self.sample_rate)?;

        Ok(AudioChunk {
            seq,
            data,
            mime: "audio/wav".to_string(),
            captured_at_ms,
        })
    }
}

/// Encode f32 samples to 16-bit mono WAV
pub fn encode_wav(samples: &[f32], sample_rate: u32) -> Result<Vec<u8>, DetectError> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut buffer = Cursor::new(Vec::new());
    let mut writer = hound::WavWriter::new(&mut buffer, spec)
        .map_err(|e| DetectError::InvalidInput(format!("Failed to create WAV writer: {}", e)))?;

    // Convert f32 [-1.0, 1.0] to i16
    for &sample in samples {
        let clamped = sample.clamp(-1.0, 1.0);
        let scaled = (clamped * i16::MAX as f32) as i16;
        writer
            .write_sample(scaled)
            .map_err(|e| DetectError::InvalidInput(format!("Failed to write sample: {}", e)))?;
    }

    writer
        .finalize()
        .map_err(|e| DetectError::InvalidInput(format!("Failed to finalize WAV: {}", e)))?;

    Ok(buffer.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_wav_basic() {
        let samples: Vec<f32> = (0..16000)
            .map(|i| (i as f32 * 440.0 * 2.0 * std::f32::consts::PI / 16000.0).sin() * 0.5)
            .collect();

        let wav = encode_wav(&samples, 16000).unwrap();

        // WAV header is 44 bytes, then 16000 samples * 2 bytes
        assert_eq!(wav.len(), 44 + 32000);
        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(&wav[8..12], b"WAVE");
    }

    #[test]
    fn test_encode_wav_empty() {
        let wav = encode_wav(&[], 16000).unwrap();
        assert_eq!(wav.len(), 44);
    }

    #[test]
    fn test_buffer_accumulates() {
        let mut buffer = ChunkBuffer::new(16000);
        assert!(!buffer.has_audio());

        buffer.add_samples(&vec![0.0; 8000]);
        buffer.add_samples(&vec![0.0; 8000]);
        assert!(buffer.has_audio());
        assert!((buffer.duration_secs() - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_seal_empties_buffer() {
        let mut buffer = ChunkBuffer::new(16000);
        buffer.add_samples(&[0.1, 0.2, 0.3]);

        let chunk = buffer.seal(0).unwrap();
        assert_eq!(chunk.seq, 0);
        assert_eq!(chunk.mime, "audio/wav");
        assert_eq!(chunk.data.len(), 44 + 6);
        assert!(!buffer.has_audio());
    }

    #[test]
    fn test_seal_rolls_timestamp_forward() {
        let mut buffer = ChunkBuffer::new(16000);
        let first = buffer.seal(0).unwrap();
        std::thread::sleep(std::time::Duration::from_millis(5));
        let second = buffer.seal(1).unwrap();
        assert!(second.captured_at_ms >= first.captured_at_ms);
    }

    #[test]
    fn test_seal_empty_window_still_produces_chunk() {
        let mut buffer = ChunkBuffer::new(16000);
        let chunk = buffer.seal(3).unwrap();
        assert_eq!(chunk.seq, 3);
        assert_eq!(chunk.data.len(), 44);
    }

    #[test]
    fn test_samples_after_seal_go_to_next_chunk() {
        let mut buffer = ChunkBuffer::new(16000);
        buffer.add_samples(&[0.1; 100]);
        let first = buffer.seal(0).unwrap();
        buffer.add_samples(&[0.2; 50]);
        let second = buffer.seal(1).unwrap();

        assert_eq!(first.data.len(), 44 + 200);
        assert_eq!(second.data.len(), 44 + 100);
    }

    #[test]
    fn test_chunk_duration_ms() {
        let mut buffer = ChunkBuffer::new(16000);
        buffer.add_samples(&vec![0.0; 16000]);
        let chunk = buffer.seal(0).unwrap();
        assert_eq!(chunk.duration_ms(16000), 1000);
    }
}
