//! Voxguard: live-call deepfake voice monitoring
//!
//! This library provides the core functionality for:
//! - Capturing audio via cpal (supports PipeWire, PulseAudio, ALSA)
//! - Sealing the live stream into fixed-duration chunks on a timer
//! - Submitting each chunk to a remote deepfake-detection endpoint
//! - Fanning verdicts, errors, and lifecycle events out to subscribers
//!
//! # Architecture
//!
//! ```text
//!                 ┌───────────────────────────────┐
//!                 │       MonitorController       │
//!                 │   Idle → Starting → Active    │
//!                 │        → Stopping → Idle      │
//!                 └───────────────────────────────┘
//!                      │                    │
//!         ┌────────────┘                    └───────────┐
//!         ▼                                             ▼
//! ┌───────────────┐   samples    ┌──────────────────────────────┐
//! │ CaptureSession│ ───────────▶ │        ChunkScheduler        │
//! │    (cpal)     │              │  seal every window_ms (5 s)  │
//! └───────────────┘              └──────────────────────────────┘
//!                                               │ sealed AudioChunk
//!                                               ▼
//!                                ┌──────────────────────────────┐
//!                                │       DispatchPipeline       │
//!                                │  one task per chunk, never   │
//!                                │  blocks the capture cadence  │
//!                                └──────────────────────────────┘
//!                                               │ POST multipart "audio"
//!                                               ▼
//!                                ┌──────────────────────────────┐
//!                                │    RemoteDetector (HTTP)     │
//!                                └──────────────────────────────┘
//!                                               │ Verdict / DetectError
//!                                               ▼
//!                                     result subscribers
//! ```

pub mod audio;
pub mod config;
pub mod detect;
pub mod error;
pub mod monitor;

pub use config::Config;
pub use detect::{Detector, Verdict};
pub use error::{Result, VoxguardError};
pub use monitor::{AnalysisEvent, MonitorController, MonitorEvent, SessionInfo, SessionState};
