//! Dispatch pipeline: per-chunk classification fan-out
//!
//! Decouples classification latency from capture cadence. Each sealed
//! chunk is handed to its own tokio task; the blocking HTTP call runs on
//! the blocking pool so the scheduler's timer loop is never suspended.
//! Chunks are independent: one failure never halts the session, and
//! results are delivered in completion order, tagged with the chunk's
//! sequence number so subscribers can re-order if they need to.

use crate::detect::{Detector, Verdict};
use crate::error::DetectError;
use crate::monitor::chunk::AudioChunk;
use crate::monitor::subscribers::SubscriberRegistry;
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;

/// Per-chunk analysis outcome delivered to result subscribers
///
/// Exactly one event is emitted per sealed chunk.
#[derive(Debug, Clone)]
pub enum AnalysisEvent {
    /// The chunk was classified
    Verdict { seq: u64, verdict: Verdict },
    /// Classification failed; the session continues
    Failed { seq: u64, error: DetectError },
}

impl AnalysisEvent {
    /// Sequence number of the chunk this event belongs to
    pub fn seq(&self) -> u64 {
        match self {
            AnalysisEvent::Verdict { seq, .. } => *seq,
            AnalysisEvent::Failed { seq, .. } => *seq,
        }
    }
}

/// Submits sealed chunks for classification without blocking the caller
#[derive(Clone)]
pub struct DispatchPipeline {
    detector: Arc<dyn Detector>,
    results: Arc<SubscriberRegistry<AnalysisEvent>>,
    in_flight: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

impl DispatchPipeline {
    pub fn new(
        detector: Arc<dyn Detector>,
        results: Arc<SubscriberRegistry<AnalysisEvent>>,
    ) -> Self {
        Self {
            detector,
            results,
            in_flight: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Registry receiving per-chunk analysis events
    pub fn results(&self) -> &Arc<SubscriberRegistry<AnalysisEvent>> {
        &self.results
    }

    /// Submit a sealed chunk for classification.
    ///
    /// Returns immediately; the result (or failure) reaches subscribers
    /// whenever the call completes, possibly out of submission order.
    pub fn dispatch(&self, chunk: AudioChunk) {
        let detector = self.detector.clone();
        let results = self.results.clone();
        let seq = chunk.seq;

        tracing::debug!("Dispatching chunk {} ({} bytes)", seq, chunk.data.len());

        let handle = tokio::spawn(async move {
            let outcome = tokio::task::spawn_blocking(move || detector.detect(&chunk)).await;
            let event = match outcome {
                Ok(Ok(verdict)) => AnalysisEvent::Verdict { seq, verdict },
                Ok(Err(error)) => {
                    tracing::warn!("Chunk {} classification failed: {}", seq, error);
                    AnalysisEvent::Failed { seq, error }
                }
                Err(e) => {
                    tracing::error!("Chunk {} detection task panicked: {}", seq, e);
                    AnalysisEvent::Failed {
                        seq,
                        error: DetectError::Server(format!("detection task failed: {}", e)),
                    }
                }
            };
            results.notify(&event);
        });

        let mut in_flight = self.in_flight.lock().unwrap();
        in_flight.retain(|h| !h.is_finished());
        in_flight.push(handle);
    }

    /// Emit a failure event for a chunk that never reached the detector
    /// (e.g. the seal itself failed). Keeps the one-event-per-chunk
    /// guarantee intact.
    pub fn fail(&self, seq: u64, error: DetectError) {
        tracing::warn!("Chunk {} failed before dispatch: {}", seq, error);
        self.results.notify(&AnalysisEvent::Failed { seq, error });
    }

    /// Abort all in-flight classifications. No result event fires for an
    /// aborted chunk; the underlying blocking call is abandoned, not
    /// interrupted.
    pub fn cancel_in_flight(&self) {
        let handles: Vec<_> = std::mem::take(&mut *self.in_flight.lock().unwrap());
        let count = handles.len();
        for handle in handles {
            handle.abort();
        }
        if count > 0 {
            tracing::info!("Cancelled {} in-flight classification(s)", count);
        }
    }

    /// Wait for all in-flight classifications to complete and deliver
    /// their events. Used for graceful shutdown.
    pub async fn join_in_flight(&self) {
        let handles: Vec<_> = std::mem::take(&mut *self.in_flight.lock().unwrap());
        for handle in handles {
            let _ = handle.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct ScriptedDetector {
        fail_seqs: Vec<u64>,
    }

    impl Detector for ScriptedDetector {
        fn detect(&self, chunk: &AudioChunk) -> Result<Verdict, DetectError> {
            if self.fail_seqs.contains(&chunk.seq) {
                Err(DetectError::Network("unreachable".into()))
            } else {
                Ok(Verdict {
                    is_synthetic: false,
                    confidence: 10.0,
                    raw_message: "ok".into(),
                })
            }
        }
    }

    fn chunk(seq: u64) -> AudioChunk {
        AudioChunk {
            seq,
            data: vec![0u8; 64],
            mime: "audio/wav".into(),
            captured_at_ms: 0,
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_one_event_per_chunk() {
        let results = Arc::new(SubscriberRegistry::new());
        let events = Arc::new(Mutex::new(Vec::new()));
        let events_clone = events.clone();
        results.subscribe(move |e: &AnalysisEvent| {
            events_clone.lock().unwrap().push(e.seq());
        });

        let pipeline = DispatchPipeline::new(
            Arc::new(ScriptedDetector { fail_seqs: vec![] }),
            results,
        );

        for seq in 0..4 {
            pipeline.dispatch(chunk(seq));
        }
        pipeline.join_in_flight().await;

        let mut seqs = events.lock().unwrap().clone();
        seqs.sort_unstable();
        assert_eq!(seqs, vec![0, 1, 2, 3]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_failure_isolated_to_chunk() {
        let results = Arc::new(SubscriberRegistry::new());
        let events = Arc::new(Mutex::new(Vec::new()));
        let events_clone = events.clone();
        results.subscribe(move |e: &AnalysisEvent| {
            events_clone.lock().unwrap().push(e.clone());
        });

        let pipeline = DispatchPipeline::new(
            Arc::new(ScriptedDetector { fail_seqs: vec![1] }),
            results,
        );

        for seq in 0..3 {
            pipeline.dispatch(chunk(seq));
        }
        pipeline.join_in_flight().await;

        let events = events.lock().unwrap();
        assert_eq!(events.len(), 3);
        let failed: Vec<u64> = events
            .iter()
            .filter(|e| matches!(e, AnalysisEvent::Failed { .. }))
            .map(|e| e.seq())
            .collect();
        assert_eq!(failed, vec![1]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_fail_emits_event() {
        let results = Arc::new(SubscriberRegistry::new());
        let events = Arc::new(Mutex::new(Vec::new()));
        let events_clone = events.clone();
        results.subscribe(move |e: &AnalysisEvent| {
            events_clone.lock().unwrap().push(e.seq());
        });

        let pipeline = DispatchPipeline::new(
            Arc::new(ScriptedDetector { fail_seqs: vec![] }),
            results,
        );
        pipeline.fail(9, DetectError::InvalidInput("bad seal".into()));

        assert_eq!(*events.lock().unwrap(), vec![9]);
    }
}
