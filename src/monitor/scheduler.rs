//! Chunk scheduler: timer-driven seal-and-swap
//!
//! A single task owns the current capture buffer. It appends samples
//! arriving from the capture session and, on every window tick, seals the
//! buffer into a chunk and hands it to the dispatch pipeline. Because one
//! task does both, the swap is atomic: no sample written after a seal can
//! land in the sealed chunk.
//!
//! The tokio interval's default missed-tick behavior is burst, so a slow
//! handoff queues the tick rather than silently skipping it, preserving
//! strict chunk ordering.

use crate::monitor::chunk::ChunkBuffer;
use crate::monitor::dispatch::DispatchPipeline;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

/// Handle to a running scheduler task
pub struct SchedulerHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<u64>,
}

impl SchedulerHandle {
    /// Stop the scheduler. No tick fires after this returns. The
    /// not-yet-sealed partial buffer is discarded. Returns the number of
    /// chunks sealed during the session.
    pub async fn stop(self) -> u64 {
        let _ = self.shutdown.send(true);
        self.task.await.unwrap_or(0)
    }
}

/// Spawn the scheduler task for one session.
///
/// `samples_rx` is the capture session's sample stream; `window` is the
/// chunk duration. Sequence numbers start at 0 for every session.
pub fn spawn(
    window: Duration,
    sample_rate: u32,
    mut samples_rx: mpsc::Receiver<Vec<f32>>,
    pipeline: DispatchPipeline,
) -> SchedulerHandle {
    let (shutdown, mut shutdown_rx) = watch::channel(false);

    let task = tokio::spawn(async move {
        let mut interval = tokio::time::interval(window);
        // The first interval tick completes immediately; consume it so the
        // first chunk covers a full window.
        interval.tick().await;

        let mut buffer = ChunkBuffer::new(sample_rate);
        let mut next_seq: u64 = 0;
        let mut source_open = true;

        loop {
            tokio::select! {
                _ = shutdown_rx.changed() => break,
                _ = interval.tick() => {
                    let seq = next_seq;
                    next_seq += 1;
                    match buffer.seal(seq) {
                        Ok(chunk) => pipeline.dispatch(chunk),
                        Err(e) => pipeline.fail(seq, e),
                    }
                }
                received = samples_rx.recv(), if source_open => {
                    match received {
                        Some(samples) => buffer.add_samples(&samples),
                        None => {
                            tracing::warn!("Audio source channel closed mid-session");
                            source_open = false;
                        }
                    }
                }
            }
        }

        tracing::debug!("Chunk scheduler stopped after {} chunk(s)", next_seq);
        next_seq
    });

    SchedulerHandle { shutdown, task }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::{Detector, Verdict};
    use crate::error::DetectError;
    use crate::monitor::chunk::AudioChunk;
    use crate::monitor::dispatch::AnalysisEvent;
    use crate::monitor::subscribers::SubscriberRegistry;
    use std::sync::{Arc, Mutex};

    struct OkDetector;

    impl Detector for OkDetector {
        fn detect(&self, _chunk: &AudioChunk) -> Result<Verdict, DetectError> {
            Ok(Verdict {
                is_synthetic: false,
                confidence: 1.0,
                raw_message: String::new(),
            })
        }
    }

    fn pipeline_with_log() -> (DispatchPipeline, Arc<Mutex<Vec<u64>>>) {
        let results = Arc::new(SubscriberRegistry::new());
        let seqs = Arc::new(Mutex::new(Vec::new()));
        let seqs_clone = seqs.clone();
        results.subscribe(move |e: &AnalysisEvent| {
            seqs_clone.lock().unwrap().push(e.seq());
        });
        (DispatchPipeline::new(Arc::new(OkDetector), results), seqs)
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_seals_one_chunk_per_window() {
        let (pipeline, seqs) = pipeline_with_log();
        let (tx, rx) = mpsc::channel(16);

        let handle = spawn(Duration::from_millis(25), 16000, rx, pipeline.clone());
        tx.send(vec![0.1f32; 400]).await.unwrap();
        tokio::time::sleep(Duration::from_millis(90)).await;

        let sealed = handle.stop().await;
        pipeline.join_in_flight().await;

        // ~3 windows elapsed; allow timer slack
        assert!((2..=4).contains(&sealed), "sealed {} chunks", sealed);

        let mut delivered = seqs.lock().unwrap().clone();
        delivered.sort_unstable();
        let expected: Vec<u64> = (0..sealed).collect();
        assert_eq!(delivered, expected, "sequence numbers must be gap-free");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_no_tick_after_stop() {
        let (pipeline, seqs) = pipeline_with_log();
        let (_tx, rx) = mpsc::channel(16);

        let handle = spawn(Duration::from_millis(20), 16000, rx, pipeline.clone());
        tokio::time::sleep(Duration::from_millis(50)).await;

        let sealed = handle.stop().await;
        pipeline.join_in_flight().await;
        let count_at_stop = seqs.lock().unwrap().len() as u64;
        assert_eq!(count_at_stop, sealed);

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(seqs.lock().unwrap().len() as u64, sealed);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_closed_source_does_not_stop_ticks() {
        let (pipeline, _seqs) = pipeline_with_log();
        let (tx, rx) = mpsc::channel(16);

        let handle = spawn(Duration::from_millis(20), 16000, rx, pipeline.clone());
        drop(tx);
        tokio::time::sleep(Duration::from_millis(55)).await;

        let sealed = handle.stop().await;
        assert!(sealed >= 2, "scheduler must keep ticking, sealed {}", sealed);
    }
}
