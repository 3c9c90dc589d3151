//! Background reference-frame capture.
//!
//! Spawns a thread that owns the `FrameSource`, averages a fixed number of
//! frames at a paced rate and delivers the aggregate once via a bounded
//! channel. Used to capture the reference frame a correction map is built
//! from without blocking the caller.
//!
//! Safety: each `FrameCollector` spawns exactly one thread that is
//! automatically shut down when the collector is dropped, preventing
//! thread leaks.
use crossbeam_channel as xch;
use padcal_traits::clock::Clock;
use padcal_traits::FrameSource;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::Duration;

use crate::error::CalError;
use crate::frame::SensorFrame;

/// Consecutive read failures tolerated before the capture is abandoned.
const MAX_CONSECUTIVE_FAILURES: u32 = 10;

/// Aggregate of a capture run.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceCapture {
    /// Per-cell mean response over the captured frames.
    pub mean: SensorFrame,
    /// Per-cell standard deviation over the captured frames.
    pub std: SensorFrame,
    pub frames_used: u32,
}

pub struct FrameCollector {
    rx: xch::Receiver<Result<ReferenceCapture, CalError>>,
    progress: Arc<AtomicU32>,
    cancel: Arc<AtomicBool>,
    join_handle: Option<std::thread::JoinHandle<()>>,
}

impl FrameCollector {
    /// Capture `frame_count` frames from `source`, paced by `period`.
    ///
    /// The source's reported shape fixes the expected shape; a frame of any
    /// other size aborts the run with a shape error rather than averaging
    /// mismatched grids.
    pub fn spawn<S: FrameSource + Send + 'static, C: Clock + Send + Sync + 'static>(
        mut source: S,
        frame_count: u32,
        period: Duration,
        timeout: Duration,
        clock: C,
    ) -> Self {
        let (tx, rx) = xch::bounded(1);
        let cancel = Arc::new(AtomicBool::new(false));
        let cancel_clone = cancel.clone();
        let progress = Arc::new(AtomicU32::new(0));
        let progress_clone = progress.clone();

        let join_handle = std::thread::spawn(move || {
            let (rows, cols) = source.shape();
            let cells = rows * cols;
            // Welford accumulators, one per cell
            let mut mean = vec![0.0f64; cells];
            let mut m2 = vec![0.0f64; cells];
            let mut used: u32 = 0;
            let mut failures: u32 = 0;

            let outcome = loop {
                if cancel_clone.load(Ordering::Relaxed) {
                    tracing::debug!("collector thread received cancel signal");
                    return;
                }
                if used >= frame_count {
                    let n = f64::from(used);
                    let std = m2
                        .iter()
                        .map(|&s| if used > 1 { (s / n).sqrt() } else { 0.0 })
                        .collect();
                    break match (
                        SensorFrame::new(rows, cols, mean),
                        SensorFrame::new(rows, cols, std),
                    ) {
                        (Ok(mean), Ok(std)) => Ok(ReferenceCapture {
                            mean,
                            std,
                            frames_used: used,
                        }),
                        (Err(e), _) | (_, Err(e)) => Err(e),
                    };
                }
                match source.read_frame(timeout) {
                    Ok(values) => {
                        if values.len() != cells {
                            break Err(CalError::ShapeMismatch {
                                context: "collector frame",
                                expected: (rows, cols),
                                got: (values.len(), 1),
                            });
                        }
                        failures = 0;
                        used += 1;
                        progress_clone.store(used, Ordering::Relaxed);
                        let n = f64::from(used);
                        for (i, v) in values.iter().enumerate() {
                            let delta = v - mean[i];
                            mean[i] += delta / n;
                            m2[i] += delta * (v - mean[i]);
                        }
                    }
                    Err(e) => {
                        failures += 1;
                        tracing::warn!(error = %e, failures, "frame read failed during capture");
                        if failures >= MAX_CONSECUTIVE_FAILURES {
                            break Err(CalError::Io(format!(
                                "aborted after {failures} consecutive read failures: {e}"
                            )));
                        }
                    }
                }
                if cancel_clone.load(Ordering::Relaxed) {
                    return;
                }
                clock.sleep(period);
            };

            // If send fails the consumer is gone; nothing left to do.
            let _ = tx.send(outcome);
            tracing::trace!("collector thread exiting cleanly");
        });

        Self {
            rx,
            progress,
            cancel,
            join_handle: Some(join_handle),
        }
    }

    /// Frames captured so far.
    pub fn progress(&self) -> u32 {
        self.progress.load(Ordering::Relaxed)
    }

    /// Non-blocking poll for the finished capture.
    pub fn try_result(&self) -> Option<Result<ReferenceCapture, CalError>> {
        self.rx.try_recv().ok()
    }

    /// Block until the capture finishes or `timeout` elapses.
    pub fn wait(&self, timeout: Duration) -> Option<Result<ReferenceCapture, CalError>> {
        self.rx.recv_timeout(timeout).ok()
    }

    /// Request early termination; the thread is joined on drop.
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::Relaxed);
    }
}

impl Drop for FrameCollector {
    fn drop(&mut self) {
        self.cancel.store(true, Ordering::Relaxed);
        if let Some(handle) = self.join_handle.take() {
            match handle.join() {
                Ok(()) => {
                    tracing::trace!("collector thread joined successfully");
                }
                Err(e) => {
                    // Thread panicked; log but don't propagate (we're in Drop)
                    tracing::warn!(?e, "collector thread panicked during shutdown");
                }
            }
        }
    }
}
