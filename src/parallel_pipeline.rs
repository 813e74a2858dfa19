// THEORY:
// Camera reads block. In the plain `run_blocking` loop that blocking time is dead time
// for the animation. `CaptureHandoff` moves the reads onto a blocking worker so the
// next frame is being captured while the current one is tracked and rendered.
//
// The handoff is a bounded channel with a single slot: the worker can be at most one
// frame ahead. The tracker, gaze target and animation state never leave the consumer,
// so nothing beyond the channel needs synchronizing.

use crate::capture::FrameSource;
use crate::error::EyeError;
use crate::pipeline::{EyePipeline, InputSource, Renderer, RunSummary};
use futures::stream::{self, BoxStream, Stream, StreamExt};
use image::RgbImage;
use rand::Rng;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

const HANDOFF_SLOTS: usize = 1;

pub type CaptureResult = Result<RgbImage, EyeError>;

/// Frames captured on a background worker, handed over one at a time.
pub struct CaptureHandoff {
    receiver: mpsc::Receiver<CaptureResult>,
    worker: JoinHandle<()>,
}

impl CaptureHandoff {
    /// Starts reading `source` on the blocking thread pool. Must be called from within a
    /// tokio runtime. The worker stops once the handoff is dropped.
    pub fn spawn<S>(mut source: S) -> Self
    where
        S: FrameSource + Send + 'static,
    {
        let (sender, receiver) = mpsc::channel::<CaptureResult>(HANDOFF_SLOTS);

        let worker = tokio::task::spawn_blocking(move || {
            loop {
                let frame = source.read();
                if let Err(e) = &frame {
                    debug!(error = %e, "Capture worker read failed");
                }
                if sender.blocking_send(frame).is_err() {
                    // Consumer went away.
                    break;
                }
            }
            debug!("Capture worker stopped");
        });

        Self { receiver, worker }
    }

    /// The next captured frame, or `None` once the worker has stopped.
    pub async fn next_frame(&mut self) -> Option<CaptureResult> {
        self.receiver.recv().await
    }

    pub fn into_stream(self) -> BoxStream<'static, CaptureResult> {
        stream::unfold(self, |mut handoff| async move {
            handoff.next_frame().await.map(|frame| (frame, handoff))
        })
        .boxed()
    }

    pub fn is_finished(&self) -> bool {
        self.worker.is_finished()
    }
}

/// Drives `pipeline` from a stream of captures with the same retry policy as
/// `EyePipeline::run_blocking`, pausing asynchronously between failed reads.
pub async fn run_async<I, R, G, S>(
    pipeline: &mut EyePipeline<I, R, G>,
    mut frames: S,
    max_frames: Option<u64>,
) -> Result<RunSummary, EyeError>
where
    I: InputSource,
    R: Renderer,
    G: Rng,
    S: Stream<Item = CaptureResult> + Unpin,
{
    let started = Instant::now();
    let capture = pipeline.config().capture.clone();
    let backoff = Duration::from_millis(capture.retry_backoff_ms);
    let mut summary = RunSummary::default();
    let mut consecutive_failures = 0u32;

    info!(?max_frames, "Starting async frame loop");
    while max_frames.is_none_or(|max| summary.frames < max) {
        let Some(next) = frames.next().await else {
            warn!("Capture stream ended");
            return Err(EyeError::CaptureFailure("capture stream ended".to_string()));
        };

        let cycle = next.and_then(|image| pipeline.record(&mut summary, &image, started.elapsed().as_secs_f64()));
        match cycle {
            Ok(()) => consecutive_failures = 0,
            Err(e) if e.is_capture_failure() => {
                summary.capture_failures += 1;
                consecutive_failures += 1;
                if consecutive_failures > capture.retry_limit {
                    error!(error = %e, failures = consecutive_failures, "Giving up on capture");
                    return Err(e);
                }
                warn!(error = %e, attempt = consecutive_failures, "Capture failed; retrying");
                tokio::time::sleep(backoff).await;
            }
            Err(e) => return Err(e),
        }
    }

    info!(frames = summary.frames, motion_frames = summary.motion_frames, "Async frame loop finished");
    Ok(summary)
}
