// THEORY:
// The `pipeline` module is the top-level API of the eye. It wires the motion tracker and
// the animation layers into one per-frame step and hides them behind three seams:
//
// - `FrameSource` (in `capture`): where frames come from.
// - `InputSource`: the physical blink button, or anything that behaves like one.
// - `Renderer`: whatever draws the eye. It receives a finished `EyePose` and nothing else.
//
// One call to `step` does, in order: track motion, advance the blink, ease the eyelids
// towards the gaze, sample the pupil, build per-eye rotations and render. `run_blocking`
// is the classic pull loop around `step`, with a bounded retry when capture fails.

use crate::capture::FrameSource;
use crate::config::EyeConfig;
use crate::core_modules::blink::{BlinkController, BlinkPhase};
use crate::core_modules::eyelid::{EyelidTracker, LidWeights};
use crate::core_modules::gaze::GazePoint;
use crate::core_modules::motion_tracker::MotionTracker;
use crate::core_modules::pupil::PupilAnimator;
use crate::core_modules::region_detector::Region;
use crate::error::EyeError;
use image::RgbImage;
use rand::Rng;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// A source of the blink button state.
pub trait InputSource {
    fn blink_pressed(&mut self) -> bool;
}

/// No button attached.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoInput;

impl InputSource for NoInput {
    fn blink_pressed(&mut self) -> bool {
        false
    }
}

/// Consumes one finished pose per frame.
pub trait Renderer {
    fn render(&mut self, pose: &EyePose) -> Result<(), EyeError>;
}

/// Writes each pose to the log instead of drawing it.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogRenderer;

impl Renderer for LogRenderer {
    fn render(&mut self, pose: &EyePose) -> Result<(), EyeError> {
        debug!(
            frame = pose.frame,
            gaze_x = pose.gaze.x,
            gaze_y = pose.gaze.y,
            upper_lid = pose.lids.upper,
            lower_lid = pose.lids.lower,
            pupil = pose.pupil,
            blink = ?pose.blink,
            "Eye pose"
        );
        Ok(())
    }
}

/// Rotation of one eye, in degrees around the horizontal (x) and vertical (y) axes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EyeRotation {
    pub x: f64,
    pub y: f64,
}

/// Everything a renderer needs to draw one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct EyePose {
    /// Index of this frame since the pipeline was created.
    pub frame: u64,
    pub gaze: GazePoint,
    /// The eye on the viewer's right.
    pub left: EyeRotation,
    /// The eye on the viewer's left.
    pub right: EyeRotation,
    pub lids: LidWeights,
    pub pupil: f64,
    pub blink: BlinkPhase,
    /// The region that moved the gaze this frame, if any.
    pub motion: Option<Region>,
}

/// What a frame loop did before it returned.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub frames: u64,
    pub motion_frames: u64,
    pub capture_failures: u64,
}

pub struct EyePipeline<I, R, G> {
    config: EyeConfig,
    tracker: MotionTracker,
    blink: BlinkController,
    eyelids: EyelidTracker,
    pupil: PupilAnimator,
    input: I,
    renderer: R,
    rng: G,
    frames: u64,
}

impl<I: InputSource, R: Renderer, G: Rng> EyePipeline<I, R, G> {
    pub fn new(config: EyeConfig, input: I, renderer: R, rng: G) -> Result<Self, EyeError> {
        config.validate()?;
        let animation = &config.animation;
        Ok(Self {
            tracker: MotionTracker::new(config.tracker.clone(), config.mapping),
            blink: BlinkController::new(animation.autoblink),
            eyelids: EyelidTracker::new(animation.eyelid_tracking, animation.initial_tracking_position),
            pupil: PupilAnimator::new(
                animation.initial_pupil,
                animation.pupil_min,
                animation.pupil_max,
                animation.pupil_cycle_seconds,
                animation.pupil_range,
            ),
            config,
            input,
            renderer,
            rng,
            frames: 0,
        })
    }

    /// Runs one frame at time `now` (seconds since the pipeline started).
    pub fn step(&mut self, image: &RgbImage, now: f64) -> Result<EyePose, EyeError> {
        let report = self.tracker.update(image)?;
        let gaze = self.tracker.gaze_target();

        let blink_held = self.input.blink_pressed();
        let closure = self.blink.update(now, blink_held, &mut self.rng);

        self.eyelids.update(gaze.y);
        let lids = self.eyelids.weights(closure);

        let pupil = self.pupil.value_at(now, &mut self.rng);

        let convergence = self.config.animation.convergence;
        let pose = EyePose {
            frame: self.frames,
            gaze,
            left: EyeRotation { x: gaze.y, y: gaze.x + convergence },
            right: EyeRotation { x: gaze.y, y: gaze.x - convergence },
            lids,
            pupil,
            blink: self.blink.phase(),
            motion: report.region(),
        };
        self.frames += 1;

        self.renderer.render(&pose)?;
        Ok(pose)
    }

    /// Pulls frames from `source` until `max_frames` have been rendered. Capture failures
    /// are retried after a pause; once more than `retry_limit` happen back to back the
    /// loop stops and returns the last one.
    pub fn run_blocking<S: FrameSource + ?Sized>(
        &mut self,
        source: &mut S,
        max_frames: Option<u64>,
    ) -> Result<RunSummary, EyeError> {
        let started = Instant::now();
        let backoff = Duration::from_millis(self.config.capture.retry_backoff_ms);
        let mut summary = RunSummary::default();
        let mut consecutive_failures = 0u32;

        info!(?max_frames, "Starting frame loop");
        while max_frames.is_none_or(|max| summary.frames < max) {
            let cycle = source
                .read()
                .and_then(|image| self.record(&mut summary, &image, started.elapsed().as_secs_f64()));
            match cycle {
                Ok(()) => consecutive_failures = 0,
                Err(e) if e.is_capture_failure() => {
                    summary.capture_failures += 1;
                    consecutive_failures += 1;
                    if consecutive_failures > self.config.capture.retry_limit {
                        error!(error = %e, failures = consecutive_failures, "Giving up on capture");
                        return Err(e);
                    }
                    warn!(error = %e, attempt = consecutive_failures, "Capture failed; retrying");
                    std::thread::sleep(backoff);
                }
                Err(e) => return Err(e),
            }
        }

        info!(frames = summary.frames, motion_frames = summary.motion_frames, "Frame loop finished");
        Ok(summary)
    }

    pub(crate) fn record(&mut self, summary: &mut RunSummary, image: &RgbImage, now: f64) -> Result<(), EyeError> {
        let pose = self.step(image, now)?;
        summary.frames += 1;
        if pose.motion.is_some() {
            summary.motion_frames += 1;
        }
        Ok(())
    }

    pub fn tracker(&self) -> &MotionTracker {
        &self.tracker
    }

    pub fn config(&self) -> &EyeConfig {
        &self.config
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }
}

