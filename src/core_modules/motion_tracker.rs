// THEORY:
// The `MotionTracker` is the whole "where is something moving?" engine in one stateful
// object. It replaces a pair of process-wide globals (the background frame and the last
// gaze position) with a struct its caller owns and feeds once per rendered frame.
//
// Per cycle:
// 1.  The capture is reduced to a blurred grayscale `Frame`.
// 2.  The very first frame only bootstraps the reference; nothing can be compared yet.
// 3.  Afterwards, the frame is differenced against the reference, thresholded and
//     dilated into a `DifferenceMask`.
// 4.  The largest outer region of the mask (holes filled) becomes the motion candidate, and the
//     center of its bounding box is fed to the `GazeFilter`.
// 5.  The live frame replaces the reference, whatever the outcome.
//
// The reference is therefore always exactly one cycle old. There is no long-lived
// background model: slow pans and lighting drift are absorbed within a cycle instead of
// being reported as motion, at the price of losing objects that stop moving.
//
// "Nothing moved" is a normal, quiet result. The gaze target is left untouched and the
// eye keeps looking at the last thing that moved.

use crate::capture::FrameSource;
use crate::config::TrackerConfig;
use crate::core_modules::difference_mask::DifferenceMask;
use crate::core_modules::frame::Frame;
use crate::core_modules::gaze::{GazeFilter, GazeMapping, GazePoint};
use crate::core_modules::region_detector::{Region, region_detector};
use crate::core_modules::utils::image_helper::image_helper;
use crate::error::EyeError;
use image::RgbImage;
use tracing::{debug, warn};

/// Lifecycle of a tracker. `Tracking` lasts until `reset`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackerState {
    /// No reference frame has been observed yet.
    Uninitialized,
    /// A reference frame exists and every update is compared against it.
    Tracking,
}

/// The motion found in a single cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Detection {
    /// Bounding box of the largest area of change.
    pub region: Region,
    /// Raw center of `region`, in pixels.
    pub center: (f64, f64),
    /// Gaze target after this detection was applied.
    pub gaze: GazePoint,
}

/// The outcome of one `update`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MotionReport {
    NoMotion,
    Motion(Detection),
}

impl MotionReport {
    pub fn region(&self) -> Option<Region> {
        match self {
            MotionReport::NoMotion => None,
            MotionReport::Motion(detection) => Some(detection.region),
        }
    }

    pub fn is_motion(&self) -> bool {
        matches!(self, MotionReport::Motion(_))
    }
}

pub struct MotionTracker {
    config: TrackerConfig,
    /// The previous cycle's frame; `None` until the first update.
    reference: Option<Frame>,
    gaze: GazeFilter,
    /// Number of updates seen since the last reset.
    cycle: u64,
}

impl MotionTracker {
    pub fn new(config: TrackerConfig, mapping: GazeMapping) -> Self {
        let gaze = GazeFilter::new(mapping, config.smoothing, config.max_step, config.initial_gaze);
        Self {
            config,
            reference: None,
            gaze,
            cycle: 0,
        }
    }

    /// Forgets the reference frame and returns the gaze to its initial target.
    pub fn reset(&mut self) {
        self.reference = None;
        self.gaze.reset();
        self.cycle = 0;
    }

    /// Processes one color capture. An empty raster is rejected as a capture failure
    /// and leaves the tracker exactly as it was.
    pub fn update(&mut self, image: &RgbImage) -> Result<MotionReport, EyeError> {
        let frame = Frame::from_rgb(image, self.config.blur_kernel_size)?;
        Ok(self.update_frame(frame))
    }

    /// Pulls one frame from `source` and processes it. Capture failures leave the tracker
    /// exactly as it was.
    pub fn update_from<S: FrameSource + ?Sized>(&mut self, source: &mut S) -> Result<MotionReport, EyeError> {
        let image = source.read()?;
        self.update(&image)
    }

    /// Processes a frame that has already been converted and blurred.
    pub fn update_frame(&mut self, frame: Frame) -> MotionReport {
        self.cycle += 1;

        let Some(reference) = self.reference.as_ref() else {
            debug!(cycle = self.cycle, "Bootstrapping reference frame");
            self.reference = Some(frame);
            return MotionReport::NoMotion;
        };

        if reference.dimensions() != frame.dimensions() {
            warn!(
                reference = ?reference.dimensions(),
                frame = ?frame.dimensions(),
                "Frame size changed; restarting from this frame"
            );
            self.reference = Some(frame);
            return MotionReport::NoMotion;
        }

        let mask = DifferenceMask::between(
            reference,
            &frame,
            self.config.difference_threshold,
            self.config.dilation_iterations,
        );
        self.dump_mask(&mask);

        let report = match region_detector::largest_region(&mask, self.config.min_region_area) {
            Some(region) => {
                let center = region.center();
                let gaze = self.gaze.observe(center.0, center.1);
                debug!(cycle = self.cycle, ?region, x = gaze.x, y = gaze.y, "Motion detected");
                MotionReport::Motion(Detection { region, center, gaze })
            }
            None => MotionReport::NoMotion,
        };

        self.reference = Some(frame);
        report
    }

    /// The current gaze target in renderer coordinates.
    pub fn gaze_target(&self) -> GazePoint {
        self.gaze.target()
    }

    pub fn state(&self) -> TrackerState {
        if self.reference.is_some() {
            TrackerState::Tracking
        } else {
            TrackerState::Uninitialized
        }
    }

    pub fn reference(&self) -> Option<&Frame> {
        self.reference.as_ref()
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    fn dump_mask(&self, mask: &DifferenceMask) {
        if let Some(dir) = &self.config.debug_mask_dir {
            if let Err(e) = image_helper::save_mask(dir, self.cycle, mask.as_image()) {
                warn!(error = %e, "Failed to write debug mask");
            }
        }
    }
}
