//! Configuration for motion_eye
//!
//! Every constant the tracker and the animation loop depend on lives here. The defaults
//! reproduce the deployed eye; any subset can be overridden from a TOML file.

use crate::core_modules::gaze::{GazeMapping, GazePoint};
use crate::error::EyeError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Difference cutoff used by the deployed eye animation.
pub const ANIMATION_DIFFERENCE_THRESHOLD: u8 = 10;
/// Difference cutoff used by the standalone motion detector.
pub const DETECTOR_DIFFERENCE_THRESHOLD: u8 = 20;

/// Tunables of the motion tracker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Side of the square Gaussian kernel. Must be odd; 1 or 0 disables blurring.
    pub blur_kernel_size: u32,
    /// A pixel is "changed" when its absolute difference is at least this value.
    pub difference_threshold: u8,
    /// Number of 3x3 dilation passes over the thresholded mask.
    pub dilation_iterations: u32,
    /// Regions smaller than this many pixels are ignored. `None` accepts every region.
    pub min_region_area: Option<usize>,
    /// Gaze target before any motion has been observed, in output coordinates.
    pub initial_gaze: GazePoint,
    /// Exponential smoothing factor in (0, 1]. 1.0 jumps straight to the new target.
    pub smoothing: f64,
    /// Largest raw center movement per cycle, in pixels per axis.
    pub max_step: Option<f64>,
    /// When set, every cycle's dilated mask is written here as a PNG.
    pub debug_mask_dir: Option<PathBuf>,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            blur_kernel_size: 21,
            difference_threshold: ANIMATION_DIFFERENCE_THRESHOLD,
            dilation_iterations: 2,
            min_region_area: None,
            initial_gaze: GazePoint::default(),
            smoothing: 1.0,
            max_step: None,
            debug_mask_dir: None,
        }
    }
}

/// Tunables of the blink, eyelid and pupil animation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationConfig {
    /// Blink on a random schedule without any input.
    pub autoblink: bool,
    /// Let the eyelids follow the vertical gaze.
    pub eyelid_tracking: bool,
    /// Starting eyelid tracking position (0 = lids wide, 1 = upper lid low).
    pub initial_tracking_position: f64,
    /// Degrees each eye is turned inwards around the vertical axis.
    pub convergence: f64,
    pub pupil_min: f64,
    pub pupil_max: f64,
    /// Pupil scale before the first schedule starts.
    pub initial_pupil: f64,
    /// Seconds spent moving the pupil towards each new random target.
    pub pupil_cycle_seconds: f64,
    /// Random spread of the first subdivision midpoint.
    pub pupil_range: f64,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            autoblink: true,
            eyelid_tracking: true,
            initial_tracking_position: 0.3,
            convergence: 2.0,
            pupil_min: 0.0,
            pupil_max: 1.0,
            initial_pupil: 0.5,
            pupil_cycle_seconds: 4.0,
            pupil_range: 1.0,
        }
    }
}

/// How the frame loop reacts to capture failures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Consecutive failed reads tolerated before the loop stops.
    pub retry_limit: u32,
    /// Pause between a failed read and the next attempt.
    pub retry_backoff_ms: u64,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            retry_limit: 3,
            retry_backoff_ms: 100,
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EyeConfig {
    pub tracker: TrackerConfig,
    pub mapping: GazeMapping,
    pub animation: AnimationConfig,
    pub capture: CaptureConfig,
}

impl EyeConfig {
    /// Parses and validates a TOML document.
    pub fn from_toml_str(text: &str) -> Result<Self, EyeError> {
        let config: EyeConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, EyeError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), EyeError> {
        let tracker = &self.tracker;
        if tracker.blur_kernel_size > 1 && tracker.blur_kernel_size % 2 == 0 {
            return Err(EyeError::Config(format!(
                "blur_kernel_size must be odd, got {}",
                tracker.blur_kernel_size
            )));
        }
        if !(tracker.smoothing > 0.0 && tracker.smoothing <= 1.0) {
            return Err(EyeError::Config(format!(
                "smoothing must be in (0, 1], got {}",
                tracker.smoothing
            )));
        }
        if let Some(step) = tracker.max_step {
            if !(step > 0.0) {
                return Err(EyeError::Config(format!("max_step must be positive, got {step}")));
            }
        }
        if tracker.difference_threshold == 0 {
            return Err(EyeError::Config(
                "difference_threshold must be at least 1".to_string(),
            ));
        }
        if !(tracker.initial_gaze.x.is_finite() && tracker.initial_gaze.y.is_finite()) {
            return Err(EyeError::Config(format!(
                "initial_gaze must be finite, got ({}, {})",
                tracker.initial_gaze.x, tracker.initial_gaze.y
            )));
        }

        let mapping = &self.mapping;
        let scales_usable = |scale: f64| scale.is_finite() && scale != 0.0;
        if !(scales_usable(mapping.x_scale) && scales_usable(mapping.y_scale)) {
            return Err(EyeError::Config(format!(
                "mapping scales must be finite and non-zero, got ({}, {})",
                mapping.x_scale, mapping.y_scale
            )));
        }
        if !(mapping.x_offset.is_finite() && mapping.y_offset.is_finite()) {
            return Err(EyeError::Config("mapping offsets must be finite".to_string()));
        }

        let animation = &self.animation;
        if animation.pupil_min > animation.pupil_max {
            return Err(EyeError::Config(format!(
                "pupil_min ({}) exceeds pupil_max ({})",
                animation.pupil_min, animation.pupil_max
            )));
        }
        if !(animation.pupil_cycle_seconds > 0.0) {
            return Err(EyeError::Config("pupil_cycle_seconds must be positive".to_string()));
        }
        if !(0.0..=1.0).contains(&animation.initial_tracking_position) {
            return Err(EyeError::Config(
                "initial_tracking_position must be in [0, 1]".to_string(),
            ));
        }

        Ok(())
    }
}
