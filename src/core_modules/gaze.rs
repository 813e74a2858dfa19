// THEORY:
// The `gaze` module turns the pixel-space center of a motion region into the point the
// renderer aims the eye at. It is deliberately split into two small pieces:
//
// 1.  **GazeMapping**: a fixed, per-axis affine transform from camera pixels into the
//     renderer's angular coordinates. The two axes never mix, so a mapping is exactly
//     two scales and two offsets.
// 2.  **GazeFilter**: the stateful part. It remembers the previous raw center (to clamp
//     how far a single cycle may jump) and the current output target (to smooth towards
//     the new one). When nothing moves, it is simply not fed and the eye keeps looking
//     where it was.

use serde::{Deserialize, Serialize};

/// A point in the renderer's gaze coordinate system.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GazePoint {
    pub x: f64,
    pub y: f64,
}

impl GazePoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Moves `factor` of the way from `self` towards `target`.
    pub fn lerp(self, target: GazePoint, factor: f64) -> GazePoint {
        GazePoint {
            x: self.x + (target.x - self.x) * factor,
            y: self.y + (target.y - self.y) * factor,
        }
    }
}

/// Per-axis affine map `out = scale * raw + offset` from pixel centers to gaze coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GazeMapping {
    pub x_scale: f64,
    pub x_offset: f64,
    pub y_scale: f64,
    pub y_offset: f64,
}

impl Default for GazeMapping {
    /// The deployed 640x480 camera transform: `x = (320 + cx) / 6 + 260`, `y = (240 - cy) / 6`.
    fn default() -> Self {
        Self {
            x_scale: 1.0 / 6.0,
            x_offset: 320.0 / 6.0 + 260.0,
            y_scale: -1.0 / 6.0,
            y_offset: 240.0 / 6.0,
        }
    }
}

impl GazeMapping {
    pub fn identity() -> Self {
        Self {
            x_scale: 1.0,
            x_offset: 0.0,
            y_scale: 1.0,
            y_offset: 0.0,
        }
    }

    pub fn apply(&self, raw_x: f64, raw_y: f64) -> GazePoint {
        GazePoint {
            x: self.x_scale * raw_x + self.x_offset,
            y: self.y_scale * raw_y + self.y_offset,
        }
    }
}

/// Holds the gaze target between cycles.
#[derive(Debug, Clone)]
pub struct GazeFilter {
    mapping: GazeMapping,
    smoothing: f64,
    max_step: Option<f64>,
    initial: GazePoint,
    /// The last accepted raw center, in pixels.
    previous_raw: Option<(f64, f64)>,
    target: GazePoint,
}

impl GazeFilter {
    pub fn new(mapping: GazeMapping, smoothing: f64, max_step: Option<f64>, initial: GazePoint) -> Self {
        Self {
            mapping,
            smoothing,
            max_step,
            initial,
            previous_raw: None,
            target: initial,
        }
    }

    /// Feeds a new raw region center and returns the updated target.
    pub fn observe(&mut self, raw_x: f64, raw_y: f64) -> GazePoint {
        let (raw_x, raw_y) = match (self.max_step, self.previous_raw) {
            (Some(step), Some((prev_x, prev_y))) => (
                raw_x.clamp(prev_x - step, prev_x + step),
                raw_y.clamp(prev_y - step, prev_y + step),
            ),
            _ => (raw_x, raw_y),
        };
        self.previous_raw = Some((raw_x, raw_y));

        let mapped = self.mapping.apply(raw_x, raw_y);
        self.target = self.target.lerp(mapped, self.smoothing);
        self.target
    }

    pub fn target(&self) -> GazePoint {
        self.target
    }

    pub fn reset(&mut self) {
        self.previous_raw = None;
        self.target = self.initial;
    }
}
