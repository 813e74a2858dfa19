// THEORY:
// Real eyelids follow the eye: looking up lifts the upper lid, looking down lowers it.
// The `EyelidTracker` keeps a slowly-moving "tracking position" derived from the
// vertical gaze, then combines it with the blink closure into two lid weights.
//
// A weight of 0.0 means a lid is fully open, 1.0 fully closed. A full blink drives
// both weights to 1.0 regardless of the tracking position.

/// Gaze height (in gaze units) that maps to the neutral tracking position.
const NEUTRAL_OFFSET: f64 = 0.4;
const GAZE_Y_SPAN: f64 = 60.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LidWeights {
    pub upper: f64,
    pub lower: f64,
}

#[derive(Debug, Clone)]
pub struct EyelidTracker {
    enabled: bool,
    position: f64,
}

impl EyelidTracker {
    pub fn new(enabled: bool, initial_position: f64) -> Self {
        Self {
            enabled,
            position: initial_position,
        }
    }

    /// Eases the tracking position a quarter of the way towards the one implied by `gaze_y`.
    pub fn update(&mut self, gaze_y: f64) -> f64 {
        if self.enabled {
            let target = (NEUTRAL_OFFSET - gaze_y / GAZE_Y_SPAN).clamp(0.0, 1.0);
            self.position = (self.position * 3.0 + target) * 0.25;
        }
        self.position
    }

    pub fn position(&self) -> f64 {
        self.position
    }

    /// Lid weights for a blink closure in [0, 1].
    pub fn weights(&self, closure: f64) -> LidWeights {
        let pos = self.position;
        LidWeights {
            upper: pos + closure * (1.0 - pos),
            lower: (1.0 - pos) + closure * pos,
        }
    }
}
