// THEORY:
// The `BlinkController` is a small timed state machine: Open -> Closing -> Opening -> Open.
//
// - A blink starts either on its own (auto-blink, on a randomized schedule) or because
//   the blink input is pressed while the eye is open.
// - Closing lasts the blink duration; opening lasts twice as long, which reads as a
//   natural "snap shut, ease open" motion.
// - While the blink input is held, a fully closed eye stays closed.
//
// The controller only produces a closure amount in [0, 1]. How that closure bends the
// eyelids is the `eyelid` module's business.

use rand::Rng;

const BLINK_DURATION_MIN: f64 = 0.035;
const BLINK_DURATION_MAX: f64 = 0.06;
const FIRST_AUTO_BLINK_AFTER: f64 = 1.0;
const AUTO_BLINK_JITTER: f64 = 4.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlinkPhase {
    Open,
    Closing,
    Opening,
}

#[derive(Debug, Clone)]
pub struct BlinkController {
    autoblink: bool,
    phase: BlinkPhase,
    /// When the current phase began, in seconds.
    phase_start: f64,
    /// How long the current phase lasts, in seconds.
    phase_duration: f64,
    last_auto_blink: f64,
    time_to_next_blink: f64,
}

impl BlinkController {
    pub fn new(autoblink: bool) -> Self {
        Self {
            autoblink,
            phase: BlinkPhase::Open,
            phase_start: 0.0,
            phase_duration: 0.0,
            last_auto_blink: 0.0,
            time_to_next_blink: FIRST_AUTO_BLINK_AFTER,
        }
    }

    /// Advances the state machine to `now` and returns the eyelid closure.
    pub fn update<R: Rng + ?Sized>(&mut self, now: f64, blink_held: bool, rng: &mut R) -> f64 {
        if self.autoblink && now - self.last_auto_blink >= self.time_to_next_blink {
            self.last_auto_blink = now;
            let duration = random_duration(rng);
            if self.phase != BlinkPhase::Closing {
                self.start(now, duration);
            }
            self.time_to_next_blink = duration * 3.0 + rng.gen_range(0.0..AUTO_BLINK_JITTER);
        }

        if self.phase != BlinkPhase::Open && now - self.phase_start >= self.phase_duration {
            match self.phase {
                // Held shut.
                BlinkPhase::Closing if blink_held => {}
                BlinkPhase::Closing => {
                    self.phase = BlinkPhase::Opening;
                    self.phase_duration *= 2.0;
                    self.phase_start = now;
                }
                BlinkPhase::Opening => self.phase = BlinkPhase::Open,
                BlinkPhase::Open => {}
            }
        }

        if blink_held && self.phase == BlinkPhase::Open {
            let duration = random_duration(rng);
            self.start(now, duration);
        }

        self.closure(now)
    }

    /// 0.0 is fully open, 1.0 fully closed.
    pub fn closure(&self, now: f64) -> f64 {
        let progress = if self.phase_duration > 0.0 {
            ((now - self.phase_start) / self.phase_duration).clamp(0.0, 1.0)
        } else {
            1.0
        };
        match self.phase {
            BlinkPhase::Open => 0.0,
            BlinkPhase::Closing => progress,
            BlinkPhase::Opening => 1.0 - progress,
        }
    }

    pub fn phase(&self) -> BlinkPhase {
        self.phase
    }

    fn start(&mut self, now: f64, duration: f64) {
        self.phase = BlinkPhase::Closing;
        self.phase_start = now;
        self.phase_duration = duration;
    }
}

fn random_duration<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    rng.gen_range(BLINK_DURATION_MIN..BLINK_DURATION_MAX)
}
