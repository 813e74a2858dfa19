// THEORY:
// Without a light sensor, the pupil is animated by random midpoint subdivision. To move
// from one scale to another over a duration, the interval is split in half and the
// midpoint is nudged by a random amount; each half is split again with half the spread,
// until the spread is too small to matter. The leaves are played back as straight ramps.
// The result wanders like a living pupil instead of sliding linearly.
//
// Subdivision is done with an explicit stack, lazily: each call to `next` does just
// enough splitting to produce the next leaf in time order. Depth is bounded by the
// spread halving, not by the call stack.

use rand::Rng;

/// Subdivision stops once the spread drops below this value.
const MIN_SPLIT_RANGE: f64 = 0.125;

/// One straight ramp of pupil scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PupilSegment {
    pub start: f64,
    pub end: f64,
    /// Seconds.
    pub duration: f64,
}

impl PupilSegment {
    /// Scale after `elapsed` seconds into the segment.
    pub fn value_at(&self, elapsed: f64) -> f64 {
        if self.duration <= 0.0 {
            return self.end;
        }
        let t = (elapsed / self.duration).clamp(0.0, 1.0);
        self.start + (self.end - self.start) * t
    }
}

#[derive(Debug, Clone, Copy)]
struct Span {
    start: f64,
    end: f64,
    duration: f64,
    range: f64,
}

/// The pending subdivision of one start-to-end pupil movement.
#[derive(Debug, Clone)]
pub struct PupilSchedule {
    /// Spans still to be played, the next one on top.
    pending: Vec<Span>,
}

impl PupilSchedule {
    pub fn new(start: f64, end: f64, duration: f64, range: f64) -> Self {
        Self {
            pending: vec![Span {
                start,
                end,
                duration,
                range,
            }],
        }
    }

    /// Splits until the next leaf is reached and returns it.
    pub fn next_segment<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<PupilSegment> {
        while let Some(span) = self.pending.pop() {
            if span.range < MIN_SPLIT_RANGE {
                return Some(PupilSegment {
                    start: span.start,
                    end: span.end,
                    duration: span.duration,
                });
            }

            let duration = span.duration * 0.5;
            let range = span.range * 0.5;
            let mid = (span.start + span.end - range) * 0.5 + rng.gen_range(0.0..=range);

            // Second half first so the first half is popped next.
            self.pending.push(Span { start: mid, end: span.end, duration, range });
            self.pending.push(Span { start: span.start, end: mid, duration, range });
        }
        None
    }

    /// Iterates the remaining segments, drawing midpoints from `rng`.
    pub fn segments<'a, R: Rng + ?Sized>(&'a mut self, rng: &'a mut R) -> Segments<'a, R> {
        Segments { schedule: self, rng }
    }

    pub fn is_finished(&self) -> bool {
        self.pending.is_empty()
    }
}

pub struct Segments<'a, R: Rng + ?Sized> {
    schedule: &'a mut PupilSchedule,
    rng: &'a mut R,
}

impl<R: Rng + ?Sized> Iterator for Segments<'_, R> {
    type Item = PupilSegment;

    fn next(&mut self) -> Option<PupilSegment> {
        self.schedule.next_segment(self.rng)
    }
}

#[derive(Debug, Clone, Copy)]
struct ActiveSegment {
    segment: PupilSegment,
    started_at: f64,
}

/// Plays schedules back to back, picking a fresh random target whenever one finishes.
#[derive(Debug, Clone)]
pub struct PupilAnimator {
    min: f64,
    max: f64,
    cycle_seconds: f64,
    range: f64,
    /// Target of the schedule being played.
    target: f64,
    schedule: PupilSchedule,
    active: Option<ActiveSegment>,
}

impl PupilAnimator {
    pub fn new(initial: f64, min: f64, max: f64, cycle_seconds: f64, range: f64) -> Self {
        Self {
            min,
            max,
            cycle_seconds,
            range,
            target: initial,
            // Empty: the first call to `value_at` picks a target.
            schedule: PupilSchedule { pending: Vec::new() },
            active: None,
        }
    }

    /// Pupil scale at `now`, clamped to the configured range.
    pub fn value_at<R: Rng + ?Sized>(&mut self, now: f64, rng: &mut R) -> f64 {
        loop {
            let Some(active) = self.active else {
                self.begin_next(now, rng);
                continue;
            };

            let elapsed = now - active.started_at;
            if elapsed < active.segment.duration {
                return active.segment.value_at(elapsed).clamp(self.min, self.max);
            }

            // Keep segments back to back unless we fell more than a cycle behind.
            let next_start = active.started_at + active.segment.duration;
            let next_start = if now - next_start > self.cycle_seconds { now } else { next_start };
            self.begin_next(next_start, rng);
        }
    }

    fn begin_next<R: Rng + ?Sized>(&mut self, start_time: f64, rng: &mut R) {
        if self.schedule.is_finished() {
            let next_target = rng.gen_range(0.0..1.0);
            self.schedule = PupilSchedule::new(self.target, next_target, self.cycle_seconds, self.range);
            self.target = next_target;
        }
        self.active = self
            .schedule
            .next_segment(rng)
            .map(|segment| ActiveSegment { segment, started_at: start_time });
    }
}
