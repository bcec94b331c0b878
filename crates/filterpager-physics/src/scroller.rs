use std::time::Duration;

/// Quintic ease-out: fast start, gentle landing.
pub fn interpolate(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0) - 1.0;
    t * t * t * t * t + 1.0
}

/// Time-driven horizontal scroll animation.
///
/// The caller supplies `now` on every call so the animation is deterministic under test.
#[derive(Debug, Clone)]
pub struct Scroller {
    start_x: i32,
    final_x: i32,
    curr_x: i32,
    start_time: Duration,
    duration: Duration,
    finished: bool,
}

impl Default for Scroller {
    fn default() -> Self {
        Self::new()
    }
}

impl Scroller {
    pub fn new() -> Self {
        Self {
            start_x: 0,
            final_x: 0,
            curr_x: 0,
            start_time: Duration::ZERO,
            duration: Duration::ZERO,
            finished: true,
        }
    }

    pub fn start_scroll(&mut self, start_x: i32, dx: i32, duration: Duration, now: Duration) {
        self.start_x = start_x;
        self.curr_x = start_x;
        self.final_x = start_x + dx;
        self.start_time = now;
        self.duration = duration;
        self.finished = false;
    }

    /// Advances to `now`. Returns true while the animation produced a position this call;
    /// the call that reaches the end still returns true and marks the scroller finished.
    pub fn compute_scroll_offset(&mut self, now: Duration) -> bool {
        if self.finished {
            return false;
        }
        let elapsed = now.saturating_sub(self.start_time);
        if elapsed < self.duration {
            let t = elapsed.as_secs_f32() / self.duration.as_secs_f32();
            let dx = (self.final_x - self.start_x) as f32;
            self.curr_x = self.start_x + (interpolate(t) * dx).round() as i32;
        } else {
            self.curr_x = self.final_x;
            self.finished = true;
        }
        true
    }

    /// Stops and jumps to the final position.
    pub fn abort_animation(&mut self) {
        self.curr_x = self.final_x;
        self.finished = true;
    }

    /// Stops where it is.
    pub fn force_finished(&mut self) {
        self.finished = true;
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn start_x(&self) -> i32 {
        self.start_x
    }

    pub fn curr_x(&self) -> i32 {
        self.curr_x
    }

    pub fn final_x(&self) -> i32 {
        self.final_x
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }
}
