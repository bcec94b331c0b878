use std::collections::VecDeque;
use std::time::Duration;

use filterpager_core::InputEvent;

/// Samples kept per pointer.
const HISTORY: usize = 20;
/// Samples older than this (relative to the newest one) do not contribute.
const HORIZON: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy)]
struct Sample {
    time: Duration,
    x: f32,
}

#[derive(Debug)]
struct PointerTrack {
    id: u32,
    samples: VecDeque<Sample>,
}

impl PointerTrack {
    fn push(&mut self, sample: Sample) {
        if self.samples.len() == HISTORY {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    /// Least-squares slope of x over time, in pixels per millisecond.
    fn slope_px_per_ms(&self) -> f32 {
        let Some(newest) = self.samples.back() else {
            return 0.0;
        };
        let recent: Vec<(f32, f32)> = self
            .samples
            .iter()
            .filter(|s| newest.time.saturating_sub(s.time) <= HORIZON)
            .map(|s| {
                let age_ms = newest.time.saturating_sub(s.time).as_secs_f32() * 1000.0;
                (-age_ms, s.x)
            })
            .collect();
        if recent.len() < 2 {
            return 0.0;
        }

        let n = recent.len() as f32;
        let mean_t = recent.iter().map(|(t, _)| t).sum::<f32>() / n;
        let mean_x = recent.iter().map(|(_, x)| x).sum::<f32>() / n;
        let mut num = 0.0;
        let mut den = 0.0;
        for (t, x) in &recent {
            num += (t - mean_t) * (x - mean_x);
            den += (t - mean_t) * (t - mean_t);
        }
        if den <= f32::EPSILON {
            return 0.0;
        }
        num / den
    }
}

/// Per-pointer horizontal velocity estimate over recent motion samples.
#[derive(Debug, Default)]
pub struct VelocityTracker {
    tracks: Vec<PointerTrack>,
}

impl VelocityTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the position of every pointer in `ev`.
    pub fn add_movement(&mut self, ev: &InputEvent) {
        for p in &ev.pointers {
            self.add_sample(p.id, ev.time, p.x);
        }
        if ev.pointers.is_empty() {
            self.add_sample(ev.pointer_id, ev.time, ev.x);
        }
    }

    pub fn add_sample(&mut self, pointer_id: u32, time: Duration, x: f32) {
        let sample = Sample { time, x };
        match self.tracks.iter_mut().find(|t| t.id == pointer_id) {
            Some(track) => track.push(sample),
            None => {
                let mut track = PointerTrack {
                    id: pointer_id,
                    samples: VecDeque::with_capacity(HISTORY),
                };
                track.push(sample);
                self.tracks.push(track);
            }
        }
    }

    pub fn clear(&mut self) {
        self.tracks.clear();
    }

    /// Velocity of `pointer_id` in pixels per `units_ms` milliseconds, clamped to `±max`.
    ///
    /// `compute_velocity(id, 1000.0, max)` yields pixels per second.
    pub fn compute_velocity(&self, pointer_id: u32, units_ms: f32, max: f32) -> f32 {
        let v = self
            .tracks
            .iter()
            .find(|t| t.id == pointer_id)
            .map(|t| t.slope_px_per_ms() * units_ms)
            .unwrap_or(0.0);
        v.clamp(-max.abs(), max.abs())
    }
}
