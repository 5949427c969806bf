use std::time::Duration;

/// Fixed-cadence tick gate. At most one tick fires per `advance` call, however
/// late the call is.
#[derive(Debug, Clone, Default)]
pub struct PlaybackClock {
    accumulator: Duration,
}

impl PlaybackClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&mut self, wall_delta: Duration, tick: Duration) -> bool {
        self.accumulator = self.accumulator.saturating_add(wall_delta);
        if self.accumulator > tick {
            self.accumulator = Duration::ZERO;
            return true;
        }
        false
    }

    pub fn reset(&mut self) {
        self.accumulator = Duration::ZERO;
    }

    pub fn accumulated(&self) -> Duration {
        self.accumulator
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackPhase {
    Idle,
    Playing,
    Paused,
    Ended,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlaybackState {
    /// Index of the next packet to dispatch, in `[0, packet_count]`.
    pub step_index: usize,
    pub paused: bool,
    pub ended: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickStart {
    pub step: usize,
    pub restarted: bool,
}

impl PlaybackState {
    pub fn phase(&self) -> PlaybackPhase {
        if self.ended {
            PlaybackPhase::Ended
        } else if self.paused {
            PlaybackPhase::Paused
        } else if self.step_index == 0 {
            PlaybackPhase::Idle
        } else {
            PlaybackPhase::Playing
        }
    }

    /// Step a due tick dispatches; playing past the end rewinds to 0.
    pub fn begin_tick(&mut self, packet_count: usize) -> TickStart {
        let restarted = !self.paused && self.step_index >= packet_count;
        if restarted {
            self.step_index = 0;
        }
        TickStart {
            step: self.step_index,
            restarted,
        }
    }

    /// Moves past the dispatched step. Returns true when playback just ended.
    pub fn complete_tick(&mut self, packet_count: usize) -> bool {
        self.step_index += 1;
        if self.step_index >= packet_count {
            self.paused = true;
            self.ended = true;
            true
        } else {
            self.ended = false;
            false
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeedChange {
    Faster,
    Slower,
    /// Doubles, wrapping back to the minimum past the maximum.
    Cycle,
}

/// Playback rate multiplier applied to the configured tick duration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeedControl {
    rate: f32,
    min: f32,
    max: f32,
}

impl SpeedControl {
    pub fn new(min: f32, max: f32) -> Self {
        Self {
            rate: 1.0_f32.clamp(min, max),
            min,
            max,
        }
    }

    pub fn rate(&self) -> f32 {
        self.rate
    }

    /// Returns true when the rate changed.
    pub fn apply(&mut self, change: SpeedChange) -> bool {
        let next = match change {
            SpeedChange::Faster => (self.rate * 2.0).min(self.max),
            SpeedChange::Slower => (self.rate / 2.0).max(self.min),
            SpeedChange::Cycle if self.rate >= self.max => self.min,
            SpeedChange::Cycle => (self.rate * 2.0).min(self.max),
        };
        let changed = next != self.rate;
        self.rate = next;
        changed
    }

    pub fn effective_tick(&self, base: Duration) -> Duration {
        Duration::from_nanos((base.as_nanos() as f64 / f64::from(self.rate)).round() as u64)
    }
}
