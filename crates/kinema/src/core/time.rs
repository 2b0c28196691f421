use crate::error::{KinemaError, Result};

/// Elapsed time for one frame, in milliseconds.
///
/// Everything that depends on the frame rate (knockback duration, stop
/// compliance windows, force normalization) reads it from here instead of
/// from shared state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTime {
    elapsed_ms: f32,
}

impl FrameTime {
    /// Validate a frame's elapsed time. Negative or non-finite values are a
    /// caller error and are rejected rather than clamped.
    pub fn from_millis(elapsed_ms: f32) -> Result<Self> {
        if !elapsed_ms.is_finite() || elapsed_ms < 0.0 {
            return Err(KinemaError::InvalidElapsed(elapsed_ms));
        }
        Ok(Self { elapsed_ms })
    }

    pub fn millis(&self) -> f32 {
        self.elapsed_ms
    }

    pub fn seconds(&self) -> f32 {
        self.elapsed_ms / 1000.0
    }

    /// Instantaneous frames per second implied by this frame. Zero for an
    /// empty frame.
    pub fn frame_rate(&self) -> f32 {
        if self.elapsed_ms > 0.0 {
            1000.0 / self.elapsed_ms
        } else {
            0.0
        }
    }

    /// Number of whole frames at this frame rate that span `seconds`.
    pub fn frames_for(&self, seconds: f32) -> u32 {
        (self.frame_rate() * seconds).floor() as u32
    }
}

/// Result of one [`FrameClock::tick`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClockTick {
    /// Time the frame accounts for, including any sleep.
    pub elapsed_ms: f32,
    /// How long the caller should sleep to hit the target frametime.
    pub sleep_ms: f32,
}

/// Frame limiter driven by caller-supplied timestamps.
///
/// A frame that finished early is padded up to the target frametime; a slow
/// frame reports its real duration. The clock never reads wall time itself,
/// so it is deterministic under test.
#[derive(Debug, Clone)]
pub struct FrameClock {
    target_ms: Option<f32>,
    last_tick_ms: Option<f64>,
    ticks: u64,
    framerate: f32,
}

impl FrameClock {
    pub fn new(target_ms: Option<f32>) -> Self {
        Self {
            target_ms: target_ms.filter(|t| *t > 0.0),
            last_tick_ms: None,
            ticks: 0,
            framerate: 0.0,
        }
    }

    /// Advance the clock to `now_ms`. The first tick reports zero elapsed.
    pub fn tick(&mut self, now_ms: f64) -> ClockTick {
        let passed = match self.last_tick_ms {
            Some(last) => (now_ms - last).max(0.0) as f32,
            None => 0.0,
        };
        let sleep_ms = match (self.target_ms, self.last_tick_ms) {
            (Some(target), Some(_)) => (target - passed).max(0.0),
            _ => 0.0,
        };
        let elapsed_ms = passed + sleep_ms;

        // The next frame starts after the sleep.
        self.last_tick_ms = Some(now_ms + sleep_ms as f64);
        self.ticks += 1;
        if elapsed_ms > 0.0 {
            let instant = 1000.0 / elapsed_ms;
            self.framerate = if self.framerate == 0.0 {
                instant
            } else {
                self.framerate * 0.9 + instant * 0.1
            };
        }

        ClockTick {
            elapsed_ms,
            sleep_ms,
        }
    }

    /// Smoothed frames per second.
    pub fn framerate(&self) -> f32 {
        self.framerate
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn target_ms(&self) -> Option<f32> {
        self.target_ms
    }
}
