use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::api::types::Direction;
use crate::components::channels::{TransitionBuffer, VelocityChannels};
use crate::components::rect::Rect;
use crate::core::time::FrameTime;
use crate::error::{KinemaError, Result};

/// Where applied forces accumulate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForceMode {
    /// Forces add straight into the velocity channels.
    #[default]
    IntoVelocity,
    /// Forces add into a separate accumulator summed with velocity at
    /// integration time.
    IntoForce,
}

/// Optional per-direction ceilings on force accumulation.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ForceCaps {
    pub left: Option<f32>,
    pub right: Option<f32>,
    pub up: Option<f32>,
    pub down: Option<f32>,
}

impl ForceCaps {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with_cap(mut self, direction: Direction, cap: f32) -> Self {
        match direction {
            Direction::Left => self.left = Some(cap),
            Direction::Right => self.right = Some(cap),
            Direction::Up => self.up = Some(cap),
            Direction::Down => self.down = Some(cap),
        }
        self
    }

    pub fn get(&self, direction: Direction) -> Option<f32> {
        match direction {
            Direction::Left => self.left,
            Direction::Right => self.right,
            Direction::Up => self.up,
            Direction::Down => self.down,
        }
    }
}

/// Add `increment` to `current` unless `cap` has already been reached.
/// A single step never overshoots the cap; a value already past it is left
/// alone.
fn accumulate_capped(current: f32, increment: f32, cap: Option<f32>) -> f32 {
    match cap {
        Some(cap) if current >= cap => current,
        Some(cap) => (current + increment).min(cap),
        None => current + increment,
    }
}

/// Kinematic state for a sprite that moves on its own.
///
/// Position is not stored here: [`MovingBody::integrate`] moves the owning
/// sprite's rectangle.
#[derive(Debug, Clone, PartialEq)]
pub struct MovingBody {
    channels: VelocityChannels,
    transitions: TransitionBuffer,
    /// Whether each channel's value came from a motor command.
    going: [bool; 4],
    force: Vec2,
    reference: Vec2,
    speed: f32,
    force_mode: ForceMode,
}

impl MovingBody {
    /// `speed` scales velocity and force into pixels per second; larger is
    /// faster. It must be positive.
    pub fn new(speed: f32) -> Result<Self> {
        if !speed.is_finite() || speed <= 0.0 {
            return Err(KinemaError::InvalidConfig(format!(
                "speed must be positive and finite (got {speed})"
            )));
        }
        Ok(Self {
            channels: VelocityChannels::new(),
            transitions: TransitionBuffer::new(),
            going: [false; 4],
            force: Vec2::ZERO,
            reference: Vec2::ZERO,
            speed,
            force_mode: ForceMode::default(),
        })
    }

    pub fn with_force_mode(mut self, mode: ForceMode) -> Self {
        self.force_mode = mode;
        self
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn force_mode(&self) -> ForceMode {
        self.force_mode
    }

    pub fn channels(&self) -> &VelocityChannels {
        &self.channels
    }

    pub fn transitions(&self) -> &TransitionBuffer {
        &self.transitions
    }

    pub fn channel(&self, direction: Direction) -> f32 {
        self.channels.get(direction)
    }

    /// Velocity from the channels alone.
    pub fn velocity(&self) -> Vec2 {
        self.channels.velocity()
    }

    /// Accumulated force (always zero in [`ForceMode::IntoVelocity`]).
    pub fn force(&self) -> Vec2 {
        self.force
    }

    /// Velocity the next step will move the body with: channels plus the
    /// force accumulator.
    pub fn effective_velocity(&self) -> Vec2 {
        self.velocity() + self.force
    }

    pub fn reference(&self) -> Vec2 {
        self.reference
    }

    /// Whether the body is driven toward `direction` by a motor command
    /// rather than coasting.
    pub fn is_going(&self, direction: Direction) -> bool {
        self.going[direction.index()]
    }

    /// Whether the body will move toward `direction` on the next step.
    pub fn is_moving(&self, direction: Direction) -> bool {
        let v = self.effective_velocity();
        match direction {
            Direction::Left => v.x < 0.0,
            Direction::Right => v.x > 0.0,
            Direction::Up => v.y < 0.0,
            Direction::Down => v.y > 0.0,
        }
    }

    fn overwrite(&mut self, direction: Direction, magnitude: f32, duration_frames: u32) {
        let old = self.channels.get(direction);
        self.transitions.schedule(direction, duration_frames, old);
        self.channels.set(direction, magnitude);
        // Timed overrides (knockback) leave the motor state for the revert.
        if duration_frames == 0 {
            self.going[direction.index()] = magnitude > 0.0;
        }
    }

    fn set_axis(&mut self, value: f32, negative: Direction, positive: Direction, duration_frames: u32) {
        if value < 0.0 {
            self.overwrite(negative, value.abs(), duration_frames);
            self.overwrite(positive, 0.0, duration_frames);
        } else {
            self.overwrite(positive, value, duration_frames);
            self.overwrite(negative, 0.0, duration_frames);
        }
    }

    /// Set motion along either axis. `None` leaves that axis alone. With a
    /// non-zero `duration_frames` the old values come back after that many
    /// integrations.
    pub fn set_motion(&mut self, vx: Option<f32>, vy: Option<f32>, duration_frames: u32) {
        if let Some(vx) = vx {
            self.set_axis(vx, Direction::Left, Direction::Right, duration_frames);
        }
        if let Some(vy) = vy {
            self.set_axis(vy, Direction::Up, Direction::Down, duration_frames);
        }
    }

    /// Zero one channel, optionally only for `duration_frames`.
    pub fn stop_direction(&mut self, direction: Direction, duration_frames: u32) {
        self.overwrite(direction, 0.0, duration_frames);
        if self.force_mode == ForceMode::IntoForce {
            let along = self.force.dot(direction.unit());
            if along > 0.0 {
                self.force -= direction.unit() * along;
            }
        }
    }

    /// How many frames a knock lasts: faster bodies recover sooner, never in
    /// less than two frames.
    pub fn knock_duration(&self, frame: &FrameTime) -> u32 {
        let frames = frame.frame_rate() / (self.speed / 4.0);
        (frames.floor() as u32).max(2)
    }

    /// A brief externally imposed velocity that wears off on its own.
    pub fn knock(&mut self, vx: Option<f32>, vy: Option<f32>, frame: &FrameTime) {
        let duration = self.knock_duration(frame);
        self.set_motion(vx, vy, duration);
    }

    /// Accumulate a force, respecting `caps`.
    pub fn apply_force(&mut self, force: Vec2, caps: &ForceCaps) {
        match self.force_mode {
            ForceMode::IntoVelocity => {
                self.push_channel(force.x, Direction::Left, Direction::Right, caps);
                self.push_channel(force.y, Direction::Up, Direction::Down, caps);
            }
            ForceMode::IntoForce => {
                self.force.x = Self::push_component(self.force.x, force.x, Direction::Left, Direction::Right, caps);
                self.force.y = Self::push_component(self.force.y, force.y, Direction::Up, Direction::Down, caps);
            }
        }
    }

    fn push_channel(&mut self, amount: f32, negative: Direction, positive: Direction, caps: &ForceCaps) {
        let direction = if amount > 0.0 {
            positive
        } else if amount < 0.0 {
            negative
        } else {
            return;
        };
        let current = self.channels.get(direction);
        let next = accumulate_capped(current, amount.abs(), caps.get(direction));
        self.channels.set(direction, next);
    }

    fn push_component(
        current: f32,
        amount: f32,
        negative: Direction,
        positive: Direction,
        caps: &ForceCaps,
    ) -> f32 {
        if amount > 0.0 {
            accumulate_capped(current, amount, caps.get(positive))
        } else if amount < 0.0 {
            -accumulate_capped(-current, -amount, caps.get(negative))
        } else {
            current
        }
    }

    /// Carry the body along with whatever it stands on, for the next step
    /// only.
    pub fn set_reference_frame(&mut self, reference: Vec2) {
        self.reference = reference;
    }

    /// Advance `rect` by one frame and return the displacement.
    pub fn integrate(&mut self, rect: &mut Rect, frame: &FrameTime) -> Vec2 {
        self.transitions.tick(&mut self.channels);
        let velocity = self.channels.velocity();
        let delta = (self.reference + (self.force + velocity) * self.speed) * frame.seconds();
        rect.translate(delta);
        self.reference = Vec2::ZERO;
        delta
    }
}
