use std::ops::{Index, IndexMut};

use glam::Vec2;

use crate::api::types::Direction;

/// Motion as four independent non-negative magnitudes, one per direction.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct VelocityChannels {
    values: [f32; 4],
}

impl VelocityChannels {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, direction: Direction) -> f32 {
        self.values[direction.index()]
    }

    /// Negative magnitudes are stored as zero.
    pub fn set(&mut self, direction: Direction, magnitude: f32) {
        self.values[direction.index()] = magnitude.max(0.0);
    }

    /// `(right - left, down - up)`.
    pub fn velocity(&self) -> Vec2 {
        Vec2::new(
            self.get(Direction::Right) - self.get(Direction::Left),
            self.get(Direction::Down) - self.get(Direction::Up),
        )
    }
}

impl Index<Direction> for VelocityChannels {
    type Output = f32;

    fn index(&self, direction: Direction) -> &f32 {
        &self.values[direction.index()]
    }
}

impl IndexMut<Direction> for VelocityChannels {
    fn index_mut(&mut self, direction: Direction) -> &mut f32 {
        &mut self.values[direction.index()]
    }
}

/// A pending revert for one channel.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Transition {
    pub frames_remaining: u32,
    pub reverts_to: f32,
}

/// Per-direction timers that put a channel back to an earlier value after a
/// fixed number of frames.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TransitionBuffer {
    slots: [Transition; 4],
}

impl TransitionBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `direction` to revert to `reverts_to` after `frames` ticks.
    /// Zero frames records the old value without scheduling anything.
    pub fn schedule(&mut self, direction: Direction, frames: u32, reverts_to: f32) {
        self.slots[direction.index()] = Transition {
            frames_remaining: frames,
            reverts_to,
        };
    }

    pub fn get(&self, direction: Direction) -> Transition {
        self.slots[direction.index()]
    }

    pub fn is_pending(&self, direction: Direction) -> bool {
        self.slots[direction.index()].frames_remaining > 0
    }

    /// Count every pending timer down by one frame and apply the ones that
    /// expire. Returns the directions that reverted.
    pub fn tick(&mut self, channels: &mut VelocityChannels) -> Vec<Direction> {
        let mut reverted = Vec::new();
        for direction in Direction::ALL {
            let slot = &mut self.slots[direction.index()];
            if slot.frames_remaining == 0 {
                continue;
            }
            slot.frames_remaining -= 1;
            if slot.frames_remaining < 1 {
                channels.set(direction, slot.reverts_to);
                reverted.push(direction);
            }
        }
        reverted
    }
}
