use std::fmt;
use std::str::FromStr;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::error::KinemaError;

/// Conventional tag for level geometry: floors, walls, and the segments a
/// rigid space adds along its bounds.
pub const WALL_TAG: &str = "wall";

/// Unique identifier for a sprite in a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub u32);

/// One of the four screen directions. Y grows downward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Left,
        Direction::Right,
        Direction::Up,
        Direction::Down,
    ];

    /// The direction pointing the other way along the same axis.
    pub fn opposite(self) -> Self {
        match self {
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
        }
    }

    /// Dense index for per-direction arrays.
    pub(crate) fn index(self) -> usize {
        match self {
            Direction::Left => 0,
            Direction::Right => 1,
            Direction::Up => 2,
            Direction::Down => 3,
        }
    }

    pub fn is_horizontal(self) -> bool {
        matches!(self, Direction::Left | Direction::Right)
    }

    /// Unit vector for this direction.
    pub fn unit(self) -> Vec2 {
        match self {
            Direction::Left => Vec2::NEG_X,
            Direction::Right => Vec2::X,
            Direction::Up => Vec2::NEG_Y,
            Direction::Down => Vec2::Y,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Left => "left",
            Direction::Right => "right",
            Direction::Up => "up",
            Direction::Down => "down",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = KinemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "left" => Ok(Direction::Left),
            "right" => Ok(Direction::Right),
            "up" | "top" => Ok(Direction::Up),
            "down" | "bottom" => Ok(Direction::Down),
            other => Err(KinemaError::InvalidArgument(format!(
                "unknown direction '{other}'"
            ))),
        }
    }
}

/// A resolved contact from the collision pass.
///
/// `side` is the edge of `to` that `by` struck: `Up` means `by` landed on
/// top of `to`, `Left` means `by` ran into `to` from the left, and so on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactEvent {
    pub by: EntityId,
    pub to: EntityId,
    pub side: Direction,
    /// Knockback handed to `to`, if it accepted one.
    pub knock: Option<Vec2>,
}

impl ContactEvent {
    /// `by` came down onto `to`.
    pub fn is_landing(&self) -> bool {
        self.side == Direction::Up
    }
}
