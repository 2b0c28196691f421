use serde::{Deserialize, Serialize};

use crate::api::types::Direction;

/// Which sides of a sprite are solid. A sprite whose `left` edge is open can
/// be entered from the left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EdgeMask {
    pub top: bool,
    pub bottom: bool,
    pub left: bool,
    pub right: bool,
}

impl EdgeMask {
    pub const SOLID: EdgeMask = EdgeMask {
        top: true,
        bottom: true,
        left: true,
        right: true,
    };

    /// Solid on top only: a platform that can be jumped through from below.
    pub const ONE_WAY: EdgeMask = EdgeMask {
        top: true,
        bottom: false,
        left: false,
        right: false,
    };

    /// Whether the edge facing `direction` is solid (`Up` is the top edge).
    pub fn is_solid(&self, direction: Direction) -> bool {
        match direction {
            Direction::Up => self.top,
            Direction::Down => self.bottom,
            Direction::Left => self.left,
            Direction::Right => self.right,
        }
    }

    pub fn with_edge(mut self, direction: Direction, solid: bool) -> Self {
        match direction {
            Direction::Up => self.top = solid,
            Direction::Down => self.bottom = solid,
            Direction::Left => self.left = solid,
            Direction::Right => self.right = solid,
        }
        self
    }
}

impl Default for EdgeMask {
    fn default() -> Self {
        Self::SOLID
    }
}
