use glam::Vec2;

use crate::components::body::Body;
use crate::components::motion::ForceCaps;
use crate::core::time::FrameTime;

/// A constant force (gravity, wind) applied to every movable body in a
/// collection, once per frame, before integration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForceField {
    pub force: Vec2,
    pub caps: ForceCaps,
}

impl ForceField {
    pub fn new(force: Vec2) -> Self {
        Self {
            force,
            caps: ForceCaps::none(),
        }
    }

    /// Vertical gravity in Y-down coordinates.
    pub fn gravity(strength: f32) -> Self {
        Self::new(Vec2::new(0.0, strength))
    }

    pub fn with_caps(mut self, caps: ForceCaps) -> Self {
        self.caps = caps;
        self
    }

    /// Force scaled to this frame's length.
    pub fn increment(&self, frame: &FrameTime) -> Vec2 {
        self.force * frame.seconds()
    }

    /// Push every body that has a motion component. Returns how many were
    /// affected.
    pub fn apply<B: Body>(&self, bodies: &mut [B], frame: &FrameTime) -> usize {
        let increment = self.increment(frame);
        if increment == Vec2::ZERO {
            return 0;
        }
        let mut pushed = 0;
        for body in bodies.iter_mut().filter(|b| b.is_active()) {
            if let Some(motion) = body.motion_mut() {
                motion.apply_force(increment, &self.caps);
                pushed += 1;
            }
        }
        pushed
    }
}
