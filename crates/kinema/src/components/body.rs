use crate::api::types::EntityId;
use crate::components::edges::EdgeMask;
use crate::components::motion::MovingBody;
use crate::components::rect::Rect;

/// What the motion systems need from a sprite.
///
/// Capabilities are opt-in: a body without a [`MovingBody`] is never
/// integrated, stopped, or knocked; a body that does not override
/// [`Body::edges`] is solid on every side.
pub trait Body {
    fn id(&self) -> EntityId;

    fn rect(&self) -> &Rect;

    fn rect_mut(&mut self) -> &mut Rect;

    /// Movable capability.
    fn motion(&self) -> Option<&MovingBody> {
        None
    }

    fn motion_mut(&mut self) -> Option<&mut MovingBody> {
        None
    }

    /// Motion and rectangle borrowed together, for integration.
    fn split_motion(&mut self) -> Option<(&mut MovingBody, &mut Rect)> {
        None
    }

    /// Edge-aware capability.
    fn edges(&self) -> EdgeMask {
        EdgeMask::SOLID
    }

    /// Knockable capability. Only meaningful together with a motion
    /// component.
    fn is_knockable(&self) -> bool {
        false
    }

    /// Inactive bodies are skipped by every system.
    fn is_active(&self) -> bool {
        true
    }

    /// Whether the body takes part in collision resolution at all.
    fn is_collidable(&self) -> bool {
        true
    }
}
