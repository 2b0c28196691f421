use glam::Vec2;

use crate::api::types::EntityId;
use crate::components::body::Body;
use crate::components::edges::EdgeMask;
use crate::components::motion::MovingBody;
use crate::components::rect::Rect;
#[cfg(feature = "physics")]
use crate::core::physics::RigidHandle;

/// Fat sprite: a rectangle plus optional capabilities.
/// Designed for simplicity over ECS purity.
#[derive(Debug, Clone)]
pub struct Sprite {
    /// Unique identifier.
    pub id: EntityId,
    /// String tag for finding sprites by name ("player", "wall", ...).
    pub tag: String,
    /// Inactive sprites are skipped by every system.
    pub active: bool,
    /// Bounding box; its center is the integrated position.
    pub rect: Rect,
    /// Render order, lower first.
    pub depth: i32,
    /// Kinematic motion (optional; sprites without it never move on their own).
    pub motion: Option<MovingBody>,
    /// Solid edges (optional; absent means solid all round).
    pub edges: Option<EdgeMask>,
    /// Whether collisions may knock this sprite back.
    pub knockable: bool,
    /// Whether the sprite takes part in collision resolution.
    pub collidable: bool,
    /// Rigid body in a [`crate::core::physics::RigidSpace`] (requires "physics" feature).
    #[cfg(feature = "physics")]
    pub body: Option<RigidHandle>,
}

impl Sprite {
    /// Create a sprite with the given ID and bounding box.
    pub fn new(id: EntityId, rect: Rect) -> Self {
        Self {
            id,
            tag: String::new(),
            active: true,
            rect,
            depth: 0,
            motion: None,
            edges: None,
            knockable: false,
            collidable: true,
            #[cfg(feature = "physics")]
            body: None,
        }
    }

    // -- Builder pattern --

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = tag.into();
        self
    }

    pub fn with_depth(mut self, depth: i32) -> Self {
        self.depth = depth;
        self
    }

    pub fn with_center(mut self, center: Vec2) -> Self {
        self.rect.set_center(center);
        self
    }

    pub fn with_motion(mut self, motion: MovingBody) -> Self {
        self.motion = Some(motion);
        self
    }

    pub fn with_edges(mut self, edges: EdgeMask) -> Self {
        self.edges = Some(edges);
        self
    }

    pub fn knockable(mut self) -> Self {
        self.knockable = true;
        self
    }

    /// Exclude the sprite from collision resolution (scenery, HUD).
    pub fn ghost(mut self) -> Self {
        self.collidable = false;
        self
    }

    #[cfg(feature = "physics")]
    pub fn with_body(mut self, body: RigidHandle) -> Self {
        self.body = Some(body);
        self
    }

    /// Velocity from the motion component, or zero.
    pub fn velocity(&self) -> Vec2 {
        self.motion
            .as_ref()
            .map(MovingBody::velocity)
            .unwrap_or(Vec2::ZERO)
    }
}

impl Body for Sprite {
    fn id(&self) -> EntityId {
        self.id
    }

    fn rect(&self) -> &Rect {
        &self.rect
    }

    fn rect_mut(&mut self) -> &mut Rect {
        &mut self.rect
    }

    fn motion(&self) -> Option<&MovingBody> {
        self.motion.as_ref()
    }

    fn motion_mut(&mut self) -> Option<&mut MovingBody> {
        self.motion.as_mut()
    }

    fn split_motion(&mut self) -> Option<(&mut MovingBody, &mut Rect)> {
        self.motion.as_mut().map(|motion| (motion, &mut self.rect))
    }

    fn edges(&self) -> EdgeMask {
        self.edges.unwrap_or_default()
    }

    fn is_knockable(&self) -> bool {
        self.knockable && self.motion.is_some()
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn is_collidable(&self) -> bool {
        self.active && self.collidable
    }
}
