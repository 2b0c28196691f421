use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::api::types::{ContactEvent, Direction};
use crate::components::body::Body;
use crate::components::motion::MovingBody;
use crate::core::time::FrameTime;
use crate::error::{KinemaError, Result};

/// Default penetration threshold in pixels. Overlaps deeper than this along
/// an axis are not treated as contact on that axis.
pub const DEFAULT_PENETRATION_THRESHOLD: f32 = -5.0;

/// How long a body driven into an obstacle gives way before pushing again.
const STOP_COMPLIANCE_SECONDS: f32 = 0.1;

/// When a collision stop is temporary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevertPolicy {
    /// Only a body actively driven toward the obstacle gets the compliance
    /// window; a coasting body halts for good.
    #[default]
    WhenGoing,
    /// Every stop reverts after the compliance window.
    Always,
}

/// Pairwise axis-separated AABB resolution with knockback.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionResolver {
    threshold: f32,
    pub revert_policy: RevertPolicy,
}

/// Hand out two distinct elements of a slice mutably.
fn pair_mut<T>(items: &mut [T], i: usize, j: usize) -> (&mut T, &mut T) {
    debug_assert_ne!(i, j);
    if i < j {
        let (lo, hi) = items.split_at_mut(j);
        (&mut lo[i], &mut hi[0])
    } else {
        let (lo, hi) = items.split_at_mut(i);
        (&mut hi[0], &mut lo[j])
    }
}

impl CollisionResolver {
    /// `threshold` must be negative: it is the deepest overlap still counted
    /// as touching.
    pub fn new(threshold: f32) -> Result<Self> {
        if !threshold.is_finite() || threshold >= 0.0 {
            return Err(KinemaError::InvalidConfig(format!(
                "penetration threshold must be negative (got {threshold})"
            )));
        }
        Ok(Self {
            threshold,
            revert_policy: RevertPolicy::default(),
        })
    }

    pub fn with_revert_policy(mut self, policy: RevertPolicy) -> Self {
        self.revert_policy = policy;
        self
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    fn penetrates(&self, depth: f32) -> bool {
        self.threshold < depth && depth < 0.0
    }

    /// Frames a collision stop toward `heading` lasts before the old speed
    /// returns. Zero means a permanent stop.
    pub fn revert_duration(&self, motion: &MovingBody, heading: Direction, frame: &FrameTime) -> u32 {
        let compliant = match self.revert_policy {
            RevertPolicy::Always => true,
            RevertPolicy::WhenGoing => motion.is_going(heading),
        };
        if compliant {
            frame.frames_for(STOP_COMPLIANCE_SECONDS)
        } else {
            0
        }
    }

    /// Resolve every overlapping pair, using strict rectangle intersection
    /// as the broad phase.
    pub fn resolve<B: Body>(&self, bodies: &mut [B], frame: &FrameTime, events: &mut Vec<ContactEvent>) {
        self.resolve_with(bodies, frame, |a, b| a.rect().intersects(b.rect()), events);
    }

    /// Resolve every ordered pair `(a, b)` for which `collides(a, b)` holds.
    ///
    /// Pairs are visited in index order, so the outcome depends only on the
    /// slice order. Each pair is re-tested against the positions left by the
    /// pairs before it.
    pub fn resolve_with<B, F>(
        &self,
        bodies: &mut [B],
        frame: &FrameTime,
        collides: F,
        events: &mut Vec<ContactEvent>,
    ) where
        B: Body,
        F: Fn(&B, &B) -> bool,
    {
        let usable = |body: &B| body.is_active() && body.is_collidable();
        let n = bodies.len();
        for i in 0..n {
            for j in 0..n {
                if i == j {
                    continue;
                }
                if !usable(&bodies[i]) || !usable(&bodies[j]) {
                    continue;
                }
                if !collides(&bodies[i], &bodies[j]) {
                    continue;
                }
                let (a, b) = pair_mut(bodies, i, j);
                self.resolve_pair(a, b, frame, events);
            }
        }
    }

    /// Resolve one ordered pair on both axes. At most one vertical and one
    /// horizontal contact is produced.
    pub fn resolve_pair<B: Body>(
        &self,
        a: &mut B,
        b: &mut B,
        frame: &FrameTime,
        events: &mut Vec<ContactEvent>,
    ) {
        let a_rect = *a.rect();
        let b_rect = *b.rect();
        let b_edges = b.edges();
        let a_velocity = a.motion().map(MovingBody::effective_velocity);

        // Top case first; the bottom case only runs when it did not fire.
        let d_top = b_rect.top() - a_rect.bottom();
        let d_bottom = a_rect.top() - b_rect.bottom();
        let vertical = if self.penetrates(d_top)
            && b_edges.top
            && a_velocity.map_or(true, |v| v.y > 0.0)
        {
            Some(Direction::Down)
        } else if self.penetrates(d_bottom)
            && b_edges.bottom
            && a_velocity.map_or(true, |v| v.y < 0.0)
        {
            Some(Direction::Up)
        } else {
            None
        };

        let d_left = b_rect.left() - a_rect.right();
        let d_right = a_rect.left() - b_rect.right();
        let horizontal = if self.penetrates(d_left)
            && b_edges.left
            && a_velocity.map_or(true, |v| v.x > 0.0)
        {
            Some(Direction::Right)
        } else if self.penetrates(d_right)
            && b_edges.right
            && a_velocity.map_or(true, |v| v.x < 0.0)
        {
            Some(Direction::Left)
        } else {
            None
        };

        for heading in [vertical, horizontal].into_iter().flatten() {
            let event = self.settle(a, b, heading, a_velocity, frame);
            events.push(event);
        }
    }

    /// `a` ran into `b` while heading toward `heading`: put `a` back against
    /// the struck edge, stop it, and pass its speed on to `b`.
    fn settle<B: Body>(
        &self,
        a: &mut B,
        b: &mut B,
        heading: Direction,
        a_velocity: Option<Vec2>,
        frame: &FrameTime,
    ) -> ContactEvent {
        let side = heading.opposite();
        let b_rect = *b.rect();
        let a_solid = a.edges().is_solid(heading);

        // Sprites without motion are immovable; they only report the contact.
        if a.motion().is_some() {
            if a_solid {
                let rect = a.rect_mut();
                match heading {
                    Direction::Down => rect.set_bottom(b_rect.top()),
                    Direction::Up => rect.set_top(b_rect.bottom()),
                    Direction::Right => rect.set_right(b_rect.left()),
                    Direction::Left => rect.set_left(b_rect.right()),
                }
            }
            if let Some(motion) = a.motion_mut() {
                let duration = self.revert_duration(motion, heading, frame);
                motion.stop_direction(heading, duration);
            }
        }

        let mut knock = None;
        if let (Some(v), true) = (a_velocity, b.is_knockable()) {
            if let Some(motion) = b.motion_mut() {
                let impulse = if heading.is_horizontal() {
                    motion.knock(Some(v.x), None, frame);
                    Vec2::new(v.x, 0.0)
                } else {
                    motion.knock(None, Some(v.y), frame);
                    Vec2::new(0.0, v.y)
                };
                knock = Some(impulse);
            }
        }

        log::debug!(
            "contact: {:?} hit {} side of {:?} (knock {:?})",
            a.id(),
            side,
            b.id(),
            knock
        );

        ContactEvent {
            by: a.id(),
            to: b.id(),
            side,
            knock,
        }
    }
}

impl Default for CollisionResolver {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_PENETRATION_THRESHOLD,
            revert_policy: RevertPolicy::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::EntityId;
    use crate::components::edges::EdgeMask;
    use crate::components::entity::Sprite;
    use crate::components::motion::ForceMode;
    use crate::components::rect::Rect;
    use crate::systems::forces::ForceField;
    use crate::systems::motion::integrate_all;

    fn frame(ms: f32) -> FrameTime {
        FrameTime::from_millis(ms).unwrap()
    }

    fn mover(id: u32, rect: Rect, vx: f32, vy: f32) -> Sprite {
        let mut motion = MovingBody::new(1.0).unwrap();
        motion.set_motion(Some(vx), Some(vy), 0);
        Sprite::new(EntityId(id), rect).with_motion(motion)
    }

    #[test]
    fn rejects_non_negative_threshold() {
        assert!(CollisionResolver::new(0.0).is_err());
        assert!(CollisionResolver::new(3.0).is_err());
        assert_eq!(CollisionResolver::new(-15.0).unwrap().threshold(), -15.0);
    }

    #[test]
    fn landing_snaps_and_stops() {
        let resolver = CollisionResolver::default();
        let mut sprites = vec![
            mover(1, Rect::new(0.0, 2.0, 10.0, 10.0), 0.0, 40.0),
            Sprite::new(EntityId(2), Rect::new(-20.0, 10.0, 50.0, 10.0)),
        ];
        let mut events = Vec::new();
        resolver.resolve(&mut sprites, &frame(20.0), &mut events);

        assert_eq!(sprites[0].rect.bottom(), 10.0);
        let motion = sprites[0].motion.as_ref().unwrap();
        assert_eq!(motion.channel(Direction::Down), 0.0);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].by, EntityId(1));
        assert!(events[0].is_landing());
        assert_eq!(events[0].knock, None);
    }

    #[test]
    fn going_body_gets_compliance_window() {
        let resolver = CollisionResolver::default();
        let mut sprites = vec![
            mover(1, Rect::new(2.0, 0.0, 10.0, 10.0), 30.0, 0.0),
            Sprite::new(EntityId(2), Rect::new(10.0, -20.0, 10.0, 50.0)),
        ];
        let mut events = Vec::new();
        resolver.resolve(&mut sprites, &frame(20.0), &mut events);

        assert_eq!(sprites[0].rect.right(), 10.0);
        assert_eq!(events[0].side, Direction::Left);
        let motion = sprites[0].motion.as_ref().unwrap();
        assert_eq!(motion.channel(Direction::Right), 0.0);
        let pending = motion.transitions().get(Direction::Right);
        assert_eq!(pending.frames_remaining, 5);
        assert_eq!(pending.reverts_to, 30.0);
    }

    #[test]
    fn coasting_body_halts_immediately() {
        let resolver = CollisionResolver::default();
        let mut motion = MovingBody::new(1.0).unwrap();
        motion.apply_force(Vec2::new(0.0, 40.0), &Default::default());
        let mut sprites = vec![
            Sprite::new(EntityId(1), Rect::new(0.0, 2.0, 10.0, 10.0)).with_motion(motion),
            Sprite::new(EntityId(2), Rect::new(-20.0, 10.0, 50.0, 10.0)),
        ];
        let mut events = Vec::new();
        resolver.resolve(&mut sprites, &frame(20.0), &mut events);
        let motion = sprites[0].motion.as_ref().unwrap();
        assert!(!motion.transitions().is_pending(Direction::Down));

        // Same contact under the unconditional policy is temporary.
        let always = CollisionResolver::default().with_revert_policy(RevertPolicy::Always);
        let mut motion = MovingBody::new(1.0).unwrap();
        motion.apply_force(Vec2::new(0.0, 40.0), &Default::default());
        sprites[0] = Sprite::new(EntityId(1), Rect::new(0.0, 2.0, 10.0, 10.0)).with_motion(motion);
        always.resolve(&mut sprites, &frame(20.0), &mut events);
        let motion = sprites[0].motion.as_ref().unwrap();
        assert!(motion.transitions().is_pending(Direction::Down));
    }

    #[test]
    fn top_case_excludes_bottom_case() {
        // Both rectangles are thin enough that the top and bottom overlaps
        // are each within the threshold; A has no motion, so neither
        // velocity gate rules a case out.
        let resolver = CollisionResolver::default();
        let mut sprites = vec![
            Sprite::new(EntityId(1), Rect::new(0.0, 0.0, 10.0, 3.0)),
            Sprite::new(EntityId(2), Rect::new(0.0, 1.0, 10.0, 3.0)),
        ];
        let mut events = Vec::new();
        resolver.resolve(&mut sprites, &frame(16.0), &mut events);

        let from_a: Vec<_> = events.iter().filter(|e| e.by == EntityId(1)).collect();
        assert_eq!(from_a.len(), 1);
        assert_eq!(from_a[0].side, Direction::Up);
        // Immovable sprites are never pushed.
        assert_eq!(sprites[0].rect, Rect::new(0.0, 0.0, 10.0, 3.0));
    }

    #[test]
    fn open_edge_lets_bodies_through() {
        let resolver = CollisionResolver::default();
        let mut sprites = vec![
            mover(1, Rect::new(0.0, 18.0, 10.0, 10.0), 0.0, -50.0),
            Sprite::new(EntityId(2), Rect::new(-20.0, 10.0, 50.0, 10.0)).with_edges(EdgeMask::ONE_WAY),
        ];
        let mut events = Vec::new();
        resolver.resolve(&mut sprites, &frame(16.0), &mut events);
        assert!(events.iter().all(|e| e.by != EntityId(1)));
        assert_eq!(sprites[0].rect.top(), 18.0);
        assert_eq!(sprites[0].velocity().y, -50.0);
    }

    #[test]
    fn open_own_edge_skips_correction_but_still_stops() {
        let resolver = CollisionResolver::default();
        let mut motion = MovingBody::new(1.0).unwrap();
        motion.set_motion(None, Some(40.0), 0);
        let mut sprites = vec![
            Sprite::new(EntityId(1), Rect::new(0.0, 2.0, 10.0, 10.0))
                .with_motion(motion)
                .with_edges(EdgeMask::SOLID.with_edge(Direction::Down, false)),
            Sprite::new(EntityId(2), Rect::new(-20.0, 10.0, 50.0, 10.0)),
        ];
        let mut events = Vec::new();
        resolver.resolve(&mut sprites, &frame(20.0), &mut events);
        assert_eq!(sprites[0].rect.top(), 2.0);
        assert_eq!(sprites[0].motion.as_ref().unwrap().channel(Direction::Down), 0.0);
    }

    #[test]
    fn deep_overlap_is_ignored() {
        let resolver = CollisionResolver::default();
        let mut sprites = vec![
            mover(1, Rect::new(0.0, 0.0, 10.0, 30.0), 0.0, 40.0),
            Sprite::new(EntityId(2), Rect::new(-20.0, 10.0, 50.0, 40.0)),
        ];
        let mut events = Vec::new();
        resolver.resolve(&mut sprites, &frame(16.0), &mut events);
        assert!(events.is_empty());
    }

    #[test]
    fn knock_transfers_speed_to_struck_body() {
        let resolver = CollisionResolver::default();
        let mut sprites = vec![
            mover(1, Rect::new(2.0, 0.0, 10.0, 10.0), 80.0, 0.0),
            mover(2, Rect::new(10.0, 0.0, 10.0, 10.0), 0.0, 0.0).knockable(),
        ];
        let mut events = Vec::new();
        resolver.resolve(&mut sprites, &frame(16.0), &mut events);
        assert_eq!(events[0].knock, Some(Vec2::new(80.0, 0.0)));
        assert_eq!(sprites[1].velocity().x, 80.0);
        assert!(sprites[1].motion.as_ref().unwrap().transitions().is_pending(Direction::Right));
    }

    fn forced(id: u32, rect: Rect, force: Vec2) -> Sprite {
        let mut motion = MovingBody::new(1.0).unwrap().with_force_mode(ForceMode::IntoForce);
        motion.apply_force(force, &Default::default());
        Sprite::new(EntityId(id), rect).with_motion(motion)
    }

    #[test]
    fn force_driven_body_lands() {
        let resolver = CollisionResolver::default();
        let mut sprites = vec![
            forced(1, Rect::new(0.0, 2.0, 10.0, 10.0), Vec2::new(0.0, 40.0)),
            Sprite::new(EntityId(2), Rect::new(-20.0, 10.0, 50.0, 10.0)),
        ];
        let mut events = Vec::new();
        resolver.resolve(&mut sprites, &frame(20.0), &mut events);

        assert_eq!(sprites[0].rect.bottom(), 10.0);
        assert_eq!(events.len(), 1);
        assert!(events[0].is_landing());
        let motion = sprites[0].motion.as_ref().unwrap();
        assert_eq!(motion.force(), Vec2::ZERO);
        assert!(!motion.is_moving(Direction::Down));
    }

    #[test]
    fn force_driven_body_knocks_with_its_real_speed() {
        let resolver = CollisionResolver::default();
        let mut sprites = vec![
            forced(1, Rect::new(2.0, 0.0, 10.0, 10.0), Vec2::new(80.0, 0.0)),
            mover(2, Rect::new(10.0, 0.0, 10.0, 10.0), 0.0, 0.0).knockable(),
        ];
        let mut events = Vec::new();
        resolver.resolve(&mut sprites, &frame(16.0), &mut events);
        assert_eq!(events[0].side, Direction::Left);
        assert_eq!(events[0].knock, Some(Vec2::new(80.0, 0.0)));
        assert_eq!(sprites[1].velocity().x, 80.0);
    }

    #[test]
    fn force_driven_body_settles_on_floor_under_gravity() {
        let gravity = ForceField::gravity(400.0);
        let mut sprites = vec![
            forced(1, Rect::new(0.0, 0.0, 10.0, 10.0), Vec2::ZERO),
            Sprite::new(EntityId(2), Rect::new(-20.0, 30.0, 50.0, 10.0)),
        ];
        let resolver = CollisionResolver::default();
        let f = frame(16.0);
        let mut landings = 0;
        for _ in 0..120 {
            let mut events = Vec::new();
            gravity.apply(&mut sprites, &f);
            integrate_all(&mut sprites, &f);
            resolver.resolve(&mut sprites, &f, &mut events);
            landings += events.iter().filter(|e| e.by == EntityId(1) && e.is_landing()).count();
        }
        assert!(landings > 0);
        assert!((sprites[0].rect.bottom() - 30.0).abs() < 1e-3, "bottom={}", sprites[0].rect.bottom());
    }

    #[test]
    fn ghosts_are_skipped() {
        let resolver = CollisionResolver::default();
        let mut sprites = vec![
            mover(1, Rect::new(0.0, 2.0, 10.0, 10.0), 0.0, 40.0),
            Sprite::new(EntityId(2), Rect::new(-20.0, 10.0, 50.0, 10.0)).ghost(),
        ];
        let mut events = Vec::new();
        resolver.resolve(&mut sprites, &frame(16.0), &mut events);
        assert!(events.is_empty());
    }

    #[test]
    fn custom_broad_phase_predicate() {
        let resolver = CollisionResolver::default();
        let mut sprites = vec![
            mover(1, Rect::new(0.0, 2.0, 10.0, 10.0), 0.0, 40.0),
            Sprite::new(EntityId(2), Rect::new(-20.0, 10.0, 50.0, 10.0)),
        ];
        let mut events = Vec::new();
        resolver.resolve_with(&mut sprites, &frame(16.0), |_, _| false, &mut events);
        assert!(events.is_empty());
    }
}
