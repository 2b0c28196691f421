use crate::api::types::Direction;
use crate::components::body::Body;
use crate::components::rect::Rect;

/// Keeps bodies inside a rectangular region.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundsConstraint {
    pub region: Rect,
}

impl BoundsConstraint {
    pub fn new(region: Rect) -> Self {
        Self { region }
    }

    /// Snap any edge that crossed the region back onto it and cancel motion
    /// toward that side. Edges are handled independently, so a body pushed
    /// into a corner is clamped twice. Returns the sides that were hit.
    pub fn clamp<B: Body>(&self, body: &mut B) -> Vec<Direction> {
        let region = self.region;
        let mut hit = Vec::new();
        {
            let rect = body.rect_mut();
            if rect.top() < region.top() {
                rect.set_top(region.top());
                hit.push(Direction::Up);
            }
            if rect.bottom() > region.bottom() {
                rect.set_bottom(region.bottom());
                hit.push(Direction::Down);
            }
            if rect.left() < region.left() {
                rect.set_left(region.left());
                hit.push(Direction::Left);
            }
            if rect.right() > region.right() {
                rect.set_right(region.right());
                hit.push(Direction::Right);
            }
        }
        if let Some(motion) = body.motion_mut() {
            for &side in &hit {
                motion.stop_direction(side, 0);
            }
        }
        hit
    }

    pub fn clamp_all<B: Body>(&self, bodies: &mut [B]) {
        for body in bodies.iter_mut().filter(|b| b.is_active()) {
            self.clamp(body);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::EntityId;
    use crate::components::entity::Sprite;
    use crate::components::motion::MovingBody;

    fn moving(rect: Rect, vx: f32, vy: f32) -> Sprite {
        let mut motion = MovingBody::new(1.0).unwrap();
        motion.set_motion(Some(vx), Some(vy), 0);
        Sprite::new(EntityId(1), rect).with_motion(motion)
    }

    #[test]
    fn body_inside_is_untouched() {
        let bounds = BoundsConstraint::new(Rect::new(0.0, 0.0, 100.0, 100.0));
        let mut s = moving(Rect::new(10.0, 10.0, 20.0, 20.0), -5.0, 5.0);
        let before = s.clone();
        assert!(bounds.clamp(&mut s).is_empty());
        assert_eq!(s.rect, before.rect);
        assert_eq!(s.velocity(), before.velocity());
    }

    #[test]
    fn straddling_body_snaps_to_edge() {
        let bounds = BoundsConstraint::new(Rect::new(0.0, 0.0, 100.0, 100.0));
        let mut s = moving(Rect::new(90.0, 40.0, 20.0, 20.0), 7.0, -2.0);
        assert_eq!(bounds.clamp(&mut s), vec![Direction::Right]);
        assert_eq!(s.rect.right(), 100.0);
        assert_eq!(s.velocity().x, 0.0);
        assert_eq!(s.velocity().y, -2.0);
    }

    #[test]
    fn corner_clamps_two_edges() {
        let bounds = BoundsConstraint::new(Rect::new(0.0, 0.0, 100.0, 100.0));
        let mut s = moving(Rect::new(-5.0, -5.0, 20.0, 20.0), -3.0, -3.0);
        let hit = bounds.clamp(&mut s);
        assert_eq!(hit, vec![Direction::Up, Direction::Left]);
        assert_eq!((s.rect.left(), s.rect.top()), (0.0, 0.0));
        assert_eq!(s.velocity(), glam::Vec2::ZERO);
    }

    #[test]
    fn static_body_is_still_repositioned() {
        let bounds = BoundsConstraint::new(Rect::new(0.0, 0.0, 100.0, 100.0));
        let mut s = Sprite::new(EntityId(1), Rect::new(0.0, 95.0, 10.0, 10.0));
        bounds.clamp(&mut s);
        assert_eq!(s.rect.bottom(), 100.0);
    }
}
