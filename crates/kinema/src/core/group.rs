use crate::api::config::EngineConfig;
use crate::api::types::{ContactEvent, EntityId};
use crate::components::entity::Sprite;
use crate::core::time::FrameTime;
use crate::error::Result;
use crate::systems::bounds::BoundsConstraint;
use crate::systems::collision::CollisionResolver;
use crate::systems::forces::ForceField;
use crate::systems::motion::integrate_all;

/// Sprite storage using a flat Vec, plus the policy every member shares.
/// Designed for small-to-medium sprite counts (hundreds, not millions).
///
/// Insertion order is the collision pair order, so removal keeps the
/// remaining sprites in place.
pub struct Group {
    sprites: Vec<Sprite>,
    fields: Vec<ForceField>,
    bounds: Option<BoundsConstraint>,
    resolver: Option<CollisionResolver>,
    contacts: Vec<ContactEvent>,
}

impl Group {
    /// An empty group with no forces, no bounds, and collisions off.
    pub fn new() -> Self {
        Self {
            sprites: Vec::with_capacity(64),
            fields: Vec::new(),
            bounds: None,
            resolver: None,
            contacts: Vec::new(),
        }
    }

    /// A colliding group set up from engine configuration: gravity (if any),
    /// bounds (if any), and the configured resolver.
    pub fn from_config(config: &EngineConfig) -> Result<Self> {
        let mut group = Self::new().with_resolver(config.resolver()?);
        if let Some(field) = config.gravity_field() {
            group.add_field(field);
        }
        if let Some(bounds) = config.bounds_constraint() {
            group.set_bounds(Some(bounds));
        }
        Ok(group)
    }

    // -- Builder pattern --

    pub fn with_field(mut self, field: ForceField) -> Self {
        self.fields.push(field);
        self
    }

    pub fn with_bounds(mut self, bounds: BoundsConstraint) -> Self {
        self.bounds = Some(bounds);
        self
    }

    pub fn with_resolver(mut self, resolver: CollisionResolver) -> Self {
        self.resolver = Some(resolver);
        self
    }

    // -- Policy --

    pub fn add_field(&mut self, field: ForceField) {
        self.fields.push(field);
    }

    pub fn clear_fields(&mut self) {
        self.fields.clear();
    }

    pub fn set_bounds(&mut self, bounds: Option<BoundsConstraint>) {
        self.bounds = bounds;
    }

    pub fn set_resolver(&mut self, resolver: Option<CollisionResolver>) {
        self.resolver = resolver;
    }

    pub fn resolver(&self) -> Option<&CollisionResolver> {
        self.resolver.as_ref()
    }

    // -- Storage --

    /// Add a sprite at the end of the pair order.
    pub fn spawn(&mut self, sprite: Sprite) {
        self.sprites.push(sprite);
    }

    /// Remove a sprite by ID. Returns the removed sprite if found.
    pub fn despawn(&mut self, id: EntityId) -> Option<Sprite> {
        let idx = self.sprites.iter().position(|s| s.id == id)?;
        Some(self.sprites.remove(idx))
    }

    pub fn get(&self, id: EntityId) -> Option<&Sprite> {
        self.sprites.iter().find(|s| s.id == id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Sprite> {
        self.sprites.iter_mut().find(|s| s.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Sprite> {
        self.sprites.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Sprite> {
        self.sprites.iter_mut()
    }

    /// All sprites in pair order, for systems that work on slices.
    pub fn sprites_mut(&mut self) -> &mut [Sprite] {
        &mut self.sprites
    }

    pub fn find_by_tag(&self, tag: &str) -> Option<&Sprite> {
        self.sprites.iter().find(|s| s.tag == tag)
    }

    pub fn find_by_tag_mut(&mut self, tag: &str) -> Option<&mut Sprite> {
        self.sprites.iter_mut().find(|s| s.tag == tag)
    }

    pub fn find_all_by_tag(&self, tag: &str) -> Vec<&Sprite> {
        self.sprites.iter().filter(|s| s.tag == tag).collect()
    }

    pub fn len(&self) -> usize {
        self.sprites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sprites.is_empty()
    }

    /// Remove every sprite and forget last frame's contacts.
    pub fn clear(&mut self) {
        self.sprites.clear();
        self.contacts.clear();
    }

    /// Sprites sorted for drawing: lower depth first, ties in insertion order.
    pub fn draw_order(&self) -> Vec<&Sprite> {
        let mut sorted: Vec<&Sprite> = self.sprites.iter().collect();
        sorted.sort_by_key(|s| s.depth);
        sorted
    }

    // -- Frame --

    /// Contacts resolved during the last update.
    pub fn contacts(&self) -> &[ContactEvent] {
        &self.contacts
    }

    /// Contacts from the last update where a sprite tagged `by_tag` struck
    /// one tagged `to_tag`.
    pub fn contacts_between(&self, by_tag: &str, to_tag: &str) -> Vec<ContactEvent> {
        let tagged = |id: EntityId, tag: &str| self.get(id).is_some_and(|s| s.tag == tag);
        self.contacts
            .iter()
            .filter(|c| tagged(c.by, by_tag) && tagged(c.to, to_tag))
            .copied()
            .collect()
    }

    /// Advance one frame of `elapsed_ms` milliseconds.
    pub fn update(&mut self, elapsed_ms: f32) -> Result<()> {
        let frame = FrameTime::from_millis(elapsed_ms)?;
        self.step(&frame);
        Ok(())
    }

    /// Forces, then integration, then bounds, then collisions.
    pub fn step(&mut self, frame: &FrameTime) {
        self.contacts.clear();

        for field in &self.fields {
            field.apply(&mut self.sprites, frame);
        }

        integrate_all(&mut self.sprites, frame);

        if let Some(bounds) = &self.bounds {
            bounds.clamp_all(&mut self.sprites);
        }

        if let Some(resolver) = &self.resolver {
            resolver.resolve(&mut self.sprites, frame, &mut self.contacts);
        }

        log::trace!(
            "group step: {} sprites, {:.2} ms, {} contacts",
            self.sprites.len(),
            frame.millis(),
            self.contacts.len()
        );
    }
}

impl Default for Group {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::Direction;
    use crate::components::motion::MovingBody;
    use crate::components::rect::Rect;
    use crate::error::KinemaError;
    use glam::Vec2;

    fn mover(id: u32, rect: Rect) -> Sprite {
        Sprite::new(EntityId(id), rect).with_motion(MovingBody::new(1.0).unwrap())
    }

    fn platform_world() -> Group {
        let mut group = Group::new()
            .with_field(ForceField::gravity(200.0))
            .with_bounds(BoundsConstraint::new(Rect::new(0.0, 0.0, 200.0, 100.0)))
            .with_resolver(CollisionResolver::default());
        let mut hero = mover(1, Rect::new(20.0, 10.0, 10.0, 10.0)).with_tag("hero");
        if let Some(m) = hero.motion.as_mut() {
            m.set_motion(Some(40.0), None, 0);
        }
        group.spawn(hero);
        group.spawn(mover(2, Rect::new(60.0, 40.0, 10.0, 10.0)).knockable());
        group.spawn(Sprite::new(EntityId(3), Rect::new(0.0, 80.0, 200.0, 20.0)).with_tag("wall"));
        group
    }

    #[test]
    fn spawn_and_get() {
        let mut group = Group::new();
        group.spawn(Sprite::new(EntityId(1), Rect::new(10.0, 20.0, 4.0, 4.0)));
        assert_eq!(group.get(EntityId(1)).unwrap().rect.x, 10.0);
        assert!(group.get(EntityId(2)).is_none());
    }

    #[test]
    fn despawn_keeps_order() {
        let mut group = Group::new();
        for id in 1..=3 {
            group.spawn(Sprite::new(EntityId(id), Rect::default()));
        }
        assert!(group.despawn(EntityId(1)).is_some());
        let ids: Vec<_> = group.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![EntityId(2), EntityId(3)]);
        assert!(group.despawn(EntityId(9)).is_none());
    }

    #[test]
    fn find_by_tag() {
        let group = platform_world();
        assert_eq!(group.find_by_tag("hero").unwrap().id, EntityId(1));
        assert_eq!(group.find_all_by_tag("wall").len(), 1);
    }

    #[test]
    fn draw_order_by_depth() {
        let mut group = Group::new();
        group.spawn(Sprite::new(EntityId(1), Rect::default()).with_depth(5));
        group.spawn(Sprite::new(EntityId(2), Rect::default()).with_depth(-1));
        group.spawn(Sprite::new(EntityId(3), Rect::default()).with_depth(5));
        let ids: Vec<_> = group.draw_order().iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![EntityId(2), EntityId(1), EntityId(3)]);
    }

    #[test]
    fn negative_elapsed_rejected() {
        let mut group = platform_world();
        let before: Vec<Rect> = group.iter().map(|s| s.rect).collect();
        assert!(matches!(group.update(-1.0), Err(KinemaError::InvalidElapsed(_))));
        let after: Vec<Rect> = group.iter().map(|s| s.rect).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn landing_scenario() {
        let mut group = Group::new().with_resolver(CollisionResolver::default());
        let mut a = mover(1, Rect::new(0.0, 0.0, 10.0, 10.0));
        if let Some(m) = a.motion.as_mut() {
            m.set_motion(None, Some(50.0), 0);
        }
        group.spawn(a);
        group.spawn(mover(2, Rect::new(0.0, 10.0, 10.0, 10.0)).knockable());

        group.update(16.0).unwrap();

        let a = group.get(EntityId(1)).unwrap();
        let b = group.get(EntityId(2)).unwrap();
        assert_eq!(a.motion.as_ref().unwrap().channel(Direction::Down), 0.0);
        assert!(a.rect.bottom() <= b.rect.top());
        assert_eq!(b.velocity(), Vec2::new(0.0, 50.0));

        assert_eq!(group.contacts().len(), 1);
        let contact = group.contacts()[0];
        assert_eq!((contact.by, contact.to), (EntityId(1), EntityId(2)));
        assert!(contact.is_landing());
        assert_eq!(contact.knock, Some(Vec2::new(0.0, 50.0)));
    }

    #[test]
    fn contacts_filtered_by_tag() {
        let mut group = Group::new().with_resolver(CollisionResolver::default());
        let mut hero = mover(1, Rect::new(0.0, 0.0, 10.0, 10.0)).with_tag("hero");
        if let Some(m) = hero.motion.as_mut() {
            m.set_motion(None, Some(50.0), 0);
        }
        group.spawn(hero);
        group.spawn(Sprite::new(EntityId(2), Rect::new(-10.0, 10.0, 30.0, 10.0)).with_tag("wall"));
        group.update(16.0).unwrap();

        assert_eq!(group.contacts_between("hero", "wall").len(), 1);
        assert!(group.contacts_between("wall", "hero").is_empty());
    }

    #[test]
    fn identical_runs_match() {
        let run = || {
            let mut group = platform_world();
            for _ in 0..120 {
                group.update(16.0).unwrap();
            }
            group.iter().map(|s| s.rect).collect::<Vec<_>>()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn gravity_settles_on_floor() {
        let mut group = platform_world();
        for _ in 0..120 {
            group.update(16.0).unwrap();
        }
        let floor_top = group.find_by_tag("wall").unwrap().rect.top();
        for sprite in group.iter().filter(|s| s.motion.is_some()) {
            assert!(sprite.rect.bottom() <= floor_top + 0.001);
        }
    }

    #[test]
    fn from_config_wires_policy() {
        let config = EngineConfig::from_json(
            r#"{ "gravity": 10, "bounds": { "x": 0, "y": 0, "w": 50, "h": 50 } }"#,
        )
        .unwrap();
        let mut group = Group::from_config(&config).unwrap();
        group.spawn(mover(1, Rect::new(45.0, 45.0, 10.0, 10.0)));
        group.update(10.0).unwrap();
        let rect = group.get(EntityId(1)).unwrap().rect;
        assert_eq!(rect.right(), 50.0);
        assert_eq!(rect.bottom(), 50.0);
    }
}
