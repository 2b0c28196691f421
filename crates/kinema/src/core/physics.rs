use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use glam::Vec2;
use rapier2d::prelude::*;
use serde_json::Value;

use crate::api::config::vector_from_json;
use crate::api::types::{Direction, EntityId};
use crate::components::entity::Sprite;
use crate::components::rect::Rect;
use crate::core::time::FrameTime;
use crate::error::Result;

/// Vertical speed under which a body counts as resting for jump resets.
/// A body at the apex of a jump also passes this test.
pub const JUMP_RESET_SPEED: f32 = 1.0;

const WALL_MARKER: u128 = 1 << 64;

// ---------------------------------------------------------------------------
// Conversion helpers (private), glam <-> nalgebra
// ---------------------------------------------------------------------------

fn vec2_to_na(v: Vec2) -> nalgebra::Vector2<f32> {
    nalgebra::Vector2::new(v.x, v.y)
}

fn na_to_vec2(v: &nalgebra::Vector2<f32>) -> Vec2 {
    Vec2::new(v.x, v.y)
}

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// How a sprite's rigid body takes part in the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RigidKind {
    #[default]
    Dynamic,
    /// Never moves; platforms and scenery.
    Fixed,
}

/// Physical material for a sprite's collider.
#[derive(Debug, Clone, Copy)]
pub struct RigidMaterial {
    pub restitution: f32,
    pub friction: f32,
    pub density: f32,
}

impl Default for RigidMaterial {
    fn default() -> Self {
        Self {
            restitution: 0.0,
            friction: 1.0,
            density: 1.0,
        }
    }
}

/// Handle pair stored on a sprite, referencing Rapier internals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RigidHandle {
    pub body: RigidBodyHandle,
    pub collider: ColliderHandle,
}

/// One side of a contact reported by the rigid space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactTarget {
    Sprite(EntityId),
    /// A bounding segment, by the side of the region it guards.
    Wall(Direction),
}

/// A contact between two colliders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RigidContact {
    pub a: ContactTarget,
    pub b: ContactTarget,
    /// `true` when the contact just started, `false` when it ended.
    pub started: bool,
}

impl RigidContact {
    /// The other party, if `id` is one of the two.
    pub fn other(&self, id: EntityId) -> Option<ContactTarget> {
        match (self.a, self.b) {
            (ContactTarget::Sprite(a), other) if a == id => Some(other),
            (other, ContactTarget::Sprite(b)) if b == id => Some(other),
            _ => None,
        }
    }

    /// Whether `id` touched a wall segment.
    pub fn hits_wall(&self, id: EntityId) -> bool {
        matches!(self.other(id), Some(ContactTarget::Wall(_)))
    }
}

/// Motor state kept per body: directional surface speeds and the jump count.
#[derive(Debug, Clone, Copy, Default)]
struct Motor {
    going: [f32; 4],
    jumps: u32,
}

impl Motor {
    /// Surface velocity that moves the body toward its going channels.
    fn surface(&self) -> Vec2 {
        let g = |d: Direction| self.going[d.index()];
        Vec2::new(
            g(Direction::Left) - g(Direction::Right),
            g(Direction::Up) - g(Direction::Down),
        )
    }
}

// ---------------------------------------------------------------------------
// Hooks and events (no crossbeam)
// ---------------------------------------------------------------------------

/// Sets the tangent velocity of every solver contact that touches a collider
/// with a surface speed, so bodies roll themselves along what they stand on.
#[derive(Default)]
struct SurfaceHooks {
    surfaces: HashMap<ColliderHandle, Vec2>,
}

impl PhysicsHooks for SurfaceHooks {
    fn modify_solver_contacts(&self, context: &mut ContactModificationContext) {
        let surface = |handle: ColliderHandle| self.surfaces.get(&handle).copied().unwrap_or(Vec2::ZERO);
        let relative = surface(context.collider1) - surface(context.collider2);
        if relative == Vec2::ZERO {
            return;
        }
        for contact in context.solver_contacts.iter_mut() {
            contact.tangent_velocity = vec2_to_na(relative);
        }
    }
}

struct DirectEventCollector {
    collisions: Mutex<Vec<CollisionEvent>>,
}

impl DirectEventCollector {
    fn new() -> Self {
        Self {
            collisions: Mutex::new(Vec::new()),
        }
    }

    fn drain_collisions(&self) -> Vec<CollisionEvent> {
        let mut guard = self.collisions.lock().unwrap_or_else(PoisonError::into_inner);
        std::mem::take(&mut *guard)
    }
}

impl EventHandler for DirectEventCollector {
    fn handle_collision_event(
        &self,
        _bodies: &RigidBodySet,
        _colliders: &ColliderSet,
        event: CollisionEvent,
        _contact_pair: Option<&ContactPair>,
    ) {
        self.collisions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }

    fn handle_contact_force_event(
        &self,
        _dt: f32,
        _bodies: &RigidBodySet,
        _colliders: &ColliderSet,
        _contact_pair: &ContactPair,
        _total_force_magnitude: f32,
    ) {
    }
}

// ---------------------------------------------------------------------------
// RigidSpace
// ---------------------------------------------------------------------------

/// Rigid-body simulation for sprites that want real physics instead of
/// directional kinematics. Body centers drive sprite rectangles.
pub struct RigidSpace {
    gravity: nalgebra::Vector2<f32>,
    damping: f32,
    integration_parameters: IntegrationParameters,
    physics_pipeline: PhysicsPipeline,
    island_manager: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
    query_pipeline: QueryPipeline,
    hooks: SurfaceHooks,
    event_collector: DirectEventCollector,
    motors: HashMap<RigidBodyHandle, Motor>,
    walls: usize,
}

impl RigidSpace {
    /// For Y-down coordinates, positive Y gravity pulls toward the bottom.
    pub fn new(gravity: Vec2) -> Self {
        Self {
            gravity: vec2_to_na(gravity),
            damping: 0.0,
            integration_parameters: IntegrationParameters::default(),
            physics_pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
            hooks: SurfaceHooks::default(),
            event_collector: DirectEventCollector::new(),
            motors: HashMap::new(),
            walls: 0,
        }
    }

    // -- Space-wide settings --

    pub fn gravity(&self) -> Vec2 {
        na_to_vec2(&self.gravity)
    }

    pub fn set_gravity(&mut self, gravity: Vec2) {
        self.gravity = vec2_to_na(gravity);
    }

    /// Gravity from JSON: a number (vertical), `[x, y]`, or `{"x", "y"}`.
    pub fn set_gravity_json(&mut self, value: &Value) -> Result<()> {
        self.set_gravity(vector_from_json(value)?);
        Ok(())
    }

    /// Linear damping for every body, present and future.
    pub fn set_damping(&mut self, damping: f32) {
        self.damping = damping;
        for (_, rb) in self.bodies.iter_mut() {
            rb.set_linear_damping(damping);
        }
    }

    pub fn damping(&self) -> f32 {
        self.damping
    }

    // -- Bodies --

    /// Create a body and box collider matching the sprite's rectangle.
    /// The sprite id is stored in the collider's `user_data`.
    pub fn add_sprite(&mut self, sprite: &Sprite, kind: RigidKind, material: RigidMaterial) -> RigidHandle {
        let builder = match kind {
            RigidKind::Dynamic => RigidBodyBuilder::dynamic(),
            RigidKind::Fixed => RigidBodyBuilder::fixed(),
        };
        let rb = builder
            .translation(vec2_to_na(sprite.rect.center()))
            .locked_axes(LockedAxes::ROTATION_LOCKED)
            .linear_damping(self.damping)
            .build();
        let body = self.bodies.insert(rb);

        let half = sprite.rect.size() / 2.0;
        let collider = ColliderBuilder::cuboid(half.x, half.y)
            .restitution(material.restitution)
            .friction(material.friction)
            .density(material.density)
            .active_events(ActiveEvents::COLLISION_EVENTS)
            .active_hooks(ActiveHooks::MODIFY_SOLVER_CONTACTS)
            .user_data(sprite.id.0 as u128)
            .build();
        let collider = self
            .colliders
            .insert_with_parent(collider, body, &mut self.bodies);

        self.motors.insert(body, Motor::default());
        RigidHandle { body, collider }
    }

    /// Remove a body and its collider from the simulation.
    pub fn remove(&mut self, handle: &RigidHandle) {
        self.hooks.surfaces.remove(&handle.collider);
        self.motors.remove(&handle.body);
        self.bodies.remove(
            handle.body,
            &mut self.island_manager,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            true,
        );
    }

    /// Add fixed segments along the given sides of `region`, tagged as walls.
    pub fn bound(&mut self, region: &Rect, sides: &[Direction]) {
        for &side in sides {
            let (from, to) = match side {
                Direction::Up => ((region.left(), region.top()), (region.right(), region.top())),
                Direction::Down => (
                    (region.left(), region.bottom()),
                    (region.right(), region.bottom()),
                ),
                Direction::Left => ((region.left(), region.top()), (region.left(), region.bottom())),
                Direction::Right => (
                    (region.right(), region.top()),
                    (region.right(), region.bottom()),
                ),
            };
            let segment = ColliderBuilder::segment(
                nalgebra::Point2::new(from.0, from.1),
                nalgebra::Point2::new(to.0, to.1),
            )
                .friction(1.0)
                .active_events(ActiveEvents::COLLISION_EVENTS)
                .user_data(WALL_MARKER | side.index() as u128)
                .build();
            self.colliders.insert(segment);
            self.walls += 1;
            log::debug!("rigid space: {} bound along {:?}", side, region);
        }
    }

    /// Number of rigid bodies in the simulation (walls excluded).
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// Number of wall segments added by [`RigidSpace::bound`].
    pub fn wall_count(&self) -> usize {
        self.walls
    }

    // -- Per-body control --

    /// Set the speed a body drives itself with along whatever it touches.
    /// `None` leaves that axis as it was.
    ///
    /// The stored surface velocity is `(left - right, up - down)`: the
    /// contact surface runs backward so the body rolls forward. After
    /// `go(Some(30.0), None)` the body moves toward +x while
    /// [`RigidSpace::surface_velocity`] reports `(-30, 0)`.
    pub fn go(&mut self, handle: &RigidHandle, vx: Option<f32>, vy: Option<f32>) {
        let Some(motor) = self.motors.get_mut(&handle.body) else {
            return;
        };
        for (value, negative, positive) in [
            (vx, Direction::Left, Direction::Right),
            (vy, Direction::Up, Direction::Down),
        ] {
            if let Some(v) = value {
                if v <= 0.0 {
                    motor.going[negative.index()] = -v;
                }
                if v >= 0.0 {
                    motor.going[positive.index()] = v;
                }
            }
        }
        let surface = motor.surface();
        self.hooks.surfaces.insert(handle.collider, surface);
    }

    /// Drop the surface speed toward `direction`.
    pub fn stop(&mut self, handle: &RigidHandle, direction: Direction) {
        let Some(motor) = self.motors.get_mut(&handle.body) else {
            return;
        };
        motor.going[direction.index()] = 0.0;
        let surface = motor.surface();
        if surface == Vec2::ZERO {
            self.hooks.surfaces.remove(&handle.collider);
        } else {
            self.hooks.surfaces.insert(handle.collider, surface);
        }
    }

    /// Surface velocity currently set by [`RigidSpace::go`]. Its sign is
    /// opposite to the direction the body travels.
    pub fn surface_velocity(&self, handle: &RigidHandle) -> Vec2 {
        self.hooks
            .surfaces
            .get(&handle.collider)
            .copied()
            .unwrap_or(Vec2::ZERO)
    }

    /// Force for the next step only. Forces are cleared after every step, so
    /// a continuous push must be reapplied each frame.
    pub fn apply_force(&mut self, handle: &RigidHandle, force: Vec2) {
        if let Some(rb) = self.bodies.get_mut(handle.body) {
            rb.add_force(vec2_to_na(force), true);
        }
    }

    pub fn apply_impulse(&mut self, handle: &RigidHandle, impulse: Vec2) {
        if let Some(rb) = self.bodies.get_mut(handle.body) {
            rb.apply_impulse(vec2_to_na(impulse), true);
        }
    }

    /// Upward impulse of `strength`, allowed while fewer than `max_jumps`
    /// jumps have been made since the body last came to rest vertically.
    /// Returns whether the jump happened.
    pub fn jump(&mut self, handle: &RigidHandle, strength: f32, max_jumps: u32) -> bool {
        let Some(motor) = self.motors.get_mut(&handle.body) else {
            return false;
        };
        if motor.jumps >= max_jumps {
            return false;
        }
        motor.jumps += 1;
        self.apply_impulse(handle, Vec2::new(0.0, -strength));
        true
    }

    pub fn jumps(&self, handle: &RigidHandle) -> u32 {
        self.motors.get(&handle.body).map_or(0, |m| m.jumps)
    }

    pub fn set_velocity(&mut self, handle: &RigidHandle, velocity: Vec2) {
        if let Some(rb) = self.bodies.get_mut(handle.body) {
            rb.set_linvel(vec2_to_na(velocity), true);
        }
    }

    pub fn velocity(&self, handle: &RigidHandle) -> Vec2 {
        self.bodies
            .get(handle.body)
            .map(|rb| na_to_vec2(rb.linvel()))
            .unwrap_or(Vec2::ZERO)
    }

    /// Whether the body's velocity has a component toward `direction`.
    pub fn moving(&self, handle: &RigidHandle, direction: Direction) -> bool {
        self.velocity(handle).dot(direction.unit()) > 0.0
    }

    pub fn center(&self, handle: &RigidHandle) -> Vec2 {
        self.bodies
            .get(handle.body)
            .map(|rb| na_to_vec2(rb.translation()))
            .unwrap_or(Vec2::ZERO)
    }

    // -- Stepping --

    /// Advance by the frame's length and collect contacts. An empty frame
    /// does nothing.
    pub fn step(&mut self, frame: &FrameTime, contacts: &mut Vec<RigidContact>) {
        for (handle, motor) in self.motors.iter_mut() {
            if let Some(rb) = self.bodies.get(*handle) {
                if rb.linvel().y.abs() < JUMP_RESET_SPEED {
                    motor.jumps = 0;
                }
            }
        }

        if frame.seconds() <= 0.0 {
            return;
        }
        self.integration_parameters.dt = frame.seconds();

        self.physics_pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            Some(&mut self.query_pipeline),
            &self.hooks,
            &self.event_collector,
        );
        for (_, rb) in self.bodies.iter_mut() {
            rb.reset_forces(false);
        }

        for event in self.event_collector.drain_collisions() {
            let (h1, h2, started) = match event {
                CollisionEvent::Started(h1, h2, _) => (h1, h2, true),
                CollisionEvent::Stopped(h1, h2, _) => (h1, h2, false),
            };
            if let (Some(a), Some(b)) = (self.target_of(h1), self.target_of(h2)) {
                contacts.push(RigidContact { a, b, started });
            }
        }
    }

    /// Move each sprite's rectangle onto its body's center.
    pub fn sync<'a>(&self, sprites: impl Iterator<Item = &'a mut Sprite>) {
        for sprite in sprites {
            if let Some(handle) = &sprite.body {
                if let Some(rb) = self.bodies.get(handle.body) {
                    sprite.rect.set_center(na_to_vec2(rb.translation()));
                }
            }
        }
    }

    // -- private helpers --

    fn target_of(&self, handle: ColliderHandle) -> Option<ContactTarget> {
        let data = self.colliders.get(handle)?.user_data;
        if data & WALL_MARKER != 0 {
            let index = (data & 0b11) as usize;
            Some(ContactTarget::Wall(Direction::ALL[index]))
        } else {
            Some(ContactTarget::Sprite(EntityId(data as u32)))
        }
    }
}

impl Default for RigidSpace {
    fn default() -> Self {
        Self::new(Vec2::ZERO)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
