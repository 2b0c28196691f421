use crate::api::config::EngineConfig;
use crate::api::types::EntityId;
use crate::components::entity::Sprite;
use crate::core::group::Group;
use crate::core::time::FrameTime;
use crate::error::Result;
#[cfg(feature = "physics")]
use crate::core::physics::{RigidContact, RigidKind, RigidMaterial, RigidSpace};

/// The core contract every game must fulfill.
pub trait Game {
    /// Return engine configuration. Called once before init.
    fn config(&self) -> EngineConfig {
        EngineConfig::default()
    }

    /// Setup initial state: spawn sprites, set up the world.
    fn init(&mut self, ctx: &mut EngineContext) -> Result<()>;

    /// Per-frame game logic: steer sprites, react to last frame's contacts,
    /// request quit. Runs before the world steps.
    fn update(&mut self, ctx: &mut EngineContext, frame: &FrameTime) -> Result<()>;
}

/// Mutable access to engine state, passed to Game::init and Game::update.
pub struct EngineContext {
    pub world: Group,
    pub config: EngineConfig,
    next_id: u32,
    quit: bool,
    #[cfg(feature = "physics")]
    pub rigid: RigidSpace,
    #[cfg(feature = "physics")]
    rigid_contacts: Vec<RigidContact>,
}

impl EngineContext {
    /// A context with the default configuration.
    pub fn new() -> Self {
        Self::with_world(Group::new(), EngineConfig::default())
    }

    /// Build the world (gravity, bounds, collisions) from configuration.
    pub fn from_config(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        let world = Group::from_config(&config)?;
        Ok(Self::with_world(world, config))
    }

    fn with_world(world: Group, config: EngineConfig) -> Self {
        #[cfg(feature = "physics")]
        let rigid = {
            let mut space = RigidSpace::new(config.gravity);
            space.set_damping(config.damping);
            space
        };
        Self {
            world,
            config,
            next_id: 1,
            quit: false,
            #[cfg(feature = "physics")]
            rigid,
            #[cfg(feature = "physics")]
            rigid_contacts: Vec::new(),
        }
    }

    /// Generate the next unique sprite ID.
    pub fn next_id(&mut self) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Add a sprite to the world. Returns its id.
    pub fn spawn(&mut self, sprite: Sprite) -> EntityId {
        let id = sprite.id;
        self.world.spawn(sprite);
        id
    }

    /// Remove a sprite, cleaning up its rigid body if present.
    pub fn despawn(&mut self, id: EntityId) -> Option<Sprite> {
        let sprite = self.world.despawn(id)?;
        #[cfg(feature = "physics")]
        {
            if let Some(handle) = &sprite.body {
                self.rigid.remove(handle);
            }
        }
        Some(sprite)
    }

    /// Ask the runner to stop after the current frame.
    pub fn quit(&mut self) {
        self.quit = true;
    }

    pub fn should_quit(&self) -> bool {
        self.quit
    }

    // -- Rigid-body convenience methods --

    /// Spawn a sprite driven by a rigid body shaped like its rectangle.
    #[cfg(feature = "physics")]
    pub fn spawn_rigid(&mut self, sprite: Sprite, kind: RigidKind, material: RigidMaterial) -> EntityId {
        let handle = self.rigid.add_sprite(&sprite, kind, material);
        self.spawn(sprite.with_body(handle))
    }

    /// Rigid contacts from the most recent step.
    #[cfg(feature = "physics")]
    pub fn rigid_contacts(&self) -> &[RigidContact] {
        &self.rigid_contacts
    }

    /// Advance the world by one frame. The runner calls this after
    /// `Game::update()`.
    pub fn step(&mut self, frame: &FrameTime) {
        self.world.step(frame);

        #[cfg(feature = "physics")]
        {
            self.rigid_contacts.clear();
            self.rigid.step(frame, &mut self.rigid_contacts);
            self.rigid.sync(self.world.iter_mut());
        }
    }
}

impl Default for EngineContext {
    fn default() -> Self {
        Self::new()
    }
}
