use glam::Vec2;
use kinema::{
    Direction, EdgeMask, EngineConfig, EngineContext, EntityId, FrameTime, Game, Rect, Sprite,
    WALL_TAG,
};

const PLAYER_TAG: &str = "player";
pub const CRATE_TAG: &str = "crate";

const RUN_SPEED: f32 = 60.0;
const JUMP_SPEED: f32 = 180.0;
const MAX_JUMPS: u32 = 2;
/// Frames between jump attempts.
const JUMP_EVERY: u64 = 45;

/// A self-playing platformer: the player runs back and forth, jumps on a
/// timer, and shoves crates around. Jumps reset on landing on level geometry.
pub struct Platformer {
    player: EntityId,
    heading: Direction,
    jumps: u32,
    frames: u64,
    landings: u32,
}

impl Platformer {
    pub fn new() -> Self {
        Self {
            player: EntityId(0),
            heading: Direction::Right,
            jumps: 0,
            frames: 0,
            landings: 0,
        }
    }

    pub fn landings(&self) -> u32 {
        self.landings
    }

    pub fn player(&self) -> EntityId {
        self.player
    }

    fn run_velocity(&self) -> f32 {
        match self.heading {
            Direction::Left => -RUN_SPEED,
            _ => RUN_SPEED,
        }
    }

    /// Turn around on hitting anything sideways or reaching the world edge.
    fn should_turn(&self, ctx: &EngineContext) -> bool {
        let blocked = ctx.world.contacts().iter().any(|c| {
            c.by == self.player && c.side == self.heading.opposite()
        });
        let at_edge = ctx.world.get(self.player).is_some_and(|p| match self.heading {
            Direction::Left => p.rect.left() <= 0.0,
            _ => p.rect.right() >= ctx.config.world_width,
        });
        blocked || at_edge
    }
}

impl Default for Platformer {
    fn default() -> Self {
        Self::new()
    }
}

impl Game for Platformer {
    fn config(&self) -> EngineConfig {
        let mut config = EngineConfig {
            title: "platformer".to_string(),
            gravity: Vec2::new(0.0, 400.0),
            ..EngineConfig::default()
        };
        config.bounds = Some(config.world_rect());
        config
    }

    fn init(&mut self, ctx: &mut EngineContext) -> kinema::Result<()> {
        let width = ctx.config.world_width;
        let height = ctx.config.world_height;

        let floor = ctx.next_id();
        ctx.spawn(
            Sprite::new(floor, Rect::new(0.0, height - 20.0, width, 20.0))
                .with_tag(WALL_TAG)
                .with_depth(-1),
        );
        let ledge = ctx.next_id();
        ctx.spawn(
            Sprite::new(ledge, Rect::new(width / 2.0 - 40.0, height - 70.0, 80.0, 8.0))
                .with_tag(WALL_TAG)
                .with_edges(EdgeMask::ONE_WAY)
                .with_depth(-1),
        );

        self.player = ctx.next_id();
        let mut motion = ctx.config.moving_body()?;
        motion.set_motion(Some(self.run_velocity()), None, 0);
        ctx.spawn(
            Sprite::new(self.player, Rect::new(16.0, height - 40.0, 12.0, 16.0))
                .with_tag(PLAYER_TAG)
                .with_motion(motion)
                .with_depth(1),
        );

        for x in [width * 0.35, width * 0.75] {
            let id = ctx.next_id();
            ctx.spawn(
                Sprite::new(id, Rect::new(x, height - 36.0, 16.0, 16.0))
                    .with_tag(CRATE_TAG)
                    .with_motion(ctx.config.moving_body()?)
                    .knockable(),
            );
        }
        Ok(())
    }

    fn update(&mut self, ctx: &mut EngineContext, _frame: &FrameTime) -> kinema::Result<()> {
        self.frames += 1;

        let landed = ctx
            .world
            .contacts_between(PLAYER_TAG, WALL_TAG)
            .iter()
            .any(|c| c.is_landing());
        if landed {
            if self.jumps > 0 {
                self.landings += 1;
            }
            self.jumps = 0;
            // Spend what is left of the jump impulse.
            if let Some(motion) = ctx.world.get_mut(self.player).and_then(|p| p.motion.as_mut()) {
                motion.stop_direction(Direction::Up, 0);
            }
        }

        if self.should_turn(ctx) {
            self.heading = self.heading.opposite();
            log::debug!("player turns {}", self.heading);
        }

        let run = self.run_velocity();
        let jump = self.frames % JUMP_EVERY == 0 && self.jumps < MAX_JUMPS;
        if jump {
            self.jumps += 1;
        }
        if let Some(motion) = ctx.world.get_mut(self.player).and_then(|p| p.motion.as_mut()) {
            motion.set_motion(Some(run), None, 0);
            if jump {
                motion.set_motion(None, Some(-JUMP_SPEED), 0);
            }
        }
        Ok(())
    }
}
