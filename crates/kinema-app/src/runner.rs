use std::thread;
use std::time::{Duration, Instant};

use kinema::{EngineConfig, EngineContext, FrameClock, FrameTime, Game};

use crate::Result;

/// How often the fps title line is logged, in frames.
const TITLE_EVERY: u64 = 60;

/// Generic game runner that wires up the engine loop.
///
/// Each frame: the clock settles the frame's length (sleeping to the target
/// frametime), the game updates, then the world steps. Quit requests are
/// honored between frames only.
pub struct GameRunner<G: Game> {
    game: G,
    ctx: EngineContext,
    clock: FrameClock,
    started: Instant,
    initialized: bool,
    frames: u64,
}

impl<G: Game> GameRunner<G> {
    /// Build a runner with the game's own configuration.
    pub fn new(game: G) -> Result<Self> {
        let config = game.config();
        Self::with_config(game, config)
    }

    /// Build a runner with an explicit configuration (from a file or CLI).
    pub fn with_config(game: G, config: EngineConfig) -> Result<Self> {
        let clock = FrameClock::new(config.target_frametime_ms);
        let ctx = EngineContext::from_config(config)?;
        Ok(Self {
            game,
            ctx,
            clock,
            started: Instant::now(),
            initialized: false,
            frames: 0,
        })
    }

    /// Initialize the game. Call once after construction.
    pub fn init(&mut self) -> Result<()> {
        self.game.init(&mut self.ctx)?;
        self.initialized = true;
        log::info!(
            "{}: initialized with {} sprites",
            self.ctx.config.title,
            self.ctx.world.len()
        );
        Ok(())
    }

    /// Run one frame of `elapsed_ms`: update the game, then step the world.
    /// Returns whether the game wants to keep running.
    pub fn tick(&mut self, elapsed_ms: f32) -> Result<bool> {
        if !self.initialized {
            self.init()?;
        }
        let frame = FrameTime::from_millis(elapsed_ms)?;
        self.game.update(&mut self.ctx, &frame)?;
        self.ctx.step(&frame);
        self.frames += 1;
        Ok(!self.ctx.should_quit())
    }

    /// Run on the wall clock until the game quits or `max_frames` frames
    /// have run. Returns the number of frames run.
    pub fn run(&mut self, max_frames: Option<u64>) -> Result<u64> {
        let first = self.frames;
        log::info!(
            "{}: running (target frametime {:?} ms)",
            self.ctx.config.title,
            self.clock.target_ms()
        );
        loop {
            if max_frames.is_some_and(|max| self.frames - first >= max) {
                break;
            }
            let now_ms = self.started.elapsed().as_secs_f64() * 1000.0;
            let tick = self.clock.tick(now_ms);
            if tick.sleep_ms > 0.0 {
                thread::sleep(Duration::from_secs_f32(tick.sleep_ms / 1000.0));
            }
            let running = self.tick(tick.elapsed_ms)?;
            if self.frames % TITLE_EVERY == 0 {
                log::debug!("{}", self.title());
            }
            if !running {
                log::info!("{}: quit after {} frames", self.ctx.config.title, self.frames);
                break;
            }
        }
        Ok(self.frames - first)
    }

    /// Run `frames` frames of exactly `elapsed_ms` each, without sleeping.
    /// Stops early if the game quits.
    pub fn run_fixed(&mut self, frames: u64, elapsed_ms: f32) -> Result<u64> {
        let mut ran = 0;
        while ran < frames {
            ran += 1;
            if !self.tick(elapsed_ms)? {
                break;
            }
        }
        Ok(ran)
    }

    /// Window-title style status: `"<title> [<fps> fps]"`.
    pub fn title(&self) -> String {
        format!("{} [{:.0} fps]", self.ctx.config.title, self.clock.framerate())
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn game(&self) -> &G {
        &self.game
    }

    pub fn ctx(&self) -> &EngineContext {
        &self.ctx
    }

    pub fn ctx_mut(&mut self) -> &mut EngineContext {
        &mut self.ctx
    }
}
