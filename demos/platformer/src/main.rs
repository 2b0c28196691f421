mod game;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use kinema::Game;
use kinema_app::{init_logging, load_config, GameRunner};

use game::{Platformer, CRATE_TAG};

/// Headless platformer driven by the kinema engine.
#[derive(Parser)]
#[command(version, about = "Runs the kinema platformer demo without a window.")]
struct Cli {
    /// Stop after this many frames.
    #[arg(long, default_value_t = 600)]
    frames: u64,

    /// Engine configuration (JSON). Defaults to the game's own settings.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Target frametime in milliseconds; overrides the configuration.
    #[arg(long, value_name = "MS")]
    frametime: Option<f32>,
}

fn run(cli: Cli) -> kinema_app::Result<()> {
    let game = Platformer::new();
    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => game.config(),
    };
    if let Some(ms) = cli.frametime {
        config.target_frametime_ms = Some(ms);
        config.validate()?;
    }

    let mut runner = GameRunner::with_config(game, config)?;
    runner.init()?;
    let frames = runner.run(Some(cli.frames))?;

    let ctx = runner.ctx();
    if let Some(player) = ctx.world.get(runner.game().player()) {
        log::info!(
            "{} frames, player at ({:.1}, {:.1}), {} landings",
            frames,
            player.rect.x,
            player.rect.y,
            runner.game().landings()
        );
    }
    for sprite in ctx.world.find_all_by_tag(CRATE_TAG) {
        log::info!("crate {:?} at ({:.1}, {:.1})", sprite.id, sprite.rect.x, sprite.rect.y);
    }
    Ok(())
}

fn main() -> ExitCode {
    init_logging();
    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
