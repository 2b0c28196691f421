pub mod runner;

use std::fs;
use std::path::{Path, PathBuf};

use kinema::{EngineConfig, KinemaError};
use thiserror::Error;

pub use runner::GameRunner;

/// Errors from the native runner: the engine's own, plus file access.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Engine(#[from] KinemaError),
}

pub type Result<T> = std::result::Result<T, AppError>;

/// Install the `env_logger` backend, `info` unless `RUST_LOG` says otherwise.
/// Safe to call more than once.
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();
}

/// Read and validate an engine configuration file.
pub fn load_config(path: impl AsRef<Path>) -> Result<EngineConfig> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|source| AppError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let config = EngineConfig::from_json(&text)?;
    log::info!("loaded config from {}", path.display());
    Ok(config)
}
