use thiserror::Error;

/// Errors raised by the engine. Per-frame arithmetic never fails; everything
/// here is caught at construction, parse, or frame-entry time.
#[derive(Debug, Error)]
pub enum KinemaError {
    /// An unknown direction, side, or similar token.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A value of the wrong kind where a vector or number was expected.
    #[error("unsupported value for {expected}: got {received}")]
    UnsupportedValue {
        expected: &'static str,
        received: &'static str,
    },

    /// Elapsed frame time was negative or not a finite number.
    #[error("elapsed time must be a finite, non-negative number of milliseconds (got {0})")]
    InvalidElapsed(f32),

    /// A configuration value that would break integration (zero speed, etc.).
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to parse configuration: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, KinemaError>;
