//! Configuration error types.

use thiserror::Error;

/// Result type alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors raised while loading or validating a [`SimConfig`](crate::SimConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("worker count must be at least 1")]
    NoWorkers,

    #[error("cycle budget must be at least 1")]
    NoCycles,

    #[error("minimum request time must be at least 1 cycle")]
    ZeroRequestTime,

    #[error("minimum request time ({min}) exceeds maximum request time ({max})")]
    InvertedRequestTime { min: u32, max: u32 },

    #[error("{name} must be a finite, non-negative number (got {value})")]
    InvalidThreshold { name: &'static str, value: f64 },

    #[error("scale-down threshold ({down}) exceeds scale-up threshold ({up})")]
    InvertedThresholds { down: f64, up: f64 },

    #[error("arrival probability must be within [0, 1] (got {0})")]
    InvalidProbability(f64),

    #[error("failed to read config file: {0}")]
    Read(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}
