//! balsim-core — shared types and configuration for the load balancer
//! simulation.
//!
//! - [`Request`]: one unit of synthetic work (origin, destination, duration)
//! - [`SimConfig`]: run parameters and scaling knobs, loadable from TOML
//! - [`ConfigError`]: validation and loading failures

pub mod config;
pub mod error;
pub mod types;

pub use config::{ShrinkPolicy, SimConfig};
pub use error::{ConfigError, ConfigResult};
pub use types::*;
