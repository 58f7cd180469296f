//! Simulation configuration.
//!
//! Every knob has the classic default except the worker count and cycle
//! budget, which the run driver must supply. A TOML file may set any
//! subset of fields:
//!
//! ```toml
//! workers = 4
//! cycles = 10000
//! max_request_time = 60
//! scale_up_threshold = 2.5
//! seed = 42
//! shrink_policy = "requeue"
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

pub const DEFAULT_MIN_REQUEST_TIME: u32 = 5;
pub const DEFAULT_MAX_REQUEST_TIME: u32 = 45;
pub const DEFAULT_INITIAL_QUEUE_PER_WORKER: u32 = 100;
pub const DEFAULT_SCALE_UP_THRESHOLD: f64 = 1.8;
pub const DEFAULT_SCALE_DOWN_THRESHOLD: f64 = 1.0;
pub const DEFAULT_ARRIVAL_PROBABILITY: f64 = 1.0 / 3.0;

/// What happens to the in-flight request of a worker removed on scale-down.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShrinkPolicy {
    /// Discard the request.
    #[default]
    Drop,
    /// Put the request back at the head of the pending queue.
    Requeue,
}

/// Parameters for one simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Initial worker pool size.
    pub workers: u32,
    /// Number of cycles to run.
    pub cycles: u32,
    pub min_request_time: u32,
    pub max_request_time: u32,
    /// Initial queue length is this multiple of `workers`.
    pub initial_queue_per_worker: u32,
    /// Add a worker when queue length per worker exceeds this.
    pub scale_up_threshold: f64,
    /// Remove a worker when queue length per worker drops below this.
    pub scale_down_threshold: f64,
    /// Chance that one new request arrives at the end of each cycle.
    pub arrival_probability: f64,
    /// Fixed PRNG seed. `None` draws from OS entropy.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    pub shrink_policy: ShrinkPolicy,
}

impl Default for SimConfig {
    /// Defaults for every knob; `workers` and `cycles` are left at 0 and
    /// fail validation until set.
    fn default() -> Self {
        Self {
            workers: 0,
            cycles: 0,
            min_request_time: DEFAULT_MIN_REQUEST_TIME,
            max_request_time: DEFAULT_MAX_REQUEST_TIME,
            initial_queue_per_worker: DEFAULT_INITIAL_QUEUE_PER_WORKER,
            scale_up_threshold: DEFAULT_SCALE_UP_THRESHOLD,
            scale_down_threshold: DEFAULT_SCALE_DOWN_THRESHOLD,
            arrival_probability: DEFAULT_ARRIVAL_PROBABILITY,
            seed: None,
            shrink_policy: ShrinkPolicy::Drop,
        }
    }
}

impl SimConfig {
    /// Config for `workers` workers over `cycles` cycles, defaults elsewhere.
    pub fn new(workers: u32, cycles: u32) -> Self {
        Self {
            workers,
            cycles,
            ..Self::default()
        }
    }

    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(s: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(s)?)
    }

    pub fn to_toml_string(&self) -> ConfigResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Number of requests queued before the first cycle.
    pub fn initial_queue_len(&self) -> usize {
        self.initial_queue_per_worker as usize * self.workers as usize
    }

    /// Check every field. Must pass before any simulation state is built.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.workers == 0 {
            return Err(ConfigError::NoWorkers);
        }
        if self.cycles == 0 {
            return Err(ConfigError::NoCycles);
        }
        if self.min_request_time == 0 {
            return Err(ConfigError::ZeroRequestTime);
        }
        if self.min_request_time > self.max_request_time {
            return Err(ConfigError::InvertedRequestTime {
                min: self.min_request_time,
                max: self.max_request_time,
            });
        }
        check_threshold("scale_up_threshold", self.scale_up_threshold)?;
        check_threshold("scale_down_threshold", self.scale_down_threshold)?;
        if self.scale_down_threshold > self.scale_up_threshold {
            return Err(ConfigError::InvertedThresholds {
                down: self.scale_down_threshold,
                up: self.scale_up_threshold,
            });
        }
        if !(0.0..=1.0).contains(&self.arrival_probability) {
            return Err(ConfigError::InvalidProbability(self.arrival_probability));
        }
        Ok(())
    }
}

fn check_threshold(name: &'static str, value: f64) -> ConfigResult<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidThreshold { name, value })
    }
}
