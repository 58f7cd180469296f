//! Synthetic request generation.

use std::net::Ipv4Addr;
use std::ops::RangeInclusive;

use balsim_core::{ConfigError, ConfigResult, Request, SimConfig};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Produces random requests from an explicitly owned PRNG.
///
/// Two generators built with the same seed and bounds yield the same
/// sequence of requests and arrival draws.
pub struct RequestGenerator {
    rng: StdRng,
    durations: RangeInclusive<u32>,
}

impl RequestGenerator {
    /// Wrap an existing PRNG. The minimum duration must be at least 1 and
    /// no greater than the maximum.
    pub fn with_rng(rng: StdRng, min_duration: u32, max_duration: u32) -> ConfigResult<Self> {
        if min_duration == 0 {
            return Err(ConfigError::ZeroRequestTime);
        }
        if min_duration > max_duration {
            return Err(ConfigError::InvertedRequestTime {
                min: min_duration,
                max: max_duration,
            });
        }
        Ok(Self {
            rng,
            durations: min_duration..=max_duration,
        })
    }

    pub fn seeded(seed: u64, min_duration: u32, max_duration: u32) -> ConfigResult<Self> {
        Self::with_rng(StdRng::seed_from_u64(seed), min_duration, max_duration)
    }

    pub fn from_entropy(min_duration: u32, max_duration: u32) -> ConfigResult<Self> {
        Self::with_rng(StdRng::from_os_rng(), min_duration, max_duration)
    }

    /// Seeded if the config carries a seed, entropy otherwise.
    pub fn from_config(config: &SimConfig) -> ConfigResult<Self> {
        match config.seed {
            Some(seed) => Self::seeded(seed, config.min_request_time, config.max_request_time),
            None => Self::from_entropy(config.min_request_time, config.max_request_time),
        }
    }

    /// Generate one request: two independent random addresses and a
    /// duration drawn uniformly from the closed duration range.
    pub fn next_request(&mut self) -> Request {
        let origin = self.random_ip();
        let destination = self.random_ip();
        let duration = self.rng.random_range(self.durations.clone());
        Request::new(origin, destination, duration)
    }

    /// Bernoulli draw with success probability `probability` (clamped to [0, 1]).
    pub fn arrival(&mut self, probability: f64) -> bool {
        self.rng.random_bool(probability.clamp(0.0, 1.0))
    }

    pub fn durations(&self) -> &RangeInclusive<u32> {
        &self.durations
    }

    // Every u32 maps to a distinct dotted quad, so each octet is uniform.
    fn random_ip(&mut self) -> String {
        Ipv4Addr::from(self.rng.random::<u32>()).to_string()
    }
}
