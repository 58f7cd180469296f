//! Elastic scaling policy.
//!
//! The only signal is the load ratio `queue_len / pool_size`, evaluated
//! once per cycle after time has advanced. At most one worker is added or
//! removed per evaluation, and adding takes precedence over removing.

use balsim_core::SimConfig;
use tracing::debug;

/// A scaling decision for one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScaleDecision {
    /// Append one idle worker to the pool.
    AddWorker,
    /// Remove the most recently appended worker.
    RemoveWorker,
    /// No change needed.
    NoChange,
}

/// Threshold pair applied to the load ratio.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScalePolicy {
    /// Add a worker when load strictly exceeds this.
    pub up_threshold: f64,
    /// Remove a worker when load is strictly below this.
    pub down_threshold: f64,
}

impl ScalePolicy {
    pub fn new(up_threshold: f64, down_threshold: f64) -> Self {
        Self {
            up_threshold,
            down_threshold,
        }
    }

    pub fn from_config(config: &SimConfig) -> Self {
        Self::new(config.scale_up_threshold, config.scale_down_threshold)
    }

    /// Queue length per worker. An empty pool counts as infinite load.
    pub fn load(queue_len: usize, pool_size: usize) -> f64 {
        if pool_size == 0 {
            return f64::INFINITY;
        }
        queue_len as f64 / pool_size as f64
    }

    /// Decide from raw counts.
    pub fn evaluate(&self, queue_len: usize, pool_size: usize) -> ScaleDecision {
        self.decide(Self::load(queue_len, pool_size), pool_size)
    }

    /// Decide from an already computed load ratio.
    pub fn decide(&self, load: f64, pool_size: usize) -> ScaleDecision {
        if load > self.up_threshold {
            debug!(load, pool_size, threshold = self.up_threshold, "scaling up");
            return ScaleDecision::AddWorker;
        }
        if load < self.down_threshold && pool_size > 1 {
            debug!(load, pool_size, threshold = self.down_threshold, "scaling down");
            return ScaleDecision::RemoveWorker;
        }
        ScaleDecision::NoChange
    }
}

impl Default for ScalePolicy {
    fn default() -> Self {
        Self::from_config(&SimConfig::default())
    }
}
