//! End-of-run statistics.

use serde::Serialize;

/// Counters accumulated over a run and returned at shutdown.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub cycles_run: u32,
    /// True if the run stopped on a cancellation signal before the budget.
    pub cancelled: bool,
    pub assigned: u64,
    pub completed: u64,
    /// Requests that arrived during the run (initial queue excluded).
    pub arrivals: u64,
    pub scale_ups: u64,
    pub scale_downs: u64,
    pub dropped_on_shrink: u64,
    pub requeued_on_shrink: u64,
    pub peak_pool_size: usize,
    pub final_pool_size: usize,
    pub remaining_queue: usize,
    pub busy_at_shutdown: usize,
    pub idle_at_shutdown: usize,
    pub telemetry_failures: u64,
}
