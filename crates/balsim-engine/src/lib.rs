//! balsim-engine — discrete-cycle load balancer simulation.
//!
//! A [`Dispatcher`] owns a FIFO queue of synthetic requests and an elastic
//! pool of single-slot [`Worker`]s. Every cycle it:
//!
//! ```text
//! 1. assigns queued requests to idle workers, in pool order
//! 2. advances every worker by one cycle
//! 3. scales the pool by at most one worker:
//!        load = queue_len / pool_size
//!        load > scale_up_threshold                  => add worker at tail
//!        load < scale_down_threshold, pool_size > 1 => remove tail worker
//! 4. increments the cycle counter
//! 5. with probability `arrival_probability`, queues one new request
//! ```
//!
//! Every step is reported as an [`Event`] to a [`TelemetrySink`]. Sink
//! failures are counted and logged but never interrupt the loop.

pub mod dispatcher;
pub mod error;
pub mod generator;
pub mod report;
pub mod scaler;
pub mod telemetry;
pub mod worker;

pub use dispatcher::{CycleOutcome, Dispatcher, ScaleAction};
pub use error::{EngineError, EngineResult};
pub use generator::RequestGenerator;
pub use report::RunReport;
pub use scaler::{ScaleDecision, ScalePolicy};
pub use telemetry::{
    Event, JsonLinesSink, MemorySink, NullSink, TelemetryError, TelemetrySink, TextSink,
};
pub use worker::{Worker, WorkerStatus};
