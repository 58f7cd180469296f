//! Engine error types.

use balsim_core::{ConfigError, WorkerId};
use thiserror::Error;

/// Errors that abort a simulation run.
///
/// Everything other than `Config` is a broken internal invariant; the
/// dispatcher never produces one through its public operations.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("worker {0} is already busy")]
    WorkerBusy(WorkerId),

    #[error("cannot remove the last worker in the pool")]
    LastWorker,

    #[error("run already finished after {cycles} cycles")]
    Finished { cycles: u32 },
}

pub type EngineResult<T> = Result<T, EngineError>;
