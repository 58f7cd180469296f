//! balsim run driver: parameter resolution, log sinks, and the `run` and
//! `check` commands behind the `balsim` binary.

pub mod commands;
pub mod prompt;
pub mod sink;

pub use commands::run::RunOptions;
pub use sink::LogFormat;
