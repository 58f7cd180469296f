//! `balsim run` — resolve parameters, open the log, and drive a simulation.
//!
//! Parameters come from, in increasing precedence: defaults, `--config`,
//! command-line flags. A cycle budget or worker count still missing after
//! that is asked for on stdin, and the log file name is then asked for as
//! well (empty answer means `log.txt`).

use std::io::{BufRead, Write};
use std::path::PathBuf;

use anyhow::Context;
use balsim_core::{ShrinkPolicy, SimConfig};
use balsim_engine::{Dispatcher, RunReport};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::prompt;
use crate::sink::{BoxedSink, LogFormat, open_log};

pub const DEFAULT_LOG_DIR: &str = "load_balancer_logs";
pub const DEFAULT_LOG_NAME: &str = "log.txt";

/// Options for a single run, as parsed from the command line.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub workers: Option<u32>,
    pub cycles: Option<u32>,
    pub config: Option<PathBuf>,
    pub seed: Option<u64>,
    pub output: Option<String>,
    pub log_dir: Option<PathBuf>,
    pub format: LogFormat,
    pub requeue: bool,
}

/// Fully resolved run: simulation config plus log destination.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedRun {
    pub config: SimConfig,
    pub log_dir: PathBuf,
    pub log_name: String,
}

/// Merge config file, flags, and interactive answers.
pub fn resolve<R: BufRead, W: Write>(
    opts: &RunOptions,
    input: &mut R,
    out: &mut W,
) -> anyhow::Result<ResolvedRun> {
    let mut config = match &opts.config {
        Some(path) => SimConfig::from_file(path)
            .with_context(|| format!("failed to load {}", path.display()))?,
        None => SimConfig::default(),
    };

    if let Some(workers) = opts.workers {
        config.workers = workers;
    }
    if let Some(cycles) = opts.cycles {
        config.cycles = cycles;
    }
    if opts.seed.is_some() {
        config.seed = opts.seed;
    }
    if opts.requeue {
        config.shrink_policy = ShrinkPolicy::Requeue;
    }

    let mut interactive = false;
    if opts.cycles.is_none() && config.cycles == 0 {
        config.cycles = prompt::ask_u32(
            input,
            out,
            "Enter the amount of cycles to run the load balancer: ",
        )?;
        interactive = true;
    }
    if opts.workers.is_none() && config.workers == 0 {
        config.workers =
            prompt::ask_u32(input, out, "Enter the number of servers to start with: ")?;
        interactive = true;
    }

    let log_name = match &opts.output {
        Some(name) if !name.trim().is_empty() => name.trim().to_string(),
        Some(_) => DEFAULT_LOG_NAME.to_string(),
        None if interactive => prompt::ask_or_default(
            input,
            out,
            "Enter the preferred output file name (hit enter to default to log.txt): ",
            DEFAULT_LOG_NAME,
        )?,
        None => DEFAULT_LOG_NAME.to_string(),
    };

    config.validate()?;

    Ok(ResolvedRun {
        config,
        log_dir: opts
            .log_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_DIR)),
        log_name,
    })
}

/// Run one simulation to completion or cancellation.
pub fn simulate(
    config: SimConfig,
    sink: BoxedSink,
    cancel: &CancellationToken,
) -> anyhow::Result<RunReport> {
    let mut dispatcher = Dispatcher::new(config, sink)?;
    let report = dispatcher.run_until(cancel)?;
    if report.telemetry_failures > 0 {
        warn!(
            failures = report.telemetry_failures,
            "some log records could not be written"
        );
    }
    Ok(report)
}

/// Resolve parameters, open the log file, and run on a blocking thread.
/// Ctrl-C stops the run at the next cycle boundary.
pub async fn run<R: BufRead, W: Write>(
    opts: RunOptions,
    input: &mut R,
    out: &mut W,
) -> anyhow::Result<RunReport> {
    let resolved = resolve(&opts, input, out)?;
    let (path, sink) = open_log(&resolved.log_dir, &resolved.log_name, opts.format)?;
    info!(
        path = %path.display(),
        workers = resolved.config.workers,
        cycles = resolved.config.cycles,
        "starting simulation"
    );

    let cancel = CancellationToken::new();
    let signal_token = cancel.clone();
    let signal_task = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, stopping at the next cycle boundary");
            signal_token.cancel();
        }
    });

    let config = resolved.config;
    let result = tokio::task::spawn_blocking(move || simulate(config, sink, &cancel)).await;
    signal_task.abort();
    let report = result.context("simulation task panicked")??;

    writeln!(out, "Load balancer complete. Check log file for details.")?;
    info!(
        path = %path.display(),
        cycles = report.cycles_run,
        cancelled = report.cancelled,
        "simulation finished"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn resolve_with(opts: &RunOptions, answers: &str) -> anyhow::Result<(ResolvedRun, String)> {
        let mut input = Cursor::new(answers.to_string());
        let mut out = Vec::new();
        let resolved = resolve(opts, &mut input, &mut out)?;
        Ok((resolved, String::from_utf8(out).unwrap()))
    }

    #[test]
    fn flags_need_no_prompt() {
        let opts = RunOptions {
            workers: Some(3),
            cycles: Some(50),
            ..RunOptions::default()
        };
        let (resolved, prompts) = resolve_with(&opts, "").unwrap();
        assert!(prompts.is_empty());
        assert_eq!(resolved.config.workers, 3);
        assert_eq!(resolved.config.cycles, 50);
        assert_eq!(resolved.log_name, "log.txt");
        assert_eq!(resolved.log_dir, PathBuf::from("load_balancer_logs"));
    }

    #[test]
    fn missing_values_are_prompted_in_order() {
        let (resolved, prompts) =
            resolve_with(&RunOptions::default(), "1000\n10\nrun1.txt\n").unwrap();
        assert_eq!(resolved.config.cycles, 1000);
        assert_eq!(resolved.config.workers, 10);
        assert_eq!(resolved.log_name, "run1.txt");
        let cycles_at = prompts.find("amount of cycles").unwrap();
        let servers_at = prompts.find("number of servers").unwrap();
        let file_at = prompts.find("output file name").unwrap();
        assert!(cycles_at < servers_at && servers_at < file_at);
    }

    #[test]
    fn empty_file_name_defaults() {
        let (resolved, _) = resolve_with(&RunOptions::default(), "10\n2\n\n").unwrap();
        assert_eq!(resolved.log_name, "log.txt");
    }

    #[test]
    fn zero_answer_is_asked_again_before_file_name() {
        let (resolved, prompts) =
            resolve_with(&RunOptions::default(), "10\n0\n4\nrun2.txt\n").unwrap();
        assert_eq!(resolved.config.workers, 4);
        assert_eq!(resolved.log_name, "run2.txt");
        let retry_at = prompts.find("at least 1").unwrap();
        let file_at = prompts.find("output file name").unwrap();
        assert!(retry_at < file_at);
        assert_eq!(prompts.matches("number of servers").count(), 2);
    }

    #[test]
    fn zero_workers_from_flag_is_rejected() {
        let opts = RunOptions {
            workers: Some(0),
            cycles: Some(10),
            ..RunOptions::default()
        };
        let err = resolve_with(&opts, "").unwrap_err();
        assert!(format!("{err:#}").contains("worker count"));
    }

    #[test]
    fn flags_override_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "workers = 2\ncycles = 40\nseed = 5").unwrap();
        let opts = RunOptions {
            config: Some(file.path().to_path_buf()),
            cycles: Some(99),
            seed: Some(6),
            requeue: true,
            ..RunOptions::default()
        };
        let (resolved, prompts) = resolve_with(&opts, "").unwrap();
        assert!(prompts.is_empty());
        assert_eq!(resolved.config.workers, 2);
        assert_eq!(resolved.config.cycles, 99);
        assert_eq!(resolved.config.seed, Some(6));
        assert_eq!(resolved.config.shrink_policy, ShrinkPolicy::Requeue);
    }
}
