//! File-backed telemetry sinks.

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use anyhow::Context;
use balsim_engine::{JsonLinesSink, TelemetrySink, TextSink};
use clap::ValueEnum;

/// Log file record format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Classic human-readable log lines.
    #[default]
    Text,
    /// One JSON object per record.
    Json,
}

pub type BoxedSink = Box<dyn TelemetrySink + Send>;

/// Create `dir` if needed and open `dir/name` for writing, truncating any
/// previous log.
pub fn open_log(dir: &Path, name: &str, format: LogFormat) -> anyhow::Result<(PathBuf, BoxedSink)> {
    fs::create_dir_all(dir)
        .with_context(|| format!("failed to create log directory {}", dir.display()))?;
    let path = dir.join(name);
    let file = File::create(&path)
        .with_context(|| format!("failed to open log file {}", path.display()))?;
    let writer = BufWriter::new(file);

    let sink: BoxedSink = match format {
        LogFormat::Text => Box::new(TextSink::new(writer)),
        LogFormat::Json => Box::new(JsonLinesSink::new(writer)),
    };
    Ok((path, sink))
}
