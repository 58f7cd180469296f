//! Telemetry records and sinks.
//!
//! The dispatcher describes everything it does as an ordered stream of
//! [`Event`]s. `Display` renders the classic line-oriented log text;
//! `Serialize` renders a tagged object for structured sinks.

use std::fmt;
use std::io::Write;

use balsim_core::{Request, WorkerId};
use serde::Serialize;
use thiserror::Error;

use crate::worker::WorkerStatus;

const BANNER: &str = "########################";

/// Errors a sink may report. The dispatcher counts and logs them but
/// never stops on them.
#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("sink write failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("record encoding failed: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("sink unavailable: {0}")]
    Unavailable(String),
}

/// One telemetry record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Event {
    Started,
    WorkerOpened {
        worker: WorkerId,
    },
    Initialized {
        workers: usize,
        cycles: u32,
        queue_len: usize,
        min_request_time: u32,
        max_request_time: u32,
    },
    CycleStarted {
        cycle: u32,
        queue_len: usize,
    },
    Assigned {
        worker: WorkerId,
        request: Request,
    },
    /// Queue was non-empty at cycle start but every worker was busy.
    NoCapacity {
        queue_len: usize,
    },
    PoolStatus {
        idle: usize,
        total: usize,
    },
    Completed {
        worker: WorkerId,
    },
    ScaledUp {
        worker: WorkerId,
        load: f64,
    },
    ScaledDown {
        worker: WorkerId,
        load: f64,
        #[serde(skip_serializing_if = "Option::is_none")]
        in_flight: Option<Request>,
        requeued: bool,
    },
    WorkerClosed {
        worker: WorkerId,
    },
    RequestArrived {
        request: Request,
        queue_len: usize,
    },
    Cancelled {
        cycle: u32,
    },
    Closing,
    FinalWorkerStatus {
        worker: WorkerId,
        status: WorkerStatus,
    },
    Summary {
        queue_len: usize,
        busy: usize,
        idle: usize,
    },
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::Started => write!(f, "Load Balancer Started."),
            Event::WorkerOpened { worker } => write!(f, "Web server {worker} opened."),
            Event::Initialized {
                workers,
                cycles,
                queue_len,
                min_request_time,
                max_request_time,
            } => {
                writeln!(f, "Number of servers: {workers}")?;
                writeln!(f, "Total cycles to run: {cycles} cycles")?;
                writeln!(f, "Number of requests in queue: {queue_len}")?;
                writeln!(f, "Max request cycles: {max_request_time} cycles")?;
                writeln!(f, "Min request cycles: {min_request_time} cycles")?;
                write!(f, "{BANNER} Load balancer initialized {BANNER}")
            }
            Event::CycleStarted { cycle, queue_len } => {
                writeln!(f, "{BANNER} CYCLE {cycle} {BANNER}")?;
                write!(f, "Current queue size: {queue_len}")
            }
            Event::Assigned { worker, request } => write!(f, "Web server {worker}: {request}"),
            Event::NoCapacity { queue_len } => {
                writeln!(f, "No requests processed this cycle: all servers busy.")?;
                write!(f, "Queue Size: {queue_len}")
            }
            Event::PoolStatus { idle, total } => {
                writeln!(f, "Number of idle servers: {idle}")?;
                write!(f, "Number of total servers: {total}")
            }
            Event::Completed { worker } => write!(
                f,
                "Web server {worker} request complete. Opening for new request."
            ),
            Event::ScaledUp { worker, .. } => {
                write!(f, "Adding new server {worker} due to high load.")
            }
            Event::ScaledDown {
                worker,
                in_flight,
                requeued,
                ..
            } => {
                write!(f, "Removing server {worker} due to low load.")?;
                match (in_flight, requeued) {
                    (Some(request), true) => write!(f, " Requeued in-flight {request}."),
                    (Some(request), false) => write!(f, " Dropped in-flight {request}."),
                    (None, _) => Ok(()),
                }
            }
            Event::WorkerClosed { worker } => write!(f, "Web server {worker} closed."),
            Event::RequestArrived { request, queue_len } => {
                write!(f, "New {request} queued. Queue size: {queue_len}")
            }
            Event::Cancelled { cycle } => write!(f, "Run cancelled after {cycle} cycles."),
            Event::Closing => write!(f, "{BANNER} Load balancer closed {BANNER}"),
            Event::FinalWorkerStatus { worker, status } => match status {
                WorkerStatus::Idle => {
                    write!(f, "Server {worker} is idle and ready for new requests.")
                }
                WorkerStatus::Busy { request, elapsed } => {
                    writeln!(f, "Server {worker} still processing {request}")?;
                    write!(f, "Processed time: {elapsed} Cycles")
                }
            },
            Event::Summary {
                queue_len,
                busy,
                idle,
            } => {
                writeln!(f, "Number of requests remaining in queue: {queue_len}")?;
                writeln!(f, "Number of busy servers: {busy}")?;
                write!(f, "Number of idle servers: {idle}")
            }
        }
    }
}

/// Ordered, append-only destination for telemetry records.
pub trait TelemetrySink {
    fn record(&mut self, event: &Event) -> Result<(), TelemetryError>;

    /// Flush buffered records. Called once after shutdown.
    fn flush(&mut self) -> Result<(), TelemetryError> {
        Ok(())
    }
}

impl<S: TelemetrySink + ?Sized> TelemetrySink for &mut S {
    fn record(&mut self, event: &Event) -> Result<(), TelemetryError> {
        (**self).record(event)
    }

    fn flush(&mut self) -> Result<(), TelemetryError> {
        (**self).flush()
    }
}

impl<S: TelemetrySink + ?Sized> TelemetrySink for Box<S> {
    fn record(&mut self, event: &Event) -> Result<(), TelemetryError> {
        (**self).record(event)
    }

    fn flush(&mut self) -> Result<(), TelemetryError> {
        (**self).flush()
    }
}

/// Keeps every record in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Vec<Event>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Render all records as text, one record per line group.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        for event in &self.events {
            out.push_str(&event.to_string());
            out.push('\n');
        }
        out
    }
}

impl TelemetrySink for MemorySink {
    fn record(&mut self, event: &Event) -> Result<(), TelemetryError> {
        self.events.push(event.clone());
        Ok(())
    }
}

/// Writes each record's text form followed by a newline.
pub struct TextSink<W: Write> {
    writer: W,
}

impl<W: Write> TextSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> TelemetrySink for TextSink<W> {
    fn record(&mut self, event: &Event) -> Result<(), TelemetryError> {
        writeln!(self.writer, "{event}")?;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), TelemetryError> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Writes one JSON object per line.
pub struct JsonLinesSink<W: Write> {
    writer: W,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> TelemetrySink for JsonLinesSink<W> {
    fn record(&mut self, event: &Event) -> Result<(), TelemetryError> {
        serde_json::to_writer(&mut self.writer, event)?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), TelemetryError> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Discards every record.
#[derive(Debug, Default)]
pub struct NullSink;

impl TelemetrySink for NullSink {
    fn record(&mut self, _event: &Event) -> Result<(), TelemetryError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req() -> Request {
        Request::new("1.1.1.1", "2.2.2.2", 7)
    }

    #[test]
    fn cycle_header_text() {
        let event = Event::CycleStarted {
            cycle: 3,
            queue_len: 12,
        };
        assert_eq!(
            event.to_string(),
            "######################## CYCLE 3 ########################\nCurrent queue size: 12"
        );
    }

    #[test]
    fn assignment_text() {
        let event = Event::Assigned {
            worker: WorkerId(2),
            request: req(),
        };
        assert_eq!(
            event.to_string(),
            "Web server 2: request from 1.1.1.1 to 2.2.2.2 :: Duration 7 Cycles"
        );
    }

    #[test]
    fn scale_down_text_mentions_dropped_work() {
        let event = Event::ScaledDown {
            worker: WorkerId(3),
            load: 0.5,
            in_flight: Some(req()),
            requeued: false,
        };
        let text = event.to_string();
        assert!(text.starts_with("Removing server 3 due to low load."));
        assert!(text.contains("Dropped in-flight request from 1.1.1.1"));
    }

    #[test]
    fn final_status_text() {
        let busy = Event::FinalWorkerStatus {
            worker: WorkerId(1),
            status: WorkerStatus::Busy {
                request: req(),
                elapsed: 4,
            },
        };
        assert!(busy.to_string().ends_with("Processed time: 4 Cycles"));

        let idle = Event::FinalWorkerStatus {
            worker: WorkerId(2),
            status: WorkerStatus::Idle,
        };
        assert_eq!(
            idle.to_string(),
            "Server 2 is idle and ready for new requests."
        );
    }

    #[test]
    fn json_is_tagged() {
        let event = Event::Assigned {
            worker: WorkerId(5),
            request: req(),
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["event"], "assigned");
        assert_eq!(value["worker"], 5);
        assert_eq!(value["request"]["duration"], 7);
    }

    #[test]
    fn json_nests_worker_status() {
        let event = Event::FinalWorkerStatus {
            worker: WorkerId(1),
            status: WorkerStatus::Idle,
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["event"], "final_worker_status");
        assert_eq!(value["status"]["state"], "idle");
    }

    #[test]
    fn text_sink_writes_lines() {
        let mut sink = TextSink::new(Vec::new());
        sink.record(&Event::Started).unwrap();
        sink.record(&Event::Completed { worker: WorkerId(1) }).unwrap();
        let out = String::from_utf8(sink.into_inner()).unwrap();
        assert_eq!(
            out,
            "Load Balancer Started.\nWeb server 1 request complete. Opening for new request.\n"
        );
    }

    #[test]
    fn json_lines_sink_writes_one_object_per_line() {
        let mut sink = JsonLinesSink::new(Vec::new());
        sink.record(&Event::Started).unwrap();
        sink.record(&Event::Closing).unwrap();
        let out = String::from_utf8(sink.into_inner()).unwrap();
        let lines: Vec<_> = out.lines().collect();
        assert_eq!(lines, vec![r#"{"event":"started"}"#, r#"{"event":"closing"}"#]);
    }

    #[test]
    fn mut_ref_sink_forwards_to_owner() {
        fn feed<S: TelemetrySink>(mut sink: S) {
            sink.record(&Event::Closing).unwrap();
            sink.flush().unwrap();
        }

        let mut memory = MemorySink::new();
        feed(&mut memory);
        feed(&mut memory);
        assert_eq!(memory.events(), &[Event::Closing, Event::Closing]);
        let line = format!("{BANNER} Load balancer closed {BANNER}\n");
        assert_eq!(memory.to_text(), line.repeat(2));
    }
}
