//! Dispatcher — owns the pending queue and worker pool and runs the cycle
//! loop.
//!
//! All simulation state lives in one [`Dispatcher`] value. [`Dispatcher::step`]
//! runs exactly one cycle, so a single cycle can be driven and inspected
//! in isolation; [`Dispatcher::run`] steps until the cycle budget is spent
//! and then shuts down.

use std::collections::VecDeque;

use balsim_core::{Request, ShrinkPolicy, SimConfig, WorkerId};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::{EngineError, EngineResult};
use crate::generator::RequestGenerator;
use crate::report::RunReport;
use crate::scaler::{ScaleDecision, ScalePolicy};
use crate::telemetry::{Event, TelemetrySink};
use crate::worker::{Worker, WorkerStatus};

/// Pool change applied during one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScaleAction {
    Added(WorkerId),
    Removed(WorkerId),
    Unchanged,
}

/// What happened during one call to [`Dispatcher::step`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleOutcome {
    /// 1-based number of the cycle just run.
    pub cycle: u32,
    /// Queue length observed at the start of the cycle.
    pub queue_at_start: usize,
    pub assigned: usize,
    pub completed: usize,
    pub scale: ScaleAction,
    pub arrived: bool,
}

/// The load balancer simulation engine.
pub struct Dispatcher<S> {
    config: SimConfig,
    policy: ScalePolicy,
    generator: RequestGenerator,
    queue: VecDeque<Request>,
    workers: Vec<Worker>,
    cycle: u32,
    closed: bool,
    sink: S,
    report: RunReport,
}

impl<S: TelemetrySink> Dispatcher<S> {
    /// Validate `config`, pre-fill the queue, and open the initial workers.
    pub fn new(config: SimConfig, sink: S) -> EngineResult<Self> {
        config.validate()?;
        let generator = RequestGenerator::from_config(&config)?;
        Self::with_generator(config, generator, sink)
    }

    /// Like [`new`](Self::new) but with an explicitly supplied generator.
    /// The generator's duration bounds, already checked when it was built,
    /// take precedence over the config's.
    pub fn with_generator(
        config: SimConfig,
        generator: RequestGenerator,
        sink: S,
    ) -> EngineResult<Self> {
        config.validate()?;

        let mut dispatcher = Self {
            policy: ScalePolicy::from_config(&config),
            generator,
            queue: VecDeque::with_capacity(config.initial_queue_len()),
            workers: Vec::with_capacity(config.workers as usize),
            cycle: 0,
            closed: false,
            sink,
            report: RunReport::default(),
            config,
        };
        dispatcher.emit(Event::Started);

        for _ in 0..dispatcher.config.initial_queue_len() {
            let request = dispatcher.generator.next_request();
            dispatcher.queue.push_back(request);
        }

        for n in 1..=dispatcher.config.workers {
            dispatcher.open_worker(WorkerId(n));
        }
        dispatcher.report.peak_pool_size = dispatcher.workers.len();

        let durations = dispatcher.generator.durations().clone();
        dispatcher.emit(Event::Initialized {
            workers: dispatcher.workers.len(),
            cycles: dispatcher.config.cycles,
            queue_len: dispatcher.queue.len(),
            min_request_time: *durations.start(),
            max_request_time: *durations.end(),
        });

        info!(
            workers = dispatcher.workers.len(),
            cycles = dispatcher.config.cycles,
            queue = dispatcher.queue.len(),
            "load balancer initialized"
        );
        Ok(dispatcher)
    }

    /// Cycles completed so far.
    pub fn cycle(&self) -> u32 {
        self.cycle
    }

    pub fn budget(&self) -> u32 {
        self.config.cycles
    }

    pub fn is_finished(&self) -> bool {
        self.cycle >= self.config.cycles
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// Pending requests, head first.
    pub fn pending(&self) -> impl Iterator<Item = &Request> {
        self.queue.iter()
    }

    pub fn pool_size(&self) -> usize {
        self.workers.len()
    }

    pub fn workers(&self) -> &[Worker] {
        &self.workers
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    pub fn telemetry_failures(&self) -> u64 {
        self.report.telemetry_failures
    }

    /// Append a request to the tail of the pending queue.
    pub fn push_request(&mut self, request: Request) {
        self.queue.push_back(request);
    }

    /// Run one cycle: assign, advance, scale, count, then maybe admit a
    /// new request.
    pub fn step(&mut self) -> EngineResult<CycleOutcome> {
        if self.closed || self.is_finished() {
            return Err(EngineError::Finished { cycles: self.cycle });
        }

        let cycle = self.cycle + 1;
        let queue_at_start = self.queue.len();
        self.emit(Event::CycleStarted {
            cycle,
            queue_len: queue_at_start,
        });

        let assigned = self.assign_pass()?;
        if assigned == 0 && queue_at_start > 0 {
            self.emit(Event::NoCapacity {
                queue_len: queue_at_start,
            });
        }
        let idle = self.workers.iter().filter(|w| w.is_idle()).count();
        self.emit(Event::PoolStatus {
            idle,
            total: self.workers.len(),
        });

        let completed = self.advance_pass();
        let scale = self.scale_pass()?;

        self.cycle = cycle;

        let arrived = self.generator.arrival(self.config.arrival_probability);
        if arrived {
            let request = self.generator.next_request();
            self.queue.push_back(request.clone());
            self.report.arrivals += 1;
            self.emit(Event::RequestArrived {
                request,
                queue_len: self.queue.len(),
            });
        }

        debug!(
            cycle,
            assigned,
            completed,
            queue = self.queue.len(),
            pool = self.workers.len(),
            "cycle complete"
        );

        Ok(CycleOutcome {
            cycle,
            queue_at_start,
            assigned,
            completed,
            scale,
            arrived,
        })
    }

    /// Step until the budget is spent, then shut down.
    pub fn run(&mut self) -> EngineResult<RunReport> {
        self.run_until(&CancellationToken::new())
    }

    /// Like [`run`](Self::run), but checks `cancel` before every cycle. A
    /// cancelled run still performs the shutdown report.
    pub fn run_until(&mut self, cancel: &CancellationToken) -> EngineResult<RunReport> {
        if self.closed {
            return Err(EngineError::Finished { cycles: self.cycle });
        }

        let mut cancelled = false;
        while !self.is_finished() {
            if cancel.is_cancelled() {
                cancelled = true;
                break;
            }
            self.step()?;
        }

        if cancelled {
            info!(cycle = self.cycle, budget = self.config.cycles, "run cancelled");
            self.emit(Event::Cancelled { cycle: self.cycle });
        }
        Ok(self.shutdown(cancelled))
    }

    fn assign_pass(&mut self) -> EngineResult<usize> {
        let mut assigned = 0;
        for idx in 0..self.workers.len() {
            if !self.workers[idx].is_idle() {
                continue;
            }
            let Some(request) = self.queue.pop_front() else {
                break;
            };
            let worker = self.workers[idx].id();
            let event = Event::Assigned {
                worker,
                request: request.clone(),
            };
            self.workers[idx].assign(request)?;
            self.emit(event);
            assigned += 1;
        }
        self.report.assigned += assigned as u64;
        Ok(assigned)
    }

    fn advance_pass(&mut self) -> usize {
        let finished: Vec<WorkerId> = self
            .workers
            .iter_mut()
            .filter_map(|w| w.advance_one_cycle().map(|_| w.id()))
            .collect();
        for &worker in &finished {
            self.emit(Event::Completed { worker });
        }
        self.report.completed += finished.len() as u64;
        finished.len()
    }

    fn scale_pass(&mut self) -> EngineResult<ScaleAction> {
        let load = ScalePolicy::load(self.queue.len(), self.workers.len());
        match self.policy.decide(load, self.workers.len()) {
            ScaleDecision::AddWorker => {
                let worker = WorkerId(self.workers.len() as u32 + 1);
                self.emit(Event::ScaledUp { worker, load });
                self.open_worker(worker);
                self.report.scale_ups += 1;
                self.report.peak_pool_size = self.report.peak_pool_size.max(self.workers.len());
                Ok(ScaleAction::Added(worker))
            }
            ScaleDecision::RemoveWorker => {
                let worker = self.remove_tail_worker(load)?;
                Ok(ScaleAction::Removed(worker))
            }
            ScaleDecision::NoChange => Ok(ScaleAction::Unchanged),
        }
    }

    fn remove_tail_worker(&mut self, load: f64) -> EngineResult<WorkerId> {
        if self.workers.len() <= 1 {
            return Err(EngineError::LastWorker);
        }
        let Some(removed) = self.workers.pop() else {
            return Err(EngineError::LastWorker);
        };
        let worker = removed.id();
        let in_flight = removed.into_request();

        let requeued = in_flight.is_some() && self.config.shrink_policy == ShrinkPolicy::Requeue;
        if let Some(request) = &in_flight {
            if requeued {
                self.queue.push_front(request.clone());
                self.report.requeued_on_shrink += 1;
            } else {
                debug!(worker = %worker, "dropping in-flight request of removed worker");
                self.report.dropped_on_shrink += 1;
            }
        }

        self.emit(Event::ScaledDown {
            worker,
            load,
            in_flight,
            requeued,
        });
        self.emit(Event::WorkerClosed { worker });
        self.report.scale_downs += 1;
        Ok(worker)
    }

    fn open_worker(&mut self, id: WorkerId) {
        self.workers.push(Worker::new(id));
        self.emit(Event::WorkerOpened { worker: id });
    }

    /// Report every worker's final state, then discard the pool.
    fn shutdown(&mut self, cancelled: bool) -> RunReport {
        self.emit(Event::Closing);

        let statuses: Vec<(WorkerId, WorkerStatus)> =
            self.workers.iter().map(|w| (w.id(), w.status())).collect();
        let busy = statuses
            .iter()
            .filter(|(_, s)| matches!(s, WorkerStatus::Busy { .. }))
            .count();
        let idle = statuses.len() - busy;
        for (worker, status) in statuses {
            self.emit(Event::FinalWorkerStatus { worker, status });
        }

        let final_pool_size = self.workers.len();
        let closed: Vec<WorkerId> = self.workers.drain(..).map(|w| w.id()).collect();
        for worker in closed {
            self.emit(Event::WorkerClosed { worker });
        }

        self.emit(Event::Summary {
            queue_len: self.queue.len(),
            busy,
            idle,
        });
        if let Err(e) = self.sink.flush() {
            self.report.telemetry_failures += 1;
            warn!(error = %e, "telemetry sink flush failed");
        }
        self.closed = true;

        self.report.cycles_run = self.cycle;
        self.report.cancelled = cancelled;
        self.report.final_pool_size = final_pool_size;
        self.report.remaining_queue = self.queue.len();
        self.report.busy_at_shutdown = busy;
        self.report.idle_at_shutdown = idle;

        info!(
            cycles = self.cycle,
            queue = self.queue.len(),
            busy,
            idle,
            "load balancer closed"
        );
        self.report.clone()
    }

    fn emit(&mut self, event: Event) {
        if let Err(e) = self.sink.record(&event) {
            self.report.telemetry_failures += 1;
            warn!(error = %e, "telemetry sink rejected record");
        }
    }
}
