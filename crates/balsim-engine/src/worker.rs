//! Single-slot worker.
//!
//! A worker is either idle or busy with exactly one request. The elapsed
//! counter only exists while busy, so an idle worker always reports 0.

use balsim_core::{Request, WorkerId};
use serde::Serialize;

use crate::error::{EngineError, EngineResult};

#[derive(Debug, Clone, PartialEq, Eq)]
enum WorkerState {
    Idle,
    Busy { request: Request, elapsed: u32 },
}

/// Snapshot of a worker for shutdown reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum WorkerStatus {
    Idle,
    Busy { request: Request, elapsed: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Worker {
    id: WorkerId,
    state: WorkerState,
}

impl Worker {
    /// Create an idle worker.
    pub fn new(id: WorkerId) -> Self {
        Self {
            id,
            state: WorkerState::Idle,
        }
    }

    pub fn id(&self) -> WorkerId {
        self.id
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.state, WorkerState::Idle)
    }

    /// Cycles spent on the active request; 0 while idle.
    pub fn elapsed(&self) -> u32 {
        match &self.state {
            WorkerState::Idle => 0,
            WorkerState::Busy { elapsed, .. } => *elapsed,
        }
    }

    pub fn active_request(&self) -> Option<&Request> {
        match &self.state {
            WorkerState::Idle => None,
            WorkerState::Busy { request, .. } => Some(request),
        }
    }

    /// Start processing `request`.
    ///
    /// The worker must be idle. A busy worker returns
    /// [`EngineError::WorkerBusy`] and keeps its current request.
    pub fn assign(&mut self, request: Request) -> EngineResult<()> {
        if !self.is_idle() {
            return Err(EngineError::WorkerBusy(self.id));
        }
        self.state = WorkerState::Busy {
            request,
            elapsed: 0,
        };
        Ok(())
    }

    /// Advance by one cycle.
    ///
    /// Returns the request if it completed on this cycle. Idle workers are
    /// left untouched.
    pub fn advance_one_cycle(&mut self) -> Option<Request> {
        let done = match &mut self.state {
            WorkerState::Idle => return None,
            WorkerState::Busy { request, elapsed } => {
                *elapsed += 1;
                *elapsed >= request.duration()
            }
        };
        if !done {
            return None;
        }
        match std::mem::replace(&mut self.state, WorkerState::Idle) {
            WorkerState::Busy { request, .. } => Some(request),
            WorkerState::Idle => None,
        }
    }

    pub fn status(&self) -> WorkerStatus {
        match &self.state {
            WorkerState::Idle => WorkerStatus::Idle,
            WorkerState::Busy { request, elapsed } => WorkerStatus::Busy {
                request: request.clone(),
                elapsed: *elapsed,
            },
        }
    }

    /// Consume the worker, yielding its in-flight request if any.
    pub fn into_request(self) -> Option<Request> {
        match self.state {
            WorkerState::Idle => None,
            WorkerState::Busy { request, .. } => Some(request),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req(duration: u32) -> Request {
        Request::new("10.0.0.1", "10.0.0.2", duration)
    }

    #[test]
    fn new_worker_is_idle() {
        let worker = Worker::new(WorkerId(1));
        assert!(worker.is_idle());
        assert_eq!(worker.elapsed(), 0);
        assert!(worker.active_request().is_none());
        assert_eq!(worker.status(), WorkerStatus::Idle);
    }

    #[test]
    fn assign_makes_busy_with_zero_elapsed() {
        let mut worker = Worker::new(WorkerId(1));
        worker.assign(req(3)).unwrap();
        assert!(!worker.is_idle());
        assert_eq!(worker.elapsed(), 0);
        assert_eq!(worker.active_request(), Some(&req(3)));
    }

    #[test]
    fn assign_to_busy_worker_is_rejected() {
        let mut worker = Worker::new(WorkerId(4));
        worker.assign(req(3)).unwrap();
        let err = worker.assign(req(9)).unwrap_err();
        assert!(matches!(err, EngineError::WorkerBusy(WorkerId(4))));
        // Original request is still in flight.
        assert_eq!(worker.active_request().map(Request::duration), Some(3));
    }

    #[test]
    fn completes_when_elapsed_reaches_duration() {
        let mut worker = Worker::new(WorkerId(1));
        worker.assign(req(3)).unwrap();

        assert_eq!(worker.advance_one_cycle(), None);
        assert_eq!(worker.elapsed(), 1);
        assert_eq!(worker.advance_one_cycle(), None);
        assert_eq!(worker.elapsed(), 2);

        assert_eq!(worker.advance_one_cycle(), Some(req(3)));
        assert!(worker.is_idle());
        assert_eq!(worker.elapsed(), 0);
    }

    #[test]
    fn one_cycle_request_completes_on_first_advance() {
        let mut worker = Worker::new(WorkerId(1));
        worker.assign(req(1)).unwrap();
        assert!(worker.advance_one_cycle().is_some());
        assert!(worker.is_idle());
    }

    #[test]
    fn idle_advance_is_idempotent() {
        let mut worker = Worker::new(WorkerId(2));
        let before = worker.clone();
        for _ in 0..10 {
            assert_eq!(worker.advance_one_cycle(), None);
        }
        assert_eq!(worker, before);
    }

    #[test]
    fn elapsed_never_exceeds_duration() {
        let mut worker = Worker::new(WorkerId(1));
        worker.assign(req(7)).unwrap();
        while !worker.is_idle() {
            let duration = worker.active_request().unwrap().duration();
            assert!(worker.elapsed() <= duration);
            worker.advance_one_cycle();
        }
        assert_eq!(worker.elapsed(), 0);
    }

    #[test]
    fn status_reports_in_flight_request() {
        let mut worker = Worker::new(WorkerId(1));
        worker.assign(req(5)).unwrap();
        worker.advance_one_cycle();
        worker.advance_one_cycle();
        assert_eq!(
            worker.status(),
            WorkerStatus::Busy {
                request: req(5),
                elapsed: 2
            }
        );
    }

    #[test]
    fn into_request_yields_in_flight_work() {
        let mut worker = Worker::new(WorkerId(1));
        assert_eq!(worker.clone().into_request(), None);
        worker.assign(req(5)).unwrap();
        assert_eq!(worker.into_request(), Some(req(5)));
    }
}
