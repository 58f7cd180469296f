//! Core simulation types.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Display label for a worker.
///
/// Assigned from the pool size at creation time, so a label can be reused
/// after the pool shrinks and grows again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkerId(pub u32);

impl fmt::Display for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A synthetic network request.
///
/// Immutable once constructed; the duration is the number of cycles a
/// worker spends processing it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    origin: String,
    destination: String,
    duration: u32,
}

impl Request {
    pub fn new(origin: impl Into<String>, destination: impl Into<String>, duration: u32) -> Self {
        Self {
            origin: origin.into(),
            destination: destination.into(),
            duration,
        }
    }

    /// Source address, dotted-quad form.
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Destination address, dotted-quad form.
    pub fn destination(&self) -> &str {
        &self.destination
    }

    /// Processing time in cycles.
    pub fn duration(&self) -> u32 {
        self.duration
    }
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "request from {} to {} :: Duration {} Cycles",
            self.origin, self.destination, self.duration
        )
    }
}
