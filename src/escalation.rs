//! Once-per-signature fault reporting.
//!
//! Some hardware returns the same odd HIDP status on every report. Each
//! distinct [`UnexpectedStatus`] is handed to the [`FaultSink`] the first time it
//! is seen; repeats are suppressed for the lifetime of the log.

use crate::error::UnexpectedStatus;
use std::collections::HashSet;

/// Receiver for escalated faults (crash reporter, telemetry, log).
pub trait FaultSink {
    fn escalate(&self, fault: &UnexpectedStatus);
}

/// Default sink: logs at `error` level.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingFaultSink;

impl FaultSink for TracingFaultSink {
    fn escalate(&self, fault: &UnexpectedStatus) {
        tracing::error!(
            status = %fault.status,
            context = %fault.context,
            "HID capability query returned an unexpected status"
        );
    }
}

pub struct EscalationLog {
    seen: HashSet<UnexpectedStatus>,
    sink: Box<dyn FaultSink>,
}

impl EscalationLog {
    pub fn new(sink: Box<dyn FaultSink>) -> Self {
        Self {
            seen: HashSet::new(),
            sink,
        }
    }

    /// Report `fault` unless its signature was already reported.
    /// Returns `true` when the sink was called.
    pub fn escalate(&mut self, fault: UnexpectedStatus) -> bool {
        if !self.seen.insert(fault) {
            tracing::trace!(%fault, "suppressed repeated fault");
            return false;
        }
        self.sink.escalate(&fault);
        true
    }

    /// Number of distinct signatures reported so far.
    pub fn reported(&self) -> usize {
        self.seen.len()
    }
}

impl Default for EscalationLog {
    fn default() -> Self {
        Self::new(Box::new(TracingFaultSink))
    }
}
