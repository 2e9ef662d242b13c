//! Audit sink implementations.
//!
//! Records admission decisions so embedders can inspect how a budget behaved
//! under pressure (when it shrank, which units were cancelled, and so on).

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::util::clock::now_ms;
use crate::util::UnitId;

/// What happened to a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchAction {
    /// Unit handed to the dispatcher.
    Submit,
    /// Unit admitted and started.
    Admit,
    /// Unit finished successfully.
    Complete,
    /// Unit finished with a caller-visible error.
    Fail,
    /// Exhaustion reported; the ceiling was clamped and the unit re-queued.
    Shrink,
    /// Exhaustion reported with nothing left to shrink to.
    Exhausted,
    /// Unit withdrawn before admission.
    Cancel,
}

impl fmt::Display for DispatchAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Submit => "submit",
            Self::Admit => "admit",
            Self::Complete => "complete",
            Self::Fail => "fail",
            Self::Shrink => "shrink",
            Self::Exhausted => "exhausted",
            Self::Cancel => "cancel",
        };
        f.write_str(name)
    }
}

/// Audit event structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchEvent {
    /// Unit the event refers to.
    pub unit: UnitId,
    /// Name of the dispatcher that handled it.
    pub dispatcher: String,
    /// Action taken.
    pub action: DispatchAction,
    /// Outstanding count right after the action.
    pub outstanding: usize,
    /// Ceiling right after the action.
    pub limit: f64,
    /// Timestamp milliseconds.
    pub at_ms: u128,
}

/// Audit sink abstraction.
pub trait AuditSink: Send {
    /// Record an audit event.
    fn record(&mut self, event: DispatchEvent);
}

/// Shared sinks let the caller keep reading events the dispatcher records.
impl<T: AuditSink> AuditSink for Arc<Mutex<T>> {
    fn record(&mut self, event: DispatchEvent) {
        self.lock().record(event);
    }
}

/// In-memory audit sink for testing and dev.
#[derive(Debug)]
pub struct InMemoryAuditSink {
    events: VecDeque<DispatchEvent>,
    max_events: usize,
}

impl InMemoryAuditSink {
    /// Create a new in-memory sink with a bounded buffer.
    #[must_use]
    pub fn new(max_events: usize) -> Self {
        Self {
            events: VecDeque::with_capacity(max_events.min(1024)),
            max_events,
        }
    }

    /// Retrieve a snapshot of stored events.
    #[must_use]
    pub fn events(&self) -> Vec<DispatchEvent> {
        self.events.iter().cloned().collect()
    }
}

impl AuditSink for InMemoryAuditSink {
    fn record(&mut self, event: DispatchEvent) {
        if self.max_events == 0 {
            return;
        }
        if self.events.len() >= self.max_events {
            self.events.pop_front();
        }
        self.events.push_back(event);
    }
}

/// Helper to build an audit event from context.
pub fn build_dispatch_event(
    unit: UnitId,
    dispatcher: impl Into<String>,
    action: DispatchAction,
    outstanding: usize,
    limit: f64,
) -> DispatchEvent {
    DispatchEvent {
        unit,
        dispatcher: dispatcher.into(),
        action,
        outstanding,
        limit,
        at_ms: now_ms(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ring_buffer_drops_oldest() {
        let mut sink = InMemoryAuditSink::new(2);
        let unit = UnitId::new();
        sink.record(build_dispatch_event(unit, "fs", DispatchAction::Submit, 0, 1.0));
        sink.record(build_dispatch_event(unit, "fs", DispatchAction::Admit, 1, 1.0));
        sink.record(build_dispatch_event(unit, "fs", DispatchAction::Complete, 0, 1.0));

        let actions: Vec<_> = sink.events().iter().map(|e| e.action).collect();
        assert_eq!(actions, vec![DispatchAction::Admit, DispatchAction::Complete]);
    }

    #[test]
    fn action_display_matches_serde_name() {
        let json = serde_json::to_string(&DispatchAction::Exhausted).unwrap();
        assert_eq!(json, format!("\"{}\"", DispatchAction::Exhausted));
    }
}
