//! Event types and priority-queue ordering for the discrete event loop.

use std::cmp::Ordering;

use raymond::{NodeId, Timestamp};

/// Unique sequence number for deterministic ordering of same-time events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct SequenceNumber(u64);

impl SequenceNumber {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

/// Driver timing events in the discrete event simulation.
///
/// These are the only things that advance virtual time. Message dispatch
/// itself is instantaneous: the mediator drains its FIFO completely after
/// each timing event.
#[derive(Debug, Clone, Copy)]
pub enum Event {
    /// A node's inter-arrival stall elapsed; its driver issues REQUEST_CS.
    RequestArrival { node: NodeId },
    /// A node's CS execution elapsed; its driver issues EXIT_CS.
    CsComplete { node: NodeId },
}

/// A scheduled event with timestamp and sequence number for ordering.
#[derive(Debug, Clone)]
pub struct ScheduledEvent {
    /// When the event should occur.
    pub time: Timestamp,
    /// Tie-breaker for events at the same virtual instant.
    pub seq: SequenceNumber,
    /// The event to process.
    pub event: Event,
}

impl ScheduledEvent {
    pub fn new(time: Timestamp, seq: SequenceNumber, event: Event) -> Self {
        Self { time, seq, event }
    }
}

// Implement ordering for min-heap use (BinaryHeap is a max-heap, so the
// comparison is reversed).
impl PartialEq for ScheduledEvent {
    fn eq(&self, other: &Self) -> bool {
        self.time == other.time && self.seq == other.seq
    }
}

impl Eq for ScheduledEvent {}

impl PartialOrd for ScheduledEvent {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ScheduledEvent {
    fn cmp(&self, other: &Self) -> Ordering {
        match other.time.cmp(&self.time) {
            Ordering::Equal => other.seq.cmp(&self.seq),
            ord => ord,
        }
    }
}
