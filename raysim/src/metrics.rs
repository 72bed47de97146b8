//! Run statistics: global counters, per-node service counts, and the
//! summary block printed and appended to the log file.

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::Path;

use hashbrown::HashMap;

use raymond::{NodeId, Timestamp};

use crate::workload::SimLoad;

/// Global counters owned by the mediator and mutated only by its
/// dispatch loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counters {
    /// REQUEST_CS messages dispatched.
    pub requests: u64,
    /// EXIT_CS messages dispatched (completed critical sections).
    pub serviced: u64,
    /// Inter-node messages: PASS_REQUEST plus PASS_TOKEN.
    pub messages: u64,
    /// PASS_TOKEN messages alone.
    pub token_passes: u64,
}

impl Counters {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Result of a completed simulation run.
#[derive(Debug, Clone)]
pub struct SimulationResult {
    /// Number of nodes simulated.
    pub nodes: u32,
    /// Workload intensity of the run.
    pub load: SimLoad,
    /// Virtual time at which the last event was processed.
    pub end_time: Timestamp,
    /// Global counters.
    pub counters: Counters,
    /// Critical sections completed per node.
    pub serviced_by: HashMap<NodeId, u64>,
}

impl SimulationResult {
    /// Messages per critical-section request; 0 when nothing was requested.
    pub fn messages_per_request(&self) -> f64 {
        ratio(self.counters.messages, self.counters.requests)
    }

    /// Token passes per critical-section request; 0 when nothing was
    /// requested.
    pub fn token_passes_per_request(&self) -> f64 {
        ratio(self.counters.token_passes, self.counters.requests)
    }

    /// The run summary block, one statistic per line.
    pub fn summary(&self) -> String {
        let c = &self.counters;
        format!(
            "Load: {}\n\
             Number of nodes: {}\n\
             Number of critical section: {}\n\
             Number of critical sections serviced: {}\n\
             Number of messages: {}\n\
             Number of messages per request: {}\n\
             Number of token passes: {}\n\
             Number of token passes per critical section: {}\n",
            self.load,
            self.nodes,
            c.requests,
            c.serviced,
            c.messages,
            self.messages_per_request(),
            c.token_passes,
            self.token_passes_per_request(),
        )
    }

    /// Append the summary block to the run log.
    ///
    /// The file handle is opened per call and closed on return, so a
    /// failure here never holds a descriptor open. Callers treat failure
    /// as non-fatal: the run's statistics are already in memory.
    pub fn append_to_log(&self, path: &Path) -> io::Result<()> {
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        file.write_all(self.summary().as_bytes())
    }
}

fn ratio(numerator: u64, denominator: u64) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}
