//! Scenario builder for setting up and running simulations.

use crate::error::InvariantViolation;
use crate::metrics::SimulationResult;
use crate::sim::Simulator;
use crate::trace::TraceEmitter;
use crate::workload::SimLoad;

/// Requests each node issues when not configured otherwise.
pub const DEFAULT_REQUESTS: u64 = 500;

/// Builder for simulation runs.
///
/// ```
/// use raysim::{ScenarioBuilder, SimLoad};
///
/// let result = ScenarioBuilder::new(3, SimLoad::Low)
///     .with_seed(42)
///     .with_requests(100)
///     .run()
///     .unwrap();
/// assert_eq!(result.counters.serviced, 300);
/// ```
pub struct ScenarioBuilder {
    nodes: u32,
    load: SimLoad,
    seed: u64,
    requests: u64,
    emitter: Option<Box<dyn TraceEmitter>>,
    invariant_checks: bool,
}

impl ScenarioBuilder {
    /// Create a scenario over `nodes` nodes at the given load.
    pub fn new(nodes: u32, load: SimLoad) -> Self {
        Self {
            nodes,
            load,
            seed: 42,
            requests: DEFAULT_REQUESTS,
            emitter: None,
            invariant_checks: false,
        }
    }

    /// Set the RNG seed for deterministic workloads.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set how many critical sections each node requests.
    pub fn with_requests(mut self, requests: u64) -> Self {
        self.requests = requests;
        self
    }

    /// Route the per-event trace to the given emitter (dropped lines by
    /// default).
    pub fn with_emitter(mut self, emitter: Box<dyn TraceEmitter>) -> Self {
        self.emitter = Some(emitter);
        self
    }

    /// Assert protocol invariants during the run.
    pub fn with_invariant_checks(mut self, enabled: bool) -> Self {
        self.invariant_checks = enabled;
        self
    }

    /// Build the wired simulator without running it.
    pub fn build(self) -> Simulator {
        let mut sim = Simulator::new(self.nodes, self.load, self.seed, self.requests)
            .with_invariant_checks(self.invariant_checks);
        if let Some(emitter) = self.emitter {
            sim = sim.with_emitter(emitter);
        }
        sim
    }

    /// Build and run to termination.
    pub fn run(self) -> Result<SimulationResult, InvariantViolation> {
        self.build().run()
    }
}
