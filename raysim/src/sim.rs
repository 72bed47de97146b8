//! Discrete event simulator for the Raymond tree-mutex protocol.
//!
//! The main loop pops driver timing events from a `(time, sequence)`
//! ordered priority queue, advances the virtual clock, converts each
//! event into a mediator message, and then drains the mediator FIFO to
//! empty before touching the clock again. Message dispatch is therefore
//! instantaneous and totally ordered; only stalls and CS occupancy take
//! virtual time.
//!
//! With the optional invariant checker enabled, mutual exclusion is
//! asserted after every dispatch, and token uniqueness plus tree
//! invariance are asserted at every quiescent instant (empty FIFO).

use std::collections::BinaryHeap;

use hashbrown::{HashMap, HashSet};

use raymond::{Message, NodeId, RaymondNode, Timestamp};

use crate::driver::{DriverState, NodeDriver};
use crate::error::InvariantViolation;
use crate::event::{Event, ScheduledEvent, SequenceNumber};
use crate::mediator::Mediator;
use crate::metrics::SimulationResult;
use crate::topology::{canonical_pair, Tree};
use crate::trace::{NullEmitter, TraceEmitter};
use crate::workload::{generate_times, SimLoad};

/// Discrete event simulator: mediator, drivers, and the virtual clock.
pub struct Simulator {
    tree: Tree,
    mediator: Mediator,
    drivers: HashMap<NodeId, NodeDriver>,
    event_queue: BinaryHeap<ScheduledEvent>,
    current_time: Timestamp,
    next_seq: u64,
    emitter: Box<dyn TraceEmitter>,
    check_invariants: bool,
    nodes: u32,
    load: SimLoad,
}

impl Simulator {
    /// Wire up a full simulation: heap tree over `nodes` nodes, one state
    /// machine and one driver per node, `requests` precomputed cycles per
    /// driver drawn from `seed`.
    ///
    /// All initial request arrivals are scheduled before `run` pops the
    /// first one, so no node can observe a partially wired tree.
    pub fn new(nodes: u32, load: SimLoad, seed: u64, requests: u64) -> Self {
        let tree = Tree::heap(nodes);
        let mediator = Mediator::new(&tree);

        let mut sim = Self {
            mediator,
            drivers: HashMap::with_capacity(nodes as usize),
            event_queue: BinaryHeap::new(),
            current_time: Timestamp::ZERO,
            next_seq: 0,
            emitter: Box::new(NullEmitter),
            check_invariants: false,
            nodes,
            load,
            tree,
        };

        for id in sim.tree.node_ids().collect::<Vec<_>>() {
            let schedule = generate_times(seed, id, nodes, load, requests);
            let mut driver = NodeDriver::new(id, schedule);
            match driver.next_cycle() {
                Some(delay) => {
                    sim.schedule(Timestamp::ZERO + delay, Event::RequestArrival { node: id });
                }
                None => {
                    sim.mediator
                        .mark_done(id, Timestamp::ZERO)
                        .expect("each node signals done at most once during setup");
                }
            }
            sim.drivers.insert(id, driver);
        }

        tracing::debug!(nodes, %load, seed, requests, "simulation wired");
        sim
    }

    /// Replace the trace emitter. Must be called before `run`.
    pub fn with_emitter(mut self, emitter: Box<dyn TraceEmitter>) -> Self {
        self.emitter = emitter;
        self
    }

    /// Enable or disable the invariant harness.
    pub fn with_invariant_checks(mut self, enabled: bool) -> Self {
        self.check_invariants = enabled;
        self
    }

    /// Current virtual time.
    pub fn current_time(&self) -> Timestamp {
        self.current_time
    }

    /// The spanning tree the run is wired on.
    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    /// Look up a node's protocol state.
    pub fn node(&self, id: NodeId) -> Option<&RaymondNode> {
        self.mediator.node(id)
    }

    /// Look up a node's driver.
    pub fn driver(&self, id: NodeId) -> Option<&NodeDriver> {
        self.drivers.get(&id)
    }

    /// Run to global termination: every driver has exhausted its schedule
    /// and the mediator FIFO is empty.
    pub fn run(&mut self) -> Result<SimulationResult, InvariantViolation> {
        while let Some(scheduled) = self.event_queue.pop() {
            self.advance_time(scheduled.time);

            match scheduled.event {
                Event::RequestArrival { node } => {
                    self.driver_mut(node).on_request_issued();
                    self.mediator.send(Message::request_cs(node));
                }
                Event::CsComplete { node } => {
                    self.driver_mut(node).on_cs_complete();
                    self.mediator.send(Message::exit_cs(node));

                    // The next stall begins as the exit is sent.
                    match self.driver_mut(node).next_cycle() {
                        Some(delay) => {
                            let at = self.current_time + delay;
                            self.schedule(at, Event::RequestArrival { node });
                        }
                        None => self.mediator.mark_done(node, self.current_time)?,
                    }
                }
            }

            self.drain()?;
        }

        if !self.mediator.all_done() {
            let mut waiting: Vec<u32> = self
                .drivers
                .values()
                .filter(|d| d.state() != DriverState::AwaitingRelease)
                .map(|d| d.id().get())
                .collect();
            waiting.sort_unstable();
            return Err(InvariantViolation::new(
                self.current_time.as_millis(),
                format!("simulation stalled with nodes {waiting:?} still active"),
            ));
        }

        // Global quiescence reached: release every parked driver.
        for id in self.tree.node_ids().collect::<Vec<_>>() {
            self.driver_mut(id).release();
        }

        let counters = self.mediator.counters();
        tracing::debug!(
            requests = counters.requests,
            serviced = counters.serviced,
            messages = counters.messages,
            token_passes = counters.token_passes,
            end_ms = self.current_time.as_millis(),
            "simulation terminated"
        );

        Ok(SimulationResult {
            nodes: self.nodes,
            load: self.load,
            end_time: self.current_time,
            counters,
            serviced_by: self.mediator.serviced_by().clone(),
        })
    }

    /// Schedule an event at an absolute virtual time.
    fn schedule(&mut self, time: Timestamp, event: Event) {
        let seq = SequenceNumber::new(self.next_seq);
        self.next_seq += 1;
        self.event_queue.push(ScheduledEvent::new(time, seq, event));
    }

    /// Advance the virtual clock.
    fn advance_time(&mut self, time: Timestamp) {
        if time > self.current_time {
            self.current_time = time;
        }
    }

    /// Dispatch mediator messages until the FIFO is empty, resuming any
    /// driver whose token signal fires.
    fn drain(&mut self) -> Result<(), InvariantViolation> {
        while let Some(dispatched) = self
            .mediator
            .dispatch_next(self.current_time, self.emitter.as_mut())?
        {
            if let Some(node) = dispatched.granted {
                let execution = self.driver_mut(node).on_token_granted();
                let at = self.current_time + execution;
                self.schedule(at, Event::CsComplete { node });
            }

            if self.check_invariants {
                self.check_state()?;
            }
        }
        Ok(())
    }

    fn driver_mut(&mut self, node: NodeId) -> &mut NodeDriver {
        self.drivers
            .get_mut(&node)
            .expect("a driver exists for every node")
    }

    /// Assert mutual exclusion after the dispatch that just ran, and the
    /// quiescent-instant invariants when the FIFO is empty: exactly one
    /// token holder, and holder edges matching the tree edge for edge.
    /// A token in flight legitimately leaves zero self-holders, which is
    /// why those two checks wait for quiescence.
    fn check_state(&self) -> Result<(), InvariantViolation> {
        let now = self.current_time.as_millis();

        let mut using: Vec<u32> = self
            .mediator
            .nodes()
            .filter(|n| n.is_using())
            .map(|n| n.id().get())
            .collect();
        if using.len() > 1 {
            using.sort_unstable();
            return Err(InvariantViolation::new(
                now,
                format!("nodes {using:?} are inside the CS simultaneously"),
            ));
        }

        if !self.mediator.queue_is_empty() {
            return Ok(());
        }

        let mut holders: Vec<u32> = self
            .mediator
            .nodes()
            .filter(|n| n.is_holder())
            .map(|n| n.id().get())
            .collect();
        if holders.len() != 1 {
            holders.sort_unstable();
            return Err(InvariantViolation::new(
                now,
                format!("expected exactly one token holder at quiescence, found {holders:?}"),
            ));
        }

        let holder_edges: HashSet<(NodeId, NodeId)> = self
            .mediator
            .nodes()
            .filter(|n| !n.is_holder())
            .map(|n| canonical_pair(n.id(), n.holder()))
            .collect();
        if holder_edges != self.tree.edges() {
            return Err(InvariantViolation::new(
                now,
                "holder edges diverged from the spanning tree",
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_node_completes_schedule() {
        let mut sim = Simulator::new(1, SimLoad::Low, 42, 5).with_invariant_checks(true);
        let result = sim.run().unwrap();

        assert_eq!(result.counters.requests, 5);
        assert_eq!(result.counters.serviced, 5);
        assert_eq!(result.counters.messages, 0);
        assert_eq!(result.counters.token_passes, 0);
        assert_eq!(
            sim.driver(NodeId::new(1)).unwrap().state(),
            DriverState::Released
        );
        assert!(sim.current_time() > Timestamp::ZERO);
    }

    #[test]
    fn test_two_nodes_share_the_token() {
        let mut sim = Simulator::new(2, SimLoad::High, 7, 20).with_invariant_checks(true);
        let result = sim.run().unwrap();

        assert_eq!(result.counters.requests, 40);
        assert_eq!(result.counters.serviced, 40);
        // Node 2 entered the CS at least once, so the token moved.
        assert!(result.counters.token_passes >= 1);
        assert_eq!(result.serviced_by.get(&NodeId::new(1)), Some(&20));
        assert_eq!(result.serviced_by.get(&NodeId::new(2)), Some(&20));
    }

    #[test]
    fn test_zero_requests_terminates_immediately() {
        let mut sim = Simulator::new(3, SimLoad::Med, 1, 0);
        let result = sim.run().unwrap();

        assert_eq!(result.counters.requests, 0);
        assert_eq!(result.end_time, Timestamp::ZERO);
        for id in 1..=3 {
            assert_eq!(
                sim.driver(NodeId::new(id)).unwrap().state(),
                DriverState::Released
            );
        }
    }

    #[test]
    fn test_token_parks_where_last_used() {
        // After termination the holder pointers must form the tree again,
        // with the token resting wherever the last CS ran.
        let mut sim = Simulator::new(4, SimLoad::Med, 99, 10).with_invariant_checks(true);
        sim.run().unwrap();

        let holders: Vec<NodeId> = (1..=4)
            .map(NodeId::new)
            .filter(|&id| sim.node(id).unwrap().is_holder())
            .collect();
        assert_eq!(holders.len(), 1);
    }
}
