//! Per-node driver lifecycle.
//!
//! A driver walks its node through REQUEST / ENTER / EXIT cycles, one per
//! precomputed time sample, then parks until the mediator releases it at
//! global termination. The simulator advances drivers on scheduled events
//! and on token grants reported by the mediator; the state assertions
//! here catch any out-of-order transition.

use std::collections::VecDeque;

use raymond::{Duration, NodeId, Signal};

use crate::workload::TimeSample;

/// Where a driver is inside its cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    /// Sleeping out the inter-arrival time before the next request.
    Stalling,
    /// REQUEST_CS sent; parked on the token signal.
    AwaitingToken,
    /// Inside the critical section.
    InCs,
    /// Schedule exhausted and DONE sent; parked on the done signal.
    AwaitingRelease,
    /// Done signal consumed; the driver is finished.
    Released,
}

/// Control loop state for one node.
#[derive(Debug)]
pub struct NodeDriver {
    id: NodeId,
    schedule: VecDeque<TimeSample>,
    active: Option<TimeSample>,
    state: DriverState,
    done_signal: Signal,
    completed: u64,
}

impl NodeDriver {
    /// Create a driver with its precomputed schedule.
    pub fn new(id: NodeId, schedule: VecDeque<TimeSample>) -> Self {
        Self {
            id,
            schedule,
            active: None,
            state: DriverState::Stalling,
            done_signal: Signal::new(),
            completed: 0,
        }
    }

    /// This driver's node.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Current lifecycle state.
    pub fn state(&self) -> DriverState {
        self.state
    }

    /// Critical sections completed so far.
    pub fn completed(&self) -> u64 {
        self.completed
    }

    /// Begin the next cycle: pop a time sample and start stalling.
    ///
    /// Returns the inter-arrival delay to sleep, or `None` when the
    /// schedule is exhausted, in which case the driver parks awaiting
    /// release.
    pub fn next_cycle(&mut self) -> Option<Duration> {
        match self.schedule.pop_front() {
            Some(sample) => {
                self.active = Some(sample);
                self.state = DriverState::Stalling;
                Some(sample.inter_arrival)
            }
            None => {
                self.active = None;
                self.state = DriverState::AwaitingRelease;
                None
            }
        }
    }

    /// The stall elapsed and REQUEST_CS was sent; park on the token.
    pub fn on_request_issued(&mut self) {
        assert_eq!(self.state, DriverState::Stalling, "driver {} not stalling", self.id);
        self.state = DriverState::AwaitingToken;
    }

    /// The token signal fired; enter the CS and return its duration.
    pub fn on_token_granted(&mut self) -> Duration {
        assert_eq!(
            self.state,
            DriverState::AwaitingToken,
            "driver {} granted a token it did not wait for",
            self.id
        );
        self.state = DriverState::InCs;
        self.active
            .expect("an active sample accompanies every request")
            .execution
    }

    /// The CS execution elapsed and EXIT_CS was sent.
    pub fn on_cs_complete(&mut self) {
        assert_eq!(self.state, DriverState::InCs, "driver {} not in the CS", self.id);
        self.completed += 1;
        self.active = None;
    }

    /// The mediator released this driver at global termination.
    pub fn release(&mut self) {
        assert_eq!(
            self.state,
            DriverState::AwaitingRelease,
            "driver {} released before signalling done",
            self.id
        );
        self.done_signal.post();
        if self.done_signal.take() {
            self.state = DriverState::Released;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(iat: u64, et: u64) -> TimeSample {
        TimeSample {
            inter_arrival: Duration::from_millis(iat),
            execution: Duration::from_millis(et),
        }
    }

    fn driver(samples: &[TimeSample]) -> NodeDriver {
        NodeDriver::new(NodeId::new(1), samples.iter().copied().collect())
    }

    #[test]
    fn test_full_cycle() {
        let mut d = driver(&[sample(10, 5)]);

        assert_eq!(d.next_cycle(), Some(Duration::from_millis(10)));
        assert_eq!(d.state(), DriverState::Stalling);

        d.on_request_issued();
        assert_eq!(d.state(), DriverState::AwaitingToken);

        assert_eq!(d.on_token_granted(), Duration::from_millis(5));
        assert_eq!(d.state(), DriverState::InCs);

        d.on_cs_complete();
        assert_eq!(d.completed(), 1);

        assert_eq!(d.next_cycle(), None);
        assert_eq!(d.state(), DriverState::AwaitingRelease);

        d.release();
        assert_eq!(d.state(), DriverState::Released);
    }

    #[test]
    fn test_empty_schedule_parks_immediately() {
        let mut d = driver(&[]);
        assert_eq!(d.next_cycle(), None);
        assert_eq!(d.state(), DriverState::AwaitingRelease);
        assert_eq!(d.completed(), 0);
    }

    #[test]
    fn test_cycles_consume_schedule_in_order() {
        let mut d = driver(&[sample(1, 2), sample(3, 4)]);

        assert_eq!(d.next_cycle(), Some(Duration::from_millis(1)));
        d.on_request_issued();
        assert_eq!(d.on_token_granted(), Duration::from_millis(2));
        d.on_cs_complete();

        assert_eq!(d.next_cycle(), Some(Duration::from_millis(3)));
        d.on_request_issued();
        assert_eq!(d.on_token_granted(), Duration::from_millis(4));
        d.on_cs_complete();

        assert_eq!(d.completed(), 2);
        assert_eq!(d.next_cycle(), None);
    }

    #[test]
    #[should_panic(expected = "granted a token it did not wait for")]
    fn test_unrequested_grant_panics() {
        let mut d = driver(&[sample(1, 1)]);
        d.next_cycle();
        d.on_token_granted();
    }
}
