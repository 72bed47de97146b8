//! Synthetic workload generation.
//!
//! Each node precomputes its full schedule of (inter-arrival, execution)
//! durations before the simulation starts, using inverse-transform
//! sampling of the exponential distribution. Times are integer virtual
//! milliseconds; draws that round to zero are redrawn so every stall and
//! every CS occupancy advances the clock.

use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use raymond::{Duration, NodeId};

/// Request arrival rate lambda (requests per 100ms-scaled unit).
const LAMBDA: f64 = 1.0;

/// Scale factor applied to raw exponential draws to obtain milliseconds.
const TIME_SCALE: f64 = 100.0;

/// Per-node seed stride: node i draws from `run_seed + i * 1000`.
const NODE_SEED_STRIDE: u64 = 1000;

/// Workload intensity, selecting the CS service rate mu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SimLoad {
    Low,
    Med,
    High,
}

impl SimLoad {
    /// Target utilization ratio for this load level.
    fn ratio(self) -> f64 {
        match self {
            SimLoad::Low => 0.1,
            SimLoad::Med => 0.5,
            SimLoad::High => 0.8,
        }
    }

    /// Service rate mu for a network of `nodes` nodes.
    ///
    /// Truncates the f64 quotient rather than rounding it; 3 nodes at LOW
    /// yields mu = 29 because 3.0 / 0.1 falls just below 30 in binary
    /// floating point, and the reference behavior keeps that artifact.
    pub fn service_rate(self, nodes: u32) -> u64 {
        (f64::from(nodes) * LAMBDA / self.ratio()) as u64
    }
}

impl fmt::Display for SimLoad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SimLoad::Low => "LOW",
            SimLoad::Med => "MED",
            SimLoad::High => "HIGH",
        };
        write!(f, "{s}")
    }
}

impl FromStr for SimLoad {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "low" | "1" => Ok(SimLoad::Low),
            "med" | "2" => Ok(SimLoad::Med),
            "high" | "3" => Ok(SimLoad::High),
            other => Err(format!("unknown load {other:?} (expected low, med, or high)")),
        }
    }
}

/// One REQUEST/ENTER/EXIT cycle's timing: how long the node idles before
/// requesting, and how long it occupies the CS once granted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSample {
    pub inter_arrival: Duration,
    pub execution: Duration,
}

/// Generate the schedule for one node: `requests` samples drawn from a
/// ChaCha stream seeded from the run seed and the node id, so runs are
/// reproducible and nodes are decorrelated.
pub fn generate_times(
    run_seed: u64,
    node: NodeId,
    nodes: u32,
    load: SimLoad,
    requests: u64,
) -> VecDeque<TimeSample> {
    let mut rng = ChaCha8Rng::seed_from_u64(
        run_seed.wrapping_add(u64::from(node.get()) * NODE_SEED_STRIDE),
    );
    let mu = load.service_rate(nodes);

    (0..requests)
        .map(|_| TimeSample {
            inter_arrival: draw_exponential_ms(&mut rng, LAMBDA),
            execution: draw_exponential_ms(&mut rng, mu as f64),
        })
        .collect()
}

/// Draw a strictly positive exponential duration with the given rate,
/// scaled to milliseconds. Zero-rounding draws are rejected and retried.
fn draw_exponential_ms<R: Rng>(rng: &mut R, rate: f64) -> Duration {
    loop {
        let u: f64 = rng.gen();
        if u <= 0.0 {
            continue;
        }
        let ms = (TIME_SCALE * (-1.0 / rate) * u.ln()).round();
        if ms >= 1.0 {
            return Duration::from_millis(ms as u64);
        }
    }
}
