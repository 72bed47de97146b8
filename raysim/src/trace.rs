//! Per-event trace output.
//!
//! Every dispatched message renders to one canonical line. Emitters only
//! decide where formatted lines go, never how they look, so the stdout
//! trace and the lines a test collects are byte-identical.

use std::fmt;
use std::sync::{Arc, Mutex};

use raymond::{NodeId, Timestamp};

/// One dispatched mediator message, as seen by the trace.
#[derive(Debug, Clone, Copy)]
pub enum TraceEvent {
    /// A node requested the CS; `pending` is the number of requests not
    /// yet serviced at that instant.
    Requested {
        time: Timestamp,
        node: NodeId,
        pending: u64,
    },
    /// A request was forwarded one hop.
    SentRequest {
        time: Timestamp,
        from: NodeId,
        to: NodeId,
    },
    /// The token moved one hop.
    PassedToken {
        time: Timestamp,
        from: NodeId,
        to: NodeId,
    },
    /// A node left the CS.
    Exited { time: Timestamp, node: NodeId },
}

impl fmt::Display for TraceEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            TraceEvent::Requested {
                time,
                node,
                pending,
            } => write!(
                f,
                "{}: {} requested the CS, {} Pending",
                time.as_millis(),
                node,
                pending
            ),
            TraceEvent::SentRequest { time, from, to } => {
                write!(f, "{}: {} sent request to {}", time.as_millis(), from, to)
            }
            TraceEvent::PassedToken { time, from, to } => {
                write!(
                    f,
                    "{}: {} passed the token to {}",
                    time.as_millis(),
                    from,
                    to
                )
            }
            TraceEvent::Exited { time, node } => {
                write!(f, "{}: {} exited the CS", time.as_millis(), node)
            }
        }
    }
}

/// Sink for trace events.
pub trait TraceEmitter {
    fn emit(&mut self, event: &TraceEvent);
}

/// Emitter that discards everything (the `--quiet` mode and the default
/// for tests that only look at counters).
#[derive(Debug, Default)]
pub struct NullEmitter;

impl TraceEmitter for NullEmitter {
    fn emit(&mut self, _event: &TraceEvent) {}
}

/// Emitter that prints each line to stdout as it occurs.
#[derive(Debug, Default)]
pub struct PrintEmitter;

impl TraceEmitter for PrintEmitter {
    fn emit(&mut self, event: &TraceEvent) {
        println!("{event}");
    }
}

/// Emitter that collects formatted lines into a shared Vec, so a caller
/// can keep a handle and inspect (or diff) the full trace after the run.
pub struct VecEmitter {
    lines: Arc<Mutex<Vec<String>>>,
}

impl VecEmitter {
    pub fn new(lines: Arc<Mutex<Vec<String>>>) -> Self {
        Self { lines }
    }
}

impl TraceEmitter for VecEmitter {
    fn emit(&mut self, event: &TraceEvent) {
        self.lines.lock().unwrap().push(event.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_formats() {
        let t = Timestamp::from_millis(1234);
        let n1 = NodeId::new(1);
        let n2 = NodeId::new(2);

        assert_eq!(
            TraceEvent::Requested {
                time: t,
                node: n2,
                pending: 3
            }
            .to_string(),
            "1234: 2 requested the CS, 3 Pending"
        );
        assert_eq!(
            TraceEvent::SentRequest {
                time: t,
                from: n2,
                to: n1
            }
            .to_string(),
            "1234: 2 sent request to 1"
        );
        assert_eq!(
            TraceEvent::PassedToken {
                time: t,
                from: n1,
                to: n2
            }
            .to_string(),
            "1234: 1 passed the token to 2"
        );
        assert_eq!(
            TraceEvent::Exited { time: t, node: n2 }.to_string(),
            "1234: 2 exited the CS"
        );
    }

    #[test]
    fn test_vec_emitter_collects() {
        let lines = Arc::new(Mutex::new(Vec::new()));
        let mut emitter = VecEmitter::new(lines.clone());

        emitter.emit(&TraceEvent::Exited {
            time: Timestamp::ZERO,
            node: NodeId::new(1),
        });

        assert_eq!(lines.lock().unwrap().as_slice(), ["0: 1 exited the CS"]);
    }
}
