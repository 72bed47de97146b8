//! The mediator: single FIFO message serializer.
//!
//! Every inter-node event funnels through one queue and is dispatched one
//! message at a time, which is what totally orders the simulation and
//! makes traces reproducible. The per-node rules run only here; nothing
//! else touches node state.
//!
//! Dispatch table (counters updated after the rules run):
//!
//! | Kind         | Acts on  | Rules                                   | Counter        |
//! |--------------|----------|-----------------------------------------|----------------|
//! | REQUEST_CS   | sender   | enqueue(self); assign; make_request     | requests       |
//! | PASS_REQUEST | receiver | enqueue(sender); assign; make_request   | messages       |
//! | PASS_TOKEN   | receiver | receive_token; assign; make_request     | messages, token_passes |
//! | EXIT_CS      | sender   | clear_using; assign; make_request       | serviced       |
//!
//! REQUEST_CS and EXIT_CS are driver messages about the sender's own
//! state; their receiver field is ignored.

use std::collections::VecDeque;

use hashbrown::{HashMap, HashSet};

use raymond::{Message, MessageKind, NodeId, RaymondNode, Timestamp};

use crate::error::InvariantViolation;
use crate::metrics::Counters;
use crate::topology::Tree;
use crate::trace::{TraceEmitter, TraceEvent};

/// Outcome of dispatching a single message.
#[derive(Debug, Clone, Copy)]
pub struct Dispatched {
    /// The node whose token signal fired during this dispatch, if any.
    /// The simulator resumes that node's driver into the CS.
    pub granted: Option<NodeId>,
}

/// FIFO message serializer and owner of all node state.
pub struct Mediator {
    queue: VecDeque<Message>,
    nodes: HashMap<NodeId, RaymondNode>,
    counters: Counters,
    serviced_by: HashMap<NodeId, u64>,
    done: HashSet<NodeId>,
    node_count: u32,
}

impl Mediator {
    /// Create a mediator with one node per tree position, holder pointers
    /// initialized from the tree (root at itself, others at their parent).
    pub fn new(tree: &Tree) -> Self {
        let nodes: HashMap<NodeId, RaymondNode> = tree
            .node_ids()
            .map(|id| (id, RaymondNode::new(id, tree.initial_holder(id))))
            .collect();

        Self {
            queue: VecDeque::new(),
            nodes,
            counters: Counters::new(),
            serviced_by: HashMap::new(),
            done: HashSet::new(),
            node_count: tree.size(),
        }
    }

    /// Append a message to the FIFO.
    pub fn send(&mut self, message: Message) {
        self.queue.push_back(message);
    }

    /// Whether the FIFO is empty.
    pub fn queue_is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Global counters so far.
    pub fn counters(&self) -> Counters {
        self.counters
    }

    /// Per-node completed-CS counts so far.
    pub fn serviced_by(&self) -> &HashMap<NodeId, u64> {
        &self.serviced_by
    }

    /// Look up a node's state.
    pub fn node(&self, id: NodeId) -> Option<&RaymondNode> {
        self.nodes.get(&id)
    }

    /// All node states, in unspecified order.
    pub fn nodes(&self) -> impl Iterator<Item = &RaymondNode> {
        self.nodes.values()
    }

    /// Record that a node's driver finished its request schedule.
    pub fn mark_done(&mut self, node: NodeId, now: Timestamp) -> Result<(), InvariantViolation> {
        if !self.done.insert(node) {
            return Err(InvariantViolation::new(
                now.as_millis(),
                format!("node {node} signalled done twice"),
            ));
        }
        if self.done.len() as u32 > self.node_count {
            return Err(InvariantViolation::new(
                now.as_millis(),
                format!(
                    "done set grew to {} with only {} nodes",
                    self.done.len(),
                    self.node_count
                ),
            ));
        }
        Ok(())
    }

    /// Whether every node has signalled done.
    pub fn all_done(&self) -> bool {
        self.done.len() as u32 == self.node_count
    }

    /// Pop and dispatch the next message, if any.
    ///
    /// Applies the dispatch table to the acted-on node, drains that node's
    /// outbox back into the FIFO, and reports whether the node's token
    /// signal fired.
    pub fn dispatch_next(
        &mut self,
        now: Timestamp,
        emitter: &mut dyn TraceEmitter,
    ) -> Result<Option<Dispatched>, InvariantViolation> {
        let Some(message) = self.queue.pop_front() else {
            return Ok(None);
        };

        let snd = message.sender;
        let recv = message.receiver;

        // Log first, then act.
        let trace = match message.kind {
            MessageKind::RequestCs => TraceEvent::Requested {
                time: now,
                node: snd,
                pending: self.counters.requests - self.counters.serviced,
            },
            MessageKind::PassRequest => TraceEvent::SentRequest {
                time: now,
                from: snd,
                to: recv,
            },
            MessageKind::PassToken => TraceEvent::PassedToken {
                time: now,
                from: snd,
                to: recv,
            },
            MessageKind::ExitCs => TraceEvent::Exited {
                time: now,
                node: snd,
            },
        };
        emitter.emit(&trace);

        // Driver messages act on the sender; relayed messages on the receiver.
        let target = match message.kind {
            MessageKind::RequestCs | MessageKind::ExitCs => snd,
            MessageKind::PassRequest | MessageKind::PassToken => recv,
        };
        let node = self.nodes.get_mut(&target).ok_or_else(|| {
            InvariantViolation::new(
                now.as_millis(),
                format!("message {:?} addressed to unknown node {target}", message.kind),
            )
        })?;

        match message.kind {
            MessageKind::RequestCs => {
                node.enqueue(snd);
                node.assign_privilege();
                node.make_request();
                self.counters.requests += 1;
            }
            MessageKind::PassRequest => {
                node.enqueue(snd);
                node.assign_privilege();
                node.make_request();
                self.counters.messages += 1;
            }
            MessageKind::PassToken => {
                node.receive_token();
                node.assign_privilege();
                node.make_request();
                self.counters.messages += 1;
                self.counters.token_passes += 1;
            }
            MessageKind::ExitCs => {
                node.clear_using();
                node.assign_privilege();
                node.make_request();
                self.counters.serviced += 1;
                *self.serviced_by.entry(snd).or_insert(0) += 1;
            }
        }

        let granted = node.take_token_signal().then_some(target);
        let outgoing = node.take_outgoing();
        self.queue.extend(outgoing);

        Ok(Some(Dispatched { granted }))
    }
}
