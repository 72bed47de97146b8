//! Per-node state for Raymond's algorithm.
//!
//! Each node tracks four variables: the `holder` pointer (which tree
//! neighbor is on the path toward the token, or self when the node holds
//! it), a FIFO `request_queue` of pending requesters, and the `using` /
//! `asked` booleans. The three rules below are applied exclusively by the
//! mediator, one message at a time, so no per-node locking exists.
//!
//! Rules never send messages directly; they emit into the node's outbox
//! and the mediator drains it into the global FIFO after each application.

use std::collections::VecDeque;

use crate::message::Message;
use crate::signal::Signal;
use crate::types::NodeId;

/// State machine for a single node.
#[derive(Debug)]
pub struct RaymondNode {
    id: NodeId,
    holder: NodeId,
    request_queue: VecDeque<NodeId>,
    using: bool,
    asked: bool,
    token_signal: Signal,
    outbox: Vec<Message>,
}

impl RaymondNode {
    /// Create a node. `holder` is the initial holder pointer: the node's
    /// tree parent, or the node itself for the initial token holder.
    pub fn new(id: NodeId, holder: NodeId) -> Self {
        Self {
            id,
            holder,
            request_queue: VecDeque::new(),
            using: false,
            asked: false,
            token_signal: Signal::new(),
            outbox: Vec::new(),
        }
    }

    /// This node's id.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Current holder pointer.
    pub fn holder(&self) -> NodeId {
        self.holder
    }

    /// Whether this node currently holds the token.
    pub fn is_holder(&self) -> bool {
        self.holder == self.id
    }

    /// Whether this node is inside the critical section.
    pub fn is_using(&self) -> bool {
        self.using
    }

    /// Whether a PASS_REQUEST toward the holder is outstanding.
    pub fn has_asked(&self) -> bool {
        self.asked
    }

    /// Pending requesters, front first.
    pub fn queued(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.request_queue.iter().copied()
    }

    /// Append a requester to the request queue.
    pub fn enqueue(&mut self, from: NodeId) {
        self.request_queue.push_back(from);
    }

    /// Grant the privilege if this node holds an idle token and someone
    /// is waiting.
    ///
    /// Pops the front requester into `holder` and clears `asked`. If the
    /// front requester is this node itself it enters the CS (`using` set,
    /// token signal posted for the driver); otherwise the token is sent
    /// to the new holder.
    pub fn assign_privilege(&mut self) {
        if !self.is_holder() || self.using || self.request_queue.is_empty() {
            return;
        }

        // Front of the queue is always a tree neighbor or self.
        let next = self
            .request_queue
            .pop_front()
            .expect("request queue checked non-empty");
        self.holder = next;
        self.asked = false;

        if self.is_holder() {
            self.using = true;
            self.token_signal.post();
        } else {
            self.outbox.push(Message::pass_token(self.id, self.holder));
        }
    }

    /// Forward a request toward the holder if one is pending and none is
    /// already outstanding.
    ///
    /// Calling this twice with no intervening state change sends at most
    /// one PASS_REQUEST; the `asked` flag is the guard.
    pub fn make_request(&mut self) {
        if self.is_holder() || self.request_queue.is_empty() || self.asked {
            return;
        }

        self.outbox
            .push(Message::pass_request(self.id, self.holder));
        self.asked = true;
    }

    /// The token arrived: this node is now its own holder.
    pub fn receive_token(&mut self) {
        self.holder = self.id;
    }

    /// The local driver left the critical section.
    pub fn clear_using(&mut self) {
        self.using = false;
    }

    /// Drain messages emitted by the rules since the last call.
    pub fn take_outgoing(&mut self) -> Vec<Message> {
        std::mem::take(&mut self.outbox)
    }

    /// Consume the token-grant signal if the last rule application posted
    /// it. The driver may enter the CS iff this returns true.
    pub fn take_token_signal(&mut self) -> bool {
        self.token_signal.take()
    }
}
