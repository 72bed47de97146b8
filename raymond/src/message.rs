//! Inter-node message types.
//!
//! The four message kinds come straight from Raymond's paper. REQUEST_CS
//! and EXIT_CS are control messages from a node's own driver and are
//! self-directed; PASS_REQUEST and PASS_TOKEN travel along tree edges.

use crate::types::NodeId;

/// The kind of an inter-node message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    /// The local driver wants the critical section.
    RequestCs,
    /// A request forwarded one hop toward the token holder.
    PassRequest,
    /// The token itself, moving one hop toward a requester.
    PassToken,
    /// The local driver left the critical section.
    ExitCs,
}

/// An immutable message record routed through the mediator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Message {
    pub sender: NodeId,
    pub receiver: NodeId,
    pub kind: MessageKind,
}

impl Message {
    /// A driver's CS request. Self-directed: the mediator enqueues the
    /// sender on its own node regardless of any holder snapshot the driver
    /// might have read.
    pub fn request_cs(node: NodeId) -> Self {
        Message {
            sender: node,
            receiver: node,
            kind: MessageKind::RequestCs,
        }
    }

    /// A request forwarded from `from` to its current holder `to`.
    pub fn pass_request(from: NodeId, to: NodeId) -> Self {
        Message {
            sender: from,
            receiver: to,
            kind: MessageKind::PassRequest,
        }
    }

    /// The token passed from `from` to the new holder `to`.
    pub fn pass_token(from: NodeId, to: NodeId) -> Self {
        Message {
            sender: from,
            receiver: to,
            kind: MessageKind::PassToken,
        }
    }

    /// A driver's CS exit notification. Self-directed like [`request_cs`].
    ///
    /// [`request_cs`]: Message::request_cs
    pub fn exit_cs(node: NodeId) -> Self {
        Message {
            sender: node,
            receiver: node,
            kind: MessageKind::ExitCs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_driver_messages_are_self_directed() {
        let n = NodeId::new(4);
        let req = Message::request_cs(n);
        assert_eq!(req.sender, req.receiver);
        assert_eq!(req.kind, MessageKind::RequestCs);

        let exit = Message::exit_cs(n);
        assert_eq!(exit.sender, exit.receiver);
        assert_eq!(exit.kind, MessageKind::ExitCs);
    }

    #[test]
    fn test_relay_messages_carry_both_ends() {
        let a = NodeId::new(2);
        let b = NodeId::new(1);
        let m = Message::pass_request(a, b);
        assert_eq!((m.sender, m.receiver), (a, b));

        let t = Message::pass_token(b, a);
        assert_eq!((t.sender, t.receiver), (b, a));
        assert_eq!(t.kind, MessageKind::PassToken);
    }
}
