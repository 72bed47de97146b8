//! raymond - Per-node state machine for Raymond's tree-based distributed
//! mutual exclusion (ACM TOCS 7(1), 1989).
//!
//! This crate holds the protocol logic only: node state, the three rules
//! (`assign_privilege`, `make_request`, `enqueue`), and the message types
//! that travel between nodes. Driving the protocol — workload generation,
//! message serialization, topology, statistics — lives in the `raysim`
//! simulator crate.
//!
//! # Protocol sketch
//!
//! Nodes form an unrooted spanning tree. Each node keeps a `holder`
//! pointer naming the neighbor on the path toward the single token (or
//! itself when it holds the token) and a FIFO queue of pending requests.
//! A request travels hop by hop toward the holder, suppressed by the
//! `asked` flag so each node has at most one request outstanding; the
//! token travels back along the same edges, and the tree itself never
//! changes — only the direction of the `holder` pointers does.
//!
//! # Module structure
//!
//! - [`types`] - `NodeId`
//! - [`time`] - virtual `Timestamp` / `Duration`
//! - [`message`] - `Message` and `MessageKind`
//! - [`node`] - `RaymondNode` and the protocol rules
//! - [`signal`] - one-shot driver rendezvous

pub mod message;
pub mod node;
pub mod signal;
pub mod time;
pub mod types;

// Re-export main types at crate root
pub use message::{Message, MessageKind};
pub use node::RaymondNode;
pub use signal::Signal;
pub use time::{Duration, Timestamp};
pub use types::NodeId;
