//! AEGS Replica - anti-entropy gossip protocol
//!
//! Each replica holds a JSON document, a delta log and per-peer ack
//! cursors, and periodically pushes pending history to one random
//! neighbor:
//!
//! ```text
//! On local commit m:
//!   d = diff(X, m(X))        // compute delta
//!   X = apply(X, d)          // apply locally
//!   log[counter++] = d       // remember for resending
//!
//! On tick (every interval, uniform-random neighbor j):
//!   if acked[j] < counter:
//!     send log[acked[j]..counter] flattened   // or a snapshot if truncated
//!
//! On receive (d, c) from peer i:
//!   if not reflected(X, d):
//!     X = apply(X, d)        // all-or-nothing
//!     log[counter++] = d     // one entry, however many ops
//!   send ack(c) to i
//!
//! On ack c from peer j:
//!   acked[j] = max(acked[j], c)
//!   truncate log below min(acked)
//! ```
//!
//! Deltas are ordered JSON-Patch operation sequences ([`aegs_patch`]); the
//! log and cursors live in [`aegs_oplog`]. Replicas address each other by
//! id over a transport seam — an in-memory implementation and a
//! deterministic fault-injecting simulator are provided.

pub mod config;
pub mod message;
pub mod node;
pub mod replica;
pub mod sim;
pub mod transport;

// Re-exports for convenience
pub use config::{GossipConfig, GossipConfigBuilder};
pub use message::GossipMessage;
pub use node::{GossipHandle, GossipNode};
pub use replica::Replica;
pub use sim::{GossipCluster, SimConfig, SimNetwork};
pub use transport::{GossipTransport, MemoryTransport, TransportError};

// Re-export the vocabulary types from the underlying crates
pub use aegs_oplog::{ReplicaId, SeqNo};
pub use aegs_patch::{Delta, PatchError, PatchOp};
