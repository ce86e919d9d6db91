//! AEGS Oplog - replication log machinery
//!
//! The bookkeeping half of the Lazulite gossip store:
//!
//! - [`DeltaLog`]: an ordered log of deltas addressed by a monotonic
//!   counter, contiguous over `[low, head)` and truncatable only from the
//!   front
//! - [`AckTable`]: per-peer cursors recording how far each peer has
//!   confirmed receipt, driving log truncation via the global minimum
//!
//! The log is generic over the delta type; the gossip layer stores ordered
//! JSON-Patch operation sequences in it.

pub mod acks;
pub mod error;
pub mod log;

// Re-export main types for convenience
pub use acks::{AckTable, ReplicaId};
pub use error::LogError;
pub use log::{DeltaLog, SeqNo};
