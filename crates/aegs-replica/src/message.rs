//! Message shapes for the gossip exchange.

use aegs_oplog::{ReplicaId, SeqNo};
use aegs_patch::Delta;
use serde::{Deserialize, Serialize};

/// Messages exchanged between replicas.
///
/// These shapes are what any real transport must preserve; the operations
/// inside a `Notify` serialize to the JSON-Patch wire format.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum GossipMessage {
    /// Push of pending history: the operations the sender believes the
    /// recipient has not seen, flattened in order, plus the sender's
    /// counter at send time.
    Notify {
        from: ReplicaId,
        delta: Delta,
        counter: SeqNo,
    },
    /// Confirmation of receipt, echoing back the counter value carried by
    /// the `Notify` it answers.
    Ack { from: ReplicaId, counter: SeqNo },
}
