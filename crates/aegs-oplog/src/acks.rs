//! Per-peer acknowledgment cursors.

use crate::log::SeqNo;
use std::collections::BTreeMap;

/// Replica identifier.
pub type ReplicaId = String;

/// Tracks, per peer, the highest counter value that peer has confirmed
/// receiving. Cursors only ever move forward.
#[derive(Clone, Debug, Default)]
pub struct AckTable {
    acked: BTreeMap<ReplicaId, SeqNo>,
}

impl AckTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a peer's cursor at 0 if it is not tracked yet.
    ///
    /// Registration must happen the moment a neighbor is added: an
    /// untracked peer would otherwise not hold truncation back for history
    /// it has never seen.
    pub fn register(&mut self, peer: impl Into<ReplicaId>) {
        self.acked.entry(peer.into()).or_insert(0);
    }

    /// Record an acknowledgment. Monotonic: a stale ack arriving after a
    /// newer one never moves the cursor backward. Unknown peers are seeded
    /// at 0 first.
    pub fn record(&mut self, peer: &str, seq: SeqNo) {
        let cursor = self.acked.entry(peer.to_string()).or_insert(0);
        *cursor = (*cursor).max(seq);
    }

    /// The cursor for a peer (0 if never acked).
    pub fn get(&self, peer: &str) -> SeqNo {
        self.acked.get(peer).copied().unwrap_or(0)
    }

    /// Minimum cursor across all tracked peers; everything below this has
    /// been seen by everyone and is safe to truncate. 0 when no peers are
    /// tracked.
    pub fn min_acked(&self) -> SeqNo {
        self.acked.values().copied().min().unwrap_or(0)
    }

    pub fn peers(&self) -> impl Iterator<Item = &ReplicaId> {
        self.acked.keys()
    }

    pub fn len(&self) -> usize {
        self.acked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.acked.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_seeds_zero() {
        let mut table = AckTable::new();
        table.register("peer1");
        assert_eq!(table.get("peer1"), 0);
        assert_eq!(table.get("stranger"), 0);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_record_is_monotonic() {
        let mut table = AckTable::new();
        table.register("peer1");

        table.record("peer1", 5);
        assert_eq!(table.get("peer1"), 5);

        // stale ack after a newer one must not regress
        table.record("peer1", 3);
        assert_eq!(table.get("peer1"), 5);

        table.record("peer1", 8);
        assert_eq!(table.get("peer1"), 8);
    }

    #[test]
    fn test_record_for_unknown_peer_registers_it() {
        let mut table = AckTable::new();
        table.record("late", 4);
        assert_eq!(table.get("late"), 4);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_min_acked() {
        let mut table = AckTable::new();
        assert_eq!(table.min_acked(), 0);

        table.register("peer1");
        table.register("peer2");
        table.record("peer1", 7);
        // peer2 still at 0 pins the minimum
        assert_eq!(table.min_acked(), 0);

        table.record("peer2", 3);
        assert_eq!(table.min_acked(), 3);

        table.record("peer2", 9);
        assert_eq!(table.min_acked(), 7);
    }
}
