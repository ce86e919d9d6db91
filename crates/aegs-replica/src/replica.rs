//! Replica state and the protocol steps: commit, notify, receive, ack.

use aegs_oplog::{AckTable, DeltaLog, ReplicaId, SeqNo};
use aegs_patch::{apply, diff, empty_document, is_reflected, snapshot, Delta, PatchError, PatchOp};
use parking_lot::Mutex;
use serde_json::Value;
use tracing::debug;

/// One replica of the shared document.
///
/// Owns exactly one document, one delta log and one ack table. All protocol
/// steps (`commit`, `on_notify`, `on_ack`) take the internal lock, so a
/// `Replica` can be shared across tasks and the counter/log contiguity
/// invariant holds under concurrent gossip.
///
/// The document is only ever mutated through the log-committing paths; the
/// log stays the single source of truth for replay.
pub struct Replica {
    id: ReplicaId,
    state: Mutex<ReplicaState>,
}

struct ReplicaState {
    document: Value,
    log: DeltaLog<Delta>,
    acks: AckTable,
    neighbors: Vec<ReplicaId>,
}

impl Replica {
    /// Create an empty replica: `{}` document, empty log, counter 0.
    pub fn new(id: impl Into<ReplicaId>) -> Self {
        Self {
            id: id.into(),
            state: Mutex::new(ReplicaState {
                document: empty_document(),
                log: DeltaLog::new(),
                acks: AckTable::new(),
                neighbors: Vec::new(),
            }),
        }
    }

    pub fn id(&self) -> &ReplicaId {
        &self.id
    }

    /// Snapshot of the current document.
    pub fn document(&self) -> Value {
        self.state.lock().document.clone()
    }

    /// Next free log index.
    pub fn counter(&self) -> SeqNo {
        self.state.lock().log.head()
    }

    /// Oldest retained log index.
    pub fn log_low(&self) -> SeqNo {
        self.state.lock().log.low()
    }

    /// Number of retained log entries.
    pub fn log_len(&self) -> usize {
        self.state.lock().log.len()
    }

    /// The cursor recorded for a peer.
    pub fn acked_by(&self, peer: &str) -> SeqNo {
        self.state.lock().acks.get(peer)
    }

    pub fn neighbors(&self) -> Vec<ReplicaId> {
        self.state.lock().neighbors.clone()
    }

    /// Add a neighbor, seeding its ack cursor at 0 immediately so it is
    /// counted by truncation from the very first moment.
    pub fn add_peer(&self, peer: impl Into<ReplicaId>) {
        let peer = peer.into();
        let mut state = self.state.lock();
        state.acks.register(peer.clone());
        if !state.neighbors.contains(&peer) {
            state.neighbors.push(peer);
        }
    }

    /// Commit a local mutation.
    ///
    /// The mutator runs on a working copy; the resulting change is diffed
    /// against the current document, applied, and appended to the log as
    /// one delta. Returns the log index the delta was assigned. A mutation
    /// that changes nothing still commits (an empty delta replays as a
    /// no-op).
    pub fn commit<F>(&self, mutate: F) -> Result<SeqNo, PatchError>
    where
        F: FnOnce(&mut Value),
    {
        let mut state = self.state.lock();
        let mut next = state.document.clone();
        mutate(&mut next);
        let delta = diff(&state.document, &next);
        state.document = apply(&state.document, &delta)?;
        let assigned = state.log.append(delta);
        debug!(replica = %self.id, seq = assigned, "committed local delta");
        Ok(assigned)
    }

    /// Commit a single top-level key write.
    pub fn commit_set(&self, key: impl Into<String>, value: Value) -> Result<SeqNo, PatchError> {
        let key = key.into();
        self.commit(move |doc| {
            if let Value::Object(map) = doc {
                map.insert(key, value);
            }
        })
    }

    /// Decide what a neighbor still needs, if anything.
    ///
    /// Returns `None` when the peer is already caught up. Otherwise the
    /// payload is either the flattened concatenation of all log entries in
    /// `[acked, head)`, or a full-state snapshot when that history predates
    /// the retained log (the peer's cursor fell behind a truncation).
    pub fn prepare_notify(&self, peer: &str) -> Option<(Delta, SeqNo)> {
        let state = self.state.lock();
        let head = state.log.head();
        let acked = state.acks.get(peer);
        if acked >= head {
            return None;
        }

        let delta = if state.log.is_empty() || state.log.low() > acked {
            snapshot(&state.document)
        } else {
            match state.log.slice(acked, head) {
                Ok(deltas) => deltas.into_iter().flatten().collect(),
                // the range was truncated out from under us
                Err(_) => snapshot(&state.document),
            }
        };
        Some((delta, head))
    }

    /// Handle an incoming delta push.
    ///
    /// A delta that is already reflected in the document is discarded: not
    /// replayed, not re-logged. A fresh delta is applied all-or-nothing and
    /// appended as ONE log entry, advancing the counter by one no matter
    /// how many operations it contained. Either way the returned value is
    /// the sender's counter, to be echoed back as the ack — except when
    /// application fails, in which case the error propagates and no ack
    /// must be sent.
    pub fn on_notify(
        &self,
        from: &str,
        delta: &[PatchOp],
        remote_counter: SeqNo,
    ) -> Result<SeqNo, PatchError> {
        let mut state = self.state.lock();
        debug!(replica = %self.id, peer = %from, ops = delta.len(), "received gossip delta");

        if is_reflected(&state.document, delta) {
            debug!(replica = %self.id, peer = %from, "delta already reflected, discarding");
        } else {
            state.document = apply(&state.document, delta)?;
            let assigned = state.log.append(delta.to_vec());
            debug!(replica = %self.id, peer = %from, seq = assigned, "applied gossip delta");
        }
        Ok(remote_counter)
    }

    /// Handle an acknowledgment from a peer, then garbage-collect: every
    /// log entry below the minimum cursor across all known peers has been
    /// seen by everyone and is dropped.
    pub fn on_ack(&self, peer: &str, counter: SeqNo) {
        let mut state = self.state.lock();
        state.acks.record(peer, counter);
        let min_acked = state.acks.min_acked();
        state.log.truncate_before(min_acked);
    }
}

impl std::fmt::Debug for Replica {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("Replica")
            .field("id", &self.id)
            .field("counter", &state.log.head())
            .field("log_low", &state.log.low())
            .field("neighbors", &state.neighbors)
            .finish()
    }
}
