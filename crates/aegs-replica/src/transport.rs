//! Transport abstraction for gossip messages.

use crate::message::GossipMessage;
use aegs_oplog::ReplicaId;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;

/// Transport-level failure. A failed send is a dropped gossip round: the
/// next random tick retries implicitly, so no bookkeeping is kept.
#[derive(Error, Debug, Clone)]
pub enum TransportError {
    #[error("peer not found: {0}")]
    PeerNotFound(ReplicaId),

    #[error("send failed: {0}")]
    SendFailed(String),
}

/// Fire-and-forget message delivery addressed by replica id.
///
/// Replicas never hold references to each other, only ids; everything a
/// replica sends goes through this seam, so swapping in a real network
/// layer does not touch the protocol.
#[async_trait]
pub trait GossipTransport: Send + Sync + 'static {
    async fn send(&self, to: &ReplicaId, message: GossipMessage) -> Result<(), TransportError>;
}

type SharedInboxes = Arc<RwLock<HashMap<ReplicaId, mpsc::Sender<GossipMessage>>>>;

/// In-process transport for tests and simulation: a shared router of
/// per-replica mpsc inboxes.
#[derive(Clone, Default)]
pub struct MemoryTransport {
    inboxes: SharedInboxes,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a replica and hand back its inbox.
    pub fn register(&self, id: impl Into<ReplicaId>, capacity: usize) -> mpsc::Receiver<GossipMessage> {
        let (tx, rx) = mpsc::channel(capacity);
        self.inboxes.write().insert(id.into(), tx);
        rx
    }

    /// Drop a replica's inbox; subsequent sends to it fail.
    pub fn unregister(&self, id: &str) {
        self.inboxes.write().remove(id);
    }

    pub fn registered(&self) -> Vec<ReplicaId> {
        self.inboxes.read().keys().cloned().collect()
    }
}

#[async_trait]
impl GossipTransport for MemoryTransport {
    async fn send(&self, to: &ReplicaId, message: GossipMessage) -> Result<(), TransportError> {
        let tx = { self.inboxes.read().get(to).cloned() };
        match tx {
            Some(tx) => tx
                .send(message)
                .await
                .map_err(|e| TransportError::SendFailed(e.to_string())),
            None => Err(TransportError::PeerNotFound(to.clone())),
        }
    }
}
