//! Async gossip node: periodic ticks plus an inbox dispatcher per replica.

use crate::config::GossipConfig;
use crate::message::GossipMessage;
use crate::replica::Replica;
use crate::transport::GossipTransport;
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Wires a [`Replica`] to a transport and drives it.
///
/// Spawning yields two tasks: a ticker that contacts one uniformly random
/// neighbor per tick, and a dispatcher that serializes incoming messages
/// into the replica. The replica lock is released before every send, so a
/// slow or failed delivery to one neighbor never stalls ticks to others.
pub struct GossipNode<T: GossipTransport> {
    replica: Arc<Replica>,
    transport: Arc<T>,
    config: GossipConfig,
}

impl<T: GossipTransport> GossipNode<T> {
    pub fn new(replica: Arc<Replica>, transport: Arc<T>, config: GossipConfig) -> Self {
        Self {
            replica,
            transport,
            config,
        }
    }

    pub fn replica(&self) -> Arc<Replica> {
        Arc::clone(&self.replica)
    }

    pub fn config(&self) -> &GossipConfig {
        &self.config
    }

    /// Start the tick and dispatch tasks. `inbox` is this replica's
    /// receiving end on the transport.
    pub fn spawn(self, inbox: mpsc::Receiver<GossipMessage>) -> GossipHandle {
        let period = Duration::from_millis(self.config.tick_interval_ms);
        let ticker = tokio::spawn(tick_loop(
            Arc::clone(&self.replica),
            Arc::clone(&self.transport),
            period,
        ));
        let dispatcher = tokio::spawn(dispatch_loop(self.replica, self.transport, inbox));
        GossipHandle { ticker, dispatcher }
    }
}

async fn tick_loop<T: GossipTransport>(replica: Arc<Replica>, transport: Arc<T>, period: Duration) {
    let mut ticks = tokio::time::interval(period);
    loop {
        ticks.tick().await;

        let neighbors = replica.neighbors();
        if neighbors.is_empty() {
            continue;
        }
        let target = {
            let mut rng = rand::thread_rng();
            neighbors[rng.gen_range(0..neighbors.len())].clone()
        };

        let Some((delta, counter)) = replica.prepare_notify(&target) else {
            continue;
        };
        let message = GossipMessage::Notify {
            from: replica.id().clone(),
            delta,
            counter,
        };
        if let Err(err) = transport.send(&target, message).await {
            debug!(replica = %replica.id(), peer = %target, %err, "gossip round dropped");
        }
    }
}

async fn dispatch_loop<T: GossipTransport>(
    replica: Arc<Replica>,
    transport: Arc<T>,
    mut inbox: mpsc::Receiver<GossipMessage>,
) {
    while let Some(message) = inbox.recv().await {
        match message {
            GossipMessage::Notify {
                from,
                delta,
                counter,
            } => match replica.on_notify(&from, &delta, counter) {
                Ok(ack) => {
                    let reply = GossipMessage::Ack {
                        from: replica.id().clone(),
                        counter: ack,
                    };
                    if let Err(err) = transport.send(&from, reply).await {
                        debug!(replica = %replica.id(), peer = %from, %err, "ack dropped");
                    }
                }
                Err(err) => {
                    warn!(replica = %replica.id(), peer = %from, %err, "dropping undeliverable delta");
                }
            },
            GossipMessage::Ack { from, counter } => replica.on_ack(&from, counter),
        }
    }
}

/// Handles to a node's running tasks. Shutting down cancels the tick timer
/// and the dispatcher; no in-flight exchange needs rollback since every
/// protocol step is applied transactionally.
pub struct GossipHandle {
    ticker: JoinHandle<()>,
    dispatcher: JoinHandle<()>,
}

impl GossipHandle {
    pub fn shutdown(self) {
        self.ticker.abort();
        self.dispatcher.abort();
    }
}
