//! Deterministic gossip simulation for convergence testing.
//!
//! Runs the full notify/ack exchange through an in-memory message queue
//! that can lose, duplicate and reorder deliveries, without a runtime or
//! timers. Ticks are explicit, randomness comes from a seeded LCG, so
//! every run is reproducible.

use crate::message::GossipMessage;
use crate::replica::Replica;
use aegs_oplog::{ReplicaId, SeqNo};
use aegs_patch::PatchError;
use serde_json::Value;
use std::collections::VecDeque;
use tracing::warn;

/// Fault configuration for the simulated network.
#[derive(Clone, Debug)]
pub struct SimConfig {
    /// Probability of message loss (0.0 - 1.0)
    pub loss_rate: f64,
    /// Probability of message duplication (0.0 - 1.0)
    pub dup_rate: f64,
    /// Probability of message reordering (0.0 - 1.0)
    pub reorder_rate: f64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            loss_rate: 0.0,
            dup_rate: 0.0,
            reorder_rate: 0.0,
        }
    }
}

impl SimConfig {
    /// A network that drops messages.
    pub fn lossy(loss_rate: f64) -> Self {
        Self {
            loss_rate,
            ..Default::default()
        }
    }

    /// A network that duplicates messages.
    pub fn with_dups(dup_rate: f64) -> Self {
        Self {
            dup_rate,
            ..Default::default()
        }
    }

    /// A network with all faults at once.
    pub fn chaotic() -> Self {
        Self {
            loss_rate: 0.1,
            dup_rate: 0.2,
            reorder_rate: 0.3,
        }
    }
}

/// Simulated message queue with configurable faults.
#[derive(Debug)]
pub struct SimNetwork {
    in_flight: VecDeque<(ReplicaId, GossipMessage)>,
    lost: Vec<(ReplicaId, GossipMessage)>,
    config: SimConfig,
    rng_state: u64,
}

impl SimNetwork {
    pub fn new(config: SimConfig) -> Self {
        Self::with_seed(config, 12345)
    }

    pub fn with_seed(config: SimConfig, seed: u64) -> Self {
        Self {
            in_flight: VecDeque::new(),
            lost: Vec::new(),
            config,
            rng_state: seed,
        }
    }

    /// Simple LCG, good enough for fault injection.
    fn next_random(&mut self) -> f64 {
        self.rng_state = self.rng_state.wrapping_mul(1103515245).wrapping_add(12345);
        ((self.rng_state >> 16) & 0x7fff) as f64 / 32768.0
    }

    fn next_index(&mut self, bound: usize) -> usize {
        ((self.next_random() * bound as f64) as usize).min(bound.saturating_sub(1))
    }

    /// Enqueue a message for delivery, subject to the fault config.
    pub fn send(&mut self, to: ReplicaId, message: GossipMessage) {
        if self.next_random() < self.config.loss_rate {
            self.lost.push((to, message));
            return;
        }

        if self.next_random() < self.config.dup_rate {
            self.in_flight.push_back((to.clone(), message.clone()));
        }

        if self.next_random() < self.config.reorder_rate && !self.in_flight.is_empty() {
            let position = self.next_index(self.in_flight.len());
            self.in_flight.push_back((to, message));
            let last = self.in_flight.len() - 1;
            self.in_flight.swap(position, last);
        } else {
            self.in_flight.push_back((to, message));
        }
    }

    /// Take the next deliverable message, if any.
    pub fn receive(&mut self) -> Option<(ReplicaId, GossipMessage)> {
        self.in_flight.pop_front()
    }

    /// Put lost messages back in flight (simulates the next tick resending).
    pub fn retransmit_lost(&mut self) {
        for envelope in self.lost.drain(..) {
            self.in_flight.push_back(envelope);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.in_flight.is_empty()
    }

    pub fn in_flight_count(&self) -> usize {
        self.in_flight.len()
    }

    pub fn lost_count(&self) -> usize {
        self.lost.len()
    }
}

/// A cluster of replicas gossiping over a [`SimNetwork`].
#[derive(Debug)]
pub struct GossipCluster {
    replicas: Vec<Replica>,
    network: SimNetwork,
}

impl GossipCluster {
    /// Create `n` fully meshed replicas named `replica_0..replica_n`.
    pub fn new(n: usize, config: SimConfig) -> Self {
        let replicas: Vec<_> = (0..n)
            .map(|i| Replica::new(format!("replica_{i}")))
            .collect();
        for (i, replica) in replicas.iter().enumerate() {
            for (j, peer) in replicas.iter().enumerate() {
                if i != j {
                    replica.add_peer(peer.id().clone());
                }
            }
        }
        Self {
            replicas,
            network: SimNetwork::new(config),
        }
    }

    pub fn replica(&self, idx: usize) -> &Replica {
        &self.replicas[idx]
    }

    pub fn len(&self) -> usize {
        self.replicas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.replicas.is_empty()
    }

    /// Commit a mutation on one replica.
    pub fn commit<F>(&self, idx: usize, mutate: F) -> Result<SeqNo, PatchError>
    where
        F: FnOnce(&mut Value),
    {
        self.replicas[idx].commit(mutate)
    }

    /// One gossip push from `from_idx` to `to_idx` (nothing is enqueued if
    /// the target is already caught up).
    pub fn initiate_gossip(&mut self, from_idx: usize, to_idx: usize) {
        let to_id = self.replicas[to_idx].id().clone();
        let from = &self.replicas[from_idx];
        if let Some((delta, counter)) = from.prepare_notify(&to_id) {
            let message = GossipMessage::Notify {
                from: from.id().clone(),
                delta,
                counter,
            };
            self.network.send(to_id, message);
        }
    }

    /// One timer tick for `from_idx`: push to one random neighbor.
    pub fn random_tick(&mut self, from_idx: usize) {
        let neighbors = self.replicas[from_idx].neighbors();
        if neighbors.is_empty() {
            return;
        }
        let target = self.network.next_index(neighbors.len());
        let Some(to_idx) = self
            .replicas
            .iter()
            .position(|r| r.id() == &neighbors[target])
        else {
            // a neighbor outside the cluster; delivery would just fail
            return;
        };
        self.initiate_gossip(from_idx, to_idx);
    }

    /// Deliver the next in-flight message. Returns false when the network
    /// is drained.
    pub fn process_one(&mut self) -> bool {
        let Some((to, message)) = self.network.receive() else {
            return false;
        };
        let Some(idx) = self.replicas.iter().position(|r| r.id() == &to) else {
            return true;
        };
        match message {
            GossipMessage::Notify {
                from,
                delta,
                counter,
            } => match self.replicas[idx].on_notify(&from, &delta, counter) {
                Ok(ack) => {
                    let reply = GossipMessage::Ack { from: to, counter: ack };
                    self.network.send(from, reply);
                }
                Err(err) => {
                    warn!(replica = %to, peer = %from, %err, "dropping undeliverable delta");
                }
            },
            GossipMessage::Ack { from, counter } => {
                self.replicas[idx].on_ack(&from, counter);
            }
        }
        true
    }

    /// Deliver until the network is empty.
    pub fn drain(&mut self) {
        while self.process_one() {}
    }

    /// Every replica pushes to every other replica, then the network is
    /// drained.
    pub fn full_sync_round(&mut self) {
        let n = self.replicas.len();
        for from_idx in 0..n {
            for to_idx in 0..n {
                if from_idx != to_idx {
                    self.initiate_gossip(from_idx, to_idx);
                }
            }
        }
        self.drain();
    }

    /// Push from one replica to all others.
    pub fn broadcast(&mut self, from_idx: usize) {
        let n = self.replicas.len();
        for to_idx in 0..n {
            if from_idx != to_idx {
                self.initiate_gossip(from_idx, to_idx);
            }
        }
    }

    /// Re-send lost messages and deliver everything.
    pub fn retransmit_and_process(&mut self) {
        self.network.retransmit_lost();
        self.drain();
    }

    /// All documents structurally equal?
    pub fn is_converged(&self) -> bool {
        if self.replicas.len() < 2 {
            return true;
        }
        let first = self.replicas[0].document();
        self.replicas.iter().skip(1).all(|r| r.document() == first)
    }

    pub fn network(&self) -> &SimNetwork {
        &self.network
    }
}
