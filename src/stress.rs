use aegs_replica::{
    GossipCluster, GossipConfigBuilder, GossipNode, MemoryTransport, Replica, SimConfig,
};
use futures::future::join_all;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::json;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Statistics collected during a gossip stress run
#[derive(Clone, Debug)]
pub struct GossipStressStats {
    pub num_replicas: usize,
    pub commits_per_replica: usize,
    pub converged: bool,
    pub total_time: Duration,
    pub commits_per_second: f64,
    pub retained_log_entries: usize,
}

impl GossipStressStats {
    pub fn print(&self) {
        println!("\n╔════════════════════════════════════════════════════════════╗");
        println!("║              Gossip Stress Statistics                       ║");
        println!("╠════════════════════════════════════════════════════════════╣");
        println!("║  Number of Replicas:        {:>30} ║", self.num_replicas);
        println!("║  Commits per Replica:       {:>30} ║", self.commits_per_replica);
        println!("║  Converged:                 {:>30} ║", self.converged);
        println!(
            "║  Total Time:                {:>29}s ║",
            format!("{:.3}", self.total_time.as_secs_f64())
        );
        println!("║  Commits/Second:            {:>30.0} ║", self.commits_per_second);
        println!("║  Retained Log Entries:      {:>30} ║", self.retained_log_entries);
        println!("╚════════════════════════════════════════════════════════════╝");
    }
}

/// Async stress run: a full mesh of gossiping nodes over the in-memory
/// transport, concurrent random writes, then wait for convergence.
pub async fn stress_gossip_mesh(
    num_replicas: usize,
    commits_per_replica: usize,
    tick_ms: u64,
    timeout: Duration,
) -> GossipStressStats {
    println!("\n╔════════════════════════════════════════════════════════════╗");
    println!("║        Gossip Mesh Stress (Async)                          ║");
    println!(
        "║  Replicas: {} | Commits/Replica: {} | Tick: {}ms",
        num_replicas, commits_per_replica, tick_ms
    );
    println!("╚════════════════════════════════════════════════════════════╝");

    let start = Instant::now();
    let transport = Arc::new(MemoryTransport::new());
    let config = GossipConfigBuilder::new().tick_interval(tick_ms).build();

    let replicas: Vec<_> = (0..num_replicas)
        .map(|i| Arc::new(Replica::new(format!("node_{i}"))))
        .collect();
    for replica in &replicas {
        for peer in &replicas {
            if replica.id() != peer.id() {
                replica.add_peer(peer.id().clone());
            }
        }
    }

    let handles: Vec<_> = replicas
        .iter()
        .map(|replica| {
            let inbox = transport.register(replica.id().clone(), config.inbox_capacity);
            GossipNode::new(Arc::clone(replica), Arc::clone(&transport), config.clone())
                .spawn(inbox)
        })
        .collect();

    println!("\n[Phase 1/2] Committing writes...");

    let writers: Vec<_> = replicas
        .iter()
        .enumerate()
        .map(|(idx, replica)| {
            let replica = Arc::clone(replica);
            tokio::spawn(async move {
                let mut rng = StdRng::from_entropy();
                for i in 0..commits_per_replica {
                    let value = rng.gen_range(0..1_000_000);
                    replica
                        .commit_set(format!("node_{idx}_key_{i}"), json!(value))
                        .expect("local commit cannot fail");
                    if i % 16 == 0 {
                        tokio::task::yield_now().await;
                    }
                }
            })
        })
        .collect();
    join_all(writers).await;

    println!("[Phase 1/2] ✓ Completed");
    println!("[Phase 2/2] Gossiping until convergence...");

    let expected_keys = num_replicas * commits_per_replica;
    let deadline = Instant::now() + timeout;
    let mut converged = false;
    while Instant::now() < deadline {
        let first = replicas[0].document();
        let key_count = first.as_object().map(|map| map.len()).unwrap_or(0);
        if key_count == expected_keys && replicas.iter().all(|r| r.document() == first) {
            converged = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }

    println!("[Phase 2/2] ✓ Completed");

    let retained_log_entries = replicas.iter().map(|r| r.log_len()).sum();
    for handle in handles {
        handle.shutdown();
    }

    let total_time = start.elapsed();
    GossipStressStats {
        num_replicas,
        commits_per_replica,
        converged,
        total_time,
        commits_per_second: expected_keys as f64 / total_time.as_secs_f64(),
        retained_log_entries,
    }
}

/// Deterministic scaling analysis over the simulator: how many full sync
/// rounds a cluster needs as it grows.
pub fn sim_scaling_analysis(max_replicas: usize, step_size: usize) {
    println!("\n╔════════════════════════════════════════════════════════════╗");
    println!("║     Scaling Analysis - Sync Rounds vs Cluster Size         ║");
    println!("╚════════════════════════════════════════════════════════════╝");

    let mut size = step_size.max(2);
    while size <= max_replicas {
        let mut cluster = GossipCluster::new(size, SimConfig::default());
        for i in 0..size {
            cluster
                .replica(i)
                .commit_set(format!("key_{i}"), json!(i))
                .expect("local commit cannot fail");
        }

        let start = Instant::now();
        let mut rounds = 0;
        while !cluster.is_converged() && rounds < 1000 {
            cluster.full_sync_round();
            rounds += 1;
        }

        println!(
            "  {:>3} replicas: converged in {} rounds ({:.2?})",
            size,
            rounds,
            start.elapsed()
        );
        size += step_size;
    }
}
