//! Convergence tests for the gossip protocol
//!
//! These drive whole clusters through the deterministic simulator and
//! verify that documents converge under clean, lossy, duplicating and
//! chaotic network conditions, and that the protocol's bookkeeping
//! (acks, truncation, snapshot fallback) behaves.

use aegs_replica::{GossipCluster, Replica, SimConfig};
use serde_json::json;

#[test]
fn test_two_replicas_exchange_writes() {
    let mut cluster = GossipCluster::new(2, SimConfig::default());

    cluster.replica(0).commit_set("foo", json!("bar")).unwrap();
    cluster.replica(1).commit_set("fizz", json!("buzz")).unwrap();

    let mut rounds = 0;
    while !cluster.is_converged() && rounds < 20 {
        cluster.full_sync_round();
        rounds += 1;
    }

    let expected = json!({"foo": "bar", "fizz": "buzz"});
    assert_eq!(cluster.replica(0).document(), expected);
    assert_eq!(cluster.replica(1).document(), expected);
}

#[test]
fn test_convergence_with_nested_documents() {
    let mut cluster = GossipCluster::new(3, SimConfig::default());

    cluster
        .commit(0, |doc| {
            doc["user"] = json!({"name": "ada", "tags": ["math"]});
        })
        .unwrap();
    cluster
        .commit(1, |doc| {
            doc["settings"] = json!({"theme": "dark"});
        })
        .unwrap();
    cluster
        .commit(2, |doc| {
            doc["count"] = json!(3);
        })
        .unwrap();

    let mut rounds = 0;
    while !cluster.is_converged() && rounds < 30 {
        cluster.full_sync_round();
        rounds += 1;
    }

    assert!(cluster.is_converged(), "no convergence after {rounds} rounds");
    let doc = cluster.replica(0).document();
    assert_eq!(doc["user"]["name"], json!("ada"));
    assert_eq!(doc["settings"]["theme"], json!("dark"));
    assert_eq!(doc["count"], json!(3));
}

#[test]
fn test_convergence_under_loss() {
    let mut cluster = GossipCluster::new(4, SimConfig::lossy(0.5));

    for i in 0..4 {
        cluster
            .replica(i)
            .commit_set(format!("key_{i}"), json!(i))
            .unwrap();
    }

    let mut rounds = 0;
    while !cluster.is_converged() && rounds < 100 {
        cluster.full_sync_round();
        cluster.retransmit_and_process();
        rounds += 1;
    }

    assert!(cluster.is_converged(), "no convergence after {rounds} rounds");
    for i in 0..4 {
        for j in 0..4 {
            assert_eq!(cluster.replica(i).document()[format!("key_{j}")], json!(j));
        }
    }
}

#[test]
fn test_convergence_with_duplicates() {
    let mut cluster = GossipCluster::new(3, SimConfig::with_dups(0.8));

    for i in 0..3 {
        cluster
            .replica(i)
            .commit_set(format!("key_{i}"), json!(i * 100))
            .unwrap();
    }

    let mut rounds = 0;
    while !cluster.is_converged() && rounds < 50 {
        cluster.full_sync_round();
        rounds += 1;
    }

    assert!(cluster.is_converged());
}

#[test]
fn test_convergence_chaotic_network() {
    let mut cluster = GossipCluster::new(4, SimConfig::chaotic());

    for i in 0..4 {
        for j in 0..5 {
            cluster
                .replica(i)
                .commit_set(format!("key_{i}_{j}"), json!(i * 10 + j))
                .unwrap();
        }
    }

    let mut rounds = 0;
    while !cluster.is_converged() && rounds < 200 {
        cluster.full_sync_round();
        cluster.retransmit_and_process();
        rounds += 1;
    }

    assert!(cluster.is_converged(), "no convergence after {rounds} rounds");
    let doc = cluster.replica(0).document();
    for i in 0..4 {
        for j in 0..5 {
            assert_eq!(doc[format!("key_{i}_{j}")], json!(i * 10 + j));
        }
    }
}

#[test]
fn test_duplicate_delivery_is_idempotent() {
    let mut cluster = GossipCluster::new(2, SimConfig::default());
    cluster.replica(0).commit_set("answer", json!(42)).unwrap();

    cluster.full_sync_round();
    let doc_after_one = cluster.replica(1).document();
    let counter_after_one = cluster.replica(1).counter();

    // many duplicate pushes of the same (now stale) history
    for _ in 0..10 {
        cluster.full_sync_round();
    }

    assert_eq!(cluster.replica(1).document(), doc_after_one);
    assert_eq!(cluster.replica(1).counter(), counter_after_one);
}

#[test]
fn test_acks_drain_fully_acknowledged_logs() {
    let mut cluster = GossipCluster::new(2, SimConfig::default());
    for i in 0..5 {
        cluster
            .replica(0)
            .commit_set(format!("key_{i}"), json!(i))
            .unwrap();
    }

    let mut rounds = 0;
    while (cluster.replica(0).log_len() > 0 || !cluster.is_converged()) && rounds < 20 {
        cluster.full_sync_round();
        rounds += 1;
    }

    // everything acked by the only peer, so the whole prefix is gone
    assert_eq!(cluster.replica(0).log_len(), 0);
    assert_eq!(cluster.replica(0).log_low(), cluster.replica(0).counter());
}

#[test]
fn test_snapshot_to_peer_behind_truncated_log() {
    // A's history gets truncated while B has acked nothing; B must then
    // receive a full snapshot rather than an error.
    let a = Replica::new("a");
    a.add_peer("c");
    a.commit_set("foo", json!("bar")).unwrap();
    a.commit_set("n", json!([1, 2])).unwrap();

    // the only known peer acks everything, so the log drains
    a.on_ack("c", 2);
    assert_eq!(a.log_low(), 2);
    assert_eq!(a.log_len(), 0);

    // a newcomer with cursor 0 behind the truncation gets the snapshot
    a.add_peer("b");
    let b = Replica::new("b");
    let (delta, counter) = a.prepare_notify("b").expect("b is behind, must be notified");
    let ack = b.on_notify("a", &delta, counter).unwrap();

    assert_eq!(ack, 2);
    assert_eq!(b.document(), json!({"foo": "bar", "n": [1, 2]}));
}

#[test]
fn test_writes_after_convergence_propagate() {
    let mut cluster = GossipCluster::new(3, SimConfig::default());
    cluster.replica(0).commit_set("seed", json!("value")).unwrap();

    let mut rounds = 0;
    while !cluster.is_converged() && rounds < 20 {
        cluster.full_sync_round();
        rounds += 1;
    }

    // further writes keep flowing after convergence
    cluster.replica(2).commit_set("late", json!(true)).unwrap();
    let mut rounds = 0;
    while !cluster.is_converged() && rounds < 20 {
        cluster.full_sync_round();
        rounds += 1;
    }

    let expected = json!({"seed": "value", "late": true});
    for i in 0..3 {
        assert_eq!(cluster.replica(i).document(), expected);
    }
}
