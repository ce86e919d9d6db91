//! End-to-end gossip over the async in-memory transport.

use aegs_replica::{GossipConfigBuilder, GossipNode, MemoryTransport, Replica};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

async fn wait_until(
    mut condition: impl FnMut() -> bool,
    timeout: Duration,
    what: &str,
) {
    let deadline = tokio::time::Instant::now() + timeout;
    while !condition() {
        assert!(tokio::time::Instant::now() < deadline, "timed out: {what}");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

fn spawn_mesh(
    ids: &[&str],
    transport: &Arc<MemoryTransport>,
    tick_ms: u64,
) -> (Vec<Arc<Replica>>, Vec<aegs_replica::GossipHandle>) {
    let config = GossipConfigBuilder::new().tick_interval(tick_ms).build();
    let replicas: Vec<_> = ids.iter().map(|id| Arc::new(Replica::new(*id))).collect();
    for replica in &replicas {
        for id in ids {
            if replica.id() != id {
                replica.add_peer(*id);
            }
        }
    }
    let handles = replicas
        .iter()
        .map(|replica| {
            let inbox = transport.register(replica.id().clone(), config.inbox_capacity);
            GossipNode::new(Arc::clone(replica), Arc::clone(transport), config.clone())
                .spawn(inbox)
        })
        .collect();
    (replicas, handles)
}

fn all_equal(replicas: &[Arc<Replica>], expected: &Value) -> bool {
    replicas.iter().all(|r| &r.document() == expected)
}

#[tokio::test]
async fn test_two_nodes_converge() {
    let transport = Arc::new(MemoryTransport::new());
    let (replicas, handles) = spawn_mesh(&["s1", "s2"], &transport, 10);

    replicas[0].commit_set("foo", json!("bar")).unwrap();
    replicas[1].commit_set("fizz", json!("buzz")).unwrap();

    let expected = json!({"foo": "bar", "fizz": "buzz"});
    wait_until(
        || all_equal(&replicas, &expected),
        Duration::from_secs(5),
        "documents converge",
    )
    .await;

    for handle in handles {
        handle.shutdown();
    }
}

#[tokio::test]
async fn test_mesh_converges_and_truncates() {
    let transport = Arc::new(MemoryTransport::new());
    let ids = ["n0", "n1", "n2", "n3"];
    let (replicas, handles) = spawn_mesh(&ids, &transport, 5);

    for (i, replica) in replicas.iter().enumerate() {
        replica.commit_set(format!("key_{i}"), json!(i)).unwrap();
    }

    let expected = json!({"key_0": 0, "key_1": 1, "key_2": 2, "key_3": 3});
    wait_until(
        || all_equal(&replicas, &expected),
        Duration::from_secs(10),
        "documents converge",
    )
    .await;

    // with no further writes, acks eventually drain every log
    let drained = {
        let replicas = replicas.clone();
        move || replicas.iter().all(|r| r.log_len() == 0)
    };
    wait_until(drained, Duration::from_secs(10), "logs drain").await;

    for handle in handles {
        handle.shutdown();
    }
}

#[tokio::test]
async fn test_unreachable_peer_does_not_stall_gossip() {
    let transport = Arc::new(MemoryTransport::new());
    let config = GossipConfigBuilder::new().tick_interval(5).build();

    // "ghost" is a neighbor that never registered on the transport;
    // deliveries to it fail at the transport layer
    let a = Arc::new(Replica::new("a"));
    let b = Arc::new(Replica::new("b"));
    a.add_peer("b");
    a.add_peer("ghost");
    b.add_peer("a");

    let inbox_a = transport.register("a", config.inbox_capacity);
    let inbox_b = transport.register("b", config.inbox_capacity);
    let handle_a =
        GossipNode::new(Arc::clone(&a), Arc::clone(&transport), config.clone()).spawn(inbox_a);
    let handle_b =
        GossipNode::new(Arc::clone(&b), Arc::clone(&transport), config.clone()).spawn(inbox_b);

    a.commit_set("foo", json!("bar")).unwrap();

    // b still converges despite roughly half of a's ticks going nowhere
    wait_until(
        || b.document() == json!({"foo": "bar"}),
        Duration::from_secs(10),
        "b converges past the unreachable peer",
    )
    .await;

    // the ghost's cursor stays at 0 and pins the log
    assert_eq!(a.acked_by("ghost"), 0);
    assert!(a.log_len() > 0);

    handle_a.shutdown();
    handle_b.shutdown();
}
