use std::sync::Arc;
use std::time::Duration;

use aegs_replica::{GossipConfigBuilder, GossipNode, MemoryTransport, Replica};
use serde_json::json;
use stress::{sim_scaling_analysis, stress_gossip_mesh};

pub mod stress;

fn main() {
    let rt = tokio::runtime::Runtime::new().unwrap();
    rt.block_on(async_main());
}

async fn async_main() {
    println!("\n╔════════════════════════════════════════════════════════════╗");
    println!("║            TWO-REPLICA GOSSIP DEMO                         ║");
    println!("╚════════════════════════════════════════════════════════════╝");
    demo_pair().await;

    println!("\n╔════════════════════════════════════════════════════════════╗");
    println!("║            ASYNC STRESS RUNS                               ║");
    println!("╚════════════════════════════════════════════════════════════╝");

    let stats = stress_gossip_mesh(4, 50, 5, Duration::from_secs(30)).await;
    stats.print();

    let stats = stress_gossip_mesh(10, 100, 5, Duration::from_secs(60)).await;
    stats.print();

    println!("\n╔════════════════════════════════════════════════════════════╗");
    println!("║            SCALING ANALYSIS (Simulator)                    ║");
    println!("╚════════════════════════════════════════════════════════════╝");
    sim_scaling_analysis(20, 4);

    println!("\n✓ All runs completed successfully!");
}

/// The canonical scenario: two mutual neighbors each commit one key and
/// gossip until both documents hold both keys.
async fn demo_pair() {
    let transport = Arc::new(MemoryTransport::new());
    let config = GossipConfigBuilder::new().tick_interval(50).build();

    let s1 = Arc::new(Replica::new("s1"));
    let s2 = Arc::new(Replica::new("s2"));
    s1.add_peer("s2");
    s2.add_peer("s1");

    let inbox_1 = transport.register("s1", config.inbox_capacity);
    let inbox_2 = transport.register("s2", config.inbox_capacity);
    let handle_1 =
        GossipNode::new(Arc::clone(&s1), Arc::clone(&transport), config.clone()).spawn(inbox_1);
    let handle_2 =
        GossipNode::new(Arc::clone(&s2), Arc::clone(&transport), config.clone()).spawn(inbox_2);

    s1.commit_set("foo", json!("bar")).unwrap();
    s2.commit_set("fizz", json!("buzz")).unwrap();

    let expected = json!({"foo": "bar", "fizz": "buzz"});
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while (s1.document() != expected || s2.document() != expected)
        && tokio::time::Instant::now() < deadline
    {
        tokio::time::sleep(Duration::from_millis(25)).await;
    }

    println!("  s1: {}", s1.document());
    println!("  s2: {}", s2.document());

    handle_1.shutdown();
    handle_2.shutdown();
}
