//! Configuration for the gossip loop.

/// Configuration for a replica's gossip behavior.
#[derive(Clone, Debug)]
pub struct GossipConfig {
    /// Anti-entropy cadence: how often to contact one random neighbor
    /// (in milliseconds). A cadence, not a deadline.
    pub tick_interval_ms: u64,
    /// Capacity of the replica's incoming message queue.
    pub inbox_capacity: usize,
}

impl Default for GossipConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 500,
            inbox_capacity: 100,
        }
    }
}

/// Builder for gossip configuration.
pub struct GossipConfigBuilder {
    config: GossipConfig,
}

impl GossipConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: GossipConfig::default(),
        }
    }

    pub fn tick_interval(mut self, ms: u64) -> Self {
        self.config.tick_interval_ms = ms;
        self
    }

    pub fn inbox_capacity(mut self, capacity: usize) -> Self {
        self.config.inbox_capacity = capacity;
        self
    }

    pub fn build(self) -> GossipConfig {
        self.config
    }
}

impl Default for GossipConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
