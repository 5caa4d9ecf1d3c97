//! Pipeline configuration.
//!
//! Plain constants injected at construction; there is no loading layer
//! and no persisted state.

use std::net::Ipv4Addr;

/// Everything the daemon needs to wire the pipeline together.
///
/// # Example
///
/// ```rust
/// use bookcast::Config;
///
/// let config = Config::default()
///     .with_feed_port(15000)
///     .with_ring_capacity(65_536)
///     .with_pinned_consumer(true);
/// assert_eq!(config.feed_port, 15000);
/// ```
#[derive(Clone, Debug)]
pub struct Config {
    /// Multicast group to join for the feed; `None` listens unicast.
    pub feed_group: Option<Ipv4Addr>,
    /// Ingress UDP port, bound on all interfaces.
    pub feed_port: u16,
    /// Egress multicast group for book snapshots and trades.
    pub publish_group: Ipv4Addr,
    /// Egress multicast port.
    pub publish_port: u16,
    /// Egress multicast TTL.
    pub publish_ttl: u32,
    /// Requested ring capacity; rounded up to a power of two.
    pub ring_capacity: usize,
    /// Pin the consumer thread to the last CPU core.
    pub pin_consumer: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            feed_group: Some(Ipv4Addr::new(224, 0, 0, 1)),
            feed_port: 12345,
            publish_group: Ipv4Addr::new(224, 0, 0, 1),
            publish_port: 12346,
            publish_ttl: 1,
            ring_capacity: 10_000,
            pin_consumer: false,
        }
    }
}

impl Config {
    /// Listen for unicast datagrams instead of joining a group.
    pub fn with_unicast_feed(mut self) -> Self {
        self.feed_group = None;
        self
    }

    pub fn with_feed_group(mut self, group: Ipv4Addr) -> Self {
        self.feed_group = Some(group);
        self
    }

    pub fn with_feed_port(mut self, port: u16) -> Self {
        self.feed_port = port;
        self
    }

    pub fn with_publish_target(mut self, group: Ipv4Addr, port: u16) -> Self {
        self.publish_group = group;
        self.publish_port = port;
        self
    }

    pub fn with_publish_ttl(mut self, ttl: u32) -> Self {
        self.publish_ttl = ttl;
        self
    }

    pub fn with_ring_capacity(mut self, capacity: usize) -> Self {
        self.ring_capacity = capacity;
        self
    }

    pub fn with_pinned_consumer(mut self, pin: bool) -> Self {
        self.pin_consumer = pin;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.feed_group, Some(Ipv4Addr::new(224, 0, 0, 1)));
        assert_eq!(config.feed_port, 12345);
        assert_eq!(config.publish_port, 12346);
        assert_eq!(config.publish_ttl, 1);
        assert_eq!(config.ring_capacity, 10_000);
        assert!(!config.pin_consumer);
    }

    #[test]
    fn test_builders() {
        let config = Config::default()
            .with_unicast_feed()
            .with_feed_port(9000)
            .with_publish_target(Ipv4Addr::new(239, 1, 1, 1), 9001)
            .with_publish_ttl(4)
            .with_ring_capacity(1 << 16);

        assert_eq!(config.feed_group, None);
        assert_eq!(config.feed_port, 9000);
        assert_eq!(config.publish_group, Ipv4Addr::new(239, 1, 1, 1));
        assert_eq!(config.publish_ttl, 4);
        assert_eq!(config.ring_capacity, 65_536);
    }
}
