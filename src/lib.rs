//! # bookcast
//!
//! A UDP market-data feed handler that maintains per-symbol limit order
//! books and republishes top-of-book snapshots and trade prints over IP
//! multicast.
//!
//! ## Design Principles
//!
//! - **Single-Writer**: one thread owns all order-book state (no locks)
//! - **Bounded Handoff**: a lock-free SPSC ring between ingest and
//!   consumer; a full ring drops, it never blocks the feed
//! - **Price-Time Priority**: FIFO levels threaded through a slab arena
//!   with stable handles for O(1) cancel
//! - **Measured End To End**: monotonic stamps at every pipeline stage
//!
//! ## Architecture
//!
//! ```text
//! [UDP Feed] --> [Ingest Thread] --> [SPSC Ring] --> [Consumer Thread]
//!                    (parse)                          (books + latency)
//!                                                          |
//!                                                  [Multicast Publisher]
//! ```

pub mod arena;
pub mod config;
pub mod engine;
pub mod error;
pub mod event;
pub mod feed;
pub mod ingress;
pub mod order_book;
pub mod price_level;
pub mod publisher;
pub mod ring;
pub mod stats;

// Re-exports for convenience
pub use config::Config;
pub use engine::Engine;
pub use error::InitError;
pub use event::{Event, EventKind, Side};
pub use ingress::{EventSink, RingSink, UdpIngress};
pub use order_book::{BookError, Order, OrderBook, PriceKey};
pub use price_level::PriceLevel;
pub use publisher::{BookPublisher, MulticastPublisher, NullPublisher};
pub use stats::{mono_ns, LatencyBreakdown, PipelineStats, StatsSnapshot};
