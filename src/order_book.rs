//! Order Book - per-symbol bid/ask ladders keyed by order ID.
//!
//! Ladders are ordered maps from price to [`PriceLevel`]; bids are read
//! from the descending end, asks from the ascending end, with cached best
//! prices for O(1) top-of-book access. A global order-id index holds the
//! arena handle for every resting order, so cancel and modify are O(log L)
//! in the number of price levels plus O(1) for the keyed work.
//!
//! Crossed books (best bid above best ask) are representable and never
//! rejected; the feed may report them transiently.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use rustc_hash::FxHashMap;

use crate::arena::{Arena, NodeIndex, OrderNode};
use crate::event::Side;
use crate::price_level::{FifoOrders, PriceLevel};

/// Ladder key for an `f64` feed price.
///
/// Prices are opaque keys: ordering is `f64::total_cmp`, so only
/// bitwise-equal prices land on the same level. The feed is expected to
/// send finite, positive prices; nothing here normalizes them.
#[derive(Clone, Copy, Debug, Default)]
pub struct PriceKey(pub f64);

impl PartialEq for PriceKey {
    fn eq(&self, other: &Self) -> bool {
        self.0.total_cmp(&other.0) == Ordering::Equal
    }
}

impl Eq for PriceKey {}

impl PartialOrd for PriceKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PriceKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// Book-level failures. Counted by the consumer and never retried.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum BookError {
    /// Add for an order ID that is already resting
    DuplicateOrder = 0,
    /// Modify or cancel for an order ID that is not resting
    UnknownOrder = 1,
    /// Order event without a usable side
    UnknownSide = 2,
}

/// Index entry for a resting order.
#[derive(Clone, Copy, Debug)]
struct OrderInfo {
    side: Side,
    price: f64,
    node: NodeIndex,
}

/// Snapshot of one resting order, as returned by [`OrderBook::get_order`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Order {
    pub side: Side,
    pub price: f64,
    pub size: u32,
    /// Exchange wall-clock timestamp from the add event
    pub timestamp: u64,
}

/// Per-symbol limit order book with price-time priority.
pub struct OrderBook {
    symbol: String,
    /// Bid levels; best bid is the maximum key
    bids: BTreeMap<PriceKey, PriceLevel>,
    /// Ask levels; best ask is the minimum key
    asks: BTreeMap<PriceKey, PriceLevel>,
    /// Cached best prices, maintained on add and on empty-level removal
    best_bid: Option<PriceKey>,
    best_ask: Option<PriceKey>,
    /// Order ID -> owning side/price/node
    orders: FxHashMap<String, OrderInfo>,
    /// Node storage shared by every level of this book
    arena: Arena,
}

impl OrderBook {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            bids: BTreeMap::new(),
            asks: BTreeMap::new(),
            best_bid: None,
            best_ask: None,
            orders: FxHashMap::default(),
            arena: Arena::new(),
        }
    }

    /// Create a book with pre-allocated order storage.
    pub fn with_capacity(symbol: impl Into<String>, orders: u32) -> Self {
        Self {
            symbol: symbol.into(),
            bids: BTreeMap::new(),
            asks: BTreeMap::new(),
            best_bid: None,
            best_ask: None,
            orders: FxHashMap::with_capacity_and_hasher(orders as usize, Default::default()),
            arena: Arena::with_capacity(orders),
        }
    }

    #[inline]
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    // ========================================================================
    // Order Management
    // ========================================================================

    /// Add a resting order, creating its price level if absent.
    pub fn add_order(
        &mut self,
        order_id: &str,
        side: Side,
        price: f64,
        size: u32,
        timestamp: u64,
    ) -> Result<(), BookError> {
        if side == Side::Unknown {
            return Err(BookError::UnknownSide);
        }
        if self.orders.contains_key(order_id) {
            return Err(BookError::DuplicateOrder);
        }

        let node = self.arena.insert(OrderNode::new(
            order_id.to_owned(),
            side,
            price,
            size,
            timestamp,
        ));

        let key = PriceKey(price);
        let ladder = match side {
            Side::Bid => &mut self.bids,
            _ => &mut self.asks,
        };
        let level = ladder.entry(key).or_insert_with(PriceLevel::new);
        level.push_back(&mut self.arena, node);

        match side {
            Side::Bid => self.best_bid = self.best_bid.max(Some(key)),
            _ => self.best_ask = Some(self.best_ask.map_or(key, |best| best.min(key))),
        }

        self.orders
            .insert(order_id.to_owned(), OrderInfo { side, price, node });
        Ok(())
    }

    /// Resize a resting order in place.
    ///
    /// Queue position never changes on a resize. A new size of zero
    /// removes the order; a zero-size entry would make level aggregates
    /// ambiguous.
    pub fn modify_order(&mut self, order_id: &str, new_size: u32) -> Result<(), BookError> {
        let info = *self.orders.get(order_id).ok_or(BookError::UnknownOrder)?;

        if new_size == 0 {
            return self.cancel_order(order_id);
        }

        let key = PriceKey(info.price);
        let ladder = match info.side {
            Side::Bid => &mut self.bids,
            _ => &mut self.asks,
        };
        if let Some(level) = ladder.get_mut(&key) {
            level.set_size(&mut self.arena, info.node, new_size);
        }
        Ok(())
    }

    /// Remove a resting order; erases its level when it was the last
    /// entry there.
    pub fn cancel_order(&mut self, order_id: &str) -> Result<(), BookError> {
        let info = self.orders.remove(order_id).ok_or(BookError::UnknownOrder)?;

        let key = PriceKey(info.price);
        let ladder = match info.side {
            Side::Bid => &mut self.bids,
            _ => &mut self.asks,
        };

        let mut level_empty = false;
        if let Some(level) = ladder.get_mut(&key) {
            level_empty = level.remove(&mut self.arena, info.node);
        }
        if level_empty {
            ladder.remove(&key);
        }

        if level_empty {
            match info.side {
                Side::Bid => {
                    if self.best_bid == Some(key) {
                        self.best_bid = self.bids.last_key_value().map(|(k, _)| *k);
                    }
                }
                _ => {
                    if self.best_ask == Some(key) {
                        self.best_ask = self.asks.first_key_value().map(|(k, _)| *k);
                    }
                }
            }
        }

        self.arena.free(info.node);
        Ok(())
    }

    #[inline]
    pub fn has_order(&self, order_id: &str) -> bool {
        self.orders.contains_key(order_id)
    }

    /// Exact lookup of a resting order.
    pub fn get_order(&self, order_id: &str) -> Option<Order> {
        let info = self.orders.get(order_id)?;
        let node = self.arena.get(info.node);
        Some(Order {
            side: info.side,
            price: info.price,
            size: node.size,
            timestamp: node.timestamp,
        })
    }

    // ========================================================================
    // Top of Book
    // ========================================================================

    /// Best bid as `(price, aggregate size)`, or `(0.0, 0)` when the bid
    /// ladder is empty.
    #[inline]
    pub fn best_bid(&self) -> (f64, u64) {
        self.best_bid
            .and_then(|key| self.bids.get(&key).map(|level| (key.0, level.total_size())))
            .unwrap_or((0.0, 0))
    }

    /// Best ask as `(price, aggregate size)`, or `(0.0, 0)` when the ask
    /// ladder is empty.
    #[inline]
    pub fn best_ask(&self) -> (f64, u64) {
        self.best_ask
            .and_then(|key| self.asks.get(&key).map(|level| (key.0, level.total_size())))
            .unwrap_or((0.0, 0))
    }

    /// Aggregate size at a price, or 0 when no such level exists.
    pub fn size_at_price(&self, side: Side, price: f64) -> u64 {
        let level = match side {
            Side::Bid => self.bids.get(&PriceKey(price)),
            Side::Ask => self.asks.get(&PriceKey(price)),
            Side::Unknown => None,
        };
        level.map_or(0, PriceLevel::total_size)
    }

    /// Resting orders at a price, oldest first. Empty for missing levels.
    pub fn orders_in_fifo(&self, side: Side, price: f64) -> FifoOrders<'_> {
        let level = match side {
            Side::Bid => self.bids.get(&PriceKey(price)),
            Side::Ask => self.asks.get(&PriceKey(price)),
            Side::Unknown => None,
        };
        match level {
            Some(level) => level.orders_in_fifo(&self.arena),
            None => FifoOrders::empty(&self.arena),
        }
    }

    // ========================================================================
    // Derived Metrics
    // ========================================================================

    /// `ask - bid`, or 0.0 unless both sides are quoted. May be negative
    /// on a crossed book.
    pub fn spread(&self) -> f64 {
        let (bid, _) = self.best_bid();
        let (ask, _) = self.best_ask();
        if bid > 0.0 && ask > 0.0 {
            ask - bid
        } else {
            0.0
        }
    }

    /// `(bid + ask) / 2`, or 0.0 unless both sides are quoted.
    pub fn midprice(&self) -> f64 {
        let (bid, _) = self.best_bid();
        let (ask, _) = self.best_ask();
        if bid > 0.0 && ask > 0.0 {
            (bid + ask) / 2.0
        } else {
            0.0
        }
    }

    /// `(bid_size - ask_size) / (bid_size + ask_size)` at top of book,
    /// or 0.0 when nothing is quoted.
    pub fn quote_imbalance(&self) -> f64 {
        let (_, bid_size) = self.best_bid();
        let (_, ask_size) = self.best_ask();
        let total = bid_size + ask_size;
        if total > 0 {
            (bid_size as f64 - ask_size as f64) / total as f64
        } else {
            0.0
        }
    }

    // ========================================================================
    // Introspection
    // ========================================================================

    /// Number of resting orders.
    pub fn order_count(&self) -> usize {
        self.orders.len()
    }

    pub fn bid_levels(&self) -> usize {
        self.bids.len()
    }

    pub fn ask_levels(&self) -> usize {
        self.asks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    /// Drop all book state.
    pub fn clear(&mut self) {
        self.bids.clear();
        self.asks.clear();
        self.best_bid = None;
        self.best_ask = None;
        self.orders.clear();
        self.arena.clear();
    }

    /// Verify the cross-structure invariants: every indexed order rests in
    /// exactly one level on its recorded side and price, level aggregates
    /// equal the sum of their entries, no level is empty, and the cached
    /// best prices match the ladder extremes.
    ///
    /// O(orders); meant for tests and debugging, not the hot path.
    pub fn check_invariants(&self) {
        let mut seen = 0usize;
        for (ladder, side) in [(&self.bids, Side::Bid), (&self.asks, Side::Ask)] {
            for (key, level) in ladder {
                assert!(!level.is_empty(), "empty level resting at {}", key.0);
                assert!(level.total_size() > 0, "zero-size level at {}", key.0);

                let mut sum = 0u64;
                let mut count = 0u32;
                for node in level.orders_in_fifo(&self.arena) {
                    let info = self
                        .orders
                        .get(&node.order_id)
                        .unwrap_or_else(|| panic!("order {} not indexed", node.order_id));
                    assert_eq!(info.side, side, "index side mismatch for {}", node.order_id);
                    assert_eq!(
                        PriceKey(info.price),
                        *key,
                        "index price mismatch for {}",
                        node.order_id
                    );
                    assert_eq!(node.side, side);
                    sum += u64::from(node.size);
                    count += 1;
                    seen += 1;
                }
                assert_eq!(sum, level.total_size(), "aggregate drift at {}", key.0);
                assert_eq!(count, level.order_count(), "count drift at {}", key.0);
            }
        }
        assert_eq!(seen, self.orders.len(), "index has entries outside levels");
        assert_eq!(self.best_bid, self.bids.last_key_value().map(|(k, _)| *k));
        assert_eq!(self.best_ask, self.asks.first_key_value().map(|(k, _)| *k));
    }
}

impl fmt::Debug for OrderBook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OrderBook")
            .field("symbol", &self.symbol)
            .field("best_bid", &self.best_bid)
            .field("best_ask", &self.best_ask)
            .field("bid_levels", &self.bids.len())
            .field("ask_levels", &self.asks.len())
            .field("order_count", &self.orders.len())
            .finish()
    }
}
