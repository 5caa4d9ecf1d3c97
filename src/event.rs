//! Event types carried through the pipeline.
//!
//! Events are inputs from the feed (one per datagram); the consumer
//! dispatches them onto the per-symbol order books.

/// Order book event kinds (Level 2/3 market data)
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum EventKind {
    /// New order added to the book
    AddOrder = 0,
    /// Existing order resized
    ModifyOrder = 1,
    /// Order cancelled
    CancelOrder = 2,
    /// Order removed from the book (semantic alias of cancel)
    DeleteOrder = 3,
    /// Trade print
    Trade = 4,
    /// Top-of-book quote update (Level 1)
    QuoteUpdate = 5,
    /// Session start/end, halts, etc.
    MarketStatus = 6,
    /// Unrecognized event type
    #[default]
    Unknown = 7,
}

/// Order side (bid = buy, ask = sell)
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Side {
    /// Buy side (bids)
    Bid = 0,
    /// Sell side (asks)
    Ask = 1,
    /// Side missing or unrecognized
    #[default]
    Unknown = 2,
}

impl Side {
    /// Returns the opposite side; `Unknown` has no opposite.
    #[inline]
    pub const fn opposite(self) -> Self {
        match self {
            Side::Bid => Side::Ask,
            Side::Ask => Side::Bid,
            Side::Unknown => Side::Unknown,
        }
    }

    /// Feed wire label for this side.
    #[inline]
    pub const fn label(self) -> &'static str {
        match self {
            Side::Bid => "BID",
            Side::Ask => "ASK",
            Side::Unknown => "UNKNOWN",
        }
    }
}

/// One decoded feed event.
///
/// Carries three monotonic nanosecond stamps (`exchange_mono_ns`,
/// `udp_rx_mono_ns`, `enqueued_mono_ns`); the fourth stage stamp is taken
/// by the consumer at dequeue time and lives only in the latency counters.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Event {
    pub kind: EventKind,
    pub symbol: String,
    pub exchange: String,
    /// Exchange order ID; empty for non-order events
    pub order_id: String,

    pub side: Side,
    pub price: f64,
    pub size: u32,
    /// For modify/cancel events
    pub remaining_size: u32,

    // Trade details (Trade events only)
    pub trade_price: f64,
    pub trade_size: u32,
    pub is_aggressor: bool,

    // Market status (MarketStatus events only)
    pub status_message: String,
    pub is_trading_halted: bool,

    /// Exchange wall-clock timestamp (ns), may be zero
    pub timestamp: u64,
    pub sequence_number: u64,

    // Monotonic stamps (ns, single epoch for latency measurement)
    pub exchange_mono_ns: u64,
    pub udp_rx_mono_ns: u64,
    pub enqueued_mono_ns: u64,
}

impl Event {
    /// Create an order event (add/modify/cancel/delete).
    pub fn order(
        kind: EventKind,
        symbol: &str,
        order_id: &str,
        side: Side,
        price: f64,
        size: u32,
    ) -> Self {
        Self {
            kind,
            symbol: symbol.to_owned(),
            order_id: order_id.to_owned(),
            side,
            price,
            size,
            ..Self::default()
        }
    }

    /// Create a trade print event.
    pub fn trade(symbol: &str, trade_price: f64, trade_size: u32, is_aggressor: bool) -> Self {
        Self {
            kind: EventKind::Trade,
            symbol: symbol.to_owned(),
            trade_price,
            trade_size,
            is_aggressor,
            ..Self::default()
        }
    }

    /// True for the kinds that mutate an order-id-keyed book.
    #[inline]
    pub const fn mutates_book(&self) -> bool {
        matches!(
            self.kind,
            EventKind::AddOrder
                | EventKind::ModifyOrder
                | EventKind::CancelOrder
                | EventKind::DeleteOrder
        )
    }
}
