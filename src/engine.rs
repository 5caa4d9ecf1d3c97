//! Engine - the consumer loop.
//!
//! Owns every order book; runs on its own thread as the sole consumer of
//! the ring and the sole caller into the publisher. No other thread ever
//! touches book state.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use rustc_hash::FxHashMap;
use tracing::info;

use crate::event::{Event, EventKind, Side};
use crate::order_book::{BookError, OrderBook};
use crate::publisher::BookPublisher;
use crate::ring::Consumer;
use crate::stats::{mono_ns, LatencyBreakdown, PipelineStats};

/// Consumed events between periodic latency summaries (and heartbeats).
const REPORT_INTERVAL: u64 = 1000;

/// Per-symbol book state plus dispatch.
pub struct Engine {
    books: FxHashMap<String, OrderBook>,
    stats: Arc<PipelineStats>,
}

impl Engine {
    pub fn new(stats: Arc<PipelineStats>) -> Self {
        Self {
            books: FxHashMap::default(),
            stats,
        }
    }

    /// Dispatch one event and drive the publisher.
    ///
    /// Book failures are counted and the event is dropped; nothing here
    /// interrupts the pipeline. Every dispatched event except `Unknown`
    /// ends with a fresh snapshot publish for its symbol; trades publish
    /// the trade print first.
    pub fn process_event<P: BookPublisher>(&mut self, event: &Event, publisher: &mut P) {
        if event.kind == EventKind::Unknown {
            self.stats.unknown_events.fetch_add(1, Ordering::Relaxed);
            return;
        }

        let book = self
            .books
            .entry(event.symbol.clone())
            .or_insert_with(|| OrderBook::new(event.symbol.clone()));

        let result = match event.kind {
            EventKind::AddOrder => book.add_order(
                &event.order_id,
                event.side,
                event.price,
                event.size,
                event.timestamp,
            ),
            EventKind::ModifyOrder => book.modify_order(&event.order_id, event.size),
            EventKind::CancelOrder | EventKind::DeleteOrder => {
                book.cancel_order(&event.order_id)
            }
            EventKind::Trade => {
                // Trades never mutate the book; the feed reports resting
                // size changes as separate modify/cancel events.
                let aggressor = if event.is_aggressor {
                    Side::Bid
                } else {
                    Side::Ask
                };
                publisher.publish_trade(
                    &event.symbol,
                    event.trade_price,
                    event.trade_size,
                    aggressor,
                    event.timestamp,
                );
                Ok(())
            }
            // Advisory for an order-id-keyed book; forwarded via the
            // snapshot below.
            EventKind::QuoteUpdate | EventKind::MarketStatus => Ok(()),
            EventKind::Unknown => unreachable!("handled above"),
        };

        if let Err(err) = result {
            let counter = match err {
                BookError::DuplicateOrder => &self.stats.duplicate_orders,
                BookError::UnknownOrder => &self.stats.unknown_orders,
                BookError::UnknownSide => &self.stats.unknown_sides,
            };
            counter.fetch_add(1, Ordering::Relaxed);
        }

        let book = &self.books[&event.symbol];
        publisher.publish_book_update(&event.symbol, book, mono_ns());
    }

    /// Run the consumer loop until the shutdown flag is set, then drain
    /// whatever is left in the ring best-effort.
    pub fn run<P: BookPublisher>(
        &mut self,
        input: &mut Consumer<Event>,
        publisher: &mut P,
        shutdown: &AtomicBool,
        pin_to_core: bool,
    ) {
        if pin_to_core {
            pin_current_thread();
        }

        while !shutdown.load(Ordering::Relaxed) {
            match input.pop() {
                Ok(event) => self.consume(&event, publisher),
                Err(_) => thread::yield_now(),
            }
        }

        let mut drained = 0u64;
        while let Ok(event) = input.pop() {
            self.consume(&event, publisher);
            drained += 1;
        }
        if drained > 0 {
            info!(drained, "drained remaining events on shutdown");
        }
    }

    fn consume<P: BookPublisher>(&mut self, event: &Event, publisher: &mut P) {
        let dequeued_mono_ns = mono_ns();
        let latency = LatencyBreakdown::measure(event, dequeued_mono_ns);
        self.stats.record_latency(&latency);
        let consumed = self.stats.events_consumed.fetch_add(1, Ordering::Relaxed) + 1;

        self.process_event(event, publisher);

        if consumed % REPORT_INTERVAL == 0 {
            let snapshot = self.stats.snapshot();
            info!(
                events = snapshot.events_consumed,
                dropped = snapshot.events_dropped,
                avg_total_ns = snapshot.avg_total_ns(),
                avg_queue_ns = snapshot.avg_queue_ns(),
                "pipeline latency summary"
            );
            publisher.publish_heartbeat();
        }
    }

    /// Book for `symbol`, if any event for it has been dispatched.
    pub fn book(&self, symbol: &str) -> Option<&OrderBook> {
        self.books.get(symbol)
    }

    /// Number of symbols seen so far.
    pub fn book_count(&self) -> usize {
        self.books.len()
    }
}

/// Pin the current thread to the last available CPU core, which is the
/// one most likely to be isolated from OS interrupts.
fn pin_current_thread() {
    if let Some(core_ids) = core_affinity::get_core_ids() {
        if let Some(last_core) = core_ids.last() {
            if core_affinity::set_for_current(*last_core) {
                info!(core = last_core.id, "pinned consumer thread");
            }
        }
    }
}
