//! Multicast publisher - republishes book snapshots and trade prints.
//!
//! Only the consumer thread calls into the publisher, so the outbound
//! socket needs no synchronization. Send failures are counted and the
//! message is dropped; there is no retry queue.
//!
//! Wire envelope: `{"type":<0|1|2>,"symbol":"<s>","timestamp":<ns>,
//! "data":<object>}`. Prices are serialized with six fractional digits,
//! which is why the payload is formatted by hand rather than through a
//! JSON serializer.

use std::fmt::Write as _;
use std::net::{Ipv4Addr, SocketAddrV4, UdpSocket};
use std::sync::atomic::Ordering;
use std::sync::Arc;

use socket2::{Domain, Protocol, Socket, Type};
use tracing::{info, warn};

use crate::error::InitError;
use crate::event::Side;
use crate::order_book::OrderBook;
use crate::stats::{mono_ns, PipelineStats};

/// Outbound message kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum MessageType {
    BookUpdate = 0,
    Trade = 1,
    Heartbeat = 2,
}

/// The interface the consumer drives. Implemented by the multicast
/// publisher and by test doubles.
pub trait BookPublisher {
    /// Emit a fresh top-of-book snapshot for `symbol`.
    fn publish_book_update(&mut self, symbol: &str, book: &OrderBook, timestamp: u64);

    /// Emit one trade print.
    fn publish_trade(
        &mut self,
        symbol: &str,
        price: f64,
        size: u32,
        aggressor_side: Side,
        timestamp: u64,
    );

    /// Emit cumulative traffic counters.
    fn publish_heartbeat(&mut self);
}

/// Publisher that ignores everything; used by benches and reports.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullPublisher;

impl BookPublisher for NullPublisher {
    fn publish_book_update(&mut self, _symbol: &str, _book: &OrderBook, _timestamp: u64) {}
    fn publish_trade(&mut self, _: &str, _: f64, _: u32, _: Side, _: u64) {}
    fn publish_heartbeat(&mut self) {}
}

/// UDP multicast publisher.
pub struct MulticastPublisher {
    socket: UdpSocket,
    dest: SocketAddrV4,
    messages_sent: u64,
    bytes_sent: u64,
    stats: Arc<PipelineStats>,
}

impl MulticastPublisher {
    /// Create the egress socket with the given multicast TTL.
    pub fn new(
        group: Ipv4Addr,
        port: u16,
        ttl: u32,
        stats: Arc<PipelineStats>,
    ) -> Result<Self, InitError> {
        let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))
            .map_err(InitError::EgressSocket)?;
        socket
            .set_multicast_ttl_v4(ttl)
            .map_err(InitError::EgressSocket)?;

        info!(%group, port, ttl, "egress multicast publisher ready");
        Ok(Self {
            socket: socket.into(),
            dest: SocketAddrV4::new(group, port),
            messages_sent: 0,
            bytes_sent: 0,
            stats,
        })
    }

    /// Cumulative `(messages_sent, bytes_sent)` counters.
    pub fn traffic(&self) -> (u64, u64) {
        (self.messages_sent, self.bytes_sent)
    }

    fn send(&mut self, msg_type: MessageType, symbol: &str, timestamp: u64, data: &str) {
        let payload = envelope(msg_type, symbol, timestamp, data);
        match self.socket.send_to(payload.as_bytes(), self.dest) {
            Ok(_) => {
                self.messages_sent += 1;
                self.bytes_sent += data.len() as u64;
            }
            Err(err) => {
                self.stats.publish_errors.fetch_add(1, Ordering::Relaxed);
                warn!(%err, dest = %self.dest, "multicast send failed");
            }
        }
    }
}

impl BookPublisher for MulticastPublisher {
    fn publish_book_update(&mut self, symbol: &str, book: &OrderBook, timestamp: u64) {
        let data = book_update_data(book);
        self.send(MessageType::BookUpdate, symbol, timestamp, &data);
    }

    fn publish_trade(
        &mut self,
        symbol: &str,
        price: f64,
        size: u32,
        aggressor_side: Side,
        timestamp: u64,
    ) {
        let data = trade_data(price, size, aggressor_side);
        self.send(MessageType::Trade, symbol, timestamp, &data);
    }

    fn publish_heartbeat(&mut self) {
        let data = format!(
            "{{\"messages_sent\":{},\"bytes_sent\":{}}}",
            self.messages_sent, self.bytes_sent
        );
        self.send(MessageType::Heartbeat, "", mono_ns(), &data);
    }
}

/// Wrap a data object in the outer message envelope.
fn envelope(msg_type: MessageType, symbol: &str, timestamp: u64, data: &str) -> String {
    format!(
        "{{\"type\":{},\"symbol\":\"{}\",\"timestamp\":{},\"data\":{}}}",
        msg_type as u8, symbol, timestamp, data
    )
}

/// Top-of-book snapshot body.
fn book_update_data(book: &OrderBook) -> String {
    let (bid_price, bid_size) = book.best_bid();
    let (ask_price, ask_size) = book.best_ask();

    let mut data = String::with_capacity(192);
    let _ = write!(
        data,
        "{{\"best_bid_price\":{bid_price:.6},\"best_bid_size\":{bid_size},\
         \"best_ask_price\":{ask_price:.6},\"best_ask_size\":{ask_size},\
         \"spread\":{:.6},\"midprice\":{:.6},\"quote_imbalance\":{:.6}}}",
        book.spread(),
        book.midprice(),
        book.quote_imbalance(),
    );
    data
}

/// Trade print body.
fn trade_data(price: f64, size: u32, aggressor_side: Side) -> String {
    format!(
        "{{\"price\":{price:.6},\"size\":{size},\"aggressor_side\":\"{}\"}}",
        aggressor_side.label()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Side;

    #[test]
    fn test_envelope_shape() {
        let payload = envelope(MessageType::Trade, "AAPL", 42, "{\"price\":1.000000}");
        assert_eq!(
            payload,
            "{\"type\":1,\"symbol\":\"AAPL\",\"timestamp\":42,\"data\":{\"price\":1.000000}}"
        );
    }

    #[test]
    fn test_book_update_data() {
        let mut book = OrderBook::new("X");
        book.add_order("b", Side::Bid, 100.0, 30, 0).unwrap();
        book.add_order("a", Side::Ask, 101.0, 10, 0).unwrap();

        let data = book_update_data(&book);
        assert_eq!(
            data,
            "{\"best_bid_price\":100.000000,\"best_bid_size\":30,\
             \"best_ask_price\":101.000000,\"best_ask_size\":10,\
             \"spread\":1.000000,\"midprice\":100.500000,\"quote_imbalance\":0.500000}"
        );
    }

    #[test]
    fn test_book_update_data_empty_book() {
        let book = OrderBook::new("X");
        let data = book_update_data(&book);
        assert!(data.contains("\"best_bid_price\":0.000000"));
        assert!(data.contains("\"best_ask_size\":0"));
        assert!(data.contains("\"quote_imbalance\":0.000000"));
    }

    #[test]
    fn test_trade_data() {
        let data = trade_data(800.5, 10, Side::Bid);
        assert_eq!(
            data,
            "{\"price\":800.500000,\"size\":10,\"aggressor_side\":\"BID\"}"
        );
    }

    #[test]
    fn test_payloads_are_valid_json() {
        let mut book = OrderBook::new("X");
        book.add_order("b", Side::Bid, 99.5, 5, 0).unwrap();

        let payload = envelope(MessageType::BookUpdate, "X", 7, &book_update_data(&book));
        let value: serde_json::Value = serde_json::from_str(&payload).unwrap();
        assert_eq!(value["type"], 0);
        assert_eq!(value["symbol"], "X");
        assert_eq!(value["data"]["best_bid_price"], 99.5);
    }
}
