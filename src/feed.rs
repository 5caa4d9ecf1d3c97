//! Feed datagram decoding.
//!
//! One UTF-8 JSON object per datagram. Missing numerics default to zero,
//! missing strings to empty, unknown keys are ignored. An event without a
//! symbol is a parse error and never enters the pipeline.

use serde::Deserialize;
use thiserror::Error;

use crate::event::{Event, EventKind, Side};

/// Raw wire shape of one datagram. Every field is optional on the wire;
/// serde fills absent fields with defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WireEvent {
    event_type: String,
    symbol: String,
    exchange: String,
    order_id: String,
    side: String,
    price: f64,
    size: u32,
    remaining_size: u32,
    trade_price: f64,
    trade_size: u32,
    is_aggressor: bool,
    is_trading_halted: bool,
    status_message: String,
    timestamp: u64,
    sequence_number: u64,
    exchange_mono_ns: u64,
}

/// Why a datagram was rejected.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("malformed datagram: {0}")]
    Json(#[from] serde_json::Error),
    #[error("event has empty symbol")]
    EmptySymbol,
}

fn kind_from_wire(s: &str) -> EventKind {
    match s {
        "ADD_ORDER" => EventKind::AddOrder,
        "MODIFY_ORDER" => EventKind::ModifyOrder,
        "CANCEL_ORDER" => EventKind::CancelOrder,
        "DELETE_ORDER" => EventKind::DeleteOrder,
        "TRADE" => EventKind::Trade,
        "QUOTE_UPDATE" => EventKind::QuoteUpdate,
        "MARKET_STATUS" => EventKind::MarketStatus,
        _ => EventKind::Unknown,
    }
}

fn side_from_wire(s: &str) -> Side {
    match s {
        "BID" => Side::Bid,
        "ASK" => Side::Ask,
        _ => Side::Unknown,
    }
}

/// Decode one datagram payload into an [`Event`].
///
/// The receive stamp is not set here; the ingress adapter stamps
/// `udp_rx_mono_ns` itself so the value reflects socket time, not parse
/// time.
pub fn decode(datagram: &[u8]) -> Result<Event, DecodeError> {
    let wire: WireEvent = serde_json::from_slice(datagram)?;

    if wire.symbol.is_empty() {
        return Err(DecodeError::EmptySymbol);
    }

    Ok(Event {
        kind: kind_from_wire(&wire.event_type),
        symbol: wire.symbol,
        exchange: wire.exchange,
        order_id: wire.order_id,
        side: side_from_wire(&wire.side),
        price: wire.price,
        size: wire.size,
        remaining_size: wire.remaining_size,
        trade_price: wire.trade_price,
        trade_size: wire.trade_size,
        is_aggressor: wire.is_aggressor,
        status_message: wire.status_message,
        is_trading_halted: wire.is_trading_halted,
        timestamp: wire.timestamp,
        sequence_number: wire.sequence_number,
        exchange_mono_ns: wire.exchange_mono_ns,
        udp_rx_mono_ns: 0,
        enqueued_mono_ns: 0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_add_order() {
        let raw = br#"{"event_type":"ADD_ORDER","symbol":"AAPL","exchange":"SIM","order_id":"AAPL_1000","side":"BID","price":150.25,"size":500,"timestamp":1700000000000000000,"sequence_number":42,"exchange_mono_ns":123456789}"#;
        let event = decode(raw).unwrap();

        assert_eq!(event.kind, EventKind::AddOrder);
        assert_eq!(event.symbol, "AAPL");
        assert_eq!(event.exchange, "SIM");
        assert_eq!(event.order_id, "AAPL_1000");
        assert_eq!(event.side, Side::Bid);
        assert_eq!(event.price, 150.25);
        assert_eq!(event.size, 500);
        assert_eq!(event.sequence_number, 42);
        assert_eq!(event.exchange_mono_ns, 123_456_789);
        assert_eq!(event.udp_rx_mono_ns, 0);
    }

    #[test]
    fn test_decode_trade() {
        let raw = br#"{"event_type":"TRADE","symbol":"TSLA","trade_price":800.5,"trade_size":10,"is_aggressor":true}"#;
        let event = decode(raw).unwrap();

        assert_eq!(event.kind, EventKind::Trade);
        assert_eq!(event.trade_price, 800.5);
        assert_eq!(event.trade_size, 10);
        assert!(event.is_aggressor);
        // Missing fields default
        assert_eq!(event.side, Side::Unknown);
        assert_eq!(event.price, 0.0);
        assert!(event.order_id.is_empty());
    }

    #[test]
    fn test_decode_market_status() {
        let raw = br#"{"event_type":"MARKET_STATUS","symbol":"NVDA","status_message":"HALT","is_trading_halted":true}"#;
        let event = decode(raw).unwrap();

        assert_eq!(event.kind, EventKind::MarketStatus);
        assert_eq!(event.status_message, "HALT");
        assert!(event.is_trading_halted);
    }

    #[test]
    fn test_decode_tolerates_whitespace_and_unknown_keys() {
        let raw = br#"{ "event_type" : "ADD_ORDER" ,
                        "symbol" : "AMD" ,
                        "side" : "ASK" ,
                        "price" : 99.5 , "size" : 7 ,
                        "venue_specific_flag" : [1, 2, 3] }"#;
        let event = decode(raw).unwrap();

        assert_eq!(event.kind, EventKind::AddOrder);
        assert_eq!(event.symbol, "AMD");
        assert_eq!(event.side, Side::Ask);
        assert_eq!(event.price, 99.5);
        assert_eq!(event.size, 7);
    }

    #[test]
    fn test_decode_unknown_event_type() {
        let raw = br#"{"event_type":"IMBALANCE","symbol":"X"}"#;
        let event = decode(raw).unwrap();
        assert_eq!(event.kind, EventKind::Unknown);
    }

    #[test]
    fn test_decode_rejects_empty_symbol() {
        let raw = br#"{"event_type":"ADD_ORDER","side":"BID","price":1.0,"size":1}"#;
        assert!(matches!(decode(raw), Err(DecodeError::EmptySymbol)));
    }

    #[test]
    fn test_decode_rejects_malformed() {
        assert!(matches!(
            decode(b"{\"symbol\":\"X\""),
            Err(DecodeError::Json(_))
        ));
        assert!(decode(b"not json at all").is_err());
        assert!(decode(b"").is_err());
    }
}
