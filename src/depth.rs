//--------------------------------------------------------------------------------------------------
// MODULE OVERVIEW
//--------------------------------------------------------------------------------------------------
// This module defines the serializable depth snapshot format consumed by
// external publishers and the (excluded) persistence collaborator.
//
// | Component     | Description                                                |
// |---------------|------------------------------------------------------------|
// | DepthLevel    | Aggregated volume information at a specific price          |
// | DepthSnapshot | Immutable point-in-time view of order book depth           |
//--------------------------------------------------------------------------------------------------

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::orderbook::PriceLevel;

/// An aggregated price level in the depth view.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DepthLevel {
    /// The price for this level
    pub price: Decimal,
    /// Sum of leaves quantity across all orders at this level
    pub volume: Decimal,
    /// Number of orders at this level
    pub order_count: u32,
}

impl DepthLevel {
    /// Aggregates a book price level into its depth view.
    #[inline]
    pub fn from_price_level(level: &PriceLevel) -> Self {
        Self {
            price: level.price,
            volume: level.total_volume,
            order_count: level.order_count() as u32,
        }
    }
}

/// An immutable snapshot of order book depth at a specific point in time.
/// Bids are ordered by price descending, asks ascending (best first on both
/// sides).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepthSnapshot {
    /// Symbol this snapshot belongs to
    pub symbol: String,
    /// Bid levels, best (highest) first
    pub bids: Vec<DepthLevel>,
    /// Ask levels, best (lowest) first
    pub asks: Vec<DepthLevel>,
    /// Timestamp when this snapshot was taken
    pub timestamp: DateTime<Utc>,
}

impl DepthSnapshot {
    /// Creates a new depth snapshot stamped with the current time.
    pub fn new(symbol: String, bids: Vec<DepthLevel>, asks: Vec<DepthLevel>) -> Self {
        Self {
            symbol,
            bids,
            asks,
            timestamp: Utc::now(),
        }
    }

    /// Returns the best bid price if available.
    #[inline]
    pub fn best_bid(&self) -> Option<Decimal> {
        self.bids.first().map(|level| level.price)
    }

    /// Returns the best ask price if available.
    #[inline]
    pub fn best_ask(&self) -> Option<Decimal> {
        self.asks.first().map(|level| level.price)
    }

    /// Returns the current spread (best ask - best bid).
    #[inline]
    pub fn spread(&self) -> Option<Decimal> {
        match (self.best_ask(), self.best_bid()) {
            (Some(ask), Some(bid)) => Some(ask - bid),
            _ => None,
        }
    }

    /// Midpoint between best bid and best ask, a common market-price signal
    /// for the conditional layer.
    pub fn midpoint(&self) -> Option<Decimal> {
        match (self.best_ask(), self.best_bid()) {
            (Some(ask), Some(bid)) => Some((ask + bid) / Decimal::TWO),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orderbook::OrderBook;
    use crate::types::{Order, Side};
    use rust_decimal_macros::dec;

    #[test]
    fn test_empty_snapshot() {
        let snapshot = DepthSnapshot::new("BTC-USDT".to_string(), Vec::new(), Vec::new());
        assert_eq!(snapshot.best_bid(), None);
        assert_eq!(snapshot.best_ask(), None);
        assert_eq!(snapshot.spread(), None);
        assert_eq!(snapshot.midpoint(), None);
    }

    #[test]
    fn test_snapshot_from_book() {
        let mut book = OrderBook::new("BTC-USDT");
        book.submit(Order::limit("BTC-USDT", Side::Bid, dec!(1.0), dec!(50000)));
        book.submit(Order::limit("BTC-USDT", Side::Bid, dec!(0.5), dec!(50000)));
        book.submit(Order::limit("BTC-USDT", Side::Ask, dec!(2.0), dec!(50100)));

        let snapshot = book.depth_snapshot(10);
        assert_eq!(snapshot.symbol, "BTC-USDT");
        assert_eq!(snapshot.best_bid(), Some(dec!(50000)));
        assert_eq!(snapshot.best_ask(), Some(dec!(50100)));
        assert_eq!(snapshot.spread(), Some(dec!(100)));
        assert_eq!(snapshot.midpoint(), Some(dec!(50050)));
        assert_eq!(snapshot.bids[0].volume, dec!(1.5));
        assert_eq!(snapshot.bids[0].order_count, 2);
    }

    #[test]
    fn test_snapshot_serializes() {
        let mut book = OrderBook::new("BTC-USDT");
        book.submit(Order::limit("BTC-USDT", Side::Ask, dec!(1.0), dec!(50100)));

        let snapshot = book.depth_snapshot(10);
        let json = match serde_json::to_string(&snapshot) {
            Ok(json) => json,
            Err(e) => panic!("snapshot should serialize: {}", e),
        };
        assert!(json.contains("\"symbol\":\"BTC-USDT\""));
        assert!(json.contains("50100"));
    }
}
