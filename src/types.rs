//--------------------------------------------------------------------------------------------------
// MODULE OVERVIEW
//--------------------------------------------------------------------------------------------------
// This module defines the core data types used throughout the matching engine,
// including orders, trades, and the status/type enums they carry.
//
// | Section            | Description                                                      |
// |--------------------|------------------------------------------------------------------|
// | ENUMS              | Discrete value sets (Side, OrderType, OrderStatus).              |
// | STRUCTS            | The Order and Trade records.                                     |
// | TESTS              | Unit tests for the defined types.                                |
//--------------------------------------------------------------------------------------------------

//--------------------------------------------------------------------------------------------------
//  ENUMS
//--------------------------------------------------------------------------------------------------
// | Name          | Description                                  |
// |---------------|----------------------------------------------|
// | Side          | Side of an order (Bid/Ask).                  |
// | OrderType     | Execution style of an order.                 |
// | OrderStatus   | Lifecycle status of an order.                |
//--------------------------------------------------------------------------------------------------
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Represents the side of an order (Buy or Sell).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    /// A buy order.
    Bid,
    /// A sell order.
    Ask,
}

impl Side {
    /// Returns the side an incoming order matches against.
    #[inline]
    pub fn opposite(self) -> Side {
        match self {
            Side::Bid => Side::Ask,
            Side::Ask => Side::Bid,
        }
    }
}

/// Represents the type of an order, determining its matching behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderType {
    /// Executes immediately at the best available prices; never rests.
    Market,
    /// Executes at the limit price or better; any residual rests on the book.
    Limit,
    /// Immediate-or-cancel: a limit-priced order whose residual is dropped
    /// instead of resting.
    Ioc,
    /// Fill-or-kill: fills completely against available liquidity or is
    /// rejected without touching the book.
    Fok,
}

/// Represents the lifecycle status of an order within the matching engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    /// Accepted for processing but not yet matched or rested.
    Pending,
    /// Resting on the book with no fills.
    Active,
    /// Some quantity has been matched.
    PartiallyFilled,
    /// The full quantity has been matched.
    Filled,
    /// Removed before being fully filled.
    Cancelled,
    /// Refused by validation or the fill-or-kill liquidity check.
    Rejected,
    /// An immediate-or-cancel order that could not match at all.
    Expired,
}

impl OrderStatus {
    /// True once the order can no longer trade.
    #[inline]
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            OrderStatus::Filled
                | OrderStatus::Cancelled
                | OrderStatus::Rejected
                | OrderStatus::Expired
        )
    }
}

//--------------------------------------------------------------------------------------------------
//  STRUCTS
//--------------------------------------------------------------------------------------------------
// | Name          | Description                                   |
// |---------------|-----------------------------------------------|
// | Order         | A trading order in the system.                |
// | Trade         | A completed trade between two orders.         |
//--------------------------------------------------------------------------------------------------

/// Represents a trading order. Uses Decimal for price/quantity precision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    /// Unique identifier for the order.
    pub id: Uuid,
    /// Instrument key this order trades.
    pub symbol: String,
    /// Type of the order (Market, Limit, Ioc, Fok).
    pub order_type: OrderType,
    /// Side of the order (Bid or Ask).
    pub side: Side,
    /// Original order quantity. Always positive for a valid order.
    pub quantity: Decimal,
    /// Cumulative matched quantity.
    pub filled_quantity: Decimal,
    /// Remaining quantity available to trade; `quantity - filled_quantity`.
    pub leaves_quantity: Decimal,
    /// Limit price. None for Market orders; required positive otherwise.
    pub price: Option<Decimal>,
    /// Sequence number assigned by the book upon acceptance (time priority key).
    pub sequence: u64,
    /// Current status of the order.
    pub status: OrderStatus,
    /// Timestamp of order creation.
    pub created_at: DateTime<Utc>,
    /// Timestamp of the last update to the order.
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Creates a new order in `Pending` status with nothing filled yet.
    pub fn new(
        symbol: impl Into<String>,
        order_type: OrderType,
        side: Side,
        quantity: Decimal,
        price: Option<Decimal>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            symbol: symbol.into(),
            order_type,
            side,
            quantity,
            filled_quantity: Decimal::ZERO,
            leaves_quantity: quantity,
            price,
            sequence: 0,
            status: OrderStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }

    /// Convenience constructor for a limit order.
    pub fn limit(symbol: impl Into<String>, side: Side, quantity: Decimal, price: Decimal) -> Self {
        Self::new(symbol, OrderType::Limit, side, quantity, Some(price))
    }

    /// Convenience constructor for a market order.
    pub fn market(symbol: impl Into<String>, side: Side, quantity: Decimal) -> Self {
        Self::new(symbol, OrderType::Market, side, quantity, None)
    }

    /// Convenience constructor for an immediate-or-cancel order.
    pub fn immediate_or_cancel(
        symbol: impl Into<String>,
        side: Side,
        quantity: Decimal,
        price: Decimal,
    ) -> Self {
        Self::new(symbol, OrderType::Ioc, side, quantity, Some(price))
    }

    /// Convenience constructor for a fill-or-kill order.
    pub fn fill_or_kill(
        symbol: impl Into<String>,
        side: Side,
        quantity: Decimal,
        price: Decimal,
    ) -> Self {
        Self::new(symbol, OrderType::Fok, side, quantity, Some(price))
    }

    /// Applies a fill of `quantity` to this order, updating the filled and
    /// leaves accounting and moving the status to `PartiallyFilled` or
    /// `Filled`.
    ///
    /// Callers must never pass more than `leaves_quantity`; the matcher
    /// clamps fills with `min` before applying them.
    pub fn apply_fill(&mut self, quantity: Decimal) {
        self.filled_quantity += quantity;
        self.leaves_quantity -= quantity;
        self.status = if self.leaves_quantity.is_zero() {
            OrderStatus::Filled
        } else {
            OrderStatus::PartiallyFilled
        };
        self.updated_at = Utc::now();
    }

    /// True while the order is eligible to rest or keep matching.
    #[inline]
    pub fn is_open(&self) -> bool {
        matches!(
            self.status,
            OrderStatus::Active | OrderStatus::PartiallyFilled
        ) && !self.leaves_quantity.is_zero()
    }
}

/// Represents a completed trade resulting from matching two orders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    /// Unique identifier for the trade.
    pub id: Uuid,
    /// Monotonic sequence within the trade's symbol; trades for one symbol
    /// are totally ordered by this field.
    pub sequence: u64,
    /// Instrument key the trade occurred on.
    pub symbol: String,
    /// ID of the order that was resting on the book (maker).
    pub maker_order_id: Uuid,
    /// ID of the incoming order that caused the match (taker).
    pub taker_order_id: Uuid,
    /// Execution price. Always the maker's price.
    pub price: Decimal,
    /// Quantity traded. Always positive.
    pub quantity: Decimal,
    /// True iff the maker side of the trade was a bid.
    pub is_buyer_maker: bool,
    /// Timestamp when the trade occurred.
    pub executed_at: DateTime<Utc>,
}

impl Trade {
    /// Notional value of the trade (`price * quantity`).
    #[inline]
    pub fn notional(&self) -> Decimal {
        self.price * self.quantity
    }
}

//--------------------------------------------------------------------------------------------------
//  TESTS
//--------------------------------------------------------------------------------------------------
