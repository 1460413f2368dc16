//--------------------------------------------------------------------------------------------------
// MODULE OVERVIEW
//--------------------------------------------------------------------------------------------------
// This module implements a limit order book for a single trading symbol together
// with the matcher for the four base order types (Market, Limit, Ioc, Fok).
// It maintains bid and ask orders in price-time priority (FIFO) order.
//
// | Component     | Description                                                               |
// |--------------|---------------------------------------------------------------------------|
// | PriceLevel   | Groups orders at the same price in a FIFO queue                           |
// | OrderBook    | Sorted two-sided ladder, order-id index, and matcher                      |
// | SubmitResult | Outcome of one submission (trades, taker state, touched makers)           |
// | RejectReason | Structured reasons for a refused submission                               |
//
//--------------------------------------------------------------------------------------------------
// FUNCTIONS
//--------------------------------------------------------------------------------------------------
// | Name                  | Description                                | Return Type            |
// |-----------------------|--------------------------------------------|------------------------|
// | submit                | Validates, matches and rests an order      | SubmitResult           |
// | cancel                | Removes a resting order by id              | Option<Order>          |
// | modify                | Quantity-only amendment, keeps priority    | bool                   |
// | best_bid / best_ask   | Best prices (ZERO when side empty)         | Decimal                |
// | bid_levels/ask_levels | Aggregated depth, best first               | Vec<(Decimal,Decimal)> |
// | depth_snapshot        | Serializable depth snapshot                | DepthSnapshot          |
//--------------------------------------------------------------------------------------------------

use std::collections::{BTreeMap, HashMap, VecDeque};

use chrono::Utc;
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::depth::{DepthLevel, DepthSnapshot};
use crate::types::{Order, OrderStatus, OrderType, Side, Trade};

/// Why a submission was refused. Rejections are structured outcomes on the
/// normal return path, never panics.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// Order quantity must be strictly positive.
    #[error("order quantity must be positive")]
    NonPositiveQuantity,
    /// Limit/Ioc/Fok orders must carry a strictly positive price.
    #[error("order price must be positive")]
    NonPositivePrice,
    /// Limit/Ioc/Fok orders must carry a price.
    #[error("order type requires a price")]
    MissingPrice,
    /// Fill-or-kill could not be filled completely.
    #[error("insufficient liquidity to fill order completely")]
    InsufficientLiquidity,
}

/// Represents a price level in the order book, maintaining a FIFO queue of
/// orders at the same price point.
#[derive(Debug, Clone)]
pub struct PriceLevel {
    /// The price for this level
    pub price: Decimal,
    /// FIFO queue of orders at this price level
    pub orders: VecDeque<Order>,
    /// Sum of `leaves_quantity` across all queued orders
    pub total_volume: Decimal,
}

impl PriceLevel {
    /// Creates an empty price level at the given price.
    fn new(price: Decimal) -> Self {
        Self {
            price,
            orders: VecDeque::with_capacity(4),
            total_volume: Decimal::ZERO,
        }
    }

    /// Returns the next order to be matched without removing it from the
    /// queue. FIFO: always the front of the queue.
    #[inline]
    pub fn peek_next_order(&self) -> Option<&Order> {
        self.orders.front()
    }

    /// Returns the number of orders at this price level.
    pub fn order_count(&self) -> usize {
        self.orders.len()
    }
}

/// The outcome of a single submission.
#[derive(Debug, Clone)]
pub struct SubmitResult {
    /// False when the order was rejected (validation or FOK liquidity);
    /// a rejected submission leaves the book untouched.
    pub accepted: bool,
    /// Trades generated by this submission, in matching order.
    pub trades: Vec<Trade>,
    /// The taker order after processing.
    pub taker: Order,
    /// Snapshots of every resting order touched by this submission, in
    /// matching order (for order-update publication).
    pub affected: Vec<Order>,
    /// Set when `accepted` is false.
    pub reason: Option<RejectReason>,
}

impl SubmitResult {
    fn rejected(mut order: Order, reason: RejectReason) -> Self {
        order.status = OrderStatus::Rejected;
        order.updated_at = Utc::now();
        Self {
            accepted: false,
            trades: Vec::new(),
            taker: order,
            affected: Vec::new(),
            reason: Some(reason),
        }
    }

    fn accepted(order: Order, trades: Vec<Trade>, affected: Vec<Order>) -> Self {
        Self {
            accepted: true,
            trades,
            taker: order,
            affected,
            reason: None,
        }
    }
}

/// The main order book structure. Maintains bid and ask orders in price-time
/// priority using a BTreeMap of price levels per side plus an order-id index
/// for O(1) locate and keyed removal.
#[derive(Debug)]
pub struct OrderBook {
    /// Symbol this order book manages
    symbol: String,
    /// Bid side price levels; best bid is the last key
    bids: BTreeMap<Decimal, PriceLevel>,
    /// Ask side price levels; best ask is the first key
    asks: BTreeMap<Decimal, PriceLevel>,
    /// Maps resting order ids to their (side, price) location
    order_index: HashMap<Uuid, (Side, Decimal)>,
    /// Sequence counter stamped onto accepted orders (time priority key)
    next_sequence: u64,
    /// Sequence counter for trades on this book
    next_trade_sequence: u64,
}

impl OrderBook {
    /// Creates a new empty order book for a symbol.
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            bids: BTreeMap::new(),
            asks: BTreeMap::new(),
            order_index: HashMap::new(),
            next_sequence: 0,
            next_trade_sequence: 0,
        }
    }

    /// Returns the symbol this order book manages.
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Submits an order: validates it, runs the matcher for its type, and
    /// applies the residual policy (rest, drop, or reject).
    ///
    /// # Arguments
    /// * `order` - The order to process
    ///
    /// # Returns
    /// A `SubmitResult` with the generated trades, the taker's final state
    /// and the resting orders it touched. `accepted` is false for rejected
    /// orders, in which case the book is guaranteed unchanged.
    pub fn submit(&mut self, mut order: Order) -> SubmitResult {
        if let Err(reason) = self.validate(&order) {
            debug!(order_id = %order.id, symbol = %self.symbol, %reason, "order rejected");
            return SubmitResult::rejected(order, reason);
        }

        self.next_sequence += 1;
        order.sequence = self.next_sequence;

        match order.order_type {
            OrderType::Limit => self.execute_limit(order),
            OrderType::Market => self.execute_market(order),
            OrderType::Ioc => self.execute_ioc(order),
            OrderType::Fok => self.execute_fok(order),
        }
    }

    /// Removes a resting order by id.
    ///
    /// # Returns
    /// * `Some(Order)` - The removed order with status `Cancelled`
    /// * `None` - If no resting order has this id (a second cancel of the
    ///   same id therefore returns None)
    pub fn cancel(&mut self, order_id: Uuid) -> Option<Order> {
        let (side, price) = self.order_index.remove(&order_id)?;
        let ladder = match side {
            Side::Bid => &mut self.bids,
            Side::Ask => &mut self.asks,
        };
        let level = ladder.get_mut(&price)?;
        let position = level.orders.iter().position(|o| o.id == order_id)?;
        let mut order = level.orders.remove(position)?;

        level.total_volume -= order.leaves_quantity;
        if level.orders.is_empty() {
            ladder.remove(&price);
        }

        order.status = OrderStatus::Cancelled;
        order.updated_at = Utc::now();
        debug!(%order_id, symbol = %self.symbol, "order cancelled");
        Some(order)
    }

    /// Amends the quantity of a resting order. Only the quantity changes;
    /// the order keeps its queue position (time priority).
    ///
    /// Fails without mutation when the order is not resting or when
    /// `new_quantity` does not exceed the filled quantity (leaves must stay
    /// positive for a resting order).
    pub fn modify(&mut self, order_id: Uuid, new_quantity: Decimal) -> bool {
        let Some(&(side, price)) = self.order_index.get(&order_id) else {
            return false;
        };
        let ladder = match side {
            Side::Bid => &mut self.bids,
            Side::Ask => &mut self.asks,
        };
        let Some(level) = ladder.get_mut(&price) else {
            return false;
        };

        let mut volume_delta = Decimal::ZERO;
        let mut modified = false;
        if let Some(order) = level.orders.iter_mut().find(|o| o.id == order_id) {
            if new_quantity > order.filled_quantity {
                let new_leaves = new_quantity - order.filled_quantity;
                volume_delta = new_leaves - order.leaves_quantity;
                order.quantity = new_quantity;
                order.leaves_quantity = new_leaves;
                order.updated_at = Utc::now();
                modified = true;
            }
        }
        if modified {
            level.total_volume += volume_delta;
        }
        modified
    }

    /// Returns the highest bid price, or `Decimal::ZERO` when there are no
    /// bids.
    pub fn best_bid(&self) -> Decimal {
        self.bids.keys().next_back().copied().unwrap_or(Decimal::ZERO)
    }

    /// Returns the lowest ask price, or `Decimal::ZERO` when there are no
    /// asks.
    pub fn best_ask(&self) -> Decimal {
        self.asks.keys().next().copied().unwrap_or(Decimal::ZERO)
    }

    /// Returns up to `depth` bid levels as (price, aggregate leaves) pairs,
    /// best (highest) first.
    pub fn bid_levels(&self, depth: usize) -> Vec<(Decimal, Decimal)> {
        self.bids
            .values()
            .rev()
            .take(depth)
            .map(|level| (level.price, level.total_volume))
            .collect()
    }

    /// Returns up to `depth` ask levels as (price, aggregate leaves) pairs,
    /// best (lowest) first.
    pub fn ask_levels(&self, depth: usize) -> Vec<(Decimal, Decimal)> {
        self.asks
            .values()
            .take(depth)
            .map(|level| (level.price, level.total_volume))
            .collect()
    }

    /// Builds a serializable depth snapshot of up to `depth` levels per
    /// side. Every aggregate equals the sum of queued leaves at the snapshot
    /// instant.
    pub fn depth_snapshot(&self, depth: usize) -> DepthSnapshot {
        let bids = self
            .bids
            .values()
            .rev()
            .take(depth)
            .map(DepthLevel::from_price_level)
            .collect();
        let asks = self
            .asks
            .values()
            .take(depth)
            .map(DepthLevel::from_price_level)
            .collect();
        DepthSnapshot::new(self.symbol.clone(), bids, asks)
    }

    /// Looks up a resting order by id.
    pub fn get_order(&self, order_id: Uuid) -> Option<&Order> {
        self.order_index.get(&order_id).and_then(|&(side, price)| {
            let ladder = match side {
                Side::Bid => &self.bids,
                Side::Ask => &self.asks,
            };
            ladder
                .get(&price)
                .and_then(|level| level.orders.iter().find(|o| o.id == order_id))
        })
    }

    /// Number of orders currently resting on the book.
    pub fn resting_orders(&self) -> usize {
        self.order_index.len()
    }

    //----------------------------------------------------------------------------------------------
    //  Matching internals
    //----------------------------------------------------------------------------------------------

    fn validate(&self, order: &Order) -> Result<(), RejectReason> {
        if order.quantity <= Decimal::ZERO {
            return Err(RejectReason::NonPositiveQuantity);
        }
        match order.order_type {
            OrderType::Market => Ok(()),
            OrderType::Limit | OrderType::Ioc | OrderType::Fok => match order.price {
                Some(price) if price > Decimal::ZERO => Ok(()),
                Some(_) => Err(RejectReason::NonPositivePrice),
                None => Err(RejectReason::MissingPrice),
            },
        }
    }

    fn execute_limit(&mut self, mut order: Order) -> SubmitResult {
        let limit = order.price;
        let mut trades = Vec::new();
        let mut affected = Vec::new();
        self.match_incoming(&mut order, limit, &mut trades, &mut affected);

        if !order.leaves_quantity.is_zero() {
            order.status = if order.filled_quantity.is_zero() {
                OrderStatus::Active
            } else {
                OrderStatus::PartiallyFilled
            };
            self.rest(order.clone());
        }
        SubmitResult::accepted(order, trades, affected)
    }

    fn execute_market(&mut self, mut order: Order) -> SubmitResult {
        let mut trades = Vec::new();
        let mut affected = Vec::new();
        self.match_incoming(&mut order, None, &mut trades, &mut affected);

        // A market order never rests: full fill stays Filled, a partial fill
        // stays PartiallyFilled with the residual dropped, and a zero fill
        // (empty opposite side) is Cancelled.
        if order.filled_quantity.is_zero() {
            order.status = OrderStatus::Cancelled;
            order.updated_at = Utc::now();
        }
        SubmitResult::accepted(order, trades, affected)
    }

    fn execute_ioc(&mut self, mut order: Order) -> SubmitResult {
        let limit = order.price;
        let mut trades = Vec::new();
        let mut affected = Vec::new();
        self.match_incoming(&mut order, limit, &mut trades, &mut affected);

        // Same residual policy as Market, except a zero fill means the price
        // guard kept the order off the market entirely: Expired.
        if order.filled_quantity.is_zero() {
            order.status = OrderStatus::Expired;
            order.updated_at = Utc::now();
        }
        SubmitResult::accepted(order, trades, affected)
    }

    fn execute_fok(&mut self, order: Order) -> SubmitResult {
        let Some(limit) = order.price else {
            return SubmitResult::rejected(order, RejectReason::MissingPrice);
        };
        // All-or-nothing: probe available volume before any state change so a
        // rejected order leaves the book bit-identical.
        if !self.can_fill_completely(order.side, limit, order.quantity) {
            debug!(order_id = %order.id, symbol = %self.symbol, "fill-or-kill rejected");
            return SubmitResult::rejected(order, RejectReason::InsufficientLiquidity);
        }
        self.execute_limit(order)
    }

    /// Sums opposite-side leaves across levels satisfying the price guard,
    /// best first, until the target is covered or the guard fails.
    fn can_fill_completely(&self, side: Side, limit: Decimal, target: Decimal) -> bool {
        let mut available = Decimal::ZERO;
        match side {
            Side::Bid => {
                for (price, level) in self.asks.iter() {
                    if *price > limit {
                        break;
                    }
                    available += level.total_volume;
                    if available >= target {
                        return true;
                    }
                }
            }
            Side::Ask => {
                for (price, level) in self.bids.iter().rev() {
                    if *price < limit {
                        break;
                    }
                    available += level.total_volume;
                    if available >= target {
                        return true;
                    }
                }
            }
        }
        available >= target
    }

    fn best_opposite_price(&self, taker_side: Side) -> Option<Decimal> {
        match taker_side {
            Side::Bid => self.asks.keys().next().copied(),
            Side::Ask => self.bids.keys().next_back().copied(),
        }
    }

    /// The common matching loop for Market/Limit/Ioc (and the Fok fill pass).
    /// Walks the opposite ladder best-first, filling FIFO within each level
    /// at the maker's price. Maker fills mutate the queue front in place so
    /// the level's FIFO order is never disturbed.
    fn match_incoming(
        &mut self,
        taker: &mut Order,
        limit: Option<Decimal>,
        trades: &mut Vec<Trade>,
        affected: &mut Vec<Order>,
    ) {
        while !taker.leaves_quantity.is_zero() {
            let Some(best_price) = self.best_opposite_price(taker.side) else {
                break;
            };
            if let Some(limit_price) = limit {
                let crosses = match taker.side {
                    Side::Bid => limit_price >= best_price,
                    Side::Ask => limit_price <= best_price,
                };
                if !crosses {
                    break;
                }
            }

            self.next_trade_sequence += 1;
            let trade_sequence = self.next_trade_sequence;
            let symbol = self.symbol.clone();
            let ladder = match taker.side.opposite() {
                Side::Bid => &mut self.bids,
                Side::Ask => &mut self.asks,
            };
            let Some(level) = ladder.get_mut(&best_price) else {
                break;
            };
            let Some(maker) = level.orders.front_mut() else {
                break;
            };

            let fill = taker.leaves_quantity.min(maker.leaves_quantity);
            taker.apply_fill(fill);
            maker.apply_fill(fill);
            level.total_volume -= fill;

            let maker_id = maker.id;
            let maker_done = maker.leaves_quantity.is_zero();
            let is_buyer_maker = maker.side == Side::Bid;
            affected.push(maker.clone());
            trades.push(Trade {
                id: Uuid::new_v4(),
                sequence: trade_sequence,
                symbol,
                maker_order_id: maker_id,
                taker_order_id: taker.id,
                price: best_price,
                quantity: fill,
                is_buyer_maker,
                executed_at: Utc::now(),
            });

            if maker_done {
                level.orders.pop_front();
                let level_empty = level.orders.is_empty();
                self.order_index.remove(&maker_id);
                if level_empty {
                    ladder.remove(&best_price);
                }
            }
        }
    }

    /// Inserts a residual at the back of its price level and registers it in
    /// the order index.
    fn rest(&mut self, order: Order) {
        let Some(price) = order.price else {
            return;
        };
        self.order_index.insert(order.id, (order.side, price));
        let ladder = match order.side {
            Side::Bid => &mut self.bids,
            Side::Ask => &mut self.asks,
        };
        let level = ladder.entry(price).or_insert_with(|| PriceLevel::new(price));
        level.total_volume += order.leaves_quantity;
        level.orders.push_back(order);
    }
}
