//--------------------------------------------------------------------------------------------------
// MODULE OVERVIEW
//--------------------------------------------------------------------------------------------------
// This module implements the engine that owns the per-symbol order books,
// routes submissions and cancels, publishes trade and order-update events,
// and drives the conditional-order layer on each market price tick.
//
// | Component       | Description                                                |
// |-----------------|------------------------------------------------------------|
// | MatchingEngine  | Symbol -> OrderBook routing, counters, event publication   |
// | EngineError     | Errors for submissions that never reach a book             |
//
//--------------------------------------------------------------------------------------------------
// FUNCTIONS
//--------------------------------------------------------------------------------------------------
// | Name                  | Description                                  | Return Type          |
// |-----------------------|----------------------------------------------|----------------------|
// | add_symbol            | Creates a book for a symbol (idempotent)     | ()                   |
// | submit_order          | Routes an order to its book and publishes    | EngineResult<SubmitResult> |
// | cancel_order          | Cancels a resting order by symbol and id     | EngineResult<bool>   |
// | modify_order          | Quantity-only amendment                      | EngineResult<bool>   |
// | update_market_price   | Feeds the conditional layer a price signal   | ()                   |
//--------------------------------------------------------------------------------------------------

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::conditional::ConditionalOrderManager;
use crate::config::Config;
use crate::depth::DepthSnapshot;
use crate::events::{Event, EventBus, Subscription};
use crate::fees::FeeSchedule;
use crate::metrics::{LatencyHistogram, LatencySummary, ThroughputCounter};
use crate::orderbook::{OrderBook, SubmitResult};
use crate::types::{Order, Side};

/// Errors for requests the engine cannot route to a book. Everything that
/// happens inside a book (validation, FOK liquidity, not-found cancels) is a
/// structured outcome on the result, not an error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// The symbol has no registered order book.
    #[error("symbol {0} is not registered with the engine")]
    UnknownSymbol(String),
}

/// Type alias for Result with EngineError
pub type EngineResult<T> = Result<T, EngineError>;

/// The engine owning every symbol's order book.
///
/// Locking: the symbol map's RwLock is held only for lookup and insertion
/// and is released before any book code runs; each book operation holds that
/// book's mutex for its whole duration. Events are published while the book
/// mutex is held so that, per symbol, the event stream matches the matching
/// order (publication is a non-blocking channel send, see `EventBus`).
pub struct MatchingEngine {
    books: RwLock<HashMap<String, Arc<Mutex<OrderBook>>>>,
    conditionals: ConditionalOrderManager,
    fees: FeeSchedule,
    event_bus: EventBus,
    orders_accepted: ThroughputCounter,
    trades_executed: AtomicU64,
    submit_latency: LatencyHistogram,
}

impl MatchingEngine {
    /// Creates an engine with default fees and no symbols.
    pub fn new() -> Self {
        Self::with_fee_schedule(FeeSchedule::default())
    }

    /// Creates an engine with the given fee schedule.
    pub fn with_fee_schedule(fees: FeeSchedule) -> Self {
        Self {
            books: RwLock::new(HashMap::new()),
            conditionals: ConditionalOrderManager::new(),
            fees,
            event_bus: EventBus::new("matching-engine"),
            orders_accepted: ThroughputCounter::new(),
            trades_executed: AtomicU64::new(0),
            submit_latency: LatencyHistogram::new(),
        }
    }

    /// Creates an engine from configuration: fee rates and pre-registered
    /// symbols.
    pub fn from_config(config: &Config) -> Self {
        let engine = Self::with_fee_schedule(FeeSchedule::new(config.maker_fee, config.taker_fee));
        for symbol in &config.symbols {
            engine.add_symbol(symbol);
        }
        engine
    }

    /// Registers a symbol, creating its order book. Idempotent: an existing
    /// book is left untouched.
    pub fn add_symbol(&self, symbol: &str) {
        let mut books = self.books.write();
        if !books.contains_key(symbol) {
            books.insert(symbol.to_string(), Arc::new(Mutex::new(OrderBook::new(symbol))));
            info!(%symbol, "symbol added");
        }
    }

    /// Submits an order to its symbol's book and publishes the resulting
    /// events.
    ///
    /// # Returns
    /// * `Ok(SubmitResult)` - The matching outcome (including structured
    ///   rejections with `accepted == false`)
    /// * `Err(EngineError::UnknownSymbol)` - The symbol has no book; no side
    ///   effects
    pub fn submit_order(&self, order: Order) -> EngineResult<SubmitResult> {
        let book = self.book(&order.symbol)?;
        let started = std::time::Instant::now();
        let mut book = book.lock();
        let result = book.submit(order);

        if result.accepted {
            self.orders_accepted.increment(1);
            self.trades_executed
                .fetch_add(result.trades.len() as u64, Ordering::Relaxed);
        }

        // Published under the book mutex: the per-symbol event stream is
        // exactly the matching order. One trade event per pair-fill, each
        // followed by the touched maker's update, then the taker's terminal
        // update.
        for (trade, maker) in result.trades.iter().zip(result.affected.iter()) {
            self.event_bus.publish(Event::Trade(trade.clone()));
            self.event_bus.publish(Event::OrderUpdate(maker.clone()));
        }
        self.event_bus.publish(Event::OrderUpdate(result.taker.clone()));

        self.submit_latency.record(started.elapsed().as_nanos() as u64);
        Ok(result)
    }

    /// Cancels a resting order. Returns false when no resting order with
    /// this id exists on the symbol's book (idempotent).
    pub fn cancel_order(&self, symbol: &str, order_id: Uuid) -> EngineResult<bool> {
        let book = self.book(symbol)?;
        let mut book = book.lock();
        match book.cancel(order_id) {
            Some(cancelled) => {
                self.event_bus.publish(Event::OrderUpdate(cancelled));
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Amends the quantity of a resting order without changing its time
    /// priority.
    pub fn modify_order(
        &self,
        symbol: &str,
        order_id: Uuid,
        new_quantity: Decimal,
    ) -> EngineResult<bool> {
        let book = self.book(symbol)?;
        let mut book = book.lock();
        let modified = book.modify(order_id, new_quantity);
        if modified {
            if let Some(order) = book.get_order(order_id) {
                self.event_bus.publish(Event::OrderUpdate(order.clone()));
            }
        }
        Ok(modified)
    }

    /// Feeds the conditional layer a market price for `symbol` (last trade
    /// or midpoint, the caller's choice - the engine treats it as opaque).
    /// Conditionals that fire are promoted into live orders and replayed
    /// through `submit_order` after the manager's lock has been released.
    pub fn update_market_price(&self, symbol: &str, price: Decimal) {
        let fired = self.conditionals.check_triggers(symbol, price);
        for order in fired {
            info!(
                order_id = %order.id,
                %symbol,
                side = ?order.side,
                order_type = ?order.order_type,
                "submitting triggered conditional order"
            );
            if let Err(error) = self.submit_order(order) {
                warn!(%symbol, %error, "triggered conditional could not be submitted");
            }
        }
    }

    //----------------------------------------------------------------------------------------------
    //  Conditional-order surface
    //----------------------------------------------------------------------------------------------

    /// Registers a stop-loss conditional.
    pub fn add_stop_loss(
        &self,
        symbol: &str,
        side: Side,
        quantity: Decimal,
        trigger_price: Decimal,
        execution_price: Option<Decimal>,
    ) -> Uuid {
        self.conditionals
            .add_stop_loss(symbol, side, quantity, trigger_price, execution_price)
    }

    /// Registers a stop-limit conditional.
    pub fn add_stop_limit(
        &self,
        symbol: &str,
        side: Side,
        quantity: Decimal,
        trigger_price: Decimal,
        limit_price: Decimal,
    ) -> Uuid {
        self.conditionals
            .add_stop_limit(symbol, side, quantity, trigger_price, limit_price)
    }

    /// Registers a take-profit conditional.
    pub fn add_take_profit(
        &self,
        symbol: &str,
        side: Side,
        quantity: Decimal,
        trigger_price: Decimal,
        execution_price: Option<Decimal>,
    ) -> Uuid {
        self.conditionals
            .add_take_profit(symbol, side, quantity, trigger_price, execution_price)
    }

    /// Registers a trailing-stop conditional.
    pub fn add_trailing_stop(
        &self,
        symbol: &str,
        side: Side,
        quantity: Decimal,
        trailing_distance: Decimal,
        initial_trigger: Option<Decimal>,
    ) -> Uuid {
        self.conditionals
            .add_trailing_stop(symbol, side, quantity, trailing_distance, initial_trigger)
    }

    /// Cancels a pending conditional by id.
    pub fn cancel_conditional(&self, order_id: Uuid) -> bool {
        self.conditionals.cancel(order_id)
    }

    /// Number of pending conditionals for a symbol.
    pub fn pending_conditionals(&self, symbol: &str) -> usize {
        self.conditionals.pending_count(symbol)
    }

    //----------------------------------------------------------------------------------------------
    //  Introspection
    //----------------------------------------------------------------------------------------------

    /// Returns the book handle for a symbol. Snapshots taken through the
    /// handle (best prices, depth) are consistent under the book's mutex.
    pub fn get_order_book(&self, symbol: &str) -> Option<Arc<Mutex<OrderBook>>> {
        self.books.read().get(symbol).cloned()
    }

    /// Convenience: a depth snapshot of up to `depth` levels per side.
    pub fn depth_snapshot(&self, symbol: &str, depth: usize) -> EngineResult<DepthSnapshot> {
        let book = self.book(symbol)?;
        let book = book.lock();
        Ok(book.depth_snapshot(depth))
    }

    /// Registered symbols, in no particular order.
    pub fn symbols(&self) -> Vec<String> {
        self.books.read().keys().cloned().collect()
    }

    /// Total accepted submissions, regardless of fill outcome.
    pub fn total_orders(&self) -> u64 {
        self.orders_accepted.total()
    }

    /// Total trades executed across all symbols.
    pub fn total_trades(&self) -> u64 {
        self.trades_executed.load(Ordering::Relaxed)
    }

    /// Accepted submissions per second since the engine started.
    pub fn throughput_per_second(&self) -> f64 {
        self.orders_accepted.per_second()
    }

    /// Latency statistics over every submission that reached a book, in
    /// nanoseconds; None before the first submission.
    pub fn submit_latency_summary(&self) -> Option<LatencySummary> {
        self.submit_latency.summary()
    }

    /// Subscribes to the trade / order-update event stream.
    pub fn subscribe(&self) -> Subscription {
        self.event_bus.subscribe()
    }

    /// The engine's fee schedule.
    pub fn fee_schedule(&self) -> &FeeSchedule {
        &self.fees
    }

    fn book(&self, symbol: &str) -> EngineResult<Arc<Mutex<OrderBook>>> {
        self.books
            .read()
            .get(symbol)
            .cloned()
            .ok_or_else(|| EngineError::UnknownSymbol(symbol.to_string()))
    }
}

impl Default for MatchingEngine {
    fn default() -> Self {
        Self::new()
    }
}
