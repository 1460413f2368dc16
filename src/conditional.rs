//--------------------------------------------------------------------------------------------------
// MODULE OVERVIEW
//--------------------------------------------------------------------------------------------------
// This module implements the conditional-order layer: stop-loss, stop-limit,
// take-profit and trailing-stop orders that wait for a price signal and are
// promoted into live orders when their trigger condition fires.
//
// | Component               | Description                                            |
// |-------------------------|--------------------------------------------------------|
// | ConditionalKind         | The four conditional order kinds                       |
// | ConditionalOrder        | A pending conditional with its trigger state           |
// | ConditionalOrderManager | Per-symbol storage, trigger sweep, trailing ratchet    |
//--------------------------------------------------------------------------------------------------

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::types::{Order, Side};

/// The kind of a conditional order, determining its trigger predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConditionalKind {
    /// Fires when the price moves through the trigger against the position.
    StopLoss,
    /// Stop that fires as a limit order at a preset limit price.
    StopLimit,
    /// Fires when the price moves through the trigger in the position's favor.
    TakeProfit,
    /// Stop whose trigger ratchets with favorable price movement and fires on
    /// an adverse move of the configured distance.
    TrailingStop,
}

/// A pending conditional order. Lives in the manager until it either fires
/// (producing a live order) or is cancelled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConditionalOrder {
    /// Unique identifier for the conditional.
    pub id: Uuid,
    /// Instrument key the conditional watches.
    pub symbol: String,
    /// Kind of the conditional.
    pub kind: ConditionalKind,
    /// Side of the live order produced on fire.
    pub side: Side,
    /// Quantity of the live order produced on fire.
    pub quantity: Decimal,
    /// Trigger threshold. Dynamic for TrailingStop; `Decimal::ZERO` means
    /// the trail has not observed a price yet.
    pub trigger_price: Decimal,
    /// When set, the conditional fires as a limit order at this price;
    /// otherwise it fires as a market order.
    pub limit_price: Option<Decimal>,
    /// Trail distance for TrailingStop; zero for the other kinds.
    pub trailing_distance: Decimal,
    /// Terminal once fired.
    pub triggered: bool,
    /// Timestamp of creation.
    pub created_at: DateTime<Utc>,
}

impl ConditionalOrder {
    fn new(
        symbol: String,
        kind: ConditionalKind,
        side: Side,
        quantity: Decimal,
        trigger_price: Decimal,
        limit_price: Option<Decimal>,
        trailing_distance: Decimal,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            symbol,
            kind,
            side,
            quantity,
            trigger_price,
            limit_price,
            trailing_distance,
            triggered: false,
            created_at: Utc::now(),
        }
    }

    /// Moves a trailing trigger with favorable price movement. A buy trail
    /// follows the price down (trigger = low-water mark + distance); a sell
    /// trail follows it up (trigger = high-water mark - distance).
    /// Observations that would move the trigger the other way are ignored.
    fn ratchet(&mut self, price: Decimal) {
        match self.side {
            Side::Bid => {
                let candidate = price + self.trailing_distance;
                if self.trigger_price.is_zero() || candidate < self.trigger_price {
                    self.trigger_price = candidate;
                }
            }
            Side::Ask => {
                let candidate = price - self.trailing_distance;
                if candidate > self.trigger_price {
                    self.trigger_price = candidate;
                }
            }
        }
    }

    /// Evaluates the trigger predicate against the current price. For
    /// trailing stops the caller must ratchet first.
    fn should_fire(&self, price: Decimal) -> bool {
        match self.kind {
            ConditionalKind::StopLoss | ConditionalKind::StopLimit => match self.side {
                Side::Bid => price >= self.trigger_price,
                Side::Ask => price <= self.trigger_price,
            },
            ConditionalKind::TakeProfit => match self.side {
                Side::Bid => price <= self.trigger_price,
                Side::Ask => price >= self.trigger_price,
            },
            ConditionalKind::TrailingStop => {
                if self.trigger_price.is_zero() {
                    return false;
                }
                match self.side {
                    Side::Bid => price >= self.trigger_price,
                    Side::Ask => price <= self.trigger_price,
                }
            }
        }
    }

    /// Builds the live order this conditional promotes into: a limit order
    /// when a positive limit price was configured, a market order otherwise.
    fn to_live_order(&self) -> Order {
        match self.limit_price {
            Some(price) if price > Decimal::ZERO => {
                Order::limit(self.symbol.clone(), self.side, self.quantity, price)
            }
            _ => Order::market(self.symbol.clone(), self.side, self.quantity),
        }
    }
}

/// Stores pending conditionals per symbol and evaluates them against the
/// market-price signal fed by the engine.
///
/// The internal mutex is never held across a submission: `check_triggers`
/// returns the fired live orders and the caller replays them after the lock
/// has been released.
#[derive(Debug, Default)]
pub struct ConditionalOrderManager {
    pending: Mutex<HashMap<String, Vec<ConditionalOrder>>>,
}

impl ConditionalOrderManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a stop-loss. Fires as a market order unless a positive
    /// `execution_price` is given.
    pub fn add_stop_loss(
        &self,
        symbol: impl Into<String>,
        side: Side,
        quantity: Decimal,
        trigger_price: Decimal,
        execution_price: Option<Decimal>,
    ) -> Uuid {
        self.store(ConditionalOrder::new(
            symbol.into(),
            ConditionalKind::StopLoss,
            side,
            quantity,
            trigger_price,
            execution_price,
            Decimal::ZERO,
        ))
    }

    /// Registers a stop-limit: fires as a limit order at `limit_price`.
    pub fn add_stop_limit(
        &self,
        symbol: impl Into<String>,
        side: Side,
        quantity: Decimal,
        trigger_price: Decimal,
        limit_price: Decimal,
    ) -> Uuid {
        self.store(ConditionalOrder::new(
            symbol.into(),
            ConditionalKind::StopLimit,
            side,
            quantity,
            trigger_price,
            Some(limit_price),
            Decimal::ZERO,
        ))
    }

    /// Registers a take-profit. Fires as a market order unless a positive
    /// `execution_price` is given.
    pub fn add_take_profit(
        &self,
        symbol: impl Into<String>,
        side: Side,
        quantity: Decimal,
        trigger_price: Decimal,
        execution_price: Option<Decimal>,
    ) -> Uuid {
        self.store(ConditionalOrder::new(
            symbol.into(),
            ConditionalKind::TakeProfit,
            side,
            quantity,
            trigger_price,
            execution_price,
            Decimal::ZERO,
        ))
    }

    /// Registers a trailing stop with the given trail distance. The trigger
    /// starts uninitialised (or at `initial_trigger` when given) and ratchets
    /// with each observed price.
    pub fn add_trailing_stop(
        &self,
        symbol: impl Into<String>,
        side: Side,
        quantity: Decimal,
        trailing_distance: Decimal,
        initial_trigger: Option<Decimal>,
    ) -> Uuid {
        self.store(ConditionalOrder::new(
            symbol.into(),
            ConditionalKind::TrailingStop,
            side,
            quantity,
            initial_trigger.unwrap_or(Decimal::ZERO),
            None,
            trailing_distance,
        ))
    }

    /// Evaluates all pending conditionals for `symbol` against the current
    /// price. Trailing triggers are ratcheted before evaluation. Fired
    /// conditionals are erased and their derived live orders returned; the
    /// manager's lock is released before the caller submits them.
    pub fn check_triggers(&self, symbol: &str, price: Decimal) -> Vec<Order> {
        let mut fired = Vec::new();
        let mut pending = self.pending.lock();
        let Some(orders) = pending.get_mut(symbol) else {
            return fired;
        };

        orders.retain_mut(|conditional| {
            if conditional.kind == ConditionalKind::TrailingStop {
                conditional.ratchet(price);
            }
            if !conditional.should_fire(price) {
                return true;
            }
            conditional.triggered = true;
            info!(
                conditional_id = %conditional.id,
                symbol = %conditional.symbol,
                kind = ?conditional.kind,
                %price,
                "conditional order triggered"
            );
            fired.push(conditional.to_live_order());
            false
        });

        if orders.is_empty() {
            pending.remove(symbol);
        }
        fired
    }

    /// Cancels a pending conditional by id. Linear scan across all symbols;
    /// conditional volume is small relative to live orders.
    pub fn cancel(&self, order_id: Uuid) -> bool {
        let mut pending = self.pending.lock();
        let mut found: Option<String> = None;
        for (symbol, orders) in pending.iter_mut() {
            if let Some(position) = orders.iter().position(|o| o.id == order_id) {
                orders.remove(position);
                found = Some(symbol.clone());
                break;
            }
        }
        let Some(symbol) = found else {
            return false;
        };
        if pending.get(&symbol).is_some_and(Vec::is_empty) {
            pending.remove(&symbol);
        }
        debug!(%order_id, %symbol, "conditional order cancelled");
        true
    }

    /// Number of pending conditionals for a symbol.
    pub fn pending_count(&self, symbol: &str) -> usize {
        self.pending.lock().get(symbol).map_or(0, Vec::len)
    }

    /// Snapshot of the pending conditionals for a symbol.
    pub fn pending_for(&self, symbol: &str) -> Vec<ConditionalOrder> {
        self.pending
            .lock()
            .get(symbol)
            .cloned()
            .unwrap_or_default()
    }

    fn store(&self, conditional: ConditionalOrder) -> Uuid {
        let id = conditional.id;
        debug!(
            conditional_id = %id,
            symbol = %conditional.symbol,
            kind = ?conditional.kind,
            trigger = %conditional.trigger_price,
            "conditional order added"
        );
        self.pending
            .lock()
            .entry(conditional.symbol.clone())
            .or_default()
            .push(conditional);
        id
    }
}
