use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::{Order, Trade};

/// The outbound event contract of the matching core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    /// A trade was executed. Emitted exactly once per matched pair-fill, in
    /// matching order for each symbol.
    Trade(Trade),
    /// An order transitioned state: accepted/rested, partially filled,
    /// filled, cancelled, rejected or expired. Carries the order snapshot
    /// after the transition.
    OrderUpdate(Order),
}

impl Event {
    /// Symbol the event belongs to.
    pub fn symbol(&self) -> &str {
        match self {
            Event::Trade(trade) => &trade.symbol,
            Event::OrderUpdate(order) => &order.symbol,
        }
    }
}

/// Delivery metadata attached to every published event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventMetadata {
    /// Unique identifier for this delivery.
    pub id: Uuid,
    /// Timestamp when the event was published.
    pub timestamp: DateTime<Utc>,
    /// Bus-wide sequence number for ordering events.
    pub sequence: u64,
    /// Source component that published the event.
    pub source: String,
}
