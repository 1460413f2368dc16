// Expose the modules
pub mod conditional;
pub mod config;
pub mod depth;
pub mod events;
pub mod fees;
pub mod matching_engine;
pub mod metrics;
pub mod orderbook;
pub mod types;

// Re-export key types for easier usage
pub use conditional::{ConditionalKind, ConditionalOrder, ConditionalOrderManager};
pub use config::Config;
pub use depth::{DepthLevel, DepthSnapshot};
pub use events::{Event, EventBus, EventMetadata, Subscription};
pub use fees::{FeeBreakdown, FeeSchedule};
pub use matching_engine::{EngineError, EngineResult, MatchingEngine};
pub use metrics::{LatencyHistogram, LatencySummary, ThroughputCounter};
pub use orderbook::{OrderBook, PriceLevel, RejectReason, SubmitResult};
pub use types::{Order, OrderStatus, OrderType, Side, Trade};
