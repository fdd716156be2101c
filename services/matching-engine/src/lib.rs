//! Matching Engine
//!
//! Single-instrument continuous limit order book with price-time priority
//! matching and a concurrent ingestion pipeline.
//!
//! **Key Invariants:**
//! - Price-time priority strictly enforced; `(price, timestamp, order_id)`
//!   is the full resting order key
//! - Deterministic matching (same inputs → same outputs)
//! - Conservation of quantity
//! - No crossed book at rest
//!
//! Matching is serialized by the book's writer lock: worker threads amortize
//! ingestion, they do not parallelize matching. With more than one worker,
//! submission-to-match order across producers is not FIFO; the default
//! worker count is 1 for deterministic replay.

pub mod book;
pub mod engine;
pub mod matching;
pub mod queue;

pub use book::OrderBook;
pub use engine::{EngineConfig, MatchingEngine, StatsSnapshot};
pub use queue::OrderQueue;
