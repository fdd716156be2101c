//! Error types for the matching engine
//!
//! Invalid orders are reported by status (`Rejected`) rather than raised;
//! these types cover fill-application failures and API-level misuse. Queue
//! shutdown is not an error: a drained, closed queue yields `None` from
//! `dequeue`.

use thiserror::Error;

/// Order-specific errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OrderError {
    /// Fill quantity is zero, exceeds the remaining quantity, or was applied
    /// to a terminal order. The order is never partially mutated.
    #[error("invalid fill: quantity {quantity} against remaining {remaining}")]
    InvalidFill { quantity: u64, remaining: u64 },

    /// Order quantity was zero at book entry
    #[error("invalid order: quantity must be positive")]
    InvalidOrder,
}

/// Engine lifecycle errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// `submit` was called while the engine is not running
    #[error("engine is stopped; call start() before submitting orders")]
    Stopped,
}
