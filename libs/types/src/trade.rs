//! Trade execution records
//!
//! A trade is created only by the book during matching and is immutable.
//! It refers to orders by id (values, not references), so trades never keep
//! orders alive.

use crate::ids::OrderId;
use crate::numeric::{Price, Quantity};
use serde::{Deserialize, Serialize};
use std::fmt;

/// An execution between a buy order and a sell order
///
/// `sequence` is monotonic per book and gives the authoritative total order
/// of executions. `price` is always the resting order's price: price
/// improvement accrues to the aggressor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trade {
    pub sequence: u64,
    pub buy_order_id: OrderId,
    pub sell_order_id: OrderId,
    pub price: Price,
    pub quantity: Quantity,
    /// Unix nanos at execution
    pub executed_at: i64,
}

impl Trade {
    /// Create a new trade record
    pub fn new(
        sequence: u64,
        buy_order_id: OrderId,
        sell_order_id: OrderId,
        price: Price,
        quantity: Quantity,
        executed_at: i64,
    ) -> Self {
        Self {
            sequence,
            buy_order_id,
            sell_order_id,
            price,
            quantity,
            executed_at,
        }
    }
}

impl fmt::Display for Trade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Trade{{seq={}, buy={}, sell={}, price={}, qty={}}}",
            self.sequence, self.buy_order_id, self.sell_order_id, self.price, self.quantity
        )
    }
}
