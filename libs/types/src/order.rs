//! Order lifecycle types
//!
//! An order is created by a producer, handed to the engine, and mutated by
//! the matcher as fills are applied. Producers may keep an [`OrderRef`]
//! clone to observe status; all mutation happens inside the book's writer
//! section.

use crate::errors::OrderError;
use crate::ids::OrderId;
use crate::numeric::{Price, Quantity};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Order side (buyer or seller)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    /// Buy order (bid)
    Buy,
    /// Sell order (ask)
    Sell,
}

impl Side {
    /// Get the opposite side
    pub fn opposite(&self) -> Self {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

/// Order type
///
/// Limit orders carry a worst-acceptable price and may rest in the book.
/// Market orders accept any price and never rest; an unfilled remainder is
/// canceled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderType {
    Limit,
    Market,
}

/// Order status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// Accepted, no fills yet
    New,
    /// Some quantity filled, some remaining
    PartiallyFilled,
    /// Completely filled (terminal)
    Filled,
    /// Canceled; no further fills may be applied (terminal)
    Canceled,
    /// Failed validation at book entry (terminal)
    Rejected,
}

impl OrderStatus {
    /// Check if status is terminal (no further fills possible)
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderStatus::Filled | OrderStatus::Canceled | OrderStatus::Rejected
        )
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            OrderStatus::New => "NEW",
            OrderStatus::PartiallyFilled => "PARTIALLY_FILLED",
            OrderStatus::Filled => "FILLED",
            OrderStatus::Canceled => "CANCELED",
            OrderStatus::Rejected => "REJECTED",
        };
        write!(f, "{label}")
    }
}

/// Shared handle to an order
///
/// Producers and the engine both hold clones; the book owns the resting
/// lifetime. Reads outside the engine take a brief read lock.
pub type OrderRef = Arc<RwLock<Order>>;

/// A standing intent to trade
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub side: Side,
    pub order_type: OrderType,
    /// Limit price; `None` for market orders
    pub price: Option<Price>,
    pub quantity: Quantity,
    pub filled_quantity: Quantity,
    /// Unix nanos at creation; tiebreaker at equal price, never mutated
    pub timestamp: i64,
    pub status: OrderStatus,
}

impl Order {
    /// Create a new limit order
    pub fn limit(id: OrderId, side: Side, price: Price, quantity: Quantity, timestamp: i64) -> Self {
        Self {
            id,
            side,
            order_type: OrderType::Limit,
            price: Some(price),
            quantity,
            filled_quantity: Quantity::zero(),
            timestamp,
            status: OrderStatus::New,
        }
    }

    /// Create a new market order
    pub fn market(id: OrderId, side: Side, quantity: Quantity, timestamp: i64) -> Self {
        Self {
            id,
            side,
            order_type: OrderType::Market,
            price: None,
            quantity,
            filled_quantity: Quantity::zero(),
            timestamp,
            status: OrderStatus::New,
        }
    }

    /// Wrap into a shared handle for submission to the engine
    pub fn into_shared(self) -> OrderRef {
        Arc::new(RwLock::new(self))
    }

    /// Quantity still open: `quantity - filled_quantity`
    pub fn remaining_quantity(&self) -> Quantity {
        self.quantity - self.filled_quantity
    }

    /// Validate the order for book entry
    ///
    /// An order with nothing left to trade, or a limit order without a
    /// price, cannot be admitted.
    pub fn validate(&self) -> Result<(), OrderError> {
        if self.remaining_quantity().is_zero() {
            return Err(OrderError::InvalidOrder);
        }
        if self.order_type == OrderType::Limit && self.price.is_none() {
            return Err(OrderError::InvalidOrder);
        }
        Ok(())
    }

    /// Check if order is completely filled
    pub fn is_filled(&self) -> bool {
        self.filled_quantity == self.quantity
    }

    /// Check quantity invariant: filled + remaining = total
    pub fn check_invariant(&self) -> bool {
        self.filled_quantity + self.remaining_quantity() == self.quantity
    }

    /// Apply a fill to this order
    ///
    /// Rejected wholly (no mutation) when the fill quantity is zero, exceeds
    /// the remaining quantity, or the order is already terminal.
    pub fn fill(&mut self, fill_quantity: Quantity) -> Result<(), OrderError> {
        if self.status.is_terminal()
            || fill_quantity.is_zero()
            || fill_quantity > self.remaining_quantity()
        {
            return Err(OrderError::InvalidFill {
                quantity: fill_quantity.as_u64(),
                remaining: self.remaining_quantity().as_u64(),
            });
        }

        self.filled_quantity = self.filled_quantity + fill_quantity;
        self.status = if self.is_filled() {
            OrderStatus::Filled
        } else {
            OrderStatus::PartiallyFilled
        };

        Ok(())
    }

    /// Cancel the order; a no-op on an already filled order
    pub fn cancel(&mut self) {
        if self.status != OrderStatus::Filled {
            self.status = OrderStatus::Canceled;
        }
    }

    /// Mark the order as rejected
    pub fn reject(&mut self) {
        self.status = OrderStatus::Rejected;
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Order{{id={}, side={}, type={}",
            self.id,
            match self.side {
                Side::Buy => "BUY",
                Side::Sell => "SELL",
            },
            match self.order_type {
                OrderType::Limit => "LIMIT",
                OrderType::Market => "MARKET",
            },
        )?;
        if let Some(price) = self.price {
            write!(f, ", price={price}")?;
        }
        write!(
            f,
            ", qty={}, filled={}, status={}}}",
            self.quantity, self.filled_quantity, self.status
        )
    }
}
