//! Price level implementation with FIFO queue
//!
//! A price level contains all resting orders at a specific price point.
//! Orders are consumed strictly in `(timestamp, order_id)` order, which is
//! FIFO under a monotone clock and deterministic when the clock reports
//! equal values.

use std::collections::VecDeque;
use types::ids::OrderId;
use types::numeric::Quantity;
use types::order::OrderRef;

/// A price level containing orders at a specific price
///
/// Maintains the time-priority queue for one price and a cached total of
/// the remaining quantity across its orders.
#[derive(Debug, Default)]
pub struct PriceLevel {
    /// Orders at this price, ordered by (timestamp, order_id)
    orders: VecDeque<OrderRef>,
    /// Total remaining quantity at this level
    total_quantity: Quantity,
}

impl PriceLevel {
    /// Create a new empty price level
    pub fn new() -> Self {
        Self {
            orders: VecDeque::new(),
            total_quantity: Quantity::zero(),
        }
    }

    /// Insert an order, keeping `(timestamp, order_id)` order
    ///
    /// Arrivals are normally monotone in time, so this is an amortized O(1)
    /// push to the back; an equal-timestamp arrival with a smaller id is
    /// placed ahead of its peers.
    pub fn insert(&mut self, order: OrderRef) {
        let (key, remaining) = {
            let o = order.read();
            ((o.timestamp, o.id), o.remaining_quantity())
        };

        let mut idx = self.orders.len();
        while idx > 0 {
            let prev_key = {
                let o = self.orders[idx - 1].read();
                (o.timestamp, o.id)
            };
            if prev_key <= key {
                break;
            }
            idx -= 1;
        }

        self.orders.insert(idx, order);
        self.total_quantity = self.total_quantity + remaining;
    }

    /// The order at the head of the queue (oldest), if any
    pub fn front(&self) -> Option<OrderRef> {
        self.orders.front().cloned()
    }

    /// Remove and return the head order
    ///
    /// Callers pop only after the head has been fully consumed; the cached
    /// total is maintained through [`PriceLevel::apply_fill`].
    pub fn pop_front(&mut self) -> Option<OrderRef> {
        self.orders.pop_front()
    }

    /// Account for a fill of `quantity` against the head order
    pub fn apply_fill(&mut self, quantity: Quantity) {
        self.total_quantity = self.total_quantity.saturating_sub(quantity);
    }

    /// Check if the price level is empty
    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    /// Total remaining quantity at this level
    pub fn total_quantity(&self) -> Quantity {
        self.total_quantity
    }

    /// Number of orders at this level
    pub fn order_count(&self) -> usize {
        self.orders.len()
    }

    /// Ids at this level in priority order (diagnostics and tests)
    pub fn order_ids(&self) -> Vec<OrderId> {
        self.orders.iter().map(|o| o.read().id).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::ids::OrderId;
    use types::numeric::Price;
    use types::order::{Order, Side};

    fn resting_sell(id: u64, qty: u64, timestamp: i64) -> OrderRef {
        Order::limit(
            OrderId::new(id),
            Side::Sell,
            Price::from_u64(100),
            Quantity::new(qty),
            timestamp,
        )
        .into_shared()
    }

    #[test]
    fn test_insert_and_totals() {
        let mut level = PriceLevel::new();
        level.insert(resting_sell(1, 3, 10));
        level.insert(resting_sell(2, 4, 20));

        assert_eq!(level.order_count(), 2);
        assert_eq!(level.total_quantity(), Quantity::new(7));
        assert!(!level.is_empty());
    }

    #[test]
    fn test_fifo_by_timestamp() {
        let mut level = PriceLevel::new();
        level.insert(resting_sell(1, 1, 10));
        level.insert(resting_sell(2, 1, 20));
        level.insert(resting_sell(3, 1, 30));

        assert_eq!(
            level.order_ids(),
            vec![OrderId::new(1), OrderId::new(2), OrderId::new(3)]
        );
    }

    #[test]
    fn test_equal_timestamp_id_tiebreak() {
        let mut level = PriceLevel::new();
        // Id 5 arrives first, then id 3 with the same timestamp: the
        // smaller id takes priority.
        level.insert(resting_sell(5, 1, 10));
        level.insert(resting_sell(3, 1, 10));
        level.insert(resting_sell(9, 1, 10));

        assert_eq!(
            level.order_ids(),
            vec![OrderId::new(3), OrderId::new(5), OrderId::new(9)]
        );
    }

    #[test]
    fn test_pop_front() {
        let mut level = PriceLevel::new();
        level.insert(resting_sell(1, 2, 10));
        level.insert(resting_sell(2, 3, 20));

        let popped = level.pop_front().unwrap();
        assert_eq!(popped.read().id, OrderId::new(1));
        assert_eq!(level.order_count(), 1);
    }

    #[test]
    fn test_apply_fill_reduces_total() {
        let mut level = PriceLevel::new();
        level.insert(resting_sell(1, 5, 10));

        level.apply_fill(Quantity::new(2));
        assert_eq!(level.total_quantity(), Quantity::new(3));

        level.apply_fill(Quantity::new(3));
        assert_eq!(level.total_quantity(), Quantity::zero());
    }
}
