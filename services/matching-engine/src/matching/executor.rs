//! Trade execution logic
//!
//! Applies fills to both sides of a match and generates sequenced trades.

use types::errors::OrderError;
use types::ids::OrderId;
use types::numeric::{Price, Quantity};
use types::order::{Order, Side};
use types::trade::Trade;

/// Trade executor owning the book's monotonic trade sequence
#[derive(Debug, Default)]
pub struct TradeExecutor {
    sequence_counter: u64,
}

impl TradeExecutor {
    /// Create a new executor; sequences start at 1
    pub fn new() -> Self {
        Self {
            sequence_counter: 0,
        }
    }

    /// Get next sequence number (monotonically increasing)
    fn next_sequence(&mut self) -> u64 {
        self.sequence_counter += 1;
        self.sequence_counter
    }

    /// Execute a fill of `quantity` between the incoming taker and the
    /// resting maker at the maker's price
    ///
    /// Whole-or-nothing: the fill is validated against both orders before
    /// either is mutated, so a failure leaves the match untouched.
    pub fn execute(
        &mut self,
        taker: &mut Order,
        maker: &mut Order,
        price: Price,
        quantity: Quantity,
        executed_at: i64,
    ) -> Result<Trade, OrderError> {
        if taker.status.is_terminal()
            || maker.status.is_terminal()
            || quantity.is_zero()
            || quantity > taker.remaining_quantity()
            || quantity > maker.remaining_quantity()
        {
            return Err(OrderError::InvalidFill {
                quantity: quantity.as_u64(),
                remaining: taker
                    .remaining_quantity()
                    .min(maker.remaining_quantity())
                    .as_u64(),
            });
        }

        taker.fill(quantity)?;
        maker.fill(quantity)?;

        let (buy_order_id, sell_order_id): (OrderId, OrderId) = match taker.side {
            Side::Buy => (taker.id, maker.id),
            Side::Sell => (maker.id, taker.id),
        };

        Ok(Trade::new(
            self.next_sequence(),
            buy_order_id,
            sell_order_id,
            price,
            quantity,
            executed_at,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order(id: u64, side: Side, qty: u64) -> Order {
        Order::limit(
            OrderId::new(id),
            side,
            Price::from_u64(100),
            Quantity::new(qty),
            id as i64,
        )
    }

    #[test]
    fn test_execute_fills_both_sides() {
        let mut executor = TradeExecutor::new();
        let mut taker = order(1, Side::Buy, 10);
        let mut maker = order(2, Side::Sell, 4);

        let trade = executor
            .execute(
                &mut taker,
                &mut maker,
                Price::from_u64(100),
                Quantity::new(4),
                42,
            )
            .unwrap();

        assert_eq!(trade.sequence, 1);
        assert_eq!(trade.buy_order_id, OrderId::new(1));
        assert_eq!(trade.sell_order_id, OrderId::new(2));
        assert_eq!(trade.quantity, Quantity::new(4));
        assert_eq!(taker.filled_quantity, Quantity::new(4));
        assert!(maker.is_filled());
    }

    #[test]
    fn test_buy_sell_ids_from_taker_side() {
        let mut executor = TradeExecutor::new();
        let mut taker = order(1, Side::Sell, 5);
        let mut maker = order(2, Side::Buy, 5);

        let trade = executor
            .execute(
                &mut taker,
                &mut maker,
                Price::from_u64(100),
                Quantity::new(5),
                0,
            )
            .unwrap();

        assert_eq!(trade.buy_order_id, OrderId::new(2));
        assert_eq!(trade.sell_order_id, OrderId::new(1));
    }

    #[test]
    fn test_sequence_monotonic() {
        let mut executor = TradeExecutor::new();
        let mut taker = order(1, Side::Buy, 10);
        let mut m1 = order(2, Side::Sell, 3);
        let mut m2 = order(3, Side::Sell, 3);

        let t1 = executor
            .execute(&mut taker, &mut m1, Price::from_u64(100), Quantity::new(3), 0)
            .unwrap();
        let t2 = executor
            .execute(&mut taker, &mut m2, Price::from_u64(100), Quantity::new(3), 0)
            .unwrap();

        assert_eq!(t1.sequence, 1);
        assert_eq!(t2.sequence, 2);
    }

    #[test]
    fn test_oversized_fill_rejected_without_mutation() {
        let mut executor = TradeExecutor::new();
        let mut taker = order(1, Side::Buy, 10);
        let mut maker = order(2, Side::Sell, 4);

        let result = executor.execute(
            &mut taker,
            &mut maker,
            Price::from_u64(100),
            Quantity::new(5),
            0,
        );

        assert!(result.is_err());
        assert_eq!(taker.filled_quantity, Quantity::zero());
        assert_eq!(maker.filled_quantity, Quantity::zero());
    }

    #[test]
    fn test_fill_against_canceled_maker_rejected() {
        let mut executor = TradeExecutor::new();
        let mut taker = order(1, Side::Buy, 10);
        let mut maker = order(2, Side::Sell, 4);
        maker.cancel();

        let result = executor.execute(
            &mut taker,
            &mut maker,
            Price::from_u64(100),
            Quantity::new(4),
            0,
        );

        assert!(result.is_err());
        assert_eq!(taker.filled_quantity, Quantity::zero());
    }
}
