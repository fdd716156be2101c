//! Crossing detection logic
//!
//! Determines when an incoming order can trade against a resting price.

use types::numeric::Price;
use types::order::{Order, OrderType, Side};

/// Check if a bid and ask can match at given prices
///
/// A buy matches a sell when the bid price is at or above the ask price.
pub fn bid_crosses_ask(bid_price: Price, ask_price: Price) -> bool {
    bid_price >= ask_price
}

/// Check if an incoming order crosses the best resting price
///
/// Market orders cross any price. A limit buy crosses when its limit is at
/// or above the resting price; a limit sell when its limit is at or below.
pub fn incoming_crosses(incoming: &Order, resting_price: Price) -> bool {
    match incoming.order_type {
        OrderType::Market => true,
        OrderType::Limit => match (incoming.price, incoming.side) {
            (Some(limit), Side::Buy) => limit >= resting_price,
            (Some(limit), Side::Sell) => limit <= resting_price,
            // A limit order without a price is rejected at book entry
            (None, _) => false,
        },
    }
}
