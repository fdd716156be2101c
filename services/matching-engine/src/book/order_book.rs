//! The locked order book and matching walk
//!
//! Holds the two price-ordered sides, the id index, and the trade executor
//! behind one readers-writer lock. `add_order` is the only writer; the
//! price/count/snapshot accessors are readers.
//!
//! Trades are collected into a local buffer inside the write section and
//! returned after the lock is released; trade callbacks are dispatched by
//! the engine, never from inside the book.

use std::collections::HashMap;
use std::fmt;

use parking_lot::RwLock;
use tracing::{debug, error};
use types::ids::OrderId;
use types::numeric::{Price, Quantity};
use types::order::{Order, OrderRef, OrderStatus, OrderType, Side};
use types::time::unix_nanos;
use types::trade::Trade;

use crate::matching::{crossing, TradeExecutor};

use super::ask_book::AskBook;
use super::bid_book::BidBook;

/// Default number of price levels rendered per side by [`OrderBook::snapshot`]
pub const SNAPSHOT_DEPTH: usize = 5;

/// Price-time priority limit order book for a single instrument
///
/// Thread-safe: matching runs under the writer lock, so concurrent
/// `add_order` calls are serialized and the global trade order equals the
/// writer-lock acquisition order.
#[derive(Debug, Default)]
pub struct OrderBook {
    inner: RwLock<BookInner>,
}

#[derive(Debug, Default)]
struct BookInner {
    bids: BidBook,
    asks: AskBook,
    /// Resting orders by id, for O(1) lookup during erasure
    index: HashMap<OrderId, OrderRef>,
    executor: TradeExecutor,
}

impl OrderBook {
    /// Create a new empty order book
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(BookInner {
                bids: BidBook::new(),
                asks: AskBook::new(),
                index: HashMap::new(),
                executor: TradeExecutor::new(),
            }),
        }
    }

    /// Admit an order: match it against the opposite side, then rest any
    /// unfilled limit remainder
    ///
    /// Never fails. An invalid order (zero remaining quantity, limit order
    /// without a price, duplicate id) is marked `Rejected` and yields an
    /// empty trade vector with the book untouched. A market order's
    /// unfilled remainder is canceled and never rests.
    ///
    /// Returns the trades generated, in execution order.
    pub fn add_order(&self, order: OrderRef) -> Vec<Trade> {
        let mut inner = self.inner.write();
        inner.admit(&order)
    }

    /// Best bid price (highest resting buy), if any
    pub fn best_bid(&self) -> Option<Price> {
        self.inner.read().bids.best_price()
    }

    /// Best ask price (lowest resting sell), if any
    pub fn best_ask(&self) -> Option<Price> {
        self.inner.read().asks.best_price()
    }

    /// Number of resting buy orders
    pub fn buy_count(&self) -> usize {
        self.inner.read().bids.order_count()
    }

    /// Number of resting sell orders
    pub fn sell_count(&self) -> usize {
        self.inner.read().asks.order_count()
    }

    /// Look up a resting order by id
    pub fn get(&self, id: OrderId) -> Option<OrderRef> {
        self.inner.read().index.get(&id).cloned()
    }

    /// Snapshot of the top [`SNAPSHOT_DEPTH`] price levels per side
    pub fn snapshot(&self) -> BookSnapshot {
        self.snapshot_depth(SNAPSHOT_DEPTH)
    }

    /// Snapshot of the top `depth` price levels per side
    pub fn snapshot_depth(&self, depth: usize) -> BookSnapshot {
        let inner = self.inner.read();
        BookSnapshot {
            bids: inner.bids.depth_snapshot(depth),
            asks: inner.asks.depth_snapshot(depth),
        }
    }
}

impl BookInner {
    fn admit(&mut self, order_ref: &OrderRef) -> Vec<Trade> {
        let mut order = order_ref.write();

        if let Err(err) = order.validate() {
            order.reject();
            debug!(order_id = %order.id, error = %err, "Order rejected at book entry");
            return Vec::new();
        }
        if self.index.contains_key(&order.id) {
            order.reject();
            debug!(order_id = %order.id, "Duplicate order id rejected");
            return Vec::new();
        }

        let now = unix_nanos();
        let mut trades = Vec::new();
        match order.side {
            Side::Buy => self.match_buy(&mut order, now, &mut trades),
            Side::Sell => self.match_sell(&mut order, now, &mut trades),
        }

        if order.order_type == OrderType::Market {
            // Market orders never rest
            if !order.remaining_quantity().is_zero() {
                order.cancel();
                debug!(
                    order_id = %order.id,
                    filled = %order.filled_quantity,
                    "Market order remainder canceled"
                );
            }
            return trades;
        }

        // Rest an unfilled limit remainder. The guard is released first:
        // inserting reads the order through its own lock.
        let rest_at =
            if !order.remaining_quantity().is_zero() && order.status != OrderStatus::Canceled {
                order.price.map(|price| (order.side, order.id, price))
            } else {
                None
            };
        drop(order);

        if let Some((side, id, price)) = rest_at {
            match side {
                Side::Buy => self.bids.insert(price, order_ref.clone()),
                Side::Sell => self.asks.insert(price, order_ref.clone()),
            }
            self.index.insert(id, order_ref.clone());
        }

        trades
    }

    /// Match an incoming buy against the ask side (lowest price first,
    /// oldest first within a price)
    fn match_buy(&mut self, taker: &mut Order, now: i64, trades: &mut Vec<Trade>) {
        while !taker.remaining_quantity().is_zero() {
            let Some(ask_price) = self.asks.best_price() else {
                break;
            };
            if !crossing::incoming_crosses(taker, ask_price) {
                break;
            }

            let Some((_, level)) = self.asks.best_level_mut() else {
                break;
            };
            let Some(maker_ref) = level.front() else {
                break;
            };

            let mut maker = maker_ref.write();
            let fill_qty = taker.remaining_quantity().min(maker.remaining_quantity());
            // Execution price is the resting order's price
            let trade = match self
                .executor
                .execute(taker, &mut maker, ask_price, fill_qty, now)
            {
                Ok(trade) => trade,
                Err(err) => {
                    error!(
                        error = %err,
                        taker_id = %taker.id,
                        maker_id = %maker.id,
                        "Fill application failed; stopping match walk"
                    );
                    break;
                }
            };
            level.apply_fill(fill_qty);
            let maker_done = maker.is_filled();
            let maker_id = maker.id;
            drop(maker);

            trades.push(trade);

            if maker_done {
                level.pop_front();
                let exhausted = level.is_empty();
                self.index.remove(&maker_id);
                if exhausted {
                    self.asks.remove_level(ask_price);
                }
            }
        }
    }

    /// Match an incoming sell against the bid side (highest price first,
    /// oldest first within a price)
    fn match_sell(&mut self, taker: &mut Order, now: i64, trades: &mut Vec<Trade>) {
        while !taker.remaining_quantity().is_zero() {
            let Some(bid_price) = self.bids.best_price() else {
                break;
            };
            if !crossing::incoming_crosses(taker, bid_price) {
                break;
            }

            let Some((_, level)) = self.bids.best_level_mut() else {
                break;
            };
            let Some(maker_ref) = level.front() else {
                break;
            };

            let mut maker = maker_ref.write();
            let fill_qty = taker.remaining_quantity().min(maker.remaining_quantity());
            let trade = match self
                .executor
                .execute(taker, &mut maker, bid_price, fill_qty, now)
            {
                Ok(trade) => trade,
                Err(err) => {
                    error!(
                        error = %err,
                        taker_id = %taker.id,
                        maker_id = %maker.id,
                        "Fill application failed; stopping match walk"
                    );
                    break;
                }
            };
            level.apply_fill(fill_qty);
            let maker_done = maker.is_filled();
            let maker_id = maker.id;
            drop(maker);

            trades.push(trade);

            if maker_done {
                level.pop_front();
                let exhausted = level.is_empty();
                self.index.remove(&maker_id);
                if exhausted {
                    self.bids.remove_level(bid_price);
                }
            }
        }
    }
}

/// Top-of-book snapshot for diagnostics
///
/// Renders up to the top price levels of each side as aligned columns of
/// `<price>x<qty>` cells with two-decimal prices and aggregate integer
/// quantities, or `-` when a side is exhausted. Not a stable format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookSnapshot {
    pub bids: Vec<(Price, Quantity)>,
    pub asks: Vec<(Price, Quantity)>,
}

impl fmt::Display for BookSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "ORDER BOOK")?;
        writeln!(f, "-------------------------------------------")?;
        writeln!(f, "{:>10} | {:>10}", "BUY", "SELL")?;
        writeln!(f, "-------------------------------------------")?;

        let rows = self.bids.len().max(self.asks.len());
        for i in 0..rows {
            let bid = self
                .bids
                .get(i)
                .map(|(price, qty)| format!("{price}x{qty}"))
                .unwrap_or_else(|| "-".to_string());
            let ask = self
                .asks
                .get(i)
                .map(|(price, qty)| format!("{price}x{qty}"))
                .unwrap_or_else(|| "-".to_string());
            writeln!(f, "{bid:>10} | {ask:>10}")?;
        }

        Ok(())
    }
}
