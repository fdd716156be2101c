//! Matching engine lifecycle
//!
//! Owns the book, the ingestion queue, and a pool of matcher workers that
//! drain the queue into the book. Exposes asynchronous (`submit`) and
//! synchronous (`match_now`) entry points, accumulates statistics, and fans
//! out trade notifications to registered observers.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use parking_lot::{Mutex, RwLock};
use tracing::{debug, error, info, warn};
use types::errors::EngineError;
use types::order::OrderRef;
use types::trade::Trade;

use crate::book::OrderBook;
use crate::queue::OrderQueue;

/// Configuration for the matching engine
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Number of matcher worker threads draining the queue
    ///
    /// Matching itself is serialized by the book's writer lock; extra
    /// workers amortize ingestion, they do not parallelize matching. With
    /// more than one worker, submission-to-match order across producers is
    /// not FIFO.
    pub worker_count: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        // One worker keeps submission-to-match FIFO for deterministic replay
        Self { worker_count: 1 }
    }
}

/// Monotonic engine counters, updated without the book lock
#[derive(Debug, Default)]
struct EngineStats {
    orders_processed: AtomicU64,
    trades_executed: AtomicU64,
    quantity_traded: AtomicU64,
}

/// Point-in-time view of the engine counters
///
/// Each counter is monotonically non-decreasing and never reset during the
/// engine's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatsSnapshot {
    pub orders_processed: u64,
    pub trades_executed: u64,
    pub quantity_traded: u64,
}

type TradeCallback = Box<dyn Fn(&Trade) + Send + Sync>;

/// State shared between the engine handle and its workers
struct EngineCore {
    book: OrderBook,
    queue: OrderQueue,
    stats: EngineStats,
    callbacks: RwLock<Vec<TradeCallback>>,
    running: AtomicBool,
}

impl EngineCore {
    /// Match one order and publish the results
    ///
    /// The trade list is captured under the book's writer lock inside
    /// `add_order`; statistics and observer dispatch happen after release.
    fn process(&self, order: &OrderRef) -> Vec<Trade> {
        let trades = self.book.add_order(order.clone());

        self.stats.orders_processed.fetch_add(1, Ordering::Relaxed);
        if !trades.is_empty() {
            self.stats
                .trades_executed
                .fetch_add(trades.len() as u64, Ordering::Relaxed);
            let quantity: u64 = trades.iter().map(|t| t.quantity.as_u64()).sum();
            self.stats
                .quantity_traded
                .fetch_add(quantity, Ordering::Relaxed);
        }

        let callbacks = self.callbacks.read();
        if !callbacks.is_empty() {
            for trade in &trades {
                for callback in callbacks.iter() {
                    callback(trade);
                }
            }
        }

        trades
    }
}

/// The matching engine: lifecycle owner of book, queue, and workers
///
/// State machine: Stopped → Running → Stopped. Double start and double stop
/// are no-ops; `stop` is also invoked from `Drop`.
pub struct MatchingEngine {
    core: Arc<EngineCore>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    worker_count: usize,
}

impl MatchingEngine {
    /// Create an engine with the given number of matcher workers (min 1)
    pub fn new(worker_count: usize) -> Self {
        Self::with_config(EngineConfig { worker_count })
    }

    /// Create an engine from a configuration
    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            core: Arc::new(EngineCore {
                book: OrderBook::new(),
                queue: OrderQueue::new(),
                stats: EngineStats::default(),
                callbacks: RwLock::new(Vec::new()),
                running: AtomicBool::new(false),
            }),
            workers: Mutex::new(Vec::new()),
            worker_count: config.worker_count.max(1),
        }
    }

    /// Start the matcher workers
    ///
    /// Idempotent; calling on a running engine is a no-op. Reopens the
    /// queue, so a stopped engine can be restarted with identical
    /// semantics.
    pub fn start(&self) {
        if self.core.running.swap(true, Ordering::SeqCst) {
            debug!("Engine already running; start ignored");
            return;
        }

        self.core.queue.reopen();

        let mut workers = self.workers.lock();
        for worker_id in 0..self.worker_count {
            let core = Arc::clone(&self.core);
            let spawned = thread::Builder::new()
                .name(format!("matcher-{worker_id}"))
                .spawn(move || worker_loop(core, worker_id));
            match spawned {
                Ok(handle) => workers.push(handle),
                Err(err) => error!(worker_id, error = %err, "Failed to spawn matcher worker"),
            }
        }

        info!(worker_count = self.worker_count, "Matching engine started");
    }

    /// Stop the engine and join all workers
    ///
    /// Idempotent and synchronous: returns only after every worker has
    /// drained the queue and exited, so orders submitted before `stop` are
    /// matched, not dropped. A call during active matching waits for the
    /// in-flight order to complete.
    pub fn stop(&self) {
        if !self.core.running.swap(false, Ordering::SeqCst) {
            return;
        }

        self.core.queue.shutdown();

        let workers = std::mem::take(&mut *self.workers.lock());
        for handle in workers {
            if handle.join().is_err() {
                warn!("Matcher worker terminated with a panic");
            }
        }

        info!("Matching engine stopped");
    }

    /// Enqueue an order for asynchronous matching
    ///
    /// Fails with [`EngineError::Stopped`] when the engine is not running.
    pub fn submit(&self, order: OrderRef) -> Result<(), EngineError> {
        if !self.core.running.load(Ordering::SeqCst) {
            return Err(EngineError::Stopped);
        }
        self.core.queue.enqueue(order)
    }

    /// Match an order synchronously, bypassing the queue
    ///
    /// Valid whether or not the engine is running. Observer callbacks run
    /// on the calling thread, per trade in execution order, after the book
    /// lock has been released.
    pub fn match_now(&self, order: &OrderRef) -> Vec<Trade> {
        self.core.process(order)
    }

    /// Read-only access to the order book
    pub fn book(&self) -> &OrderBook {
        &self.core.book
    }

    /// Snapshot of the engine counters
    pub fn stats(&self) -> StatsSnapshot {
        StatsSnapshot {
            orders_processed: self.core.stats.orders_processed.load(Ordering::Relaxed),
            trades_executed: self.core.stats.trades_executed.load(Ordering::Relaxed),
            quantity_traded: self.core.stats.quantity_traded.load(Ordering::Relaxed),
        }
    }

    /// Register a trade observer
    ///
    /// Invoked synchronously for each trade in execution order. Observers
    /// MUST NOT call back into the engine or the book on the same thread:
    /// a worker dispatching notifications may immediately re-enter matching
    /// and the callback would deadlock against the book lock.
    pub fn on_trade<F>(&self, callback: F)
    where
        F: Fn(&Trade) + Send + Sync + 'static,
    {
        self.core.callbacks.write().push(Box::new(callback));
    }
}

impl Drop for MatchingEngine {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Worker body: drain the queue into the book until shutdown
///
/// A panic while processing one order is contained and logged; the worker
/// continues with the next order.
fn worker_loop(core: Arc<EngineCore>, worker_id: usize) {
    debug!(worker_id, "Matcher worker started");

    while let Some(order) = core.queue.dequeue() {
        let order_id = order.read().id;
        let outcome = catch_unwind(AssertUnwindSafe(|| core.process(&order)));
        if outcome.is_err() {
            error!(
                worker_id,
                order_id = %order_id,
                "Matcher worker recovered from panic while processing order"
            );
        }
    }

    debug!(worker_id, "Matcher worker exiting");
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex as PlMutex;
    use types::ids::OrderId;
    use types::numeric::{Price, Quantity};
    use types::order::{Order, OrderStatus, Side};

    fn limit(id: u64, side: Side, price: u64, qty: u64) -> OrderRef {
        Order::limit(
            OrderId::new(id),
            side,
            Price::from_u64(price),
            Quantity::new(qty),
            id as i64,
        )
        .into_shared()
    }

    #[test]
    fn test_submit_on_stopped_engine_fails() {
        let engine = MatchingEngine::new(1);
        let result = engine.submit(limit(1, Side::Buy, 100, 10));
        assert_eq!(result, Err(EngineError::Stopped));
    }

    #[test]
    fn test_match_now_works_without_start() {
        let engine = MatchingEngine::new(1);
        engine.match_now(&limit(1, Side::Sell, 100, 10));
        let trades = engine.match_now(&limit(2, Side::Buy, 100, 10));

        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].quantity, Quantity::new(10));
    }

    #[test]
    fn test_stats_accumulate() {
        let engine = MatchingEngine::new(1);
        engine.match_now(&limit(1, Side::Sell, 100, 6));
        engine.match_now(&limit(2, Side::Buy, 100, 4));
        engine.match_now(&limit(3, Side::Buy, 100, 2));

        let stats = engine.stats();
        assert_eq!(stats.orders_processed, 3);
        assert_eq!(stats.trades_executed, 2);
        assert_eq!(stats.quantity_traded, 6);
    }

    #[test]
    fn test_rejected_order_counts_as_processed() {
        let engine = MatchingEngine::new(1);
        let order = limit(1, Side::Buy, 100, 0);
        let trades = engine.match_now(&order);

        assert!(trades.is_empty());
        assert_eq!(order.read().status, OrderStatus::Rejected);
        assert_eq!(engine.stats().orders_processed, 1);
        assert_eq!(engine.stats().trades_executed, 0);
    }

    #[test]
    fn test_observers_see_trades_in_execution_order() {
        let engine = MatchingEngine::new(1);
        let seen: Arc<PlMutex<Vec<(u64, u64)>>> = Arc::new(PlMutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        engine.on_trade(move |trade| {
            sink.lock()
                .push((trade.sequence, trade.quantity.as_u64()));
        });

        engine.match_now(&limit(1, Side::Sell, 101, 5));
        engine.match_now(&limit(2, Side::Sell, 102, 5));
        engine.match_now(&limit(3, Side::Buy, 105, 10));

        assert_eq!(*seen.lock(), vec![(1, 5), (2, 5)]);
    }

    #[test]
    fn test_multiple_observers() {
        let engine = MatchingEngine::new(1);
        let count_a = Arc::new(AtomicU64::new(0));
        let count_b = Arc::new(AtomicU64::new(0));

        let a = Arc::clone(&count_a);
        engine.on_trade(move |_| {
            a.fetch_add(1, Ordering::Relaxed);
        });
        let b = Arc::clone(&count_b);
        engine.on_trade(move |_| {
            b.fetch_add(1, Ordering::Relaxed);
        });

        engine.match_now(&limit(1, Side::Sell, 100, 5));
        engine.match_now(&limit(2, Side::Buy, 100, 5));

        assert_eq!(count_a.load(Ordering::Relaxed), 1);
        assert_eq!(count_b.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_start_stop_idempotent() {
        let engine = MatchingEngine::new(2);
        engine.start();
        engine.start();
        engine.stop();
        engine.stop();
    }

    #[test]
    fn test_async_submission_is_matched() {
        let engine = MatchingEngine::new(1);
        engine.start();

        engine.submit(limit(1, Side::Sell, 100, 10)).unwrap();
        engine.submit(limit(2, Side::Buy, 100, 10)).unwrap();

        // stop() joins workers only after the queue is drained
        engine.stop();

        let stats = engine.stats();
        assert_eq!(stats.orders_processed, 2);
        assert_eq!(stats.trades_executed, 1);
        assert_eq!(stats.quantity_traded, 10);
        assert_eq!(engine.book().buy_count(), 0);
        assert_eq!(engine.book().sell_count(), 0);
    }

    #[test]
    fn test_restart_has_identical_semantics() {
        let engine = MatchingEngine::new(1);

        engine.start();
        engine.submit(limit(1, Side::Sell, 100, 5)).unwrap();
        engine.stop();

        engine.start();
        engine.submit(limit(2, Side::Buy, 100, 5)).unwrap();
        engine.stop();

        let stats = engine.stats();
        assert_eq!(stats.orders_processed, 2);
        assert_eq!(stats.trades_executed, 1);
        assert_eq!(engine.book().sell_count(), 0);
    }

    #[test]
    fn test_zero_worker_config_clamped() {
        let engine = MatchingEngine::new(0);
        engine.start();
        engine.submit(limit(1, Side::Buy, 100, 1)).unwrap();
        engine.stop();

        assert_eq!(engine.stats().orders_processed, 1);
    }
}
