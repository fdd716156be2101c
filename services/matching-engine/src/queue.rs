//! Thread-safe order queue
//!
//! Multi-producer, multi-consumer handoff buffer decoupling submission
//! latency from matching latency. Orders observed by any single consumer
//! appear in enqueue order; across multiple consumers no total order is
//! preserved, a deliberate trade-off for throughput.

use std::collections::VecDeque;

use parking_lot::{Condvar, Mutex};
use tracing::debug;
use types::errors::EngineError;
use types::order::OrderRef;

/// Unbounded FIFO buffer of pending orders with blocking dequeue and
/// cooperative shutdown
///
/// Critical sections do O(1) work; waiters are signaled after the lock is
/// released.
#[derive(Debug, Default)]
pub struct OrderQueue {
    state: Mutex<QueueState>,
    available: Condvar,
}

#[derive(Debug, Default)]
struct QueueState {
    orders: VecDeque<OrderRef>,
    shutdown: bool,
}

impl OrderQueue {
    /// Create a new open queue
    pub fn new() -> Self {
        Self {
            state: Mutex::new(QueueState {
                orders: VecDeque::new(),
                shutdown: false,
            }),
            available: Condvar::new(),
        }
    }

    /// Add an order to the tail and wake one waiting consumer
    ///
    /// After [`OrderQueue::shutdown`] the queue no longer accepts orders and
    /// enqueues are rejected.
    pub fn enqueue(&self, order: OrderRef) -> Result<(), EngineError> {
        {
            let mut state = self.state.lock();
            if state.shutdown {
                return Err(EngineError::Stopped);
            }
            state.orders.push_back(order);
        }
        self.available.notify_one();
        Ok(())
    }

    /// Take the head order without blocking
    pub fn try_dequeue(&self) -> Option<OrderRef> {
        self.state.lock().orders.pop_front()
    }

    /// Take the head order, blocking until one is available
    ///
    /// Returns `None` only once the queue has been shut down AND drained;
    /// orders enqueued before shutdown remain observable until consumed.
    /// `None` is the drain-and-exit signal for workers, not an error.
    pub fn dequeue(&self) -> Option<OrderRef> {
        let mut state = self.state.lock();
        loop {
            if let Some(order) = state.orders.pop_front() {
                return Some(order);
            }
            if state.shutdown {
                return None;
            }
            self.available.wait(&mut state);
        }
    }

    /// Transition to drain-and-exit mode and wake all waiting consumers
    ///
    /// Idempotent.
    pub fn shutdown(&self) {
        {
            let mut state = self.state.lock();
            state.shutdown = true;
        }
        self.available.notify_all();
        debug!("Order queue shut down");
    }

    /// Reopen a shut-down queue, preserving any still-queued orders
    ///
    /// Used by the engine on restart.
    pub fn reopen(&self) {
        let mut state = self.state.lock();
        state.shutdown = false;
    }

    /// Check if the queue is empty (may be momentarily stale)
    pub fn is_empty(&self) -> bool {
        self.state.lock().orders.is_empty()
    }

    /// Current queue length (may be momentarily stale)
    pub fn len(&self) -> usize {
        self.state.lock().orders.len()
    }
}
