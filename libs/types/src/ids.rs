//! Unique identifier types for engine entities
//!
//! Order ids are monotonically assigned integers, stable for the order's
//! lifetime. Allocation is an injected dependency rather than a process-wide
//! singleton so that tests can reset state and two engines can coexist with
//! disjoint id spaces.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Unique identifier for an order
///
/// Ids are assigned in submission order by an [`OrderIdGenerator`], so they
/// double as the deterministic tiebreaker when two resting orders share a
/// timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(u64);

impl OrderId {
    /// Create from a raw id value
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw id value
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Monotonic order id allocator
///
/// Lock-free; safe to share between producer threads. Each generator owns an
/// independent counter, so callers that need disjoint id spaces construct
/// separate generators with [`OrderIdGenerator::starting_at`].
#[derive(Debug)]
pub struct OrderIdGenerator {
    next: AtomicU64,
}

impl OrderIdGenerator {
    /// Create a generator starting at id 1
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    /// Create a generator starting at the given id
    pub fn starting_at(first: u64) -> Self {
        Self {
            next: AtomicU64::new(first),
        }
    }

    /// Allocate the next id (monotonically increasing)
    pub fn next_id(&self) -> OrderId {
        OrderId(self.next.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for OrderIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}
