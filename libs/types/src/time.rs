//! Wall-clock helper
//!
//! All timestamps in the engine are i64 unix nanos. Order timestamps are
//! assigned at construction; trade timestamps at execution.

use std::time::{SystemTime, UNIX_EPOCH};

/// Current wall-clock time as unix nanos
pub fn unix_nanos() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unix_nanos_advances() {
        let a = unix_nanos();
        let b = unix_nanos();
        assert!(a > 1_500_000_000_000_000_000); // after 2017
        assert!(b >= a);
    }
}
