//! # Metrics
//!
//! Point-in-time snapshot of the permit pool.
//!
//! ```text
//!     Permit Pool Snapshot:
//!     ┌─────────────────────────────────────┐
//!     │  Available: 2/5                     │
//!     │  Waiting callers: 3                 │
//!     │  Refills: 12   Cancelled: 1         │
//!     │  Max wait: 998.4ms                  │
//!     └─────────────────────────────────────┘
//! ```

use std::fmt;

/// Snapshot of a [`PermitPool`](crate::PermitPool).
///
/// Counters are read without a global lock, so fields may be very slightly
/// out of step with each other under heavy concurrency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermitPoolMetrics {
    /// Maximum permits per window.
    pub capacity: u32,

    /// Permits available right now.
    pub available: u32,

    /// Callers currently blocked waiting for a permit.
    pub waiters: u32,

    /// Whether the pool has been closed.
    pub closed: bool,

    /// Permits handed out since creation.
    pub total_acquired: u64,

    /// Replenish operations performed.
    pub total_refills: u64,

    /// Waits abandoned through a cancel token.
    pub total_cancelled: u64,

    /// Waits that ran past their timeout.
    pub total_timeouts: u64,

    /// Longest time a caller spent inside an acquire, in nanoseconds.
    pub max_wait_time_ns: u64,

    /// Timestamp of the last replenish (ms since UNIX epoch).
    pub last_refill_ms: u64,
}

impl PermitPoolMetrics {
    /// Fraction of the window's permits already spent (0.0 to 1.0).
    ///
    /// ```rust
    /// use crpt_api::PermitPool;
    ///
    /// let pool = PermitPool::new(4);
    /// pool.acquire().unwrap();
    /// assert_eq!(pool.metrics().utilization(), 0.25);
    /// ```
    #[inline]
    pub fn utilization(&self) -> f64 {
        if self.capacity == 0 {
            0.0
        } else {
            1.0 - (self.available as f64 / self.capacity as f64)
        }
    }

    /// `true` when the pool is empty and callers are queued behind it.
    #[inline]
    pub fn is_saturated(&self) -> bool {
        self.available == 0 && self.waiters > 0
    }

    /// Maximum wait time in milliseconds.
    #[inline]
    pub fn max_wait_time_ms(&self) -> f64 {
        self.max_wait_time_ns as f64 / 1_000_000.0
    }

    /// Human-readable multi-line report.
    pub fn summary(&self) -> String {
        format!(
            "Permit Pool Metrics:\n\
             ├─ Capacity:\n\
             │  ├─ Available Permits: {}/{}\n\
             │  ├─ Utilization: {:.2}%\n\
             │  └─ Waiting Callers: {}\n\
             ├─ Counters:\n\
             │  ├─ Total Acquired: {}\n\
             │  ├─ Total Refills: {}\n\
             │  ├─ Total Cancelled: {}\n\
             │  └─ Total Timeouts: {}\n\
             └─ Max Wait Time: {:.3}ms",
            self.available,
            self.capacity,
            self.utilization() * 100.0,
            self.waiters,
            self.total_acquired,
            self.total_refills,
            self.total_cancelled,
            self.total_timeouts,
            self.max_wait_time_ms(),
        )
    }
}

impl fmt::Display for PermitPoolMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.summary())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> PermitPoolMetrics {
        PermitPoolMetrics {
            capacity: 5,
            available: 0,
            waiters: 2,
            closed: false,
            total_acquired: 15,
            total_refills: 3,
            total_cancelled: 1,
            total_timeouts: 0,
            max_wait_time_ns: 2_500_000,
            last_refill_ms: 1,
        }
    }

    #[test]
    fn test_pool_calculations() {
        let metrics = sample();
        assert_eq!(metrics.utilization(), 1.0);
        assert!(metrics.is_saturated());
        assert_eq!(metrics.max_wait_time_ms(), 2.5);

        let idle = PermitPoolMetrics {
            available: 5,
            waiters: 0,
            ..sample()
        };
        assert_eq!(idle.utilization(), 0.0);
        assert!(!idle.is_saturated());
    }

    #[test]
    fn test_zero_capacity_utilization() {
        let metrics = PermitPoolMetrics {
            capacity: 0,
            ..sample()
        };
        assert_eq!(metrics.utilization(), 0.0);
    }

    #[test]
    fn test_display() {
        let summary = sample().to_string();
        assert!(summary.contains("Available Permits: 0/5"));
        assert!(summary.contains("Total Refills: 3"));
        assert!(summary.contains("Max Wait Time: 2.500ms"));
    }
}
