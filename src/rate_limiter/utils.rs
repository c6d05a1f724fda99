//! # Utility Functions (utils.rs)
//!
//! Clock helpers shared by the permit pool and the refill scheduler.

use std::sync::OnceLock;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

// Monotonic time base to prevent issues when the system clock jumps.
// We capture the wall-clock epoch milliseconds at process start,
// then advance using a monotonic Instant to compute 'now'.
static START_TIME_BASE: OnceLock<(Instant, u64)> = OnceLock::new();

/// Returns the current time in milliseconds since UNIX epoch.
///
/// Advances monotonically from a base captured on first use, so refill
/// timestamps never go backwards when the wall clock is adjusted.
///
/// ```rust
/// use crpt_api::current_time_ms;
///
/// let now = current_time_ms();
/// assert!(now > 0);
/// ```
#[inline]
pub fn current_time_ms() -> u64 {
    let (start, base_ms) = START_TIME_BASE.get_or_init(|| {
        let epoch_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64;
        (Instant::now(), epoch_ms)
    });
    base_ms.saturating_add(start.elapsed().as_millis() as u64)
}

/// Returns the deadline of tick `index` for a fixed-rate schedule.
///
/// Deadlines are anchored at `start`, so a late tick does not push
/// every following tick back.
#[inline]
pub(crate) fn tick_deadline(start: Instant, interval_ms: u64, index: u64) -> Instant {
    let offset_ms = interval_ms.saturating_mul(index);
    start + std::time::Duration::from_millis(offset_ms)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_time_monotonicity() {
        let mut last = current_time_ms();
        for _ in 0..100 {
            let now = current_time_ms();
            assert!(now >= last);
            last = now;
        }
    }

    #[test]
    fn test_tick_deadline() {
        let start = Instant::now();
        assert_eq!(tick_deadline(start, 250, 0), start);
        assert_eq!(tick_deadline(start, 250, 4), start + Duration::from_secs(1));
    }
}
