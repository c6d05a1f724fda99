//! # Refill Scheduler
//!
//! A single background thread that resets a [`PermitPool`] to full capacity
//! at a fixed rate.
//!
//! ```text
//!     Fixed-rate schedule (interval = 1000ms):
//!
//!     tick:   0        1        2        3
//!     time:   0ms ──── 1000ms ─ 2000ms ─ 3000ms ──► ...
//!             │        │        │        │
//!             ▼        ▼        ▼        ▼
//!          replenish replenish replenish replenish
//! ```
//!
//! The first tick fires immediately, before `start` returns. Deadlines are
//! anchored at the start time so the schedule does not drift. Ticks missed
//! while the thread was descheduled are skipped rather than replayed back
//! to back.

use super::{core::PermitPool, utils::tick_deadline};
use crate::error::CrptError;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

const THREAD_NAME: &str = "crpt-permit-refill";

/// Periodic refill driver for a [`PermitPool`].
///
/// Stop it with [`shutdown`](Self::shutdown). Dropping the scheduler
/// disconnects its stop channel, which also ends the thread, but does not
/// wait for it.
///
/// ```rust
/// use crpt_api::{PermitPool, RefillScheduler};
/// use std::time::Duration;
///
/// let pool = PermitPool::new(3);
/// let mut scheduler = RefillScheduler::start(pool.clone(), Duration::from_millis(50)).unwrap();
///
/// assert!(pool.try_acquire());
/// std::thread::sleep(Duration::from_millis(120));
/// assert_eq!(pool.available(), 3);
///
/// scheduler.shutdown();
/// assert!(!scheduler.is_running());
/// ```
pub struct RefillScheduler {
    interval_ms: u64,
    ticks: Arc<AtomicU64>,
    stop_tx: Option<mpsc::Sender<()>>,
    handle: Option<thread::JoinHandle<()>>,
}

impl RefillScheduler {
    /// Spawns the refill thread for `pool`, firing every `interval`.
    ///
    /// # Errors
    ///
    /// - [`CrptError::InvalidConfig`] if `interval` is shorter than 1ms
    /// - [`CrptError::Spawn`] if the OS refuses to create the thread
    pub fn start(pool: PermitPool, interval: Duration) -> Result<Self, CrptError> {
        let interval_ms = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX);
        if interval_ms == 0 {
            return Err(CrptError::InvalidConfig(
                "refill interval must be at least 1ms".into(),
            ));
        }

        let (stop_tx, stop_rx) = mpsc::channel();
        let ticks = Arc::new(AtomicU64::new(0));
        let tick_counter = ticks.clone();

        // Tick 0 runs on the caller's thread so the pool is already reset
        // when `start` returns.
        let start = Instant::now();
        pool.replenish();
        ticks.fetch_add(1, Ordering::Relaxed);

        let handle = thread::Builder::new()
            .name(THREAD_NAME.to_string())
            .spawn(move || {
                info!(
                    "Started permit refill thread (interval: {}ms, capacity: {})",
                    interval_ms,
                    pool.capacity()
                );

                let mut index: u64 = 0;

                loop {
                    // Next boundary strictly in the future; missed ones are dropped.
                    let elapsed_ms = start.elapsed().as_millis() as u64;
                    let next = (index + 1).max(elapsed_ms / interval_ms + 1);
                    if next > index + 1 {
                        debug!("Skipped {} late refill ticks", next - index - 1);
                    }
                    index = next;

                    let wait = tick_deadline(start, interval_ms, index)
                        .saturating_duration_since(Instant::now());

                    match stop_rx.recv_timeout(wait) {
                        Ok(()) | Err(mpsc::RecvTimeoutError::Disconnected) => {
                            info!("Permit refill thread stopping");
                            break;
                        }
                        Err(mpsc::RecvTimeoutError::Timeout) => {
                            pool.replenish();
                            tick_counter.fetch_add(1, Ordering::Relaxed);
                        }
                    }
                }
            })
            .map_err(CrptError::Spawn)?;

        Ok(Self {
            interval_ms,
            ticks,
            stop_tx: Some(stop_tx),
            handle: Some(handle),
        })
    }

    /// Stops the thread and waits for it to exit.
    ///
    /// A tick already in progress completes. Calling this more than once is a no-op.
    pub fn shutdown(&mut self) {
        if let Some(stop_tx) = self.stop_tx.take() {
            // A send error only means the thread is already gone.
            let _ = stop_tx.send(());
        }

        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("Permit refill thread panicked");
            }
        }
    }

    /// Returns `true` while the refill thread is alive.
    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Number of ticks fired so far.
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }

    /// Refill interval.
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

impl std::fmt::Debug for RefillScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefillScheduler")
            .field("interval_ms", &self.interval_ms)
            .field("ticks", &self.ticks())
            .field("running", &self.is_running())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_tick_is_immediate() {
        let pool = PermitPool::new(2);
        assert!(pool.try_acquire());
        assert!(pool.try_acquire());

        let mut scheduler = RefillScheduler::start(pool.clone(), Duration::from_secs(60)).unwrap();
        thread::sleep(Duration::from_millis(50));

        assert_eq!(scheduler.ticks(), 1);
        assert_eq!(pool.available(), 2);
        scheduler.shutdown();
    }

    #[test]
    fn test_ticks_follow_interval() {
        let pool = PermitPool::new(1);
        let mut scheduler = RefillScheduler::start(pool, Duration::from_millis(100)).unwrap();

        // Ticks at ~0, 100, 200, 300ms
        thread::sleep(Duration::from_millis(350));
        let ticks = scheduler.ticks();
        assert!((3..=5).contains(&ticks), "unexpected tick count {}", ticks);

        scheduler.shutdown();
    }

    #[test]
    fn test_shutdown_stops_ticks() {
        let pool = PermitPool::new(1);
        let mut scheduler = RefillScheduler::start(pool.clone(), Duration::from_millis(20)).unwrap();
        thread::sleep(Duration::from_millis(70));

        scheduler.shutdown();
        assert!(!scheduler.is_running());
        let ticks = scheduler.ticks();

        assert!(pool.try_acquire());
        thread::sleep(Duration::from_millis(80));
        assert_eq!(scheduler.ticks(), ticks);
        assert_eq!(pool.available(), 0);

        // Idempotent
        scheduler.shutdown();
    }

    #[test]
    fn test_drop_stops_thread() {
        let pool = PermitPool::new(1);
        let scheduler = RefillScheduler::start(pool.clone(), Duration::from_millis(20)).unwrap();
        let ticks = scheduler.ticks.clone();
        drop(scheduler);

        thread::sleep(Duration::from_millis(50));
        let after_drop = ticks.load(Ordering::Relaxed);
        thread::sleep(Duration::from_millis(80));
        assert_eq!(ticks.load(Ordering::Relaxed), after_drop);
    }

    #[test]
    fn test_rejects_sub_millisecond_interval() {
        let pool = PermitPool::new(1);
        let result = RefillScheduler::start(pool, Duration::from_micros(500));
        assert!(matches!(result, Err(CrptError::InvalidConfig(_))));
    }

    #[test]
    fn test_debug_format() {
        let pool = PermitPool::new(1);
        let mut scheduler = RefillScheduler::start(pool, Duration::from_secs(1)).unwrap();
        assert_eq!(scheduler.interval(), Duration::from_secs(1));
        assert!(format!("{:?}", scheduler).contains("interval_ms: 1000"));
        scheduler.shutdown();
    }
}
