//! # Permit Pool
//!
//! A counting permit pool guarding outbound calls. Callers take one permit
//! per call and block while the pool is empty; the refill scheduler resets
//! the pool to full capacity once per window.
//!
//! ```text
//!     Permit Pool (capacity 5):
//!
//!     t=0      [■■■■■] 5/5   ◄── replenish (tick 0)
//!     acquire  [■■■■ ] 4/5
//!     acquire  [■■■  ] 3/5
//!     ...      [     ] 0/5   ◄── next acquire blocks
//!     t=1s     [■■■■■] 5/5   ◄── replenish (tick 1), waiters wake
//! ```
//!
//! ## Synchronization
//!
//! The available count lives behind a single mutex shared by acquire,
//! replenish, cancellation and close. Waiters park on a condition variable.
//! Wake-up order is unspecified: any waiter may take a fresh permit.
//!
//! Replenish is a reset, not an increment. However many ticks were missed,
//! the pool never holds more than `capacity` permits.

use super::{metrics::PermitPoolMetrics, utils::current_time_ms};
use crate::error::CrptError;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Mutable pool state. Only ever touched under the pool mutex.
#[derive(Debug)]
struct PoolState {
    available: u32,
    waiters: u32,
    closed: bool,
}

struct Inner {
    state: Mutex<PoolState>,
    permit_ready: Condvar,
    capacity: u32,

    // Counters are informational; they are read without the lock.
    total_acquired: AtomicU64,
    total_refills: AtomicU64,
    total_cancelled: AtomicU64,
    total_timeouts: AtomicU64,
    max_wait_ns: AtomicU64,
    last_refill_ms: AtomicU64,
}

impl Inner {
    // The state is a plain counter that is never left half-updated, so a
    // poisoned lock is still safe to use.
    fn lock(&self) -> MutexGuard<'_, PoolState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A blocking counting permit pool with reset-to-capacity replenishment.
///
/// `PermitPool` is a cheap handle: clones share the same underlying pool.
///
/// ## Example
///
/// ```rust
/// use crpt_api::PermitPool;
///
/// let pool = PermitPool::new(2);
/// pool.acquire().unwrap();
/// pool.acquire().unwrap();
/// assert!(!pool.try_acquire());
///
/// pool.replenish();
/// assert_eq!(pool.available(), 2);
/// ```
#[derive(Clone)]
pub struct PermitPool {
    inner: Arc<Inner>,
}

impl PermitPool {
    /// Creates a full pool with `capacity` permits.
    ///
    /// A zero capacity is accepted but no acquire can ever succeed; the
    /// client rejects it during configuration validation.
    pub fn new(capacity: u32) -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(PoolState {
                    available: capacity,
                    waiters: 0,
                    closed: false,
                }),
                permit_ready: Condvar::new(),
                capacity,
                total_acquired: AtomicU64::new(0),
                total_refills: AtomicU64::new(0),
                total_cancelled: AtomicU64::new(0),
                total_timeouts: AtomicU64::new(0),
                max_wait_ns: AtomicU64::new(0),
                last_refill_ms: AtomicU64::new(current_time_ms()),
            }),
        }
    }

    /// Blocks until a permit is available, then takes it.
    ///
    /// # Errors
    ///
    /// Returns [`CrptError::Shutdown`] if the pool is closed before or while waiting.
    pub fn acquire(&self) -> Result<(), CrptError> {
        self.acquire_inner(None, None)
    }

    /// Like [`acquire`](Self::acquire), but gives up when `token` is cancelled.
    ///
    /// A cancelled wait consumes no permit and leaves the pool untouched.
    /// A token that is already cancelled fails immediately even if permits
    /// are available.
    ///
    /// # Errors
    ///
    /// - [`CrptError::Interrupted`] if `token` is cancelled
    /// - [`CrptError::Shutdown`] if the pool is closed
    pub fn acquire_with_cancel(&self, token: &CancelToken) -> Result<(), CrptError> {
        self.acquire_inner(Some(token), None)
    }

    /// Like [`acquire`](Self::acquire), but waits at most `timeout`.
    ///
    /// # Errors
    ///
    /// - [`CrptError::Timeout`] if no permit showed up in time
    /// - [`CrptError::Shutdown`] if the pool is closed
    pub fn acquire_timeout(&self, timeout: Duration) -> Result<(), CrptError> {
        self.acquire_inner(None, Some(Instant::now() + timeout))
    }

    /// Takes a permit if one is immediately available.
    pub fn try_acquire(&self) -> bool {
        let mut state = self.inner.lock();
        if state.closed || state.available == 0 {
            return false;
        }
        state.available -= 1;
        drop(state);

        self.inner.total_acquired.fetch_add(1, Ordering::Relaxed);
        true
    }

    fn acquire_inner(
        &self,
        cancel: Option<&CancelToken>,
        deadline: Option<Instant>,
    ) -> Result<(), CrptError> {
        let started = Instant::now();
        let mut state = self.inner.lock();
        state.waiters += 1;

        let result = loop {
            if state.closed {
                break Err(CrptError::Shutdown);
            }
            if cancel.is_some_and(CancelToken::is_cancelled) {
                break Err(CrptError::Interrupted);
            }
            if state.available > 0 {
                state.available -= 1;
                break Ok(());
            }

            match deadline {
                None => {
                    state = self
                        .inner
                        .permit_ready
                        .wait(state)
                        .unwrap_or_else(PoisonError::into_inner);
                }
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        break Err(CrptError::Timeout);
                    }
                    let (guard, _) = self
                        .inner
                        .permit_ready
                        .wait_timeout(state, deadline - now)
                        .unwrap_or_else(PoisonError::into_inner);
                    state = guard;
                }
            }
        };

        state.waiters -= 1;
        let remaining = state.available;
        drop(state);

        let waited_ns = u64::try_from(started.elapsed().as_nanos()).unwrap_or(u64::MAX);
        self.inner.max_wait_ns.fetch_max(waited_ns, Ordering::Relaxed);

        match &result {
            Ok(()) => {
                self.inner.total_acquired.fetch_add(1, Ordering::Relaxed);
                debug!("Permit acquired ({} remaining)", remaining);
            }
            Err(CrptError::Interrupted) => {
                self.inner.total_cancelled.fetch_add(1, Ordering::Relaxed);
                warn!("Permit wait cancelled");
            }
            Err(CrptError::Timeout) => {
                self.inner.total_timeouts.fetch_add(1, Ordering::Relaxed);
                warn!("Permit wait timed out");
            }
            Err(_) => debug!("Permit wait aborted: pool closed"),
        }

        result
    }

    /// Resets the pool to full capacity and wakes all waiters.
    ///
    /// Returns the number of permits that were available before the reset.
    pub fn replenish(&self) -> u32 {
        let mut state = self.inner.lock();
        let previous = state.available;
        state.available = self.inner.capacity;
        let waiters = state.waiters;
        drop(state);

        self.inner.permit_ready.notify_all();
        self.inner.total_refills.fetch_add(1, Ordering::Relaxed);
        self.inner
            .last_refill_ms
            .store(current_time_ms(), Ordering::Relaxed);

        debug!(
            "Replenished permits {} -> {} ({} waiting)",
            previous, self.inner.capacity, waiters
        );
        previous
    }

    /// Closes the pool. Blocked and future acquires fail with [`CrptError::Shutdown`].
    pub fn close(&self) {
        let mut state = self.inner.lock();
        if state.closed {
            return;
        }
        state.closed = true;
        drop(state);

        self.inner.permit_ready.notify_all();
        debug!("Permit pool closed");
    }

    /// Returns `true` once [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.inner.lock().closed
    }

    /// Creates a cancellation token bound to this pool.
    pub fn cancel_token(&self) -> CancelToken {
        CancelToken {
            cancelled: Arc::new(AtomicBool::new(false)),
            pool: Arc::clone(&self.inner),
        }
    }

    /// Currently available permits.
    pub fn available(&self) -> u32 {
        self.inner.lock().available
    }

    /// Maximum permits per window.
    pub fn capacity(&self) -> u32 {
        self.inner.capacity
    }

    /// Number of callers currently blocked in an acquire.
    pub fn waiters(&self) -> u32 {
        self.inner.lock().waiters
    }

    /// Returns a snapshot of the pool counters.
    pub fn metrics(&self) -> PermitPoolMetrics {
        let state = self.inner.lock();
        let (available, waiters, closed) = (state.available, state.waiters, state.closed);
        drop(state);

        PermitPoolMetrics {
            capacity: self.inner.capacity,
            available,
            waiters,
            closed,
            total_acquired: self.inner.total_acquired.load(Ordering::Relaxed),
            total_refills: self.inner.total_refills.load(Ordering::Relaxed),
            total_cancelled: self.inner.total_cancelled.load(Ordering::Relaxed),
            total_timeouts: self.inner.total_timeouts.load(Ordering::Relaxed),
            max_wait_time_ns: self.inner.max_wait_ns.load(Ordering::Relaxed),
            last_refill_ms: self.inner.last_refill_ms.load(Ordering::Relaxed),
        }
    }
}

impl std::fmt::Debug for PermitPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.lock();
        f.debug_struct("PermitPool")
            .field("capacity", &self.inner.capacity)
            .field("available", &state.available)
            .field("waiters", &state.waiters)
            .field("closed", &state.closed)
            .finish()
    }
}

/// Cancels a pending [`PermitPool::acquire_with_cancel`].
///
/// Clones share the same flag. Once cancelled a token stays cancelled;
/// create a fresh one with [`PermitPool::cancel_token`] for the next call.
///
/// ```rust
/// use crpt_api::{CrptError, PermitPool};
///
/// let pool = PermitPool::new(1);
/// let token = pool.cancel_token();
/// token.cancel();
///
/// assert!(matches!(pool.acquire_with_cancel(&token), Err(CrptError::Interrupted)));
/// assert_eq!(pool.available(), 1);
/// ```
#[derive(Clone)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
    pool: Arc<Inner>,
}

impl CancelToken {
    /// Cancels the token and wakes every waiter on the bound pool.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);

        // Taking the lock orders the flag store before any waiter's re-check,
        // so a waiter cannot miss the wake-up between checking and parking.
        drop(self.pool.lock());
        self.pool.permit_ready.notify_all();
    }

    /// Returns `true` once [`cancel`](Self::cancel) has been called.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

impl std::fmt::Debug for CancelToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancelToken")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}
