//! # Rate Limiter Module
//!
//! Permit pool, refill scheduler, and their configuration.
//!
//! ## Module Structure
//!
//! ```text
//!     rate_limiter/
//!     ├── mod.rs          (You are here - Module organization)
//!     ├── config.rs       (Time units, limits, validation)
//!     ├── core.rs         (Blocking permit pool + cancel tokens)
//!     ├── scheduler.rs    (Fixed-rate refill thread)
//!     ├── metrics.rs      (Pool and client snapshots)
//!     └── utils.rs        (Clock helpers)
//! ```
//!
//! ## Architecture Flow
//!
//! ```text
//!     Caller threads                Refill thread
//!          │                             │
//!          ▼                             ▼
//!     ┌─────────┐   acquire()      ┌───────────┐
//!     │  Pool   │ ◄─────────────── │ Scheduler │ every interval:
//!     │ (mutex) │   replenish() ◄──┤           │ reset to capacity
//!     └─────────┘                  └───────────┘
//! ```

mod config;
mod core;
mod metrics;
mod scheduler;
mod utils;

/// Configuration types for the permit pool and refill schedule
pub use config::{RateLimiterConfig, TimeUnit};

/// Blocking permit pool
pub use core::{CancelToken, PermitPool};

/// Snapshot for observability
pub use metrics::PermitPoolMetrics;

/// Background refill driver
pub use scheduler::RefillScheduler;

/// Clock helper
pub use utils::current_time_ms;
