//! # Rate Limiter Configuration
//!
//! Settings for the permit pool and its refill scheduler.
//!
//! ## Key Concepts
//!
//! ```text
//!     Permit Pool Configuration:
//!
//!     ┌──────────────────────────────┐
//!     │   Request Limit (Capacity)   │ ← Permits per window
//!     │   ┌─────────────────────┐    │
//!     │   │ ■ ■ ■ ■ ■           │    │ ← Available permits
//!     │   └─────────────────────┘    │
//!     │                              │
//!     │   Refill Interval: 1000ms    │ ← Reset to full capacity
//!     └──────────────────────────────┘
//! ```
//!
//! A refill always resets the pool to its full capacity, so missed or
//! delayed ticks never stack up.

use crate::error::CrptError;
use std::time::Duration;

/// Unit of time used to express the refill window.
///
/// The window is exactly one unit long: `TimeUnit::Seconds` means
/// "`request_limit` calls per second".
///
/// ```rust
/// use crpt_api::TimeUnit;
///
/// assert_eq!(TimeUnit::Seconds.to_millis(), 1_000);
/// assert_eq!(TimeUnit::Minutes.to_millis(), 60_000);
/// assert_eq!(TimeUnit::Microseconds.to_millis(), 0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeUnit {
    /// One nanosecond.
    Nanoseconds,
    /// One microsecond.
    Microseconds,
    /// One millisecond.
    Milliseconds,
    /// One second.
    Seconds,
    /// One minute.
    Minutes,
    /// One hour.
    Hours,
    /// One day.
    Days,
}

impl TimeUnit {
    /// Converts one unit into whole milliseconds, truncating.
    ///
    /// Sub-millisecond units convert to 0, which is rejected as a refill
    /// interval by [`RateLimiterConfig::validate`].
    pub const fn to_millis(self) -> u64 {
        match self {
            Self::Nanoseconds | Self::Microseconds => 0,
            Self::Milliseconds => 1,
            Self::Seconds => 1_000,
            Self::Minutes => 60_000,
            Self::Hours => 3_600_000,
            Self::Days => 86_400_000,
        }
    }

    /// Returns one unit as a [`Duration`].
    pub const fn as_duration(self) -> Duration {
        match self {
            Self::Nanoseconds => Duration::from_nanos(1),
            Self::Microseconds => Duration::from_micros(1),
            _ => Duration::from_millis(self.to_millis()),
        }
    }
}

/// Configuration for the permit pool and refill scheduler.
///
/// ```rust
/// use crpt_api::{RateLimiterConfig, TimeUnit};
///
/// // 5 calls per second
/// let config = RateLimiterConfig::new(TimeUnit::Seconds, 5);
/// assert_eq!(config.refill_interval_ms, 1_000);
/// assert!(config.validate().is_ok());
///
/// // Zero permits can never be acquired
/// assert!(RateLimiterConfig::per_second(0).validate().is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimiterConfig {
    /// Number of permits available per refill window (pool capacity).
    pub request_limit: u32,

    /// Milliseconds between refills. Derived once at construction.
    pub refill_interval_ms: u64,
}

impl Default for RateLimiterConfig {
    /// 10 requests per second.
    fn default() -> Self {
        Self::per_second(10)
    }
}

impl RateLimiterConfig {
    /// Creates a configuration allowing `request_limit` calls per `time_unit`.
    pub fn new(time_unit: TimeUnit, request_limit: u32) -> Self {
        Self {
            request_limit,
            refill_interval_ms: time_unit.to_millis(),
        }
    }

    /// Creates a configuration from an arbitrary window length.
    ///
    /// The interval is truncated to whole milliseconds.
    pub fn from_interval(interval: Duration, request_limit: u32) -> Self {
        Self {
            request_limit,
            refill_interval_ms: u64::try_from(interval.as_millis()).unwrap_or(u64::MAX),
        }
    }

    /// `requests` calls per second.
    pub fn per_second(requests: u32) -> Self {
        Self::new(TimeUnit::Seconds, requests)
    }

    /// `requests` calls per minute.
    pub fn per_minute(requests: u32) -> Self {
        Self::new(TimeUnit::Minutes, requests)
    }

    /// Refill interval as a [`Duration`].
    pub fn refill_interval(&self) -> Duration {
        Duration::from_millis(self.refill_interval_ms)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`CrptError::InvalidConfig`] if:
    /// - `request_limit` is 0
    /// - `refill_interval_ms` is 0
    pub fn validate(&self) -> Result<(), CrptError> {
        if self.request_limit == 0 {
            return Err(CrptError::InvalidConfig(
                "request_limit must be greater than 0".into(),
            ));
        }

        if self.refill_interval_ms == 0 {
            return Err(CrptError::InvalidConfig(
                "refill interval must be at least 1ms".into(),
            ));
        }

        Ok(())
    }

    /// Sustained rate in requests per second.
    ///
    /// ```rust
    /// use crpt_api::RateLimiterConfig;
    ///
    /// assert_eq!(RateLimiterConfig::per_minute(120).effective_rate_per_second(), 2.0);
    /// ```
    pub fn effective_rate_per_second(&self) -> f64 {
        if self.refill_interval_ms == 0 {
            0.0
        } else {
            (self.request_limit as f64 * 1000.0) / self.refill_interval_ms as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_unit_conversion() {
        assert_eq!(TimeUnit::Nanoseconds.to_millis(), 0);
        assert_eq!(TimeUnit::Microseconds.to_millis(), 0);
        assert_eq!(TimeUnit::Milliseconds.to_millis(), 1);
        assert_eq!(TimeUnit::Seconds.to_millis(), 1_000);
        assert_eq!(TimeUnit::Minutes.to_millis(), 60_000);
        assert_eq!(TimeUnit::Hours.to_millis(), 3_600_000);
        assert_eq!(TimeUnit::Days.to_millis(), 86_400_000);

        assert_eq!(TimeUnit::Microseconds.as_duration(), Duration::from_micros(1));
        assert_eq!(TimeUnit::Hours.as_duration(), Duration::from_secs(3600));
    }

    #[test]
    fn test_config_validation() {
        assert!(RateLimiterConfig::default().validate().is_ok());
        assert!(RateLimiterConfig::new(TimeUnit::Seconds, 0).validate().is_err());
        assert!(RateLimiterConfig::new(TimeUnit::Microseconds, 5).validate().is_err());
        assert!(RateLimiterConfig::new(TimeUnit::Milliseconds, 1).validate().is_ok());
    }

    #[test]
    fn test_from_interval_truncates() {
        let config = RateLimiterConfig::from_interval(Duration::from_micros(2_500), 3);
        assert_eq!(config.refill_interval_ms, 2);
        assert_eq!(config.request_limit, 3);

        let config = RateLimiterConfig::from_interval(Duration::from_micros(999), 3);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_builders() {
        let config = RateLimiterConfig::per_second(100);
        assert_eq!(config.request_limit, 100);
        assert_eq!(config.refill_interval(), Duration::from_secs(1));
        assert_eq!(config.effective_rate_per_second(), 100.0);

        let config = RateLimiterConfig::per_minute(120);
        assert_eq!(config.refill_interval_ms, 60_000);
        assert_eq!(config.effective_rate_per_second(), 2.0);
    }

    #[test]
    fn test_effective_rate_zero_interval() {
        let config = RateLimiterConfig {
            request_limit: 5,
            refill_interval_ms: 0,
        };
        assert_eq!(config.effective_rate_per_second(), 0.0);
    }
}
