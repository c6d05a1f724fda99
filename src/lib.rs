//! # crpt-api - Rate-Limited Client for the CRPT Document Registry
//!
//! A thread-safe client for the registry's `/lk/documents/create` call that
//! never exceeds a configured number of requests per time window.
//!
//! ## How the Limit Works
//!
//! ```text
//!     Permit Pool (limit 5 per second):
//!
//!     t=0s     [■■■■■] 5/5   (refill tick)
//!     call 1   [■■■■ ] ✅
//!     ...
//!     call 5   [     ] ✅
//!     call 6   [     ] ⏳ blocks...
//!     t=1s     [■■■■■] 5/5   (refill tick) ──► call 6 ✅
//! ```
//!
//! - **Permit** = authorization for one outbound call
//! - **Pool** = permits left in the current window
//! - **Refill** = a background thread resets the pool to full capacity once
//!   per window; missed ticks never stack
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use crpt_api::{CrptApi, Document, TimeUnit};
//!
//! // At most 10 calls per minute
//! let api = CrptApi::new(TimeUnit::Minutes, 10)?;
//!
//! let document = Document::default();
//! let response = api.create_document(&document, "<signature>")?;
//! println!("registry answered: {response}");
//!
//! // Stops the refill thread
//! api.shutdown();
//! # Ok::<(), crpt_api::CrptError>(())
//! ```
//!
//! ### Builder
//!
//! ```rust,no_run
//! use crpt_api::CrptApiBuilder;
//! use std::time::Duration;
//!
//! let api = CrptApiBuilder::new()
//!     .request_limit(3)
//!     .refill_interval(Duration::from_millis(500))
//!     .base_url("https://markirovka.sandbox.crptech.ru/api/v3")
//!     .build()?;
//! # api.shutdown();
//! # Ok::<(), crpt_api::CrptError>(())
//! ```
//!
//! ## Failure Policy
//!
//! | Failure | `create_document` | `try_create_document` |
//! |---------|-------------------|------------------------|
//! | cancelled while waiting | `Err(Interrupted)` | n/a |
//! | client shut down | `Err(Shutdown)` | `Err(Shutdown)` |
//! | JSON encoding | logged, empty payload sent | `Err(Serialization)` |
//! | HTTP / I/O | logged, `Ok("")` | `Err(Transport)` |
//!
//! Nothing is retried, and a permit spent on a failed call is not refunded.
//!
//! ## Thread Safety
//!
//! [`CrptApi`] is `Send + Sync`; share it through an `Arc`. Waiting callers
//! are woken in no particular order.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(
    missing_docs,
    rust_2018_idioms,
    unreachable_pub,
    missing_debug_implementations
)]
#![forbid(unsafe_code)]

mod client;
mod error;
mod rate_limiter;

// Public re-exports
pub use client::{
    decode_base64, encode_base64, to_json, BodyRequest, ClientMetrics, CrptApi, CrptApiConfig,
    Description, Document, DocumentFormat, DocumentType, HttpTransport, Product, ProductGroup,
    Transport, CONTENT_TYPE_JSON, CREATE_DOCUMENT_PATH, DEFAULT_BASE_URL,
};
pub use error::{CrptError, Result, TransportError};
pub use rate_limiter::{
    current_time_ms, CancelToken, PermitPool, PermitPoolMetrics, RateLimiterConfig, RefillScheduler,
    TimeUnit,
};

use std::sync::Arc;
use std::time::Duration;

/// A client wrapped in `Arc` for sharing across submitting threads.
pub type SharedCrptApi = Arc<CrptApi>;

/// Version information for the crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports.
///
/// ```rust
/// use crpt_api::prelude::*;
///
/// let config = CrptApiConfig::new(TimeUnit::Seconds, 5);
/// assert_eq!(config.rate_limit.request_limit, 5);
/// ```
pub mod prelude {
    pub use crate::{
        CancelToken, CrptApi, CrptApiBuilder, CrptApiConfig, CrptError, Document, Product,
        SharedCrptApi, TimeUnit,
    };
}

/// Fluent construction of a [`CrptApi`].
///
/// Defaults: 10 requests per second against [`DEFAULT_BASE_URL`] over
/// [`HttpTransport`].
///
/// ```rust
/// use crpt_api::{CrptApiBuilder, TimeUnit};
///
/// let result = CrptApiBuilder::new()
///     .time_unit(TimeUnit::Seconds)
///     .request_limit(0)   // Invalid!
///     .build();
///
/// assert!(result.is_err());
/// ```
#[derive(Clone, Default)]
pub struct CrptApiBuilder {
    config: CrptApiConfig,
    transport: Option<Arc<dyn Transport>>,
}

impl CrptApiBuilder {
    /// Creates a builder with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the window to one `unit`.
    pub fn time_unit(mut self, unit: TimeUnit) -> Self {
        self.config.rate_limit.refill_interval_ms = unit.to_millis();
        self
    }

    /// Sets the window to an arbitrary duration, truncated to milliseconds.
    pub fn refill_interval(mut self, interval: Duration) -> Self {
        let limit = self.config.rate_limit.request_limit;
        self.config.rate_limit = RateLimiterConfig::from_interval(interval, limit);
        self
    }

    /// Sets the number of calls allowed per window.
    pub fn request_limit(mut self, limit: u32) -> Self {
        self.config.rate_limit.request_limit = limit;
        self
    }

    /// Sets the endpoint root.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.config.base_url = base_url.into();
        self
    }

    /// Sends through `transport` instead of the default HTTP client.
    pub fn transport(mut self, transport: impl Transport + 'static) -> Self {
        self.transport = Some(Arc::new(transport));
        self
    }

    /// Builds the client and starts its refill thread.
    ///
    /// # Errors
    ///
    /// [`CrptError::InvalidConfig`] for a zero limit, a sub-millisecond
    /// window or an empty base URL.
    pub fn build(self) -> Result<CrptApi> {
        match self.transport {
            Some(transport) => CrptApi::with_transport(self.config, transport),
            None => CrptApi::with_config(self.config),
        }
    }
}

impl std::fmt::Debug for CrptApiBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CrptApiBuilder")
            .field("config", &self.config)
            .field("custom_transport", &self.transport.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    #[derive(Default)]
    struct CountingTransport {
        calls: Arc<AtomicUsize>,
    }

    impl Transport for CountingTransport {
        fn post(&self, _url: &str, _body: String, _content_type: &str) -> Result<String, TransportError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok("ok".into())
        }
    }

    #[test]
    fn test_builder() {
        let calls = Arc::new(AtomicUsize::new(0));
        let api = CrptApiBuilder::new()
            .time_unit(TimeUnit::Minutes)
            .request_limit(3)
            .base_url("http://localhost/api/v3")
            .transport(CountingTransport { calls: calls.clone() })
            .build()
            .unwrap();

        assert_eq!(api.config().rate_limit.refill_interval_ms, 60_000);
        assert_eq!(api.create_document(&Document::default(), "s").unwrap(), "ok");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        api.shutdown();
    }

    #[test]
    fn test_builder_validation() {
        let result = CrptApiBuilder::new()
            .refill_interval(Duration::from_micros(10))
            .transport(CountingTransport::default())
            .build();
        assert!(matches!(result, Err(CrptError::InvalidConfig(_))));

        let result = CrptApiBuilder::new().base_url("").build();
        assert!(result.is_err());
    }

    #[test]
    fn test_builder_refill_interval_keeps_limit() {
        let builder = CrptApiBuilder::new()
            .request_limit(7)
            .refill_interval(Duration::from_millis(250));
        assert_eq!(builder.config.rate_limit.request_limit, 7);
        assert_eq!(builder.config.rate_limit.refill_interval_ms, 250);
        assert!(format!("{:?}", builder).contains("custom_transport: false"));
    }

    #[test]
    fn test_shared_client_across_threads() {
        let calls = Arc::new(AtomicUsize::new(0));
        let api: SharedCrptApi = Arc::new(
            CrptApiBuilder::new()
                .request_limit(20)
                .time_unit(TimeUnit::Minutes)
                .transport(CountingTransport { calls: calls.clone() })
                .build()
                .unwrap(),
        );

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let api = api.clone();
                thread::spawn(move || {
                    for _ in 0..5 {
                        api.create_document(&Document::default(), "s").unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(calls.load(Ordering::SeqCst), 20);
        assert_eq!(api.metrics().pool.available, 0);
        api.shutdown();
    }

    #[test]
    fn test_prelude_imports() {
        use crate::prelude::*;

        let _config = CrptApiConfig::default();
        let _unit = TimeUnit::Seconds;
        let _doc = Document::default();
        assert!(!VERSION.is_empty());
    }
}
