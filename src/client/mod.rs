//! # Document Client
//!
//! [`CrptApi`] is the rate-limited façade over the registry's document
//! creation endpoint.
//!
//! ```text
//!     create_document(doc, signature)
//!          │
//!          ▼
//!     PermitPool::acquire() ──── blocks while the window is spent
//!          │
//!          ▼
//!     JSON(doc) ─► base64 ─► BodyRequest ─► JSON
//!          │
//!          ▼
//!     Transport::post(BASE_URL + /lk/documents/create)
//!          │
//!          ▼
//!     response body, or "" on failure
//! ```
//!
//! A permit is spent as soon as it is granted. Failed submissions are not
//! retried and do not give their permit back.

mod document;
mod encoding;
mod envelope;
mod metrics;
mod transport;

pub use document::{Description, Document, Product};
pub use encoding::{decode_base64, encode_base64, to_json};
pub use envelope::{BodyRequest, DocumentFormat, DocumentType, ProductGroup};
pub use metrics::ClientMetrics;
pub use transport::{HttpTransport, Transport, CONTENT_TYPE_JSON};

#[cfg(test)]
pub(crate) use document::sample_document;

use crate::error::{CrptError, Result};
use crate::rate_limiter::{
    CancelToken, PermitPool, RateLimiterConfig, RefillScheduler, TimeUnit,
};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, error, info};

/// Production endpoint root.
pub const DEFAULT_BASE_URL: &str = "https://ismp.crpt.ru/api/v3";

/// Path of the document creation call, relative to the base URL.
pub const CREATE_DOCUMENT_PATH: &str = "/lk/documents/create";

/// Client configuration.
///
/// ```rust
/// use crpt_api::{CrptApiConfig, TimeUnit};
///
/// let config = CrptApiConfig::new(TimeUnit::Seconds, 5)
///     .with_base_url("http://localhost:8080/api/v3/");
/// assert_eq!(config.create_url(), "http://localhost:8080/api/v3/lk/documents/create");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrptApiConfig {
    /// Endpoint root, without the call path.
    pub base_url: String,

    /// Permits per window and window length.
    pub rate_limit: RateLimiterConfig,
}

impl Default for CrptApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            rate_limit: RateLimiterConfig::default(),
        }
    }
}

impl CrptApiConfig {
    /// `request_limit` calls per `time_unit` against the production endpoint.
    pub fn new(time_unit: TimeUnit, request_limit: u32) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            rate_limit: RateLimiterConfig::new(time_unit, request_limit),
        }
    }

    /// Replaces the endpoint root.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Full URL of the document creation call.
    pub fn create_url(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), CREATE_DOCUMENT_PATH)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`CrptError::InvalidConfig`] for an empty base URL or an
    /// invalid rate limit.
    pub fn validate(&self) -> Result<()> {
        if self.base_url.trim().is_empty() {
            return Err(CrptError::InvalidConfig("base_url must not be empty".into()));
        }
        self.rate_limit.validate()
    }
}

/// Rate-limited client for the document registration API.
///
/// Owns one [`PermitPool`] and one [`RefillScheduler`] for its whole life.
/// Call [`shutdown`](Self::shutdown) when done; submissions after shutdown
/// fail with [`CrptError::Shutdown`].
///
/// ```rust,no_run
/// use crpt_api::{CrptApi, Document, TimeUnit};
///
/// let api = CrptApi::new(TimeUnit::Seconds, 5)?;
/// let response = api.create_document(&Document::default(), "signature")?;
/// println!("{response}");
/// api.shutdown();
/// # Ok::<(), crpt_api::CrptError>(())
/// ```
pub struct CrptApi {
    config: CrptApiConfig,
    create_url: String,
    pool: PermitPool,
    scheduler: Mutex<RefillScheduler>,
    transport: Arc<dyn Transport>,

    submitted: AtomicU64,
    serialization_failures: AtomicU64,
    transport_failures: AtomicU64,
}

impl CrptApi {
    /// Client allowing `request_limit` calls per `time_unit`.
    ///
    /// # Errors
    ///
    /// [`CrptError::InvalidConfig`] if `request_limit` is 0 or the unit is
    /// shorter than a millisecond.
    pub fn new(time_unit: TimeUnit, request_limit: u32) -> Result<Self> {
        Self::with_config(CrptApiConfig::new(time_unit, request_limit))
    }

    /// Client with a full configuration and the default HTTP transport.
    ///
    /// # Errors
    ///
    /// [`CrptError::InvalidConfig`] if [`CrptApiConfig::validate`] rejects `config`.
    pub fn with_config(config: CrptApiConfig) -> Result<Self> {
        Self::with_transport(config, Arc::new(HttpTransport::new()))
    }

    /// Client sending through a caller-provided transport.
    pub fn with_transport(config: CrptApiConfig, transport: Arc<dyn Transport>) -> Result<Self> {
        config.validate()?;

        let pool = PermitPool::new(config.rate_limit.request_limit);
        let scheduler = RefillScheduler::start(pool.clone(), config.rate_limit.refill_interval())?;

        info!(
            "CRPT client ready: {} requests per {}ms against {}",
            config.rate_limit.request_limit, config.rate_limit.refill_interval_ms, config.base_url
        );

        Ok(Self {
            create_url: config.create_url(),
            config,
            pool,
            scheduler: Mutex::new(scheduler),
            transport,
            submitted: AtomicU64::new(0),
            serialization_failures: AtomicU64::new(0),
            transport_failures: AtomicU64::new(0),
        })
    }

    /// Registers a goods introduction document.
    ///
    /// Blocks until a permit is available. Encoding and HTTP failures are
    /// logged and yield an empty string.
    ///
    /// # Errors
    ///
    /// [`CrptError::Shutdown`] if the client was shut down.
    pub fn create_document(&self, document: &Document, signature: &str) -> Result<String> {
        self.pool.acquire()?;
        Ok(self.submit(document, signature))
    }

    /// Like [`create_document`](Self::create_document), abandoning the wait
    /// when `token` is cancelled.
    ///
    /// # Errors
    ///
    /// - [`CrptError::Interrupted`] if `token` fired before a permit was
    ///   granted; nothing was sent and no permit was used
    /// - [`CrptError::Shutdown`] if the client was shut down
    pub fn create_document_with_cancel(
        &self,
        document: &Document,
        signature: &str,
        token: &CancelToken,
    ) -> Result<String> {
        self.pool.acquire_with_cancel(token)?;
        Ok(self.submit(document, signature))
    }

    /// Strict variant of [`create_document`](Self::create_document): every
    /// failure is returned instead of being swallowed.
    ///
    /// # Errors
    ///
    /// [`CrptError::Serialization`], [`CrptError::Transport`] or
    /// [`CrptError::Shutdown`].
    pub fn try_create_document(&self, document: &Document, signature: &str) -> Result<String> {
        self.pool.acquire()?;
        self.submitted.fetch_add(1, Ordering::Relaxed);

        let body = encode_body(document, signature).map_err(|e| {
            self.serialization_failures.fetch_add(1, Ordering::Relaxed);
            CrptError::from(e)
        })?;

        self.transport
            .post(&self.create_url, body, CONTENT_TYPE_JSON)
            .map_err(|e| {
                self.transport_failures.fetch_add(1, Ordering::Relaxed);
                CrptError::from(e)
            })
    }

    fn submit(&self, document: &Document, signature: &str) -> String {
        self.submitted.fetch_add(1, Ordering::Relaxed);

        let product_document = encode_document(document).unwrap_or_else(|e| {
            self.serialization_failures.fetch_add(1, Ordering::Relaxed);
            error!("Failed to encode document: {}", e);
            String::new()
        });
        debug!("Encoded product document: {}", product_document);

        let envelope = BodyRequest::introduce_goods(product_document, signature);
        let body = to_json(&envelope).unwrap_or_else(|e| {
            self.serialization_failures.fetch_add(1, Ordering::Relaxed);
            error!("Failed to encode submission envelope: {}", e);
            String::new()
        });

        match self.transport.post(&self.create_url, body, CONTENT_TYPE_JSON) {
            Ok(response) => response,
            Err(e) => {
                self.transport_failures.fetch_add(1, Ordering::Relaxed);
                error!("Document submission to {} failed: {}", self.create_url, e);
                String::new()
            }
        }
    }

    /// Token for [`create_document_with_cancel`](Self::create_document_with_cancel).
    pub fn cancel_token(&self) -> CancelToken {
        self.pool.cancel_token()
    }

    /// Stops the refill thread and closes the permit pool.
    ///
    /// Blocked and later submissions fail with [`CrptError::Shutdown`].
    /// Calling this more than once is a no-op.
    pub fn shutdown(&self) {
        let mut scheduler = self
            .scheduler
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        scheduler.shutdown();
        drop(scheduler);

        if !self.pool.is_closed() {
            self.pool.close();
            info!("CRPT client shut down");
        }
    }

    /// Returns `true` once [`shutdown`](Self::shutdown) has been called.
    pub fn is_shutdown(&self) -> bool {
        self.pool.is_closed()
    }

    /// Client configuration.
    pub fn config(&self) -> &CrptApiConfig {
        &self.config
    }

    /// Snapshot of client and pool counters.
    pub fn metrics(&self) -> ClientMetrics {
        ClientMetrics {
            submitted: self.submitted.load(Ordering::Relaxed),
            serialization_failures: self.serialization_failures.load(Ordering::Relaxed),
            transport_failures: self.transport_failures.load(Ordering::Relaxed),
            pool: self.pool.metrics(),
        }
    }
}

impl std::fmt::Debug for CrptApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CrptApi")
            .field("create_url", &self.create_url)
            .field("pool", &self.pool)
            .field("shutdown", &self.is_shutdown())
            .finish()
    }
}

/// Pretty JSON of `document`, base64-encoded.
fn encode_document(document: &Document) -> Result<String, serde_json::Error> {
    to_json(document).map(|json| encode_base64(&json))
}

fn encode_body(document: &Document, signature: &str) -> Result<String, serde_json::Error> {
    let product_document = encode_document(document)?;
    to_json(&BodyRequest::introduce_goods(product_document, signature))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportError;
    use std::thread;
    use std::time::{Duration, Instant};

    /// Records every call and answers with a canned result.
    #[derive(Default)]
    struct RecordingTransport {
        calls: Mutex<Vec<(String, String, String)>>,
        fail: bool,
    }

    impl Transport for RecordingTransport {
        fn post(&self, url: &str, body: String, content_type: &str) -> Result<String, TransportError> {
            self.calls
                .lock()
                .unwrap()
                .push((url.to_string(), body, content_type.to_string()));
            if self.fail {
                Err(TransportError::Status {
                    status: 503,
                    body: String::new(),
                })
            } else {
                Ok("{\"value\":\"ok\"}".to_string())
            }
        }
    }

    fn client(limit: u32, interval: Duration, transport: Arc<RecordingTransport>) -> CrptApi {
        let config = CrptApiConfig {
            base_url: "http://registry.test/api/v3".into(),
            rate_limit: RateLimiterConfig::from_interval(interval, limit),
        };
        CrptApi::with_transport(config, transport).unwrap()
    }

    #[test]
    fn test_submission_payload() {
        let transport = Arc::new(RecordingTransport::default());
        let api = client(5, Duration::from_secs(60), transport.clone());

        let document = sample_document();
        let response = api.create_document(&document, "signed").unwrap();
        assert_eq!(response, "{\"value\":\"ok\"}");

        let calls = transport.calls.lock().unwrap();
        let (url, body, content_type) = &calls[0];
        assert_eq!(url, "http://registry.test/api/v3/lk/documents/create");
        assert_eq!(content_type, "application/json");

        let envelope: BodyRequest = serde_json::from_str(body).unwrap();
        assert_eq!(envelope.document_format, DocumentFormat::Manual);
        assert_eq!(envelope.product_group, ProductGroup::WithoutGroup);
        assert_eq!(envelope.doc_type, DocumentType::LpIntroduceGoods);
        assert_eq!(envelope.signature, "signed");

        let decoded = decode_base64(&envelope.product_document).unwrap();
        let decoded: Document = serde_json::from_slice(&decoded).unwrap();
        assert_eq!(decoded, document);

        let metrics = api.metrics();
        assert_eq!(metrics.submitted, 1);
        assert_eq!(metrics.serialization_failures, 0);

        api.shutdown();
    }

    #[test]
    fn test_transport_failure_yields_empty_and_keeps_permit_spent() {
        let transport = Arc::new(RecordingTransport {
            fail: true,
            ..Default::default()
        });
        let api = client(2, Duration::from_secs(60), transport);

        let response = api.create_document(&Document::default(), "sig").unwrap();
        assert_eq!(response, "");

        let metrics = api.metrics();
        assert_eq!(metrics.submitted, 1);
        assert_eq!(metrics.transport_failures, 1);
        assert_eq!(metrics.pool.available, 1);

        api.shutdown();
    }

    #[test]
    fn test_strict_variant_propagates_transport_error() {
        let transport = Arc::new(RecordingTransport {
            fail: true,
            ..Default::default()
        });
        let api = client(2, Duration::from_secs(60), transport);

        let result = api.try_create_document(&Document::default(), "sig");
        assert!(matches!(
            result,
            Err(CrptError::Transport(TransportError::Status { status: 503, .. }))
        ));
        assert_eq!(api.metrics().transport_failures, 1);

        api.shutdown();
    }

    #[test]
    fn test_sixth_submission_waits_for_next_window() {
        let transport = Arc::new(RecordingTransport::default());
        let api = client(5, Duration::from_millis(300), transport.clone());

        let start = Instant::now();
        for _ in 0..5 {
            api.create_document(&Document::default(), "sig").unwrap();
        }
        assert!(start.elapsed() < Duration::from_millis(250));

        api.create_document(&Document::default(), "sig").unwrap();
        assert!(start.elapsed() >= Duration::from_millis(250));
        assert_eq!(transport.calls.lock().unwrap().len(), 6);

        api.shutdown();
    }

    #[test]
    fn test_cancelled_submission_sends_nothing() {
        let transport = Arc::new(RecordingTransport::default());
        let api = Arc::new(client(1, Duration::from_secs(60), transport.clone()));
        api.create_document(&Document::default(), "first").unwrap();

        let token = api.cancel_token();
        let waiter = {
            let api = api.clone();
            let token = token.clone();
            thread::spawn(move || api.create_document_with_cancel(&Document::default(), "second", &token))
        };

        thread::sleep(Duration::from_millis(50));
        token.cancel();

        assert!(matches!(waiter.join().unwrap(), Err(CrptError::Interrupted)));
        assert_eq!(transport.calls.lock().unwrap().len(), 1);
        assert_eq!(api.metrics().pool.available, 0);

        api.shutdown();
    }

    #[test]
    fn test_shutdown_rejects_submissions() {
        let transport = Arc::new(RecordingTransport::default());
        let api = client(3, Duration::from_secs(60), transport.clone());

        api.shutdown();
        api.shutdown();
        assert!(api.is_shutdown());

        let result = api.create_document(&Document::default(), "sig");
        assert!(matches!(result, Err(CrptError::Shutdown)));
        assert!(transport.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_invalid_config() {
        assert!(matches!(
            CrptApi::new(TimeUnit::Seconds, 0),
            Err(CrptError::InvalidConfig(_))
        ));
        assert!(matches!(
            CrptApi::new(TimeUnit::Nanoseconds, 10),
            Err(CrptError::InvalidConfig(_))
        ));

        let config = CrptApiConfig::default().with_base_url("  ");
        assert!(config.validate().is_err());
        assert!(matches!(
            CrptApi::with_config(config),
            Err(CrptError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_default_config() {
        let config = CrptApiConfig::default();
        assert_eq!(config.create_url(), "https://ismp.crpt.ru/api/v3/lk/documents/create");
        assert!(config.validate().is_ok());
    }
}
