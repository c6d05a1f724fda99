//! HTTP transport seam.
//!
//! The client only needs "POST this body, give me the response text".
//! [`HttpTransport`] does that with a blocking `reqwest` client; tests and
//! embedders can plug in their own [`Transport`].

use crate::error::TransportError;
use reqwest::header::CONTENT_TYPE;
use std::time::Duration;
use tracing::debug;

/// JSON content type sent with every submission.
pub const CONTENT_TYPE_JSON: &str = "application/json";

/// Sends a request body and returns the response body.
///
/// Implementations are called from the submitting thread, after a permit
/// has been granted, and must be safe to share across threads.
pub trait Transport: Send + Sync {
    /// POSTs `body` to `url` with the given content type.
    ///
    /// Returns the raw response body on a 2xx answer.
    fn post(&self, url: &str, body: String, content_type: &str) -> Result<String, TransportError>;
}

/// Blocking HTTP transport built on `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::blocking::Client,
}

impl HttpTransport {
    /// Transport with reqwest defaults.
    pub fn new() -> Self {
        Self {
            client: reqwest::blocking::Client::new(),
        }
    }

    /// Transport with an overall per-request timeout.
    pub fn with_timeout(timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }

    /// Wraps an already configured client.
    pub fn from_client(client: reqwest::blocking::Client) -> Self {
        Self { client }
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for HttpTransport {
    fn post(&self, url: &str, body: String, content_type: &str) -> Result<String, TransportError> {
        debug!("POST {} ({} bytes)", url, body.len());

        let response = self
            .client
            .post(url)
            .header(CONTENT_TYPE, content_type)
            .body(body)
            .send()?;

        let status = response.status();
        let text = response.text()?;

        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        debug!("POST {} -> {}", url, status);
        Ok(text)
    }
}
