//! Client-side counters.

use crate::rate_limiter::PermitPoolMetrics;
use std::fmt;

/// Snapshot of a [`CrptApi`](super::CrptApi) client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientMetrics {
    /// Submissions that obtained a permit and reached the encoding step.
    pub submitted: u64,

    /// Submissions whose payload could not be encoded.
    ///
    /// [`Document`](super::Document) and [`BodyRequest`](super::BodyRequest)
    /// hold only strings, booleans and enums, which always serialize, so this
    /// stays at zero with the built-in types.
    pub serialization_failures: u64,

    /// Submissions whose HTTP call failed.
    pub transport_failures: u64,

    /// State of the underlying permit pool.
    pub pool: PermitPoolMetrics,
}

impl ClientMetrics {
    /// Submissions that reached the server and got a response.
    pub fn delivered(&self) -> u64 {
        self.submitted.saturating_sub(self.transport_failures)
    }
}

impl fmt::Display for ClientMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Client: submitted={} delivered={} serialization_failures={} transport_failures={}",
            self.submitted,
            self.delivered(),
            self.serialization_failures,
            self.transport_failures
        )?;
        write!(f, "{}", self.pool)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rate_limiter::PermitPool;

    #[test]
    fn test_client_metrics() {
        let pool = PermitPool::new(5);
        assert!(pool.try_acquire());

        let metrics = ClientMetrics {
            submitted: 10,
            serialization_failures: 0,
            transport_failures: 3,
            pool: pool.metrics(),
        };
        assert_eq!(metrics.delivered(), 7);

        let text = metrics.to_string();
        assert!(text.starts_with("Client: submitted=10 delivered=7"));
        assert!(text.contains("Available Permits: 4/5"));
    }
}
