//! Reachability probe run once before any step
//!
//! Sends the throwaway registration payload `{"username":"test","password":"test"}`
//! and only asks whether something answered with a plausible status. The
//! outcome of the registration itself is irrelevant.

use crate::client::{endpoints, Transport, TransportError};
use crate::config::PreflightConfig;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

/// Preflight errors; both abort the run
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PreflightError {
    #[error("Service unreachable: {0}")]
    Unreachable(TransportError),

    #[error("Service responded with unexpected status {status}")]
    UnexpectedStatus { status: u16, body: String },
}

/// Reachability check against the registration endpoint
#[derive(Debug, Clone)]
pub struct Preflight {
    accepted: Vec<u16>,
    timeout: Duration,
}

impl Preflight {
    pub fn new(config: &PreflightConfig) -> Self {
        Self {
            accepted: config.accepted_statuses.clone(),
            timeout: config.timeout(),
        }
    }

    /// Probe the service, returning the status it answered with
    pub async fn check<T: Transport + ?Sized>(&self, transport: &T) -> Result<u16, PreflightError> {
        let request = endpoints::register("test", "test", None).with_timeout(self.timeout);

        let response = match transport.send(&request).await {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "Preflight could not reach the service");
                crate::metrics::record_preflight("unreachable");
                return Err(PreflightError::Unreachable(e));
            }
        };

        if self.accepted.contains(&response.status) {
            info!(status = response.status, "Service is reachable");
            crate::metrics::record_preflight("reachable");
            Ok(response.status)
        } else {
            warn!(
                status = response.status,
                "Preflight got an unexpected status"
            );
            crate::metrics::record_preflight("unexpected_status");
            Err(PreflightError::UnexpectedStatus {
                status: response.status,
                body: response.display_body(),
            })
        }
    }
}

impl Default for Preflight {
    fn default() -> Self {
        Self::new(&PreflightConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::scripted::ScriptedTransport;
    use crate::client::Method;
    use serde_json::json;

    #[tokio::test]
    async fn test_accepted_statuses_mean_reachable() {
        for status in [200, 201, 400, 401, 403, 405, 409] {
            let transport = ScriptedTransport::new().reply(status, "");
            assert_eq!(Preflight::default().check(&transport).await, Ok(status));
        }
    }

    #[tokio::test]
    async fn test_probe_shape() {
        let transport = ScriptedTransport::new().reply(400, "");
        Preflight::default().check(&transport).await.unwrap();

        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, Method::Post);
        assert_eq!(requests[0].path, "/register");
        assert_eq!(
            requests[0].body,
            Some(json!({"username": "test", "password": "test"}))
        );
        assert_eq!(requests[0].timeout, Some(Duration::from_secs(5)));
    }

    #[tokio::test]
    async fn test_unexpected_status() {
        let transport = ScriptedTransport::new().reply(500, "boom");
        assert!(matches!(
            Preflight::default().check(&transport).await,
            Err(PreflightError::UnexpectedStatus { status: 500, .. })
        ));
    }

    #[tokio::test]
    async fn test_connection_refused() {
        let transport =
            ScriptedTransport::new().fail(TransportError::Connect("connection refused".into()));
        assert!(matches!(
            Preflight::default().check(&transport).await,
            Err(PreflightError::Unreachable(TransportError::Connect(_)))
        ));
    }
}
