//! Origin probe used by `testSecret`.
//!
//! Sends one real request to the origin test URL with the pending secret in
//! the verification header. Only a 2xx answer counts as success.

use common::secret::{ExposeSecret, SecretString};
use reqwest::header::{HeaderName, HeaderValue};
use reqwest::Url;
use std::time::Duration;
use thiserror::Error;
use tracing::instrument;

/// Timeout for the probe request in seconds.
const PROBE_TIMEOUT_SECONDS: u64 = 10;

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("Secret is not a valid header value")]
    InvalidHeaderValue,

    #[error("Origin test request failed: {0}")]
    Request(String),

    #[error("Origin test URL returned {0}")]
    Rejected(u16),
}

/// HTTP client for the origin test URL.
pub struct OriginProbe {
    http_client: reqwest::Client,
    url: Url,
    header_name: HeaderName,
}

impl OriginProbe {
    pub fn new(url: Url, header_name: HeaderName) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(PROBE_TIMEOUT_SECONDS))
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(target: "rotation.probe", error = %e, "Failed to build HTTP client with custom config, using defaults");
                reqwest::Client::new()
            });

        Self {
            http_client,
            url,
            header_name,
        }
    }

    /// Request the test URL carrying `secret`.
    ///
    /// # Errors
    ///
    /// - `ProbeError::InvalidHeaderValue` - the secret cannot be sent as a header
    /// - `ProbeError::Request` - transport failure or timeout
    /// - `ProbeError::Rejected` - any non-2xx status
    #[instrument(skip_all, fields(url = %self.url))]
    pub async fn check(&self, secret: &SecretString) -> Result<(), ProbeError> {
        let mut value = HeaderValue::from_str(secret.expose_secret())
            .map_err(|_| ProbeError::InvalidHeaderValue)?;
        value.set_sensitive(true);

        let response = self
            .http_client
            .get(self.url.clone())
            .header(self.header_name.clone(), value)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(target: "rotation.probe", error = %e, "Origin test request failed");
                ProbeError::Request(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(target: "rotation.probe", status = %status, "Origin test URL rejected pending secret");
            return Err(ProbeError::Rejected(status.as_u16()));
        }

        tracing::info!(target: "rotation.probe", status = %status, "Origin accepted pending secret");
        Ok(())
    }
}
