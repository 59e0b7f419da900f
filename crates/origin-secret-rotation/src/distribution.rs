//! Edge distribution seam.
//!
//! The rotation only needs three things from the edge: its deployment
//! status, the custom headers it sends to each origin, and a way to push
//! changed header values back. Updates are conditional on the ETag read
//! alongside the configuration.

use async_trait::async_trait;
use common::secret::{ExposeSecret, SecretString};
use thiserror::Error;

/// Status the distribution reports when no configuration change is in flight.
pub const STATUS_DEPLOYED: &str = "Deployed";

/// Errors returned by an [`EdgeDistribution`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EdgeError {
    #[error("Edge distribution unavailable: {0}")]
    Unavailable(String),

    /// The configuration changed since it was read.
    #[error("Edge configuration changed concurrently: {0}")]
    Conflict(String),

    #[error("Edge configuration invalid: {0}")]
    InvalidConfig(String),
}

/// A custom header the edge adds to requests it forwards to an origin.
#[derive(Debug, Clone)]
pub struct OriginHeader {
    pub name: String,
    pub value: SecretString,
}

/// One origin of the distribution.
#[derive(Debug, Clone)]
pub struct EdgeOrigin {
    pub id: String,
    pub custom_headers: Vec<OriginHeader>,
}

/// The origin headers of a distribution together with the ETag they were
/// read at.
#[derive(Debug, Clone)]
pub struct EdgeOriginConfig {
    pub etag: String,
    pub origins: Vec<EdgeOrigin>,
}

/// Result of writing a secret into the origin headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderUpdate {
    /// Headers with the configured name.
    pub matched: usize,

    /// Headers whose value was different and got overwritten.
    pub changed: usize,
}

/// Set every origin header named `header_name` to `value`.
///
/// Header names are compared ignoring ASCII case.
pub fn apply_origin_secret(
    config: &mut EdgeOriginConfig,
    header_name: &str,
    value: &SecretString,
) -> HeaderUpdate {
    let mut update = HeaderUpdate {
        matched: 0,
        changed: 0,
    };

    for header in config
        .origins
        .iter_mut()
        .flat_map(|origin| origin.custom_headers.iter_mut())
        .filter(|header| header.name.eq_ignore_ascii_case(header_name))
    {
        update.matched += 1;
        if header.value.expose_secret() != value.expose_secret() {
            header.value = value.clone();
            update.changed += 1;
        }
    }

    update
}

/// Operations the rotation needs from the edge distribution.
#[async_trait]
pub trait EdgeDistribution: Send + Sync {
    /// Current deployment status, e.g. `Deployed` or `InProgress`.
    async fn status(&self) -> Result<String, EdgeError>;

    /// Read the origin headers and the ETag of the configuration.
    async fn origin_config(&self) -> Result<EdgeOriginConfig, EdgeError>;

    /// Push changed header values, conditional on `config.etag`.
    async fn update_origin_config(&self, config: &EdgeOriginConfig) -> Result<(), EdgeError>;
}

/// Mock edge distribution module for testing.
///
/// Used by the rotation unit and integration tests; holds the configuration
/// in memory and bumps the ETag on every accepted update.
pub mod mock {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Mutex;

    /// In-memory edge distribution.
    pub struct MockDistribution {
        status: Mutex<String>,
        config: Mutex<EdgeOriginConfig>,
        update_count: AtomicUsize,
        fail_updates: Option<EdgeError>,
    }

    impl MockDistribution {
        /// A deployed distribution with one origin carrying `header_name: value`.
        pub fn deployed_with_header(origin_id: &str, header_name: &str, value: &str) -> Self {
            Self::with_origins(vec![EdgeOrigin {
                id: origin_id.to_string(),
                custom_headers: vec![OriginHeader {
                    name: header_name.to_string(),
                    value: SecretString::from(value),
                }],
            }])
        }

        /// A deployed distribution with the given origins.
        pub fn with_origins(origins: Vec<EdgeOrigin>) -> Self {
            Self {
                status: Mutex::new(STATUS_DEPLOYED.to_string()),
                config: Mutex::new(EdgeOriginConfig {
                    etag: "ETAG1".to_string(),
                    origins,
                }),
                update_count: AtomicUsize::new(0),
                fail_updates: None,
            }
        }

        /// Reject every update with `error`.
        pub fn failing_updates(mut self, error: EdgeError) -> Self {
            self.fail_updates = Some(error);
            self
        }

        /// Change the reported status.
        pub async fn set_status(&self, status: &str) {
            *self.status.lock().await = status.to_string();
        }

        /// Number of accepted updates.
        pub fn update_count(&self) -> usize {
            self.update_count.load(Ordering::SeqCst)
        }

        /// Values of all headers named `header_name`, in origin order.
        pub async fn header_values(&self, header_name: &str) -> Vec<String> {
            self.config
                .lock()
                .await
                .origins
                .iter()
                .flat_map(|origin| origin.custom_headers.iter())
                .filter(|header| header.name.eq_ignore_ascii_case(header_name))
                .map(|header| header.value.expose_secret().to_string())
                .collect()
        }
    }

    #[async_trait]
    impl EdgeDistribution for MockDistribution {
        async fn status(&self) -> Result<String, EdgeError> {
            Ok(self.status.lock().await.clone())
        }

        async fn origin_config(&self) -> Result<EdgeOriginConfig, EdgeError> {
            Ok(self.config.lock().await.clone())
        }

        async fn update_origin_config(&self, config: &EdgeOriginConfig) -> Result<(), EdgeError> {
            if let Some(error) = &self.fail_updates {
                return Err(error.clone());
            }

            let mut stored = self.config.lock().await;
            if stored.etag != config.etag {
                return Err(EdgeError::Conflict(format!(
                    "expected {}, found {}",
                    config.etag, stored.etag
                )));
            }

            let count = self.update_count.fetch_add(1, Ordering::SeqCst) + 1;
            *stored = EdgeOriginConfig {
                etag: format!("ETAG{}", count + 1),
                origins: config.origins.clone(),
            };
            Ok(())
        }
    }
}
