//! Reads of the staged origin secret.
//!
//! During a rotation the edge distribution may already send the pending value
//! while some requests still carry the current one, so both stages are
//! readable here. Neither read is cached: a rotation must take effect on the
//! next request.

use common::vault::{SecretLookup, SecretVault, VersionSelector, STAGE_CURRENT, STAGE_PENDING};
use std::sync::Arc;
use tracing::instrument;

/// Access to one secret's pending and current values.
#[derive(Clone)]
pub struct OriginSecretStore {
    vault: Arc<dyn SecretVault>,
    secret_id: String,
}

impl OriginSecretStore {
    pub fn new(vault: Arc<dyn SecretVault>, secret_id: String) -> Self {
        Self { vault, secret_id }
    }

    /// Value staged `AWSPENDING`, present only while a rotation is in flight.
    #[instrument(skip(self))]
    pub async fn pending(&self) -> SecretLookup {
        self.read(STAGE_PENDING).await
    }

    /// Value staged `AWSCURRENT`.
    #[instrument(skip(self))]
    pub async fn current(&self) -> SecretLookup {
        self.read(STAGE_CURRENT).await
    }

    async fn read(&self, stage: &str) -> SecretLookup {
        let lookup = SecretLookup::from_result(
            self.vault
                .get_secret_value(&self.secret_id, &VersionSelector::stage(stage))
                .await,
        );

        if matches!(lookup, SecretLookup::NotFound) {
            tracing::debug!(target: "origin_authorizer.secret_store", stage, "No secret version in stage");
        }

        lookup
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use common::secret::ExposeSecret;
    use common::vault::VaultError;
    use gate_test_utils::{
        version_token, InMemoryVault, TEST_CURRENT_VALUE, TEST_PENDING_VALUE, TEST_SECRET_ID,
        TEST_VERSION_CURRENT, TEST_VERSION_PENDING,
    };

    #[tokio::test]
    async fn test_reads_both_stages() {
        let vault = InMemoryVault::new()
            .with_version(
                TEST_SECRET_ID,
                &version_token(TEST_VERSION_CURRENT),
                TEST_CURRENT_VALUE,
                &[STAGE_CURRENT],
            )
            .with_version(
                TEST_SECRET_ID,
                &version_token(TEST_VERSION_PENDING),
                TEST_PENDING_VALUE,
                &[STAGE_PENDING],
            );
        let store = OriginSecretStore::new(Arc::new(vault), TEST_SECRET_ID.to_string());

        assert!(
            matches!(store.pending().await, SecretLookup::Found(v) if v.expose_secret() == TEST_PENDING_VALUE)
        );
        assert!(
            matches!(store.current().await, SecretLookup::Found(v) if v.expose_secret() == TEST_CURRENT_VALUE)
        );
    }

    #[tokio::test]
    async fn test_missing_pending_is_not_found() {
        let vault = InMemoryVault::new().with_version(
            TEST_SECRET_ID,
            &version_token(TEST_VERSION_CURRENT),
            TEST_CURRENT_VALUE,
            &[STAGE_CURRENT],
        );
        let store = OriginSecretStore::new(Arc::new(vault), TEST_SECRET_ID.to_string());

        assert!(matches!(store.pending().await, SecretLookup::NotFound));
    }

    #[tokio::test]
    async fn test_vault_outage_is_unavailable() {
        let vault = InMemoryVault::new();
        vault
            .fail_all_reads(VaultError::Unavailable("throttled".to_string()))
            .await;
        let store = OriginSecretStore::new(Arc::new(vault), TEST_SECRET_ID.to_string());

        assert!(matches!(store.current().await, SecretLookup::Unavailable(_)));
    }
}
