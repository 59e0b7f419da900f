//! Four-phase rotation of the shared origin secret.
//!
//! The rotation scheduler invokes the function once per phase, in order:
//! `createSecret`, `setSecret`, `testSecret`, `finishSecret`. All state lives
//! in the vault's staging labels, so each phase can be re-run after a
//! failure without undoing anything.

use crate::distribution::{apply_origin_secret, EdgeDistribution, STATUS_DEPLOYED};
use crate::errors::RotationError;
use crate::probe::OriginProbe;
use common::secret::SecretString;
use common::vault::{
    version_with_stage, SecretLookup, SecretVault, StageUpdate, VersionSelector, STAGE_CURRENT,
    STAGE_PENDING,
};
use reqwest::header::HeaderName;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::instrument;

/// Length of generated secrets.
pub const GENERATED_SECRET_LENGTH: u32 = 32;

/// Rotation phase requested by the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RotationStep {
    CreateSecret,
    SetSecret,
    TestSecret,
    FinishSecret,
}

/// Invocation payload sent by the rotation scheduler.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RotationEvent {
    pub step: RotationStep,
    pub secret_id: String,

    /// Version id of the secret being introduced by this rotation.
    pub client_request_token: String,
}

/// Drives the rotation phases against the vault and the edge distribution.
pub struct SecretRotator {
    vault: Arc<dyn SecretVault>,
    distribution: Arc<dyn EdgeDistribution>,
    probe: OriginProbe,
    header_name: HeaderName,
}

impl SecretRotator {
    pub fn new(
        vault: Arc<dyn SecretVault>,
        distribution: Arc<dyn EdgeDistribution>,
        probe: OriginProbe,
        header_name: HeaderName,
    ) -> Self {
        Self {
            vault,
            distribution,
            probe,
            header_name,
        }
    }

    /// Run the phase named in `event`.
    #[instrument(
        skip_all,
        fields(step = ?event.step, secret_id = %event.secret_id, token = %event.client_request_token)
    )]
    pub async fn handle(&self, event: &RotationEvent) -> Result<(), RotationError> {
        let secret_id = event.secret_id.as_str();
        let token = event.client_request_token.as_str();

        let result = match event.step {
            RotationStep::CreateSecret => self.create_secret(secret_id, token).await,
            RotationStep::SetSecret => self.set_secret(secret_id, token).await,
            RotationStep::TestSecret => self.test_secret(secret_id, token).await,
            RotationStep::FinishSecret => self.finish_secret(secret_id, token).await,
        };

        match &result {
            Ok(()) => tracing::info!(target: "rotation.orchestrator", "Rotation phase completed"),
            Err(e) => tracing::error!(target: "rotation.orchestrator", error = %e, "Rotation phase failed"),
        }

        result
    }

    /// Stage a freshly generated value as pending unless this rotation
    /// already did.
    async fn create_secret(&self, secret_id: &str, token: &str) -> Result<(), RotationError> {
        self.vault
            .get_secret_value(secret_id, &VersionSelector::latest())
            .await?;

        match self
            .vault
            .get_secret_value(secret_id, &VersionSelector::version_in_stage(token, STAGE_PENDING))
            .await
        {
            Ok(_) => {
                tracing::info!(target: "rotation.orchestrator", "Pending version already exists");
                Ok(())
            }
            Err(e) if e.is_missing_version() => {
                let value = self
                    .vault
                    .random_password(GENERATED_SECRET_LENGTH, true)
                    .await?;
                self.vault
                    .put_secret_value(secret_id, token, &value, &[STAGE_PENDING])
                    .await?;
                tracing::info!(target: "rotation.orchestrator", "Pending version created");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Write the pending value into the edge's origin headers.
    async fn set_secret(&self, secret_id: &str, token: &str) -> Result<(), RotationError> {
        let status = self.distribution.status().await?;
        if status != STATUS_DEPLOYED {
            return Err(RotationError::DistributionNotDeployed(status));
        }

        let pending = self.pending_value(secret_id, token).await?;

        let mut config = self.distribution.origin_config().await?;
        let update = apply_origin_secret(&mut config, self.header_name.as_str(), &pending);

        if update.matched == 0 {
            return Err(RotationError::OriginHeaderNotFound(
                self.header_name.to_string(),
            ));
        }

        if update.changed == 0 {
            tracing::info!(
                target: "rotation.orchestrator",
                headers = update.matched,
                "Origin headers already carry the pending secret"
            );
            return Ok(());
        }

        self.distribution.update_origin_config(&config).await?;
        tracing::info!(
            target: "rotation.orchestrator",
            headers = update.changed,
            "Origin headers updated with pending secret"
        );
        Ok(())
    }

    /// Prove the origin accepts the pending value.
    // TODO: also probe with the current value so an origin outage is told
    // apart from a rejected pending secret before finishSecret runs.
    async fn test_secret(&self, secret_id: &str, token: &str) -> Result<(), RotationError> {
        let pending = self.pending_value(secret_id, token).await?;
        self.probe.check(&pending).await?;
        Ok(())
    }

    /// Promote this rotation's version to current and drop its pending label.
    async fn finish_secret(&self, secret_id: &str, token: &str) -> Result<(), RotationError> {
        let versions = self.vault.version_stages(secret_id).await?;

        let current = version_with_stage(&versions, STAGE_CURRENT)
            .ok_or_else(|| RotationError::CurrentVersionMissing(secret_id.to_string()))?;

        if current == token {
            tracing::info!(target: "rotation.orchestrator", "Version is already current");
        } else {
            self.vault
                .update_version_stage(
                    secret_id,
                    StageUpdate {
                        stage: STAGE_CURRENT,
                        move_to: Some(token),
                        remove_from: Some(current),
                    },
                )
                .await?;
            tracing::info!(target: "rotation.orchestrator", previous = %current, "Version promoted to current");
        }

        let still_pending = versions
            .get(token)
            .is_some_and(|stages| stages.iter().any(|s| s == STAGE_PENDING));

        if still_pending {
            self.vault
                .update_version_stage(
                    secret_id,
                    StageUpdate {
                        stage: STAGE_PENDING,
                        move_to: None,
                        remove_from: Some(token),
                    },
                )
                .await?;
        }

        Ok(())
    }

    async fn pending_value(&self, secret_id: &str, token: &str) -> Result<SecretString, RotationError> {
        let lookup = SecretLookup::from_result(
            self.vault
                .get_secret_value(secret_id, &VersionSelector::version_in_stage(token, STAGE_PENDING))
                .await,
        );

        match lookup {
            SecretLookup::Found(value) => Ok(value),
            SecretLookup::NotFound => Err(RotationError::PendingSecretMissing(token.to_string())),
            SecretLookup::Unavailable(e) => Err(e.into()),
        }
    }
}
