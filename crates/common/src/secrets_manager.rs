//! AWS Secrets Manager implementation of [`SecretVault`].
//!
//! A thin translation layer: every method is one Secrets Manager call, and
//! service errors are folded into [`VaultError`] so callers never see SDK
//! types.

use crate::secret::{ExposeSecret, SecretString};
use crate::vault::{SecretVault, SecretVersion, StageUpdate, VaultError, VersionSelector};
use async_trait::async_trait;
use aws_sdk_secretsmanager::error::{DisplayErrorContext, SdkError};
use aws_sdk_secretsmanager::operation::describe_secret::DescribeSecretError;
use aws_sdk_secretsmanager::operation::get_random_password::GetRandomPasswordError;
use aws_sdk_secretsmanager::operation::get_secret_value::GetSecretValueError;
use aws_sdk_secretsmanager::operation::put_secret_value::PutSecretValueError;
use aws_sdk_secretsmanager::operation::update_secret_version_stage::UpdateSecretVersionStageError;
use aws_sdk_secretsmanager::Client;
use std::collections::HashMap;
use tracing::instrument;

/// Secret vault backed by AWS Secrets Manager.
#[derive(Debug, Clone)]
pub struct SecretsManagerVault {
    client: Client,
}

impl SecretsManagerVault {
    /// Wrap an existing Secrets Manager client.
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Build a client from the ambient AWS configuration (region, credentials).
    pub async fn from_env() -> Self {
        let config = aws_config::load_from_env().await;
        Self::new(Client::new(&config))
    }
}

/// Fold an SDK error into a [`VaultError`].
///
/// `not_found` and `invalid` pick out the service error kinds that mean the
/// vault answered; everything else (throttling, network, credentials) is
/// reported as `Unavailable`.
fn classify<E>(
    operation: &str,
    err: &SdkError<E>,
    not_found: impl Fn(&E) -> bool,
    invalid: impl Fn(&E) -> bool,
) -> VaultError
where
    E: std::error::Error + Send + Sync + 'static,
{
    let message = format!("{operation}: {}", DisplayErrorContext(err));

    match err.as_service_error() {
        Some(e) if not_found(e) => VaultError::NotFound(message),
        Some(e) if invalid(e) => VaultError::InvalidRequest(message),
        _ => {
            tracing::debug!(target: "common.vault", operation, error = %message, "Secrets Manager call failed");
            VaultError::Unavailable(message)
        }
    }
}

#[async_trait]
impl SecretVault for SecretsManagerVault {
    #[instrument(skip(self, selector), fields(secret_id = %secret_id, stage = ?selector.stage))]
    async fn get_secret_value(
        &self,
        secret_id: &str,
        selector: &VersionSelector,
    ) -> Result<SecretVersion, VaultError> {
        let output = self
            .client
            .get_secret_value()
            .secret_id(secret_id)
            .set_version_id(selector.version_id.clone())
            .set_version_stage(selector.stage.clone())
            .send()
            .await
            .map_err(|e| {
                classify(
                    "GetSecretValue",
                    &e,
                    GetSecretValueError::is_resource_not_found_exception,
                    GetSecretValueError::is_invalid_request_exception,
                )
            })?;

        Ok(SecretVersion {
            version_id: output.version_id().unwrap_or_default().to_string(),
            secret_string: output.secret_string().map(SecretString::from),
            stages: output.version_stages().to_vec(),
        })
    }

    #[instrument(skip(self, value), fields(secret_id = %secret_id, version_id = %version_id))]
    async fn put_secret_value(
        &self,
        secret_id: &str,
        version_id: &str,
        value: &SecretString,
        stages: &[&str],
    ) -> Result<(), VaultError> {
        let request = stages.iter().fold(
            self.client
                .put_secret_value()
                .secret_id(secret_id)
                .client_request_token(version_id)
                .secret_string(value.expose_secret()),
            |request, stage| request.version_stages(*stage),
        );

        request.send().await.map_err(|e| {
            classify(
                "PutSecretValue",
                &e,
                PutSecretValueError::is_resource_not_found_exception,
                |e: &PutSecretValueError| {
                    e.is_invalid_request_exception() || e.is_resource_exists_exception()
                },
            )
        })?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn random_password(
        &self,
        length: u32,
        exclude_punctuation: bool,
    ) -> Result<SecretString, VaultError> {
        let output = self
            .client
            .get_random_password()
            .password_length(i64::from(length))
            .exclude_punctuation(exclude_punctuation)
            .send()
            .await
            .map_err(|e| {
                classify(
                    "GetRandomPassword",
                    &e,
                    |_: &GetRandomPasswordError| false,
                    GetRandomPasswordError::is_invalid_parameter_exception,
                )
            })?;

        output
            .random_password()
            .map(SecretString::from)
            .ok_or_else(|| VaultError::Unavailable("GetRandomPassword: empty response".to_string()))
    }

    #[instrument(skip(self), fields(secret_id = %secret_id))]
    async fn version_stages(
        &self,
        secret_id: &str,
    ) -> Result<HashMap<String, Vec<String>>, VaultError> {
        let output = self
            .client
            .describe_secret()
            .secret_id(secret_id)
            .send()
            .await
            .map_err(|e| {
                classify(
                    "DescribeSecret",
                    &e,
                    DescribeSecretError::is_resource_not_found_exception,
                    |_: &DescribeSecretError| false,
                )
            })?;

        Ok(output.version_ids_to_stages().cloned().unwrap_or_default())
    }

    #[instrument(skip(self, update), fields(secret_id = %secret_id, stage = %update.stage))]
    async fn update_version_stage(
        &self,
        secret_id: &str,
        update: StageUpdate<'_>,
    ) -> Result<(), VaultError> {
        self.client
            .update_secret_version_stage()
            .secret_id(secret_id)
            .version_stage(update.stage)
            .set_move_to_version_id(update.move_to.map(str::to_string))
            .set_remove_from_version_id(update.remove_from.map(str::to_string))
            .send()
            .await
            .map_err(|e| {
                classify(
                    "UpdateSecretVersionStage",
                    &e,
                    UpdateSecretVersionStageError::is_resource_not_found_exception,
                    UpdateSecretVersionStageError::is_invalid_request_exception,
                )
            })?;

        Ok(())
    }
}
