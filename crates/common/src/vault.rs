//! Secret vault seam.
//!
//! A logical secret holds several versions; staging labels mark which version
//! is live. Exactly one version carries [`STAGE_CURRENT`] once the secret has
//! been rotated for the first time, and [`STAGE_PENDING`] exists only while a
//! rotation is in flight. A label is unique per secret: attaching it to one
//! version removes it from any other.
//!
//! Components never talk to the vault service directly; they hold an
//! `Arc<dyn SecretVault>` so tests can inject the in-memory vault from
//! `gate-test-utils`.

use crate::secret::SecretString;
use async_trait::async_trait;
use std::collections::HashMap;
use thiserror::Error;

/// Staging label of the version being introduced by a rotation.
pub const STAGE_PENDING: &str = "AWSPENDING";

/// Staging label of the live version.
pub const STAGE_CURRENT: &str = "AWSCURRENT";

/// Staging label the vault assigns to the version that lost `AWSCURRENT`.
pub const STAGE_PREVIOUS: &str = "AWSPREVIOUS";

/// Errors returned by a [`SecretVault`].
///
/// `NotFound` and `InvalidRequest` are answers from the vault about the
/// requested version; `Unavailable` means the vault could not be asked.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VaultError {
    #[error("Secret version not found: {0}")]
    NotFound(String),

    #[error("Invalid vault request: {0}")]
    InvalidRequest(String),

    #[error("Vault unavailable: {0}")]
    Unavailable(String),
}

impl VaultError {
    /// Whether the vault positively reported that the version does not exist.
    #[must_use]
    pub fn is_missing_version(&self) -> bool {
        matches!(self, VaultError::NotFound(_) | VaultError::InvalidRequest(_))
    }
}

/// Which version of a secret to read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionSelector {
    pub version_id: Option<String>,
    pub stage: Option<String>,
}

impl VersionSelector {
    /// The version the vault returns when nothing is specified (`AWSCURRENT`).
    #[must_use]
    pub fn latest() -> Self {
        Self::default()
    }

    /// The version carrying `stage`.
    #[must_use]
    pub fn stage(stage: &str) -> Self {
        Self {
            version_id: None,
            stage: Some(stage.to_string()),
        }
    }

    /// The version `version_id`, only if it carries `stage`.
    #[must_use]
    pub fn version_in_stage(version_id: &str, stage: &str) -> Self {
        Self {
            version_id: Some(version_id.to_string()),
            stage: Some(stage.to_string()),
        }
    }
}

/// One version of a secret as returned by the vault.
#[derive(Debug, Clone)]
pub struct SecretVersion {
    pub version_id: String,

    /// `None` when the version stores binary data or no value at all.
    pub secret_string: Option<SecretString>,

    pub stages: Vec<String>,
}

/// Change to apply to a staging label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageUpdate<'a> {
    pub stage: &'a str,

    /// Version to attach the label to.
    pub move_to: Option<&'a str>,

    /// Version the label must currently be attached to; it is removed there.
    pub remove_from: Option<&'a str>,
}

/// Operations the edge components need from the secret vault.
#[async_trait]
pub trait SecretVault: Send + Sync {
    /// Read one version of a secret.
    async fn get_secret_value(
        &self,
        secret_id: &str,
        selector: &VersionSelector,
    ) -> Result<SecretVersion, VaultError>;

    /// Store a new version `version_id` with the given labels.
    ///
    /// Storing the same value under an existing `version_id` is a no-op;
    /// a different value is rejected.
    async fn put_secret_value(
        &self,
        secret_id: &str,
        version_id: &str,
        value: &SecretString,
        stages: &[&str],
    ) -> Result<(), VaultError>;

    /// Generate a random password of `length` characters.
    async fn random_password(
        &self,
        length: u32,
        exclude_punctuation: bool,
    ) -> Result<SecretString, VaultError>;

    /// Map of version id to the staging labels attached to it.
    async fn version_stages(
        &self,
        secret_id: &str,
    ) -> Result<HashMap<String, Vec<String>>, VaultError>;

    /// Move or remove a staging label.
    async fn update_version_stage(
        &self,
        secret_id: &str,
        update: StageUpdate<'_>,
    ) -> Result<(), VaultError>;
}

/// Outcome of reading a staged secret value where absence is expected.
///
/// Keeps "the vault says there is no such version" apart from "the vault
/// could not be asked", even where callers end up treating both as absent.
#[derive(Debug)]
pub enum SecretLookup {
    Found(SecretString),
    NotFound,
    Unavailable(VaultError),
}

impl SecretLookup {
    /// Classify the result of a vault read.
    #[must_use]
    pub fn from_result(result: Result<SecretVersion, VaultError>) -> Self {
        match result {
            Ok(SecretVersion {
                secret_string: Some(value),
                ..
            }) => SecretLookup::Found(value),
            Ok(SecretVersion {
                secret_string: None,
                ..
            }) => SecretLookup::NotFound,
            Err(e) if e.is_missing_version() => SecretLookup::NotFound,
            Err(e) => SecretLookup::Unavailable(e),
        }
    }
}

/// Find the version carrying `stage` in a version-to-stages map.
#[must_use]
pub fn version_with_stage<'a>(
    versions: &'a HashMap<String, Vec<String>>,
    stage: &str,
) -> Option<&'a str> {
    versions
        .iter()
        .find(|(_, stages)| stages.iter().any(|s| s == stage))
        .map(|(version_id, _)| version_id.as_str())
}
