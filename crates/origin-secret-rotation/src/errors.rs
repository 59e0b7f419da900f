//! Rotation phase errors.
//!
//! Any error fails the current phase. The rotation scheduler retries the
//! phase later, so every variant leaves the vault and the distribution in a
//! state the same phase can be re-run against.

use crate::distribution::EdgeError;
use crate::probe::ProbeError;
use common::vault::VaultError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RotationError {
    #[error("Secret vault error: {0}")]
    Vault(#[from] VaultError),

    #[error("Edge distribution error: {0}")]
    Edge(#[from] EdgeError),

    #[error("Origin test failed: {0}")]
    Probe(#[from] ProbeError),

    /// A configuration change is still propagating through the edge.
    #[error("Distribution is not Deployed (status: {0})")]
    DistributionNotDeployed(String),

    #[error("No pending secret value for version {0}")]
    PendingSecretMissing(String),

    #[error("No origin carries the header {0}")]
    OriginHeaderNotFound(String),

    #[error("Secret {0} has no current version")]
    CurrentVersionMissing(String),
}
