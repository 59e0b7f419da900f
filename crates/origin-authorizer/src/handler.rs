//! Origin header authorizer.
//!
//! Lets a request through only when it carries the shared origin secret in
//! the configured header, proving it came through the edge distribution.

use crate::secret_store::OriginSecretStore;
use common::authorizer::{AuthorizerRequest, AuthorizerResponse};
use common::secret::{matches_secret, SecretString};
use common::vault::SecretLookup;
use tracing::instrument;

/// Checks the origin verification header against the staged secret values.
pub struct OriginHeaderAuthorizer {
    store: OriginSecretStore,
    header_name: String,
}

impl OriginHeaderAuthorizer {
    pub fn new(store: OriginSecretStore, header_name: String) -> Self {
        Self { store, header_name }
    }

    /// Decide whether the request may reach the API.
    ///
    /// The pending value is tried first so a freshly deployed edge secret
    /// works before it is promoted. Vault failures on either read count as
    /// "no value" for that stage only.
    #[instrument(skip_all)]
    pub async fn authorize(&self, request: &AuthorizerRequest) -> AuthorizerResponse {
        let Some(candidate) = request
            .header(&self.header_name)
            .filter(|value| !value.is_empty())
        else {
            tracing::info!(target: "origin_authorizer.handler", reason = "missing_header", "Request denied");
            return AuthorizerResponse::deny();
        };

        if let Some(pending) = present(self.store.pending().await, "pending") {
            if matches_secret(candidate, &pending) {
                tracing::debug!(target: "origin_authorizer.handler", stage = "pending", "Request allowed");
                return AuthorizerResponse::allow();
            }
        }

        if let Some(current) = present(self.store.current().await, "current") {
            if matches_secret(candidate, &current) {
                tracing::debug!(target: "origin_authorizer.handler", stage = "current", "Request allowed");
                return AuthorizerResponse::allow();
            }
        }

        tracing::info!(target: "origin_authorizer.handler", reason = "secret_mismatch", "Request denied");
        AuthorizerResponse::deny()
    }
}

/// Collapse a lookup into an optional value, logging vault failures.
fn present(lookup: SecretLookup, stage: &str) -> Option<SecretString> {
    match lookup {
        SecretLookup::Found(value) => Some(value),
        SecretLookup::NotFound => None,
        SecretLookup::Unavailable(e) => {
            tracing::warn!(
                target: "origin_authorizer.handler",
                stage,
                error = %e,
                "Secret lookup failed, treating as absent"
            );
            None
        }
    }
}
