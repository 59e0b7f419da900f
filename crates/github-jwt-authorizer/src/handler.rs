//! Authorizer entry point for gateway invocations.
//!
//! Every request resolves to a boolean. Errors never escape to the gateway;
//! they are logged with a reason label and turned into a deny.

use crate::auth::jwks::JwksClient;
use crate::auth::jwt::JwtValidator;
use crate::config::Config;
use common::authorizer::{AuthorizerRequest, AuthorizerResponse};
use common::jwt::bearer_token;
use std::sync::Arc;
use tracing::instrument;

/// Header carrying the GitHub Actions identity token.
pub const AUTHORIZATION_HEADER: &str = "authorization";

/// Allows requests that carry a valid identity token from an allowed workflow.
pub struct GitHubJwtAuthorizer {
    validator: JwtValidator,
}

impl GitHubJwtAuthorizer {
    /// Build an authorizer with a JWKS client for the configured key URL.
    pub fn new(config: &Config) -> Self {
        let jwks_client = Arc::new(JwksClient::new(config.jwks_url.clone()));
        Self::with_jwks_client(config, jwks_client)
    }

    /// Build an authorizer around an existing JWKS client.
    pub fn with_jwks_client(config: &Config, jwks_client: Arc<JwksClient>) -> Self {
        Self {
            validator: JwtValidator::new(config, jwks_client),
        }
    }

    /// Decide whether the request may reach the API.
    #[instrument(skip_all)]
    pub async fn authorize(&self, request: &AuthorizerRequest) -> AuthorizerResponse {
        let Some(token) = request.header(AUTHORIZATION_HEADER).and_then(bearer_token) else {
            tracing::info!(target: "jwt_authorizer.handler", reason = "missing_token", "Request denied");
            return AuthorizerResponse::deny();
        };

        match self.validator.validate(token).await {
            Ok(claims) => {
                tracing::info!(
                    target: "jwt_authorizer.handler",
                    repository = ?claims.repository,
                    workflow = ?claims.workflow,
                    "Request allowed"
                );
                AuthorizerResponse::allow()
            }
            Err(e) => {
                tracing::info!(
                    target: "jwt_authorizer.handler",
                    reason = e.reason(),
                    error = %e,
                    "Request denied"
                );
                AuthorizerResponse::deny()
            }
        }
    }
}
