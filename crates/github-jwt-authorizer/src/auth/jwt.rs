//! Identity token validation.
//!
//! Validates GitHub Actions OIDC tokens against the issuer's published keys
//! and then applies the subject allow-list as a final claim check.
//!
//! # Pipeline
//!
//! 1. Size check and header inspection (`kid`, RSA `alg`)
//! 2. Key lookup through the JWKS cache
//! 3. Signature verification
//! 4. `iss` and `aud` equality
//! 5. `exp` (required) and `nbf` (when present), with configured leeway
//! 6. `sub` against the allow-list
//!
//! Any failing step rejects the token; there is no partial success.

use crate::auth::claims::GitHubClaims;
use crate::auth::jwks::{Jwk, JwksClient};
use crate::config::Config;
use crate::errors::AuthError;
use crate::subject::AllowedSubjects;
use common::jwt::{decode_key_header, KeyHeader};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use std::sync::Arc;
use tracing::instrument;

/// JWT validator using the issuer's JWKS.
pub struct JwtValidator {
    /// JWKS client for fetching public keys.
    jwks_client: Arc<JwksClient>,

    /// Expected `iss` claim.
    issuer: String,

    /// Expected `aud` claim.
    audience: String,

    /// Subjects allowed through.
    allowed_subjects: AllowedSubjects,

    /// Leeway in seconds for `exp`/`nbf`.
    clock_skew_seconds: u64,
}

impl JwtValidator {
    /// Create a validator from the authorizer configuration.
    pub fn new(config: &Config, jwks_client: Arc<JwksClient>) -> Self {
        Self {
            jwks_client,
            issuer: config.issuer.clone(),
            audience: config.audience.clone(),
            allowed_subjects: config.allowed_subjects.clone(),
            clock_skew_seconds: config.clock_skew_seconds,
        }
    }

    /// Validate a JWT and return its claims.
    ///
    /// # Errors
    ///
    /// - `AuthError::InvalidToken` - malformed, bad signature, wrong issuer or
    ///   audience, expired, not yet valid
    /// - `AuthError::SubjectNotAllowed` - verified token whose subject is not
    ///   on the allow-list
    /// - `AuthError::KeyServiceUnavailable` - key set could not be fetched
    #[instrument(skip_all)]
    pub async fn validate(&self, token: &str) -> Result<GitHubClaims, AuthError> {
        let header = decode_key_header(token).map_err(|e| {
            tracing::debug!(target: "jwt_authorizer.jwt", error = ?e, "Token header inspection failed");
            AuthError::invalid()
        })?;

        let jwk = self.jwks_client.get_key(&header.kid).await?;

        let claims = verify_token(token, &header, &jwk, &self.validation(header.alg))?;

        if !self.allowed_subjects.allows(claims.sub.as_deref()) {
            tracing::info!(
                target: "jwt_authorizer.jwt",
                repository = ?claims.repository,
                git_ref = ?claims.git_ref,
                "Token subject not on allow-list"
            );
            return Err(AuthError::SubjectNotAllowed);
        }

        tracing::debug!(target: "jwt_authorizer.jwt", "Token validated successfully");
        Ok(claims)
    }

    fn validation(&self, alg: Algorithm) -> Validation {
        let mut validation = Validation::new(alg);
        validation.set_issuer(&[&self.issuer]);
        validation.set_audience(&[&self.audience]);
        validation.set_required_spec_claims(&["exp", "iss", "aud"]);
        validation.validate_exp = true;
        validation.validate_nbf = true;
        validation.leeway = self.clock_skew_seconds;
        validation
    }
}

/// Verify the signature and registered claims of a token against one JWK.
fn verify_token(
    token: &str,
    header: &KeyHeader,
    jwk: &Jwk,
    validation: &Validation,
) -> Result<GitHubClaims, AuthError> {
    if jwk.kty != "RSA" {
        tracing::warn!(target: "jwt_authorizer.jwt", kty = %jwk.kty, "Unexpected JWK key type");
        return Err(AuthError::invalid());
    }

    if let Some(alg) = &jwk.alg {
        if alg.parse::<Algorithm>().ok() != Some(header.alg) {
            tracing::warn!(
                target: "jwt_authorizer.jwt",
                jwk_alg = %alg,
                token_alg = ?header.alg,
                "Token algorithm does not match JWK"
            );
            return Err(AuthError::invalid());
        }
    }

    if let Some(key_use) = &jwk.key_use {
        if key_use != "sig" {
            tracing::warn!(target: "jwt_authorizer.jwt", key_use = %key_use, "JWK not meant for signatures");
            return Err(AuthError::invalid());
        }
    }

    let (Some(n), Some(e)) = (jwk.n.as_deref(), jwk.e.as_deref()) else {
        tracing::error!(target: "jwt_authorizer.jwt", kid = %jwk.kid, "JWK missing modulus or exponent");
        return Err(AuthError::invalid());
    };

    let decoding_key = DecodingKey::from_rsa_components(n, e).map_err(|e| {
        tracing::error!(target: "jwt_authorizer.jwt", error = %e, "Invalid RSA key components");
        AuthError::invalid()
    })?;

    let token_data = decode::<GitHubClaims>(token, &decoding_key, validation).map_err(|e| {
        tracing::debug!(target: "jwt_authorizer.jwt", error = %e, "Token verification failed");
        AuthError::invalid()
    })?;

    Ok(token_data.claims)
}
