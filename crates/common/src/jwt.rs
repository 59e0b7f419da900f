//! JWT utilities shared across the edge authorizers.
//!
//! This module provides the token-level checks that happen before any key
//! material is involved:
//! - Size limits for DoS prevention
//! - Bearer prefix handling for the `Authorization` header
//! - Key ID and algorithm extraction from the JWT header
//!
//! # Security
//!
//! - Tokens are size-checked BEFORE parsing (DoS prevention)
//! - Only RSA signature algorithms (RS256/RS384/RS512) are accepted
//! - Generic error messages prevent information leakage
//!
//! # Usage
//!
//! ```rust,ignore
//! use common::jwt::{bearer_token, decode_key_header};
//!
//! let token = bearer_token(authorization_header).ok_or(Denied)?;
//! let header = decode_key_header(token)?;
//! let jwk = jwks_client.get_key(&header.kid).await?;
//! ```

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use jsonwebtoken::Algorithm;
use std::time::Duration;
use thiserror::Error;

// =============================================================================
// Constants
// =============================================================================

/// Maximum allowed JWT size in bytes (8KB).
///
/// GitHub Actions OIDC tokens are roughly 1-1.5KB; anything above 8KB is
/// rejected before base64 decoding or signature verification.
pub const MAX_JWT_SIZE_BYTES: usize = 8192;

/// Maximum allowed clock skew tolerance for `exp`/`nbf` checks (10 minutes).
pub const MAX_CLOCK_SKEW: Duration = Duration::from_secs(600);

/// Literal prefix of a bearer credential in the `Authorization` header.
pub const BEARER_PREFIX: &str = "Bearer ";

/// Signature algorithms accepted for identity tokens.
pub const RSA_ALGORITHMS: [Algorithm; 3] = [Algorithm::RS256, Algorithm::RS384, Algorithm::RS512];

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur while inspecting a JWT before verification.
///
/// Note: Error messages are intentionally generic to prevent information leakage.
/// Detailed information is logged at debug level for troubleshooting.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JwtValidationError {
    /// Token size exceeds maximum allowed.
    #[error("The identity token is invalid or expired")]
    TokenTooLarge,

    /// Token format is invalid (not a valid JWT structure).
    #[error("The identity token is invalid or expired")]
    MalformedToken,

    /// Token is missing required `kid` header.
    #[error("The identity token is invalid or expired")]
    MissingKid,

    /// Token header names an algorithm outside [`RSA_ALGORITHMS`].
    #[error("The identity token is invalid or expired")]
    UnsupportedAlgorithm,
}

// =============================================================================
// Header Types
// =============================================================================

/// The parts of a JWT header needed to select a verification key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyHeader {
    /// Key ID used to look the signing key up in the JWKS.
    pub kid: String,

    /// Signature algorithm declared by the token.
    pub alg: Algorithm,
}

// =============================================================================
// Functions
// =============================================================================

/// Extract the bearer token from an `Authorization` header value.
///
/// The `Bearer ` prefix is stripped when present; a value without the prefix
/// is passed through unchanged and left to signature verification to reject.
/// Returns `None` for a value that is empty once the prefix is removed.
#[must_use]
pub fn bearer_token(authorization: &str) -> Option<&str> {
    let token = authorization
        .strip_prefix(BEARER_PREFIX)
        .unwrap_or(authorization)
        .trim();

    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}

/// Extract the `kid` and `alg` from a JWT header without verifying the signature.
///
/// # Security
///
/// - Token size is checked BEFORE any parsing (denial-of-service prevention)
/// - This function does NOT validate the token signature
/// - The `kid` value should only be used for key lookup in a trusted JWKS
///
/// # Errors
///
/// Returns `JwtValidationError` variants:
/// - `TokenTooLarge` - Token exceeds size limit (denial-of-service protection)
/// - `MalformedToken` - Token format invalid (wrong structure, bad base64, invalid JSON)
/// - `MissingKid` - Token header missing `kid` field or `kid` is empty
/// - `UnsupportedAlgorithm` - Header `alg` is not an RSA signature algorithm
pub fn decode_key_header(token: &str) -> Result<KeyHeader, JwtValidationError> {
    if token.len() > MAX_JWT_SIZE_BYTES {
        tracing::debug!(
            target: "common.jwt",
            token_size = token.len(),
            max_size = MAX_JWT_SIZE_BYTES,
            "Token rejected: size exceeds maximum allowed"
        );
        return Err(JwtValidationError::TokenTooLarge);
    }

    // JWT format: header.payload.signature
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        tracing::debug!(
            target: "common.jwt",
            parts = parts.len(),
            "Token rejected: invalid JWT format"
        );
        return Err(JwtValidationError::MalformedToken);
    }

    let header_part = parts.first().ok_or(JwtValidationError::MalformedToken)?;
    let header_bytes = URL_SAFE_NO_PAD.decode(header_part).map_err(|e| {
        tracing::debug!(target: "common.jwt", error = %e, "Failed to decode JWT header base64");
        JwtValidationError::MalformedToken
    })?;

    let header: serde_json::Value = serde_json::from_slice(&header_bytes).map_err(|e| {
        tracing::debug!(target: "common.jwt", error = %e, "Failed to parse JWT header JSON");
        JwtValidationError::MalformedToken
    })?;

    // Extract kid as string, rejecting empty values
    let kid = header
        .get("kid")
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .ok_or(JwtValidationError::MissingKid)?;

    let alg = header
        .get("alg")
        .and_then(|v| v.as_str())
        .and_then(|s| s.parse::<Algorithm>().ok())
        .filter(|alg| RSA_ALGORITHMS.contains(alg))
        .ok_or_else(|| {
            tracing::debug!(target: "common.jwt", "Token rejected: unsupported alg");
            JwtValidationError::UnsupportedAlgorithm
        })?;

    Ok(KeyHeader { kid, alg })
}
