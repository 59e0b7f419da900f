//! JWKS client for fetching and caching the identity provider's public keys.
//!
//! The client lives for the whole process, so warm invocations reuse the
//! cached key set. Keys are refreshed when the TTL expires or when a token
//! names a key id the cache does not know (the provider rotated its keys).
//!
//! # Security
//!
//! - Unknown-`kid` refreshes are rate limited by a cool-down, so tokens with
//!   forged key ids cannot turn the authorizer into a load generator
//! - A failed refresh denies the request; it never falls back to unverified
//!   tokens
//! - Concurrent refreshes are harmless: each one installs the same key set

use crate::errors::AuthError;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::instrument;

/// Default cache TTL in seconds (10 minutes).
const DEFAULT_CACHE_TTL_SECONDS: u64 = 600;

/// Default minimum time between refreshes caused by unknown key ids.
const DEFAULT_REFRESH_COOLDOWN_SECONDS: u64 = 10;

/// HTTP timeout for the JWKS request.
const JWKS_HTTP_TIMEOUT_SECONDS: u64 = 5;

/// JSON Web Key from the JWKS endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct Jwk {
    /// Key type ("RSA" for GitHub's signing keys).
    pub kty: String,

    /// Key ID - used to select the correct key for verification.
    pub kid: String,

    /// RSA modulus (base64url encoded).
    #[serde(default)]
    pub n: Option<String>,

    /// RSA public exponent (base64url encoded).
    #[serde(default)]
    pub e: Option<String>,

    /// Algorithm the key is meant for (e.g. "RS256").
    #[serde(default)]
    pub alg: Option<String>,

    /// Key use (should be "sig" for signing).
    #[serde(default, rename = "use")]
    pub key_use: Option<String>,
}

/// JWKS document.
#[derive(Debug, Clone, Deserialize)]
pub struct JwksResponse {
    /// List of JSON Web Keys.
    pub keys: Vec<Jwk>,
}

/// Cached JWKS data.
struct CachedJwks {
    /// Map of key ID to JWK.
    keys: HashMap<String, Jwk>,

    /// When the key set was fetched.
    fetched_at: Instant,
}

/// JWKS client for fetching and caching public keys.
///
/// Thread-safe; share it behind an `Arc`.
pub struct JwksClient {
    /// URL to the JWKS endpoint.
    jwks_url: String,

    /// HTTP client for fetching JWKS.
    http_client: reqwest::Client,

    /// Cached JWKS data.
    cache: Arc<RwLock<Option<CachedJwks>>>,

    /// Cache TTL duration.
    cache_ttl: Duration,

    /// Minimum age of the cache before an unknown kid may trigger a refresh.
    refresh_cooldown: Duration,
}

impl JwksClient {
    /// Create a new JWKS client with default TTL and cool-down.
    pub fn new(jwks_url: String) -> Self {
        Self::with_settings(
            jwks_url,
            Duration::from_secs(DEFAULT_CACHE_TTL_SECONDS),
            Duration::from_secs(DEFAULT_REFRESH_COOLDOWN_SECONDS),
        )
    }

    /// Create a new JWKS client with custom cache TTL and cool-down.
    ///
    /// # Arguments
    ///
    /// * `jwks_url` - URL of the key set
    /// * `cache_ttl` - How long to cache the key set before refreshing
    /// * `refresh_cooldown` - Minimum cache age before an unknown kid forces a refresh
    pub fn with_settings(jwks_url: String, cache_ttl: Duration, refresh_cooldown: Duration) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(JWKS_HTTP_TIMEOUT_SECONDS))
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(target: "jwt_authorizer.jwks", error = %e, "Failed to build HTTP client with custom config, using defaults");
                reqwest::Client::new()
            });

        Self {
            jwks_url,
            http_client,
            cache: Arc::new(RwLock::new(None)),
            cache_ttl,
            refresh_cooldown,
        }
    }

    /// Get a JWK by key ID.
    ///
    /// Serves from cache when possible; fetches the key set when the cache is
    /// empty, expired, or does not contain `kid` (subject to the cool-down).
    ///
    /// # Errors
    ///
    /// Returns `AuthError::KeyServiceUnavailable` if the key set cannot be fetched.
    /// Returns `AuthError::InvalidToken` if the key ID is not in the key set.
    #[instrument(skip(self), fields(kid = %kid))]
    pub async fn get_key(&self, kid: &str) -> Result<Jwk, AuthError> {
        // Check cache first
        {
            let cache = self.cache.read().await;
            if let Some(cached) = cache.as_ref() {
                let age = cached.fetched_at.elapsed();
                if age < self.cache_ttl {
                    if let Some(key) = cached.keys.get(kid) {
                        tracing::debug!(target: "jwt_authorizer.jwks", kid = %kid, "JWKS cache hit");
                        return Ok(key.clone());
                    }
                    if age < self.refresh_cooldown {
                        tracing::debug!(
                            target: "jwt_authorizer.jwks",
                            kid = %kid,
                            "Unknown key id within refresh cool-down"
                        );
                        return Err(AuthError::invalid());
                    }
                }
            }
        }

        // Cache miss, expired, or unknown kid - fetch fresh JWKS
        self.refresh_cache().await?;

        let cache = self.cache.read().await;
        if let Some(key) = cache.as_ref().and_then(|cached| cached.keys.get(kid)) {
            return Ok(key.clone());
        }

        tracing::warn!(target: "jwt_authorizer.jwks", kid = %kid, "Key not found in JWKS after refresh");
        Err(AuthError::invalid())
    }

    /// Refresh the JWKS cache by fetching from the key endpoint.
    #[instrument(skip(self))]
    async fn refresh_cache(&self) -> Result<(), AuthError> {
        tracing::debug!(target: "jwt_authorizer.jwks", url = %self.jwks_url, "Fetching JWKS");

        let response = self
            .http_client
            .get(&self.jwks_url)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(target: "jwt_authorizer.jwks", error = %e, "Failed to fetch JWKS");
                AuthError::KeyServiceUnavailable("JWKS request failed".to_string())
            })?;

        if !response.status().is_success() {
            tracing::error!(
                target: "jwt_authorizer.jwks",
                status = %response.status(),
                "JWKS endpoint returned error"
            );
            return Err(AuthError::KeyServiceUnavailable(format!(
                "JWKS endpoint returned {}",
                response.status()
            )));
        }

        let jwks: JwksResponse = response.json().await.map_err(|e| {
            tracing::error!(target: "jwt_authorizer.jwks", error = %e, "Failed to parse JWKS response");
            AuthError::KeyServiceUnavailable("JWKS response unparsable".to_string())
        })?;

        let keys: HashMap<String, Jwk> = jwks
            .keys
            .into_iter()
            .map(|key| (key.kid.clone(), key))
            .collect();

        tracing::info!(
            target: "jwt_authorizer.jwks",
            key_count = keys.len(),
            "JWKS cache refreshed"
        );

        let mut cache = self.cache.write().await;
        *cache = Some(CachedJwks {
            keys,
            fetched_at: Instant::now(),
        });

        Ok(())
    }

    /// Clear the cache.
    #[cfg(test)]
    pub async fn clear_cache(&self) {
        let mut cache = self.cache.write().await;
        *cache = None;
    }
}
