//! JWT authorizer configuration.
//!
//! The issuer, key endpoint and audience are fixed; only the subject
//! allow-list and the clock skew come from the environment. Configuration is
//! loaded once at cold start and a failure there stops the function before
//! it serves any request.

use crate::subject::AllowedSubjects;
use common::jwt::MAX_CLOCK_SKEW;
use std::collections::HashMap;
use std::env;
use thiserror::Error;

/// Issuer of GitHub Actions OIDC tokens.
pub const GITHUB_OIDC_ISSUER: &str = "https://token.actions.githubusercontent.com";

/// Key set of the GitHub Actions OIDC issuer.
pub const GITHUB_OIDC_JWKS_URL: &str =
    "https://token.actions.githubusercontent.com/.well-known/jwks";

/// Audience the gates action requests its token for.
pub const GATES_AUDIENCE: &str = "consid-germany/gates";

/// Environment variable holding the subject allow-list as a JSON string array.
pub const ALLOWED_SUB_PATTERNS: &str = "ALLOWED_SUB_PATTERNS";

/// Optional leeway in seconds for `exp`/`nbf` checks.
pub const JWT_CLOCK_SKEW_SECONDS: &str = "JWT_CLOCK_SKEW_SECONDS";

/// Default clock skew tolerance: none.
pub const DEFAULT_CLOCK_SKEW_SECONDS: u64 = 0;

/// JWT authorizer configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Expected `iss` claim.
    pub issuer: String,

    /// URL of the issuer's key set.
    pub jwks_url: String,

    /// Expected `aud` claim.
    pub audience: String,

    /// Subjects allowed to call the API.
    pub allowed_subjects: AllowedSubjects,

    /// Leeway in seconds applied to `exp` and `nbf`.
    pub clock_skew_seconds: u64,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid allowed subject patterns: {0}")]
    InvalidAllowedSubPatterns(String),

    #[error("Invalid JWT clock skew configuration: {0}")]
    InvalidJwtClockSkew(String),
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a HashMap (for testing).
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let raw_patterns = vars
            .get(ALLOWED_SUB_PATTERNS)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar(ALLOWED_SUB_PATTERNS.to_string()))?;

        let patterns: Vec<String> = serde_json::from_str(raw_patterns).map_err(|e| {
            ConfigError::InvalidAllowedSubPatterns(format!(
                "{} must be a JSON array of strings: {}",
                ALLOWED_SUB_PATTERNS, e
            ))
        })?;

        let clock_skew_seconds = if let Some(value_str) = vars.get(JWT_CLOCK_SKEW_SECONDS) {
            let value: u64 = value_str.parse().map_err(|e| {
                ConfigError::InvalidJwtClockSkew(format!(
                    "{} must be a non-negative integer, got '{}': {}",
                    JWT_CLOCK_SKEW_SECONDS, value_str, e
                ))
            })?;

            if value > MAX_CLOCK_SKEW.as_secs() {
                return Err(ConfigError::InvalidJwtClockSkew(format!(
                    "{} must not exceed {} seconds, got {}",
                    JWT_CLOCK_SKEW_SECONDS,
                    MAX_CLOCK_SKEW.as_secs(),
                    value
                )));
            }

            value
        } else {
            DEFAULT_CLOCK_SKEW_SECONDS
        };

        Ok(Config {
            issuer: GITHUB_OIDC_ISSUER.to_string(),
            jwks_url: GITHUB_OIDC_JWKS_URL.to_string(),
            audience: GATES_AUDIENCE.to_string(),
            allowed_subjects: AllowedSubjects::new(patterns),
            clock_skew_seconds,
        })
    }
}
