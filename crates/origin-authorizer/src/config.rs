//! Origin authorizer configuration.

use std::collections::HashMap;
use std::env;
use thiserror::Error;

/// Environment variable naming the shared origin secret in the vault.
pub const SECRET_ID: &str = "SECRET_ID";

/// Environment variable naming the header the edge distribution injects.
pub const X_VERIFY_ORIGIN_HEADER_NAME: &str = "X_VERIFY_ORIGIN_HEADER_NAME";

/// Origin authorizer configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Vault identifier of the shared origin secret.
    pub secret_id: String,

    /// Name of the header carrying the origin secret.
    pub header_name: String,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a HashMap (for testing).
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let required = |name: &str| {
            vars.get(name)
                .filter(|v| !v.is_empty())
                .cloned()
                .ok_or_else(|| ConfigError::MissingEnvVar(name.to_string()))
        };

        Ok(Config {
            secret_id: required(SECRET_ID)?,
            header_name: required(X_VERIFY_ORIGIN_HEADER_NAME)?,
        })
    }
}
