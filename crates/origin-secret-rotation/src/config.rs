//! Rotation function configuration.
//!
//! Values are validated at cold start so a typo in the header name or test
//! URL fails the deployment instead of the first rotation.

use reqwest::header::HeaderName;
use reqwest::Url;
use std::collections::HashMap;
use std::env;
use thiserror::Error;

/// Environment variable naming the edge distribution.
pub const CLOUDFRONT_DISTRIBUTION_ID: &str = "CLOUDFRONT_DISTRIBUTION_ID";

/// Environment variable naming the origin verification header.
pub const X_VERIFY_ORIGIN_HEADER_NAME: &str = "X_VERIFY_ORIGIN_HEADER_NAME";

/// Environment variable holding the URL used to test a pending secret.
pub const ORIGIN_TEST_URL: &str = "ORIGIN_TEST_URL";

/// Rotation function configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Edge distribution whose origin headers carry the secret.
    pub distribution_id: String,

    /// Origin verification header name.
    pub header_name: HeaderName,

    /// URL behind the origin authorizer used by `testSecret`.
    pub origin_test_url: Url,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid header name: {0}")]
    InvalidHeaderName(String),

    #[error("Invalid origin test URL: {0}")]
    InvalidOriginTestUrl(String),
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

        let distribution_id = required(CLOUDFRONT_DISTRIBUTION_ID)?;

        let raw_header = required(X_VERIFY_ORIGIN_HEADER_NAME)?;
        let header_name = HeaderName::from_bytes(raw_header.as_bytes()).map_err(|e| {
            ConfigError::InvalidHeaderName(format!(
                "{} '{}' is not a valid header name: {}",
                X_VERIFY_ORIGIN_HEADER_NAME, raw_header, e
            ))
        })?;

        let raw_url = required(ORIGIN_TEST_URL)?;
        let origin_test_url = Url::parse(&raw_url).map_err(|e| {
            ConfigError::InvalidOriginTestUrl(format!(
                "{} must be an absolute URL, got '{}': {}",
                ORIGIN_TEST_URL, raw_url, e
            ))
        })?;

        Ok(Config {
            distribution_id,
            header_name,
            origin_test_url,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn base_vars() -> HashMap<String, String> {
        HashMap::from([
            (CLOUDFRONT_DISTRIBUTION_ID.to_string(), "E2EXAMPLE".to_string()),
            (
                X_VERIFY_ORIGIN_HEADER_NAME.to_string(),
                "X-Verify-Origin".to_string(),
            ),
            (
                ORIGIN_TEST_URL.to_string(),
                "https://api.gates.example/internal/health".to_string(),
            ),
        ])
    }

    #[test]
    fn test_from_vars_success() {
        let config = Config::from_vars(&base_vars()).expect("Config should load successfully");

        assert_eq!(config.distribution_id, "E2EXAMPLE");
        // HeaderName normalises to lower case
        assert_eq!(config.header_name.as_str(), "x-verify-origin");
        assert_eq!(config.origin_test_url.host_str(), Some("api.gates.example"));
    }

    #[test]
    fn test_from_vars_missing_each_variable() {
        for name in [
            CLOUDFRONT_DISTRIBUTION_ID,
            X_VERIFY_ORIGIN_HEADER_NAME,
            ORIGIN_TEST_URL,
        ] {
            let mut vars = base_vars();
            vars.remove(name);
            let result = Config::from_vars(&vars);
            assert!(
                matches!(&result, Err(ConfigError::MissingEnvVar(v)) if v == name),
                "{name} should be required"
            );
        }
    }

    #[test]
    fn test_from_vars_rejects_invalid_header_name() {
        let mut vars = base_vars();
        vars.insert(
            X_VERIFY_ORIGIN_HEADER_NAME.to_string(),
            "x verify origin".to_string(),
        );
        let result = Config::from_vars(&vars);
        assert!(matches!(result, Err(ConfigError::InvalidHeaderName(_))));
    }

    #[test]
    fn test_from_vars_rejects_relative_url() {
        let mut vars = base_vars();
        vars.insert(ORIGIN_TEST_URL.to_string(), "/internal/health".to_string());
        let result = Config::from_vars(&vars);
        assert!(matches!(result, Err(ConfigError::InvalidOriginTestUrl(_))));
    }
}
