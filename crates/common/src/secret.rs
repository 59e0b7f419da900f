//! Secret types for protecting sensitive values from accidental logging.
//!
//! This module re-exports types from the [`secrecy`] crate. Every shared
//! origin-verification secret, generated password and bearer token travels
//! through the edge components as a [`SecretString`], so a derived `Debug`
//! on any struct holding one prints `[REDACTED]` instead of the value.
//!
//! # Example
//!
//! ```rust
//! use common::secret::SecretString;
//! use secrecy::ExposeSecret;
//!
//! #[derive(Debug)]
//! struct PendingVersion {
//!     version_id: String,
//!     value: SecretString,  // Safe: Debug shows "[REDACTED]"
//! }
//!
//! let pending = PendingVersion {
//!     version_id: "token-1".to_string(),
//!     value: SecretString::from("s3cr3t"),
//! };
//!
//! println!("{:?}", pending);
//!
//! // To access the actual value, you must explicitly call expose_secret()
//! let value: &str = pending.value.expose_secret();
//! ```
//!
//! # Comparing secrets
//!
//! Never compare a secret with `==` on the exposed string. Use
//! [`matches_secret`], which compares in constant time so response timing
//! does not reveal how many leading bytes of a guessed header were right.

use subtle::ConstantTimeEq;

// Re-export the main types from secrecy
pub use secrecy::{ExposeSecret, SecretBox, SecretString};

/// Compare a candidate value against a secret in constant time.
///
/// Returns `false` for values of different length without inspecting
/// their contents.
#[must_use]
pub fn matches_secret(candidate: &str, secret: &SecretString) -> bool {
    candidate
        .as_bytes()
        .ct_eq(secret.expose_secret().as_bytes())
        .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[test]
    fn test_debug_is_redacted() {
        let secret = SecretString::from("hunter2");
        let debug_str = format!("{secret:?}");

        assert!(debug_str.contains("REDACTED"));
        assert!(!debug_str.contains("hunter2"));
    }

    #[test]
    fn test_expose_secret_returns_inner_value() {
        let secret = SecretString::from("password123");
        assert_eq!(secret.expose_secret(), "password123");
    }

    #[test]
    fn test_deserialize_keeps_value_out_of_debug() {
        #[allow(dead_code)]
        #[derive(Debug, Deserialize)]
        struct HeaderSecret {
            header_name: String,
            header_value: SecretString,
        }

        let json = r#"{"header_name": "x-verify-origin", "header_value": "my-secret-value"}"#;
        let parsed: HeaderSecret = serde_json::from_str(json).expect("deserialize");

        assert_eq!(parsed.header_value.expose_secret(), "my-secret-value");

        let debug = format!("{parsed:?}");
        assert!(debug.contains("x-verify-origin"));
        assert!(!debug.contains("my-secret-value"));
    }

    #[test]
    fn test_matches_secret_equal_values() {
        let secret = SecretString::from("AbC123");
        assert!(matches_secret("AbC123", &secret));
    }

    #[test]
    fn test_matches_secret_rejects_different_values() {
        let secret = SecretString::from("AbC123");
        assert!(!matches_secret("AbC124", &secret));
        assert!(!matches_secret("abc123", &secret));
    }

    #[test]
    fn test_matches_secret_rejects_prefix_and_extension() {
        let secret = SecretString::from("AbC123");
        assert!(!matches_secret("AbC12", &secret));
        assert!(!matches_secret("AbC1234", &secret));
        assert!(!matches_secret("", &secret));
    }
}
