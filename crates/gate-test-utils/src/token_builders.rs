//! Builder patterns for test identity tokens
//!
//! Defaults describe a token GitHub Actions would mint for the gates
//! audience on a push to `main`.

use crate::crypto_fixtures::{sign_token_with_algorithm, FixtureError, TestKey};
use crate::test_ids::{TEST_AUDIENCE, TEST_ISSUER, TEST_KEY_ID_1, TEST_REPOSITORY, TEST_SUBJECT};
use chrono::{Duration, Utc};
use jsonwebtoken::Algorithm;
use serde_json::{json, Map, Value};

/// Builder for GitHub Actions OIDC claims and signed tokens
///
/// # Example
/// ```rust,ignore
/// let token = TestTokenBuilder::new()
///     .for_subject("repo:org/gates:ref:refs/heads/main")
///     .expires_in(300)
///     .sign()?;
/// ```
pub struct TestTokenBuilder {
    sub: Option<String>,
    iss: String,
    aud: String,
    exp: Option<i64>,
    iat: i64,
    nbf: Option<i64>,
    key: TestKey,
    kid: String,
    algorithm: Algorithm,
}

impl TestTokenBuilder {
    /// Create a new token builder with defaults
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            sub: Some(TEST_SUBJECT.to_string()),
            iss: TEST_ISSUER.to_string(),
            aud: TEST_AUDIENCE.to_string(),
            exp: Some((now + Duration::seconds(300)).timestamp()),
            iat: now.timestamp(),
            nbf: None,
            key: TestKey::One,
            kid: TEST_KEY_ID_1.to_string(),
            algorithm: Algorithm::RS256,
        }
    }

    /// Set the subject
    pub fn for_subject(mut self, subject: &str) -> Self {
        self.sub = Some(subject.to_string());
        self
    }

    /// Omit the `sub` claim
    pub fn without_subject(mut self) -> Self {
        self.sub = None;
        self
    }

    /// Set the issuer
    pub fn with_issuer(mut self, issuer: &str) -> Self {
        self.iss = issuer.to_string();
        self
    }

    /// Set the audience
    pub fn with_audience(mut self, audience: &str) -> Self {
        self.aud = audience.to_string();
        self
    }

    /// Set expiration in seconds from now (negative for an expired token)
    pub fn expires_in(mut self, seconds: i64) -> Self {
        self.exp = Some((Utc::now() + Duration::seconds(seconds)).timestamp());
        self
    }

    /// Omit the `exp` claim
    pub fn without_expiry(mut self) -> Self {
        self.exp = None;
        self
    }

    /// Set not-before in seconds from now
    pub fn not_before_in(mut self, seconds: i64) -> Self {
        self.nbf = Some((Utc::now() + Duration::seconds(seconds)).timestamp());
        self
    }

    /// Sign with the given key and `kid`
    pub fn signed_with(mut self, key: TestKey, kid: &str) -> Self {
        self.key = key;
        self.kid = kid.to_string();
        self
    }

    /// Sign with a different RSA algorithm
    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Build the claims as a JSON value
    pub fn build(&self) -> Value {
        let mut claims = Map::new();
        if let Some(sub) = &self.sub {
            claims.insert("sub".to_string(), json!(sub));
        }
        claims.insert("iss".to_string(), json!(self.iss));
        claims.insert("aud".to_string(), json!(self.aud));
        if let Some(exp) = self.exp {
            claims.insert("exp".to_string(), json!(exp));
        }
        claims.insert("iat".to_string(), json!(self.iat));
        if let Some(nbf) = self.nbf {
            claims.insert("nbf".to_string(), json!(nbf));
        }
        claims.insert("repository".to_string(), json!(TEST_REPOSITORY));
        claims.insert("ref".to_string(), json!("refs/heads/main"));
        claims.insert("workflow".to_string(), json!("deploy"));
        Value::Object(claims)
    }

    /// Build and sign the token
    pub fn sign(&self) -> Result<String, FixtureError> {
        sign_token_with_algorithm(&self.build(), self.key, &self.kid, self.algorithm)
    }
}

impl Default for TestTokenBuilder {
    fn default() -> Self {
        Self::new()
    }
}
