//! JWT authorizer error types.
//!
//! None of these reach the caller: the handler turns every error into
//! `isAuthorized: false`. The variants exist so logs say which stage of the
//! pipeline rejected a token. Messages are generic; details are logged at
//! the point of failure.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    /// Malformed, badly signed, expired, or wrong issuer/audience.
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    /// Valid token whose subject is not on the allow-list.
    #[error("Subject not allowed")]
    SubjectNotAllowed,

    /// The key set could not be fetched.
    #[error("Key service unavailable: {0}")]
    KeyServiceUnavailable(String),
}

impl AuthError {
    /// Generic invalid-token error used for every signature/claim failure.
    pub(crate) fn invalid() -> Self {
        AuthError::InvalidToken("The identity token is invalid or expired".to_string())
    }

    /// Short label for structured logs.
    pub fn reason(&self) -> &'static str {
        match self {
            AuthError::InvalidToken(_) => "invalid_token",
            AuthError::SubjectNotAllowed => "subject_not_allowed",
            AuthError::KeyServiceUnavailable(_) => "key_service_unavailable",
        }
    }
}
