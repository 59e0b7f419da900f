//! GitHub Actions identity token authorizer.
//!
//! Runs as a gateway authorizer in front of the gates API. A request is let
//! through only when its `Authorization` header carries an OIDC token that
//!
//! - is signed by a key from the GitHub Actions issuer's JWKS,
//! - names the gates audience and the GitHub issuer,
//! - is within its validity window, and
//! - has a subject matching one of the configured patterns.
//!
//! # Modules
//!
//! - `auth` - JWKS cache, claims and token validation
//! - `config` - Allow-list and clock skew from the environment
//! - `errors` - Rejection reasons
//! - `handler` - Request to allow/deny mapping
//! - `subject` - Wildcard subject patterns

pub mod auth;
pub mod config;
pub mod errors;
pub mod handler;
pub mod subject;
