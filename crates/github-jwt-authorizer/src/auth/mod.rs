//! Token verification against the GitHub Actions OIDC issuer.

pub mod claims;
pub mod jwks;
pub mod jwt;
