//! Rotation of the shared origin verification secret.
//!
//! Implements the vault's four-phase rotation contract for the secret the
//! edge distribution sends to the origin:
//!
//! - `createSecret` - stage a new random value as pending
//! - `setSecret` - write it into the distribution's origin headers
//! - `testSecret` - prove the origin accepts it
//! - `finishSecret` - promote it to current
//!
//! The origin authorizer accepts both the pending and the current value, so
//! edge traffic keeps flowing while the distribution change deploys.
//!
//! # Modules
//!
//! - `cloudfront` - CloudFront adapter for the distribution seam
//! - `config` - Distribution id, header name and test URL
//! - `distribution` - Edge distribution trait, origin header model, mock
//! - `errors` - Phase failures
//! - `probe` - HTTP check against the origin test URL
//! - `rotation` - Event model and phase handlers

pub mod cloudfront;
pub mod config;
pub mod distribution;
pub mod errors;
pub mod probe;
pub mod rotation;
