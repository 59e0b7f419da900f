//! Origin verification authorizer.
//!
//! Guards the internal gates API: only requests that carry the shared secret
//! injected by the edge distribution are let through. The secret is read
//! from the vault on every request, in both its pending and current stage,
//! so a rotation never locks out edge traffic.

pub mod config;
pub mod handler;
pub mod secret_store;
