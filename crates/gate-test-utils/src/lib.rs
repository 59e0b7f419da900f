//! # Gate Test Utilities
//!
//! Shared test utilities for the gates edge components.
//!
//! This crate provides:
//! - Fixed RSA keypairs, JWKS documents and token signing
//! - Test data builders (TestTokenBuilder)
//! - An in-memory secret vault with staging label semantics
//! - Fixed test IDs and values
//!
//! ## Usage
//!
//! ```rust,ignore
//! use gate_test_utils::*;
//!
//! #[tokio::test]
//! async fn test_example() {
//!     let token = TestTokenBuilder::new()
//!         .for_subject("repo:org/gates:ref:refs/heads/main")
//!         .sign()?;
//!
//!     let vault = InMemoryVault::new()
//!         .with_version(TEST_SECRET_ID, "v1", TEST_CURRENT_VALUE, &[STAGE_CURRENT]);
//! }
//! ```

pub mod crypto_fixtures;
pub mod in_memory_vault;
pub mod test_ids;
pub mod token_builders;

// Re-export commonly used items
pub use crypto_fixtures::*;
pub use in_memory_vault::*;
pub use test_ids::*;
pub use token_builders::*;
