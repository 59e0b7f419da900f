//! Common utilities and types shared across the gates edge components.

#![warn(clippy::pedantic)]

/// Module for the authorizer request/response payloads
pub mod authorizer;

/// Module for JWT utilities (size limits, header inspection)
pub mod jwt;

/// Module for tracing subscriber setup
pub mod observability;

/// Module for secret types that prevent accidental logging
pub mod secret;

/// Module for the secret vault seam and version staging labels
pub mod vault;

/// Module for the AWS Secrets Manager implementation of the vault seam
pub mod secrets_manager;
