//! Fixed test IDs for deterministic tests

use uuid::Uuid;

// Identity token values
pub const TEST_ISSUER: &str = "https://token.actions.githubusercontent.com";
pub const TEST_AUDIENCE: &str = "consid-germany/gates";
pub const TEST_REPOSITORY: &str = "consid-germany/gates";
pub const TEST_SUBJECT: &str = "repo:consid-germany/gates:ref:refs/heads/main";

// Signing Key IDs
pub const TEST_KEY_ID_1: &str = "test-key-2025-01";
pub const TEST_KEY_ID_2: &str = "test-key-2025-02";

// Secrets
pub const TEST_SECRET_ID: &str = "arn:aws:secretsmanager:eu-central-1:123456789012:secret:gates-origin-verify";
pub const TEST_HEADER_NAME: &str = "x-verify-origin";
pub const TEST_CURRENT_VALUE: &str = "current-origin-secret-value";
pub const TEST_PENDING_VALUE: &str = "pending-origin-secret-value";

// Version IDs (1-99)
pub const TEST_VERSION_CURRENT: Uuid = Uuid::from_u128(1);
pub const TEST_VERSION_PENDING: Uuid = Uuid::from_u128(2);
pub const TEST_VERSION_PREVIOUS: Uuid = Uuid::from_u128(3);

/// Client request token for a version ID constant.
pub fn version_token(id: Uuid) -> String {
    id.hyphenated().to_string()
}

// Distribution
pub const TEST_DISTRIBUTION_ID: &str = "E2TESTDISTRIB";
pub const TEST_ORIGIN_ID: &str = "gates-api-origin";
