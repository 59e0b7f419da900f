//! Rotation phases against the in-memory vault, the mock distribution and a
//! wiremock origin.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use common::secret::SecretString;
use common::vault::{SecretVault, VaultError, STAGE_CURRENT, STAGE_PENDING, STAGE_PREVIOUS};
use gate_test_utils::{
    version_token, InMemoryVault, TEST_CURRENT_VALUE, TEST_HEADER_NAME, TEST_ORIGIN_ID,
    TEST_PENDING_VALUE, TEST_SECRET_ID, TEST_VERSION_CURRENT, TEST_VERSION_PENDING,
};
use origin_secret_rotation::distribution::mock::MockDistribution;
use origin_secret_rotation::distribution::{
    EdgeDistribution, EdgeError, EdgeOrigin, OriginHeader,
};
use origin_secret_rotation::errors::RotationError;
use origin_secret_rotation::probe::OriginProbe;
use origin_secret_rotation::rotation::{RotationEvent, RotationStep, SecretRotator};
use reqwest::header::HeaderName;
use reqwest::Url;
use std::sync::Arc;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct Harness {
    vault: Arc<InMemoryVault>,
    distribution: Arc<MockDistribution>,
    rotator: SecretRotator,
    token: String,
}

impl Harness {
    fn new(vault: InMemoryVault, distribution: MockDistribution, origin_url: &str) -> Self {
        let vault = Arc::new(vault);
        let distribution = Arc::new(distribution);
        let header_name = HeaderName::from_static(TEST_HEADER_NAME);
        let probe = OriginProbe::new(Url::parse(origin_url).unwrap(), header_name.clone());
        let vault_seam: Arc<dyn SecretVault> = vault.clone();
        let distribution_seam: Arc<dyn EdgeDistribution> = distribution.clone();
        let rotator = SecretRotator::new(vault_seam, distribution_seam, probe, header_name);

        Self {
            vault,
            distribution,
            rotator,
            token: version_token(TEST_VERSION_PENDING),
        }
    }

    async fn run(&self, step: RotationStep) -> Result<(), RotationError> {
        self.rotator
            .handle(&RotationEvent {
                step,
                secret_id: TEST_SECRET_ID.to_string(),
                client_request_token: self.token.clone(),
            })
            .await
    }

    async fn pending_versions(&self) -> usize {
        self.vault
            .value_in_stage(TEST_SECRET_ID, STAGE_PENDING)
            .await
            .into_iter()
            .count()
    }
}

fn current_only_vault() -> InMemoryVault {
    InMemoryVault::new().with_version(
        TEST_SECRET_ID,
        &version_token(TEST_VERSION_CURRENT),
        TEST_CURRENT_VALUE,
        &[STAGE_CURRENT],
    )
}

fn vault_with_pending() -> InMemoryVault {
    current_only_vault().with_version(
        TEST_SECRET_ID,
        &version_token(TEST_VERSION_PENDING),
        TEST_PENDING_VALUE,
        &[STAGE_PENDING],
    )
}

fn deployed_distribution() -> MockDistribution {
    MockDistribution::deployed_with_header(TEST_ORIGIN_ID, TEST_HEADER_NAME, TEST_CURRENT_VALUE)
}

const UNUSED_ORIGIN: &str = "http://127.0.0.1:9/internal/health";

// =============================================================================
// createSecret
// =============================================================================

#[tokio::test]
async fn test_create_secret_stages_generated_value() {
    let harness = Harness::new(current_only_vault(), deployed_distribution(), UNUSED_ORIGIN);

    harness.run(RotationStep::CreateSecret).await.unwrap();

    let pending = harness
        .vault
        .value_of(TEST_SECRET_ID, &harness.token)
        .await
        .expect("pending version should exist");
    assert_eq!(pending.len(), 32);
    assert!(pending.chars().all(|c| c.is_ascii_alphanumeric()));
    assert_eq!(
        harness.vault.stages_of(TEST_SECRET_ID, &harness.token).await,
        vec![STAGE_PENDING.to_string()]
    );
}

#[tokio::test]
async fn test_create_secret_twice_keeps_single_pending_value() {
    let harness = Harness::new(current_only_vault(), deployed_distribution(), UNUSED_ORIGIN);

    harness.run(RotationStep::CreateSecret).await.unwrap();
    let first = harness.vault.value_of(TEST_SECRET_ID, &harness.token).await;

    harness.run(RotationStep::CreateSecret).await.unwrap();
    let second = harness.vault.value_of(TEST_SECRET_ID, &harness.token).await;

    assert_eq!(first, second);
    assert_eq!(harness.vault.put_count(), 1);
    assert_eq!(harness.vault.password_count(), 1);
    assert_eq!(harness.pending_versions().await, 1);
}

#[tokio::test]
async fn test_create_secret_keeps_existing_pending_value() {
    let harness = Harness::new(vault_with_pending(), deployed_distribution(), UNUSED_ORIGIN);

    harness.run(RotationStep::CreateSecret).await.unwrap();

    assert_eq!(
        harness.vault.value_of(TEST_SECRET_ID, &harness.token).await.as_deref(),
        Some(TEST_PENDING_VALUE)
    );
    assert_eq!(harness.vault.mutation_count(), 0);
}

#[tokio::test]
async fn test_create_secret_requires_existing_secret() {
    let harness = Harness::new(InMemoryVault::new(), deployed_distribution(), UNUSED_ORIGIN);

    let result = harness.run(RotationStep::CreateSecret).await;

    assert!(matches!(result, Err(RotationError::Vault(VaultError::NotFound(_)))));
    assert_eq!(harness.vault.put_count(), 0);
}

#[tokio::test]
async fn test_create_secret_propagates_vault_outage_on_pending_lookup() {
    let harness = Harness::new(current_only_vault(), deployed_distribution(), UNUSED_ORIGIN);
    harness
        .vault
        .fail_reads_of_stage(STAGE_PENDING, VaultError::Unavailable("throttled".to_string()))
        .await;

    let result = harness.run(RotationStep::CreateSecret).await;

    assert!(matches!(result, Err(RotationError::Vault(VaultError::Unavailable(_)))));
    assert_eq!(harness.vault.put_count(), 0);
}

// =============================================================================
// setSecret
// =============================================================================

#[tokio::test]
async fn test_set_secret_writes_pending_value_to_origin_headers() {
    let harness = Harness::new(vault_with_pending(), deployed_distribution(), UNUSED_ORIGIN);

    harness.run(RotationStep::SetSecret).await.unwrap();

    assert_eq!(
        harness.distribution.header_values(TEST_HEADER_NAME).await,
        vec![TEST_PENDING_VALUE.to_string()]
    );
    assert_eq!(harness.distribution.update_count(), 1);
}

#[tokio::test]
async fn test_set_secret_fails_when_not_deployed() {
    let harness = Harness::new(vault_with_pending(), deployed_distribution(), UNUSED_ORIGIN);
    harness.distribution.set_status("InProgress").await;

    let result = harness.run(RotationStep::SetSecret).await;

    assert!(matches!(result, Err(RotationError::DistributionNotDeployed(s)) if s == "InProgress"));
    assert_eq!(harness.distribution.update_count(), 0);
    assert_eq!(
        harness.distribution.header_values(TEST_HEADER_NAME).await,
        vec![TEST_CURRENT_VALUE.to_string()]
    );
}

#[tokio::test]
async fn test_set_secret_retry_does_not_redeploy() {
    let harness = Harness::new(vault_with_pending(), deployed_distribution(), UNUSED_ORIGIN);

    harness.run(RotationStep::SetSecret).await.unwrap();
    harness.run(RotationStep::SetSecret).await.unwrap();

    assert_eq!(harness.distribution.update_count(), 1);
}

#[tokio::test]
async fn test_set_secret_without_pending_value_fails() {
    let harness = Harness::new(current_only_vault(), deployed_distribution(), UNUSED_ORIGIN);

    let result = harness.run(RotationStep::SetSecret).await;

    assert!(matches!(result, Err(RotationError::PendingSecretMissing(_))));
    assert_eq!(harness.distribution.update_count(), 0);
}

#[tokio::test]
async fn test_set_secret_without_matching_header_fails() {
    let distribution = MockDistribution::with_origins(vec![EdgeOrigin {
        id: TEST_ORIGIN_ID.to_string(),
        custom_headers: vec![OriginHeader {
            name: "x-something-else".to_string(),
            value: SecretString::from("value"),
        }],
    }]);
    let harness = Harness::new(vault_with_pending(), distribution, UNUSED_ORIGIN);

    let result = harness.run(RotationStep::SetSecret).await;

    assert!(matches!(result, Err(RotationError::OriginHeaderNotFound(_))));
    assert_eq!(harness.distribution.update_count(), 0);
}

#[tokio::test]
async fn test_set_secret_updates_every_origin_with_header() {
    let origin = |id: &str| EdgeOrigin {
        id: id.to_string(),
        custom_headers: vec![OriginHeader {
            name: "X-Verify-Origin".to_string(),
            value: SecretString::from(TEST_CURRENT_VALUE),
        }],
    };
    let distribution = MockDistribution::with_origins(vec![origin("api"), origin("internal-api")]);
    let harness = Harness::new(vault_with_pending(), distribution, UNUSED_ORIGIN);

    harness.run(RotationStep::SetSecret).await.unwrap();

    assert_eq!(
        harness.distribution.header_values(TEST_HEADER_NAME).await,
        vec![TEST_PENDING_VALUE.to_string(), TEST_PENDING_VALUE.to_string()]
    );
}

#[tokio::test]
async fn test_set_secret_propagates_edge_conflict() {
    let distribution =
        deployed_distribution().failing_updates(EdgeError::Conflict("etag".to_string()));
    let harness = Harness::new(vault_with_pending(), distribution, UNUSED_ORIGIN);

    let result = harness.run(RotationStep::SetSecret).await;

    assert!(matches!(result, Err(RotationError::Edge(EdgeError::Conflict(_)))));
}

// =============================================================================
// testSecret
// =============================================================================

#[tokio::test]
async fn test_test_secret_succeeds_when_origin_accepts_pending() {
    let origin = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/internal/health"))
        .and(header(TEST_HEADER_NAME, TEST_PENDING_VALUE))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&origin)
        .await;
    let url = format!("{}/internal/health", origin.uri());
    let harness = Harness::new(vault_with_pending(), deployed_distribution(), &url);

    harness.run(RotationStep::TestSecret).await.unwrap();
}

#[tokio::test]
async fn test_test_secret_fails_when_origin_rejects() {
    let origin = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&origin)
        .await;
    let url = format!("{}/internal/health", origin.uri());
    let harness = Harness::new(vault_with_pending(), deployed_distribution(), &url);

    let result = harness.run(RotationStep::TestSecret).await;

    assert!(matches!(result, Err(RotationError::Probe(_))));
}

#[tokio::test]
async fn test_test_secret_without_pending_value_fails_before_request() {
    let origin = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&origin)
        .await;
    let url = format!("{}/internal/health", origin.uri());
    let harness = Harness::new(current_only_vault(), deployed_distribution(), &url);

    let result = harness.run(RotationStep::TestSecret).await;

    assert!(matches!(result, Err(RotationError::PendingSecretMissing(_))));
}

// =============================================================================
// finishSecret
// =============================================================================

#[tokio::test]
async fn test_finish_secret_promotes_pending_version() {
    let harness = Harness::new(vault_with_pending(), deployed_distribution(), UNUSED_ORIGIN);

    harness.run(RotationStep::FinishSecret).await.unwrap();

    assert_eq!(
        harness.vault.stages_of(TEST_SECRET_ID, &harness.token).await,
        vec![STAGE_CURRENT.to_string()]
    );
    assert_eq!(
        harness
            .vault
            .stages_of(TEST_SECRET_ID, &version_token(TEST_VERSION_CURRENT))
            .await,
        vec![STAGE_PREVIOUS.to_string()]
    );
    assert_eq!(harness.pending_versions().await, 0);
}

#[tokio::test]
async fn test_finish_secret_when_already_current_makes_no_mutation() {
    let vault = InMemoryVault::new()
        .with_version(
            TEST_SECRET_ID,
            &version_token(TEST_VERSION_CURRENT),
            TEST_CURRENT_VALUE,
            &[STAGE_PREVIOUS],
        )
        .with_version(
            TEST_SECRET_ID,
            &version_token(TEST_VERSION_PENDING),
            TEST_PENDING_VALUE,
            &[STAGE_CURRENT],
        );
    let harness = Harness::new(vault, deployed_distribution(), UNUSED_ORIGIN);

    harness.run(RotationStep::FinishSecret).await.unwrap();

    assert_eq!(harness.vault.mutation_count(), 0);
}

#[tokio::test]
async fn test_finish_secret_rerun_is_noop() {
    let harness = Harness::new(vault_with_pending(), deployed_distribution(), UNUSED_ORIGIN);

    harness.run(RotationStep::FinishSecret).await.unwrap();
    let after_first = harness.vault.mutation_count();

    harness.run(RotationStep::FinishSecret).await.unwrap();

    assert_eq!(harness.vault.mutation_count(), after_first);
}

#[tokio::test]
async fn test_finish_secret_propagates_describe_failure() {
    let harness = Harness::new(vault_with_pending(), deployed_distribution(), UNUSED_ORIGIN);
    harness
        .vault
        .fail_describe(VaultError::Unavailable("throttled".to_string()))
        .await;

    let result = harness.run(RotationStep::FinishSecret).await;

    assert!(matches!(result, Err(RotationError::Vault(_))));
    assert_eq!(harness.vault.mutation_count(), 0);
}

#[tokio::test]
async fn test_finish_secret_without_current_version_fails() {
    let vault = InMemoryVault::new().with_version(
        TEST_SECRET_ID,
        &version_token(TEST_VERSION_PENDING),
        TEST_PENDING_VALUE,
        &[STAGE_PENDING],
    );
    let harness = Harness::new(vault, deployed_distribution(), UNUSED_ORIGIN);

    let result = harness.run(RotationStep::FinishSecret).await;

    assert!(matches!(result, Err(RotationError::CurrentVersionMissing(id)) if id == TEST_SECRET_ID));
    assert_eq!(harness.vault.mutation_count(), 0);
}

// =============================================================================
// Full rotation
// =============================================================================

#[tokio::test]
async fn test_full_rotation_promotes_generated_secret() {
    let origin = MockServer::start().await;
    let harness_url = format!("{}/internal/health", origin.uri());
    let harness = Harness::new(current_only_vault(), deployed_distribution(), &harness_url);

    harness.run(RotationStep::CreateSecret).await.unwrap();
    let generated = harness
        .vault
        .value_of(TEST_SECRET_ID, &harness.token)
        .await
        .expect("createSecret should stage a value");

    harness.run(RotationStep::SetSecret).await.unwrap();
    assert_eq!(
        harness.distribution.header_values(TEST_HEADER_NAME).await,
        vec![generated.clone()]
    );

    Mock::given(method("GET"))
        .and(path("/internal/health"))
        .and(header(TEST_HEADER_NAME, generated.as_str()))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&origin)
        .await;
    harness.run(RotationStep::TestSecret).await.unwrap();

    harness.run(RotationStep::FinishSecret).await.unwrap();

    let current = harness
        .vault
        .value_in_stage(TEST_SECRET_ID, STAGE_CURRENT)
        .await
        .expect("a current version must exist");
    assert_eq!(current, generated);
    assert_ne!(current, TEST_CURRENT_VALUE);
    assert_eq!(harness.pending_versions().await, 0);

    let versions = harness.vault.version_stages(TEST_SECRET_ID).await.unwrap();
    let current_count = versions
        .values()
        .filter(|stages| stages.iter().any(|s| s == STAGE_CURRENT))
        .count();
    assert_eq!(current_count, 1);
}
