//! Origin secret rotation function.

use common::observability::init_tracing;
use common::secrets_manager::SecretsManagerVault;
use lambda_runtime::{service_fn, Error, LambdaEvent};
use origin_secret_rotation::cloudfront::CloudFrontDistribution;
use origin_secret_rotation::config::Config;
use origin_secret_rotation::probe::OriginProbe;
use origin_secret_rotation::rotation::{RotationEvent, SecretRotator};
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_tracing("origin_secret_rotation=info,rotation=info,common=info");

    let config = Config::from_env().map_err(|e| {
        error!(target: "rotation.config", "Failed to load configuration: {}", e);
        e
    })?;

    info!(
        target: "rotation.config",
        distribution_id = %config.distribution_id,
        header_name = %config.header_name,
        origin_test_url = %config.origin_test_url,
        "Configuration loaded successfully"
    );

    let vault = Arc::new(SecretsManagerVault::from_env().await);
    let distribution = Arc::new(CloudFrontDistribution::from_env(config.distribution_id.clone()).await);
    let probe = OriginProbe::new(config.origin_test_url.clone(), config.header_name.clone());
    let rotator = Arc::new(SecretRotator::new(vault, distribution, probe, config.header_name));

    lambda_runtime::run(service_fn(move |event: LambdaEvent<RotationEvent>| {
        let rotator = Arc::clone(&rotator);
        async move {
            rotator.handle(&event.payload).await?;
            Ok::<(), Error>(())
        }
    }))
    .await
}
