//! Origin authorizer function.

use common::authorizer::{AuthorizerRequest, AuthorizerResponse};
use common::observability::init_tracing;
use common::secrets_manager::SecretsManagerVault;
use lambda_runtime::{service_fn, Error, LambdaEvent};
use origin_authorizer::config::Config;
use origin_authorizer::handler::OriginHeaderAuthorizer;
use origin_authorizer::secret_store::OriginSecretStore;
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_tracing("origin_authorizer=info,common=info");

    let config = Config::from_env().map_err(|e| {
        error!(target: "origin_authorizer.config", "Failed to load configuration: {}", e);
        e
    })?;

    info!(
        target: "origin_authorizer.config",
        secret_id = %config.secret_id,
        header_name = %config.header_name,
        "Configuration loaded successfully"
    );

    let vault = Arc::new(SecretsManagerVault::from_env().await);
    let store = OriginSecretStore::new(vault, config.secret_id.clone());
    let authorizer = Arc::new(OriginHeaderAuthorizer::new(store, config.header_name));

    lambda_runtime::run(service_fn(move |event: LambdaEvent<AuthorizerRequest>| {
        let authorizer = Arc::clone(&authorizer);
        async move { Ok::<AuthorizerResponse, Error>(authorizer.authorize(&event.payload).await) }
    }))
    .await
}
