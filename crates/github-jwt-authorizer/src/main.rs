//! GitHub JWT authorizer function.

use common::authorizer::{AuthorizerRequest, AuthorizerResponse};
use common::observability::init_tracing;
use github_jwt_authorizer::config::Config;
use github_jwt_authorizer::handler::GitHubJwtAuthorizer;
use lambda_runtime::{service_fn, Error, LambdaEvent};
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_tracing("github_jwt_authorizer=info,jwt_authorizer=info");

    let config = Config::from_env().map_err(|e| {
        error!(target: "jwt_authorizer.config", "Failed to load configuration: {}", e);
        e
    })?;

    info!(
        target: "jwt_authorizer.config",
        issuer = %config.issuer,
        audience = %config.audience,
        allowed_patterns = config.allowed_subjects.len(),
        jwt_clock_skew_seconds = config.clock_skew_seconds,
        "Configuration loaded successfully"
    );

    let authorizer = Arc::new(GitHubJwtAuthorizer::new(&config));

    lambda_runtime::run(service_fn(move |event: LambdaEvent<AuthorizerRequest>| {
        let authorizer = Arc::clone(&authorizer);
        async move { Ok::<AuthorizerResponse, Error>(authorizer.authorize(&event.payload).await) }
    }))
    .await
}
