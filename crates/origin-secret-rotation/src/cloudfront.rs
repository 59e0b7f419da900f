//! CloudFront implementation of [`EdgeDistribution`].
//!
//! CloudFront only accepts a complete `DistributionConfig` on update, so
//! `update_origin_config` re-reads the full configuration, checks that its
//! ETag still matches the one the caller read, copies the header values in
//! by origin id and header name, and sends it back with `If-Match`.

use crate::distribution::{
    EdgeDistribution, EdgeError, EdgeOrigin, EdgeOriginConfig, OriginHeader,
};
use async_trait::async_trait;
use aws_sdk_cloudfront::error::{DisplayErrorContext, SdkError};
use aws_sdk_cloudfront::operation::update_distribution::UpdateDistributionError;
use aws_sdk_cloudfront::types::DistributionConfig;
use aws_sdk_cloudfront::Client;
use common::secret::{ExposeSecret, SecretString};
use tracing::instrument;

/// Edge distribution backed by a CloudFront distribution.
#[derive(Debug, Clone)]
pub struct CloudFrontDistribution {
    client: Client,
    distribution_id: String,
}

impl CloudFrontDistribution {
    pub fn new(client: Client, distribution_id: String) -> Self {
        Self {
            client,
            distribution_id,
        }
    }

    /// Build a client from the ambient AWS configuration.
    pub async fn from_env(distribution_id: String) -> Self {
        let config = aws_config::load_from_env().await;
        Self::new(Client::new(&config), distribution_id)
    }

    async fn full_config(&self) -> Result<(DistributionConfig, String), EdgeError> {
        let output = self
            .client
            .get_distribution_config()
            .id(&self.distribution_id)
            .send()
            .await
            .map_err(|e| unavailable("GetDistributionConfig", &e))?;

        let etag = output
            .e_tag()
            .map(str::to_string)
            .ok_or_else(|| EdgeError::InvalidConfig("distribution config has no ETag".to_string()))?;

        let config = output.distribution_config.ok_or_else(|| {
            EdgeError::InvalidConfig("distribution has no configuration".to_string())
        })?;

        Ok((config, etag))
    }
}

fn unavailable<E>(operation: &str, err: &SdkError<E>) -> EdgeError
where
    E: std::error::Error + Send + Sync + 'static,
{
    let message = format!("{operation}: {}", DisplayErrorContext(err));
    tracing::debug!(target: "rotation.cloudfront", operation, error = %message, "CloudFront call failed");
    EdgeError::Unavailable(message)
}

fn to_edge_origins(config: &DistributionConfig) -> Vec<EdgeOrigin> {
    config
        .origins
        .as_ref()
        .map(|origins| {
            origins
                .items
                .iter()
                .map(|origin| EdgeOrigin {
                    id: origin.id.clone(),
                    custom_headers: origin
                        .custom_headers
                        .as_ref()
                        .and_then(|headers| headers.items.as_ref())
                        .map(|items| {
                            items
                                .iter()
                                .map(|header| OriginHeader {
                                    name: header.header_name.clone(),
                                    value: SecretString::from(header.header_value.clone()),
                                })
                                .collect()
                        })
                        .unwrap_or_default(),
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Copy header values from `edge` into the full CloudFront configuration.
fn merge_header_values(config: &mut DistributionConfig, edge: &EdgeOriginConfig) {
    let Some(origins) = config.origins.as_mut() else {
        return;
    };

    for origin in &mut origins.items {
        let Some(edge_origin) = edge.origins.iter().find(|o| o.id == origin.id) else {
            continue;
        };
        let Some(items) = origin
            .custom_headers
            .as_mut()
            .and_then(|headers| headers.items.as_mut())
        else {
            continue;
        };

        for header in items.iter_mut() {
            if let Some(edge_header) = edge_origin
                .custom_headers
                .iter()
                .find(|h| h.name == header.header_name)
            {
                header.header_value = edge_header.value.expose_secret().to_string();
            }
        }
    }
}

#[async_trait]
impl EdgeDistribution for CloudFrontDistribution {
    #[instrument(skip(self), fields(distribution_id = %self.distribution_id))]
    async fn status(&self) -> Result<String, EdgeError> {
        let output = self
            .client
            .get_distribution()
            .id(&self.distribution_id)
            .send()
            .await
            .map_err(|e| unavailable("GetDistribution", &e))?;

        output
            .distribution()
            .map(|distribution| distribution.status().to_string())
            .ok_or_else(|| EdgeError::InvalidConfig("distribution not returned".to_string()))
    }

    #[instrument(skip(self), fields(distribution_id = %self.distribution_id))]
    async fn origin_config(&self) -> Result<EdgeOriginConfig, EdgeError> {
        let (config, etag) = self.full_config().await?;
        Ok(EdgeOriginConfig {
            etag,
            origins: to_edge_origins(&config),
        })
    }

    #[instrument(skip(self, config), fields(distribution_id = %self.distribution_id))]
    async fn update_origin_config(&self, config: &EdgeOriginConfig) -> Result<(), EdgeError> {
        let (mut full, etag) = self.full_config().await?;
        if etag != config.etag {
            return Err(EdgeError::Conflict(format!(
                "distribution {} changed since it was read",
                self.distribution_id
            )));
        }

        merge_header_values(&mut full, config);

        self.client
            .update_distribution()
            .id(&self.distribution_id)
            .if_match(etag)
            .distribution_config(full)
            .send()
            .await
            .map_err(|e| match e.as_service_error() {
                Some(UpdateDistributionError::PreconditionFailed(_))
                | Some(UpdateDistributionError::InvalidIfMatchVersion(_)) => EdgeError::Conflict(
                    format!("UpdateDistribution: {}", DisplayErrorContext(&e)),
                ),
                _ => unavailable("UpdateDistribution", &e),
            })?;

        tracing::info!(target: "rotation.cloudfront", "Distribution origin headers updated");
        Ok(())
    }
}
