use aws_sdk_cloudfront::error::DisplayErrorContext;
use aws_sdk_cloudfront::types::{InvalidationBatch, Paths};
use aws_sdk_cloudfront::Client;

use crate::error::{Result, StorageError};
use crate::CdnInvalidator;

/// CloudFront cache invalidation.
pub struct CloudFrontInvalidator {
    client: Client,
}

impl CloudFrontInvalidator {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn from_sdk_config(sdk_config: &aws_config::SdkConfig) -> Self {
        Self::new(Client::new(sdk_config))
    }
}

#[async_trait::async_trait]
impl CdnInvalidator for CloudFrontInvalidator {
    async fn create_invalidation(
        &self, distribution_id: &str, caller_reference: &str, paths: &[String],
    ) -> Result<String> {
        let paths = Paths::builder()
            .quantity(paths.len() as i32)
            .set_items(Some(paths.to_vec()))
            .build()
            .map_err(|e| StorageError::InvalidRequest(e.to_string()))?;

        let batch = InvalidationBatch::builder()
            .paths(paths)
            .caller_reference(caller_reference)
            .build()
            .map_err(|e| StorageError::InvalidRequest(e.to_string()))?;

        let output = self
            .client
            .create_invalidation()
            .distribution_id(distribution_id)
            .invalidation_batch(batch)
            .send()
            .await
            .map_err(|e| StorageError::request("CreateInvalidation", DisplayErrorContext(&e)))?;

        Ok(output
            .invalidation()
            .map(|i| i.id().to_string())
            .unwrap_or_else(|| caller_reference.to_string()))
    }
}
