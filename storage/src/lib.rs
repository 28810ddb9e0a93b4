pub mod cdn;
pub mod common;
pub mod error;
pub mod file;
pub mod memory;
pub mod s3;

pub use cdn::*;
pub use common::*;
pub use error::StorageError;
pub use file::*;
pub use memory::*;
pub use s3::*;

/// Remote object store consumed by the deploy engine.
#[async_trait::async_trait]
pub trait ObjectStore: Send + Sync {
    /// Metadata of an existing object; [`StorageError::NotFound`] when absent.
    async fn head_object(&self, bucket: &str, key: &str) -> error::Result<ObjectHead>;

    /// Write body, headers and metadata in one request.
    async fn put_object(&self, request: PutObjectRequest) -> error::Result<()>;
}

/// Downstream CDN cache.
#[async_trait::async_trait]
pub trait CdnInvalidator: Send + Sync {
    /// Ask the CDN to drop cached copies of `paths`. Returns the
    /// invalidation id assigned by the service.
    async fn create_invalidation(
        &self, distribution_id: &str, caller_reference: &str, paths: &[String],
    ) -> error::Result<String>;
}

/// Load the shared AWS configuration (credentials chain, region, retries).
pub async fn load_sdk_config(region: Option<String>) -> aws_config::SdkConfig {
    let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
    if let Some(region) = region {
        loader = loader.region(aws_config::Region::new(region));
    }

    loader.load().await
}
