use std::collections::HashMap;

use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::{ByteStream, DateTime, DateTimeFormat};
use aws_sdk_s3::types::{ObjectCannedAcl, StorageClass};
use aws_sdk_s3::Client;

use crate::common::{ObjectHead, PutObjectRequest};
use crate::error::{Result, StorageError};
use crate::ObjectStore;

/// S3 (or S3-compatible) object store.
pub struct S3Storage {
    client: Client,
}

/// Raw headers end up in smithy's `Headers::insert`, which panics on
/// anything that is not a valid HTTP header.
fn validate_header(name: &str, value: &str) -> Result<()> {
    http::HeaderName::from_bytes(name.as_bytes())
        .map_err(|e| StorageError::InvalidRequest(format!("header name '{}': {}", name, e)))?;

    if !value.is_ascii() {
        return Err(StorageError::InvalidRequest(format!(
            "header '{}' value is not ASCII",
            name
        )));
    }
    http::HeaderValue::from_str(value)
        .map_err(|e| StorageError::InvalidRequest(format!("header '{}' value: {}", name, e)))?;

    Ok(())
}

impl S3Storage {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Build a client from a shared SDK config. A custom endpoint switches
    /// to path-style addressing, which is what MinIO and friends expect.
    pub fn from_sdk_config(sdk_config: &aws_config::SdkConfig, endpoint_url: Option<&str>) -> Self {
        let mut builder = aws_sdk_s3::config::Builder::from(sdk_config);
        if let Some(url) = endpoint_url {
            builder = builder.endpoint_url(url).force_path_style(true);
        }

        Self::new(Client::from_conf(builder.build()))
    }

    pub fn client(&self) -> &Client {
        &self.client
    }
}

#[async_trait::async_trait]
impl ObjectStore for S3Storage {
    async fn head_object(&self, bucket: &str, key: &str) -> Result<ObjectHead> {
        let response = self.client.head_object().bucket(bucket).key(key).send().await;

        match response {
            Ok(output) => Ok(ObjectHead {
                metadata: output
                    .metadata()
                    .map(|m| {
                        m.iter()
                            .map(|(k, v)| (k.to_ascii_lowercase(), v.clone()))
                            .collect()
                    })
                    .unwrap_or_default(),
                content_type: output.content_type().map(str::to_string),
                content_length: output.content_length(),
            }),
            Err(err) => {
                let service_error = err.into_service_error();
                if service_error.is_not_found() {
                    Err(StorageError::NotFound(format!("{}/{}", bucket, key)))
                } else {
                    Err(StorageError::request(
                        "HeadObject",
                        DisplayErrorContext(&service_error),
                    ))
                }
            }
        }
    }

    async fn put_object(&self, request: PutObjectRequest) -> Result<()> {
        let PutObjectRequest {
            bucket,
            key,
            body,
            acl,
            content_type,
            cache_control,
            headers,
            metadata,
        } = request;

        let mut builder = self
            .client
            .put_object()
            .bucket(&bucket)
            .key(&key)
            .body(ByteStream::from(body))
            .acl(ObjectCannedAcl::from(acl.as_str()))
            .content_type(content_type)
            .set_cache_control(cache_control)
            .set_metadata(Some(metadata.into_iter().collect::<HashMap<_, _>>()));

        // Headers with a typed field go through the builder; anything else is
        // sent verbatim on the request.
        let mut passthrough = Vec::new();
        for (name, value) in headers {
            match name.to_ascii_lowercase().as_str() {
                "cache-control" => builder = builder.cache_control(value),
                "content-disposition" => builder = builder.content_disposition(value),
                "content-encoding" => builder = builder.content_encoding(value),
                "content-language" => builder = builder.content_language(value),
                "content-type" => builder = builder.content_type(value),
                "expires" => {
                    let expires = DateTime::from_str(&value, DateTimeFormat::HttpDate).map_err(|e| {
                        StorageError::InvalidRequest(format!("Expires header '{}': {}", value, e))
                    })?;
                    builder = builder.expires(expires);
                }
                "x-amz-storage-class" => {
                    builder = builder.storage_class(StorageClass::from(value.as_str()))
                }
                "x-amz-website-redirect-location" => {
                    builder = builder.website_redirect_location(value)
                }
                _ => {
                    validate_header(&name, &value)?;
                    passthrough.push((name, value));
                }
            }
        }

        let response = if passthrough.is_empty() {
            builder.send().await
        } else {
            builder
                .customize()
                .mutate_request(move |req| {
                    for (name, value) in &passthrough {
                        req.headers_mut().insert(name.clone(), value.clone());
                    }
                })
                .send()
                .await
        };

        response.map_err(|e| StorageError::request("PutObject", DisplayErrorContext(&e)))?;
        log::debug!("Put s3://{}/{}", bucket, key);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_headers() {
        assert!(validate_header("X-Robots-Tag", "noindex").is_ok());
        assert!(validate_header("x-amz-meta-owner", "web team").is_ok());
    }

    #[test]
    fn rejects_invalid_header_name() {
        let err = validate_header("X Bad Header", "v").unwrap_err();
        assert!(matches!(err, StorageError::InvalidRequest(_)));
    }

    #[test]
    fn rejects_invalid_header_value() {
        assert!(validate_header("X-Tag", "caf\u{e9}").is_err());
        assert!(validate_header("X-Tag", "line\nbreak").is_err());
    }
}
