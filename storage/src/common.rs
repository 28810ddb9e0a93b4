use std::collections::BTreeMap;
use std::fmt;

use crate::error::{Result, StorageError};

/// Destination of a deploy: bucket name plus an optional key prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketTarget {
    pub bucket: String,
    pub prefix: Option<String>,
}

impl BucketTarget {
    /// Parse `name` or `name/prefix[/more]`. Empty segments are dropped, so
    /// `site//www/` targets bucket `site` under prefix `www`.
    pub fn parse(identifier: &str) -> Result<Self> {
        let mut segments = identifier.split('/').filter(|s| !s.trim().is_empty());

        let bucket = segments
            .next()
            .map(|s| s.trim().to_string())
            .ok_or_else(|| {
                StorageError::InvalidRequest(format!("Invalid bucket identifier: '{}'", identifier))
            })?;

        let prefix: Vec<&str> = segments.collect();
        let prefix = if prefix.is_empty() {
            None
        } else {
            Some(prefix.join("/"))
        };

        Ok(Self { bucket, prefix })
    }

    /// Remote key for a file, always `/` separated.
    pub fn key_for<S: AsRef<str>>(&self, relative_path: &[S]) -> String {
        let relative = relative_path
            .iter()
            .map(|s| s.as_ref())
            .collect::<Vec<_>>()
            .join("/");

        match &self.prefix {
            Some(prefix) => format!("{}/{}", prefix, relative),
            None => relative,
        }
    }
}

impl fmt::Display for BucketTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.prefix {
            Some(prefix) => write!(f, "{}/{}", self.bucket, prefix),
            None => write!(f, "{}", self.bucket),
        }
    }
}

/// What a head request tells us about a remote object.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectHead {
    /// User metadata, keys lowercased the way S3 returns them.
    pub metadata: BTreeMap<String, String>,
    pub content_type: Option<String>,
    pub content_length: Option<i64>,
}

/// A single atomic object write.
#[derive(Debug, Clone, Default)]
pub struct PutObjectRequest {
    pub bucket: String,
    pub key: String,
    pub body: Vec<u8>,
    pub acl: String,
    pub content_type: String,
    pub cache_control: Option<String>,
    /// Transport headers, e.g. `Content-Encoding`.
    pub headers: BTreeMap<String, String>,
    /// User metadata stored alongside the object.
    pub metadata: BTreeMap<String, String>,
}
