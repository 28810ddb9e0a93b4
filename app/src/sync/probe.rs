use storage::{BucketTarget, ObjectStore};

use super::error::{DeployError, Result};

/// User metadata key holding the content digest of an uploaded object.
/// Lowercase, since S3 returns metadata keys lowercased.
pub const DIGEST_METADATA_KEY: &str = "deploy-digest";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeOutcome {
    UploadRequired,
    UploadNotRequired,
}

/// Decide whether `key` must be uploaded by comparing the remote digest
/// metadata against `digest`. A missing object means upload; any other
/// remote failure is a probe error.
pub async fn probe(
    store: &dyn ObjectStore, target: &BucketTarget, key: &str, digest: &str,
) -> Result<ProbeOutcome> {
    match store.head_object(&target.bucket, key).await {
        Ok(head) => {
            let remote = head.metadata.get(DIGEST_METADATA_KEY).map(String::as_str);
            if remote == Some(digest) {
                Ok(ProbeOutcome::UploadNotRequired)
            } else {
                log::debug!(
                    "Digest mismatch for {}: remote {:?}, local {}",
                    key,
                    remote,
                    digest
                );
                Ok(ProbeOutcome::UploadRequired)
            }
        }
        Err(err) if err.is_not_found() => Ok(ProbeOutcome::UploadRequired),
        Err(err) => Err(DeployError::Probe {
            key: key.to_string(),
            source: err,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use storage::{MemoryStorage, StoredObject};

    fn stored(digest: Option<&str>) -> StoredObject {
        let mut metadata = BTreeMap::new();
        if let Some(digest) = digest {
            metadata.insert(DIGEST_METADATA_KEY.to_string(), digest.to_string());
        }
        StoredObject {
            metadata,
            ..Default::default()
        }
    }

    fn target() -> BucketTarget {
        BucketTarget::parse("site").unwrap()
    }

    #[tokio::test]
    async fn missing_object_requires_upload() {
        let store = MemoryStorage::new();
        let outcome = probe(&store, &target(), "a.txt", "abc").await.unwrap();
        assert_eq!(outcome, ProbeOutcome::UploadRequired);
    }

    #[tokio::test]
    async fn matching_digest_skips() {
        let store = MemoryStorage::new();
        store.insert_object("site", "a.txt", stored(Some("abc")));

        let outcome = probe(&store, &target(), "a.txt", "abc").await.unwrap();
        assert_eq!(outcome, ProbeOutcome::UploadNotRequired);
    }

    #[tokio::test]
    async fn stale_or_missing_digest_requires_upload() {
        let store = MemoryStorage::new();
        store.insert_object("site", "a.txt", stored(Some("old")));
        store.insert_object("site", "b.txt", stored(None));

        assert_eq!(
            probe(&store, &target(), "a.txt", "new").await.unwrap(),
            ProbeOutcome::UploadRequired
        );
        assert_eq!(
            probe(&store, &target(), "b.txt", "new").await.unwrap(),
            ProbeOutcome::UploadRequired
        );
    }

    #[tokio::test]
    async fn other_errors_fail_the_probe() {
        let store = MemoryStorage::new();
        store.fail_head("a.txt");

        let err = probe(&store, &target(), "a.txt", "abc").await.unwrap_err();
        assert!(matches!(err, DeployError::Probe { ref key, .. } if key == "a.txt"));
    }
}
