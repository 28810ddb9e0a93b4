//! In-process backends. They behave like the remote services as far as the
//! deploy engine can tell, and let callers inject failures and latency.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::common::{ObjectHead, PutObjectRequest};
use crate::error::{Result, StorageError};
use crate::{CdnInvalidator, ObjectStore};

/// An object as the memory store keeps it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoredObject {
    pub body: Vec<u8>,
    pub acl: String,
    pub content_type: String,
    pub cache_control: Option<String>,
    pub headers: BTreeMap<String, String>,
    pub metadata: BTreeMap<String, String>,
}

#[derive(Default)]
struct MemoryState {
    objects: HashMap<(String, String), StoredObject>,
    failing_heads: HashSet<String>,
    failing_puts: HashSet<String>,
    put_log: Vec<String>,
}

#[derive(Default)]
pub struct MemoryStorage {
    state: Mutex<MemoryState>,
    latency: Option<Duration>,
    head_calls: AtomicUsize,
    put_calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every request, so concurrent requests actually overlap.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn insert_object(&self, bucket: &str, key: &str, object: StoredObject) {
        self.lock()
            .objects
            .insert((bucket.to_string(), key.to_string()), object);
    }

    pub fn object(&self, bucket: &str, key: &str) -> Option<StoredObject> {
        self.lock()
            .objects
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
    }

    pub fn object_count(&self) -> usize {
        self.lock().objects.len()
    }

    /// Make head requests for `key` fail with a non not-found error.
    pub fn fail_head(&self, key: &str) {
        self.lock().failing_heads.insert(key.to_string());
    }

    /// Make put requests for `key` fail.
    pub fn fail_put(&self, key: &str) {
        self.lock().failing_puts.insert(key.to_string());
    }

    /// Keys of successful puts, in completion order.
    pub fn put_keys(&self) -> Vec<String> {
        self.lock().put_log.clone()
    }

    pub fn head_calls(&self) -> usize {
        self.head_calls.load(Ordering::SeqCst)
    }

    pub fn put_calls(&self) -> usize {
        self.put_calls.load(Ordering::SeqCst)
    }

    /// Highest number of requests ever outstanding at once.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    async fn enter(&self) {
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }

    fn leave(&self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait::async_trait]
impl ObjectStore for MemoryStorage {
    async fn head_object(&self, bucket: &str, key: &str) -> Result<ObjectHead> {
        self.head_calls.fetch_add(1, Ordering::SeqCst);
        self.enter().await;

        let result = {
            let state = self.lock();
            if state.failing_heads.contains(key) {
                Err(StorageError::request("HeadObject", format!("access denied: {}", key)))
            } else {
                match state.objects.get(&(bucket.to_string(), key.to_string())) {
                    Some(object) => Ok(ObjectHead {
                        metadata: object.metadata.clone(),
                        content_type: Some(object.content_type.clone()),
                        content_length: Some(object.body.len() as i64),
                    }),
                    None => Err(StorageError::NotFound(format!("{}/{}", bucket, key))),
                }
            }
        };

        self.leave();
        result
    }

    async fn put_object(&self, request: PutObjectRequest) -> Result<()> {
        self.put_calls.fetch_add(1, Ordering::SeqCst);
        self.enter().await;

        let result = {
            let mut state = self.lock();
            if state.failing_puts.contains(&request.key) {
                Err(StorageError::request(
                    "PutObject",
                    format!("service unavailable: {}", request.key),
                ))
            } else {
                let object = StoredObject {
                    body: request.body,
                    acl: request.acl,
                    content_type: request.content_type,
                    cache_control: request.cache_control,
                    headers: request.headers,
                    metadata: request
                        .metadata
                        .into_iter()
                        .map(|(k, v)| (k.to_ascii_lowercase(), v))
                        .collect(),
                };
                state.put_log.push(request.key.clone());
                state.objects.insert((request.bucket, request.key), object);
                Ok(())
            }
        };

        self.leave();
        result
    }
}

/// A recorded `create_invalidation` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidationRecord {
    pub distribution_id: String,
    pub caller_reference: String,
    pub paths: Vec<String>,
}

#[derive(Default)]
pub struct MemoryInvalidator {
    records: Mutex<Vec<InvalidationRecord>>,
    fail: bool,
}

impl MemoryInvalidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// An invalidator whose every request fails.
    pub fn failing() -> Self {
        Self {
            records: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn records(&self) -> Vec<InvalidationRecord> {
        self.records
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

#[async_trait::async_trait]
impl CdnInvalidator for MemoryInvalidator {
    async fn create_invalidation(
        &self, distribution_id: &str, caller_reference: &str, paths: &[String],
    ) -> Result<String> {
        if self.fail {
            return Err(StorageError::request(
                "CreateInvalidation",
                format!("distribution {} rejected the request", distribution_id),
            ));
        }

        let mut records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        records.push(InvalidationRecord {
            distribution_id: distribution_id.to_string(),
            caller_reference: caller_reference.to_string(),
            paths: paths.to_vec(),
        });

        Ok(format!("I{}", records.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn head_after_put_returns_metadata() {
        let store = MemoryStorage::new();
        let mut metadata = BTreeMap::new();
        metadata.insert("Deploy-Digest".to_string(), "abc".to_string());

        store
            .put_object(PutObjectRequest {
                bucket: "site".into(),
                key: "index.html".into(),
                body: b"hi".to_vec(),
                acl: "public-read".into(),
                content_type: "text/html".into(),
                metadata,
                ..Default::default()
            })
            .await
            .unwrap();

        let head = store.head_object("site", "index.html").await.unwrap();
        assert_eq!(head.metadata.get("deploy-digest").map(String::as_str), Some("abc"));
        assert_eq!(head.content_length, Some(2));
        assert_eq!(store.put_keys(), vec!["index.html".to_string()]);
    }

    #[tokio::test]
    async fn missing_object_is_not_found() {
        let store = MemoryStorage::new();
        let err = store.head_object("site", "nope").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn injected_failures() {
        let store = MemoryStorage::new();
        store.fail_head("a");
        store.fail_put("b");

        let err = store.head_object("site", "a").await.unwrap_err();
        assert!(!err.is_not_found());

        let put = PutObjectRequest {
            bucket: "site".into(),
            key: "b".into(),
            ..Default::default()
        };
        assert!(store.put_object(put).await.is_err());
        assert_eq!(store.object_count(), 0);
    }

    #[tokio::test]
    async fn invalidator_records_calls() {
        let cdn = MemoryInvalidator::new();
        let id = cdn
            .create_invalidation("E1", "ref-1", &["/*".to_string()])
            .await
            .unwrap();
        assert_eq!(id, "I1");
        assert_eq!(cdn.records()[0].paths, vec!["/*".to_string()]);

        let failing = MemoryInvalidator::failing();
        assert!(failing
            .create_invalidation("E1", "ref-2", &["/*".to_string()])
            .await
            .is_err());
        assert!(failing.records().is_empty());
    }
}
