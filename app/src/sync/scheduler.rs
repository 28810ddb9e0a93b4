//! Bounded-concurrency probe + upload of a file set.
//!
//! A fixed pool of worker tasks pulls files from a shared FIFO queue, so
//! files are admitted in input order and never more than `concurrency` are
//! in flight. Outcomes flow back over a channel to a single collector loop,
//! which is the only place the run counters change and progress is emitted.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use storage::{BucketTarget, ObjectStore, PutObjectRequest};
use tokio::sync::{mpsc, Mutex};

use super::config::DeployConfig;
use super::error::{DeployError, Result};
use super::probe::{probe, ProbeOutcome, DIGEST_METADATA_KEY};
use super::status::{FileAction, RunStatus, SyncEvent};
use crate::consumer::ConsumerManager;
use crate::scan::FileDescriptor;

/// Result of syncing one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileOutcome {
    pub action: FileAction,
    pub path: String,
}

/// Shared, read-only state of the workers.
struct UploadContext {
    store: Arc<dyn ObjectStore>,
    target: BucketTarget,
    acl: String,
    cache_control: Option<String>,
}

pub struct UploadScheduler {
    context: Arc<UploadContext>,
    concurrency: usize,
}

type Queue = Arc<Mutex<mpsc::UnboundedReceiver<FileDescriptor>>>;

impl UploadScheduler {
    pub fn new(store: Arc<dyn ObjectStore>, config: &DeployConfig) -> Self {
        Self {
            context: Arc::new(UploadContext {
                store,
                target: config.target.clone(),
                acl: config.acl.clone(),
                cache_control: config.cache_control.clone(),
            }),
            concurrency: config.concurrency.max(1),
        }
    }

    /// Sync every file, updating `status` as files settle.
    ///
    /// Fails fast: the first error stops admission of further files and is
    /// returned at once. Requests already issued by other workers are left
    /// to finish on their own.
    pub async fn run(
        &self, files: Vec<FileDescriptor>, status: &mut RunStatus, consumers: &mut ConsumerManager,
    ) -> Result<()> {
        status.reset(files.len());
        consumers.dispatch(&SyncEvent::Started {
            total: status.total,
        });

        if files.is_empty() {
            return Ok(());
        }

        let (queue_tx, queue_rx) = mpsc::unbounded_channel();
        for file in files {
            queue_tx
                .send(file)
                .map_err(|_| DeployError::Worker("file queue closed".to_string()))?;
        }
        drop(queue_tx);

        let queue: Queue = Arc::new(Mutex::new(queue_rx));
        let halted = Arc::new(AtomicBool::new(false));
        let workers = self.concurrency.min(status.total);
        let (result_tx, mut result_rx) = mpsc::channel(workers);

        log::debug!("Starting {} upload workers for {} files", workers, status.total);
        for id in 0..workers {
            tokio::spawn(worker(
                id,
                self.context.clone(),
                queue.clone(),
                halted.clone(),
                result_tx.clone(),
            ));
        }
        drop(result_tx);

        while let Some(outcome) = result_rx.recv().await {
            match outcome {
                Ok(FileOutcome { action, path }) => {
                    match action {
                        FileAction::Uploaded => status.uploaded += 1,
                        FileAction::Skipped => status.skipped += 1,
                    }
                    consumers.dispatch(&SyncEvent::Progress {
                        status: *status,
                        action,
                        path,
                    });
                }
                Err(err) => {
                    halted.store(true, Ordering::SeqCst);
                    return Err(err);
                }
            }
        }

        // every worker is gone; a shortfall means one died without reporting
        if status.completed() != status.total {
            return Err(DeployError::Worker(format!(
                "{} of {} files were never reported",
                status.total - status.completed(),
                status.total
            )));
        }

        Ok(())
    }
}

async fn worker(
    id: usize, context: Arc<UploadContext>, queue: Queue, halted: Arc<AtomicBool>,
    results: mpsc::Sender<Result<FileOutcome>>,
) {
    loop {
        if halted.load(Ordering::SeqCst) {
            break;
        }

        let next = { queue.lock().await.recv().await };
        let Some(file) = next else {
            break;
        };

        if halted.load(Ordering::SeqCst) {
            break;
        }

        let outcome = sync_file(&context, file).await;
        if outcome.is_err() {
            halted.store(true, Ordering::SeqCst);
        }
        if results.send(outcome).await.is_err() {
            break;
        }
    }

    log::debug!("Upload worker {} exiting", id);
}

async fn sync_file(context: &UploadContext, file: FileDescriptor) -> Result<FileOutcome> {
    let key = context.target.key_for(&file.relative_path);
    let path = file.path();

    match probe(context.store.as_ref(), &context.target, &key, &file.digest).await? {
        ProbeOutcome::UploadNotRequired => {
            log::debug!("Skipping {} (unchanged)", key);
            Ok(FileOutcome {
                action: FileAction::Skipped,
                path,
            })
        }
        ProbeOutcome::UploadRequired => {
            upload(context, key, file).await?;
            Ok(FileOutcome {
                action: FileAction::Uploaded,
                path,
            })
        }
    }
}

/// One atomic put: body, headers, rule metadata and the digest together.
async fn upload(context: &UploadContext, key: String, file: FileDescriptor) -> Result<()> {
    let FileDescriptor {
        content,
        content_type,
        digest,
        extra_headers,
        extra_metadata,
        ..
    } = file;

    let request = PutObjectRequest {
        bucket: context.target.bucket.clone(),
        key: key.clone(),
        body: content,
        acl: context.acl.clone(),
        content_type,
        cache_control: context.cache_control.clone(),
        headers: extra_headers,
        metadata: object_metadata(extra_metadata, digest),
    };

    context
        .store
        .put_object(request)
        .await
        .map_err(|source| DeployError::Upload {
            key: key.clone(),
            source,
        })?;

    log::debug!("Uploaded {}", key);
    Ok(())
}

/// Rule metadata plus the digest. Metadata keys are case-insensitive on the
/// wire, so any rule key spelling the digest key in another case is dropped
/// too.
fn object_metadata(
    mut metadata: BTreeMap<String, String>, digest: String,
) -> BTreeMap<String, String> {
    metadata.retain(|key, _| !key.eq_ignore_ascii_case(DIGEST_METADATA_KEY));
    metadata.insert(DIGEST_METADATA_KEY.to_string(), digest);
    metadata
}
