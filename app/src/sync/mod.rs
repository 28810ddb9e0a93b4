//! Deploy orchestration: validate, enumerate, sync, invalidate.

use std::fmt;
use std::sync::Arc;
use storage::{CdnInvalidator, ObjectStore};

use crate::consumer::ConsumerManager;
use crate::scan;

pub mod config;
pub mod error;
pub mod invalidate;
pub mod probe;
pub mod scheduler;
pub mod status;

pub use config::{DeployConfig, DeployOptions, SyncRule};
pub use error::DeployError;
pub use scheduler::UploadScheduler;
pub use status::{FileAction, RunStatus, SyncEvent};

/// Where a run currently is. `Failed` is reachable from every state before
/// `Done`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeployState {
    Idle,
    Validating,
    Enumerating,
    Syncing,
    Invalidating,
    Done,
    Failed,
}

impl fmt::Display for DeployState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DeployState::Idle => "idle",
            DeployState::Validating => "validating",
            DeployState::Enumerating => "enumerating",
            DeployState::Syncing => "syncing",
            DeployState::Invalidating => "invalidating",
            DeployState::Done => "done",
            DeployState::Failed => "failed",
        };
        write!(f, "{}", name)
    }
}

/// Outcome of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployReport {
    pub status: RunStatus,
    /// Id of the CDN invalidation, when one was requested.
    pub invalidation_id: Option<String>,
}

type CompletionHook =
    Box<dyn FnOnce(&std::result::Result<DeployReport, DeployError>) + Send + 'static>;

/// Runs one deploy against an object store and a CDN.
pub struct Deployer {
    store: Arc<dyn ObjectStore>,
    cdn: Arc<dyn CdnInvalidator>,
    consumers: ConsumerManager,
    state: DeployState,
    status: RunStatus,
    on_complete: Option<CompletionHook>,
}

impl Deployer {
    pub fn new(store: Arc<dyn ObjectStore>, cdn: Arc<dyn CdnInvalidator>) -> Self {
        Self {
            store,
            cdn,
            consumers: ConsumerManager::new(),
            state: DeployState::Idle,
            status: RunStatus::default(),
            on_complete: None,
        }
    }

    pub fn with_consumers(mut self, consumers: ConsumerManager) -> Self {
        self.consumers = consumers;
        self
    }

    /// Called once with the final result, right before `run` returns it.
    pub fn on_complete<F>(mut self, hook: F) -> Self
    where
        F: FnOnce(&std::result::Result<DeployReport, DeployError>) + Send + 'static,
    {
        self.on_complete = Some(Box::new(hook));
        self
    }

    pub fn state(&self) -> DeployState {
        self.state
    }

    /// Counters of the current (or last) run. After a failure they reflect
    /// only the files that settled before it.
    pub fn status(&self) -> RunStatus {
        self.status
    }

    pub async fn run(
        &mut self, options: DeployOptions,
    ) -> std::result::Result<DeployReport, DeployError> {
        self.status = RunStatus::default();
        let result = self.execute(options).await;

        if let Err(err) = &result {
            log::error!("Deploy failed while {}: {} ({})", self.state, err, err.kind());
            self.transition(DeployState::Failed);
            self.consumers.dispatch(&SyncEvent::Failed {
                status: self.status,
                error: err.to_string(),
            });
        }

        if let Some(hook) = self.on_complete.take() {
            hook(&result);
        }

        result
    }

    async fn execute(&mut self, options: DeployOptions) -> error::Result<DeployReport> {
        self.transition(DeployState::Validating);
        let config = DeployConfig::validate(options)?;

        self.transition(DeployState::Enumerating);
        let files = scan::scan(&config).await?;

        self.transition(DeployState::Syncing);
        let scheduler = UploadScheduler::new(self.store.clone(), &config);
        scheduler
            .run(files, &mut self.status, &mut self.consumers)
            .await?;

        self.transition(DeployState::Invalidating);
        let reference = invalidate::caller_reference();
        let invalidation_id = invalidate::invalidate(
            self.cdn.as_ref(),
            config.distribution_id.as_deref(),
            &reference,
        )
        .await?;

        if let (Some(distribution_id), Some(id)) = (&config.distribution_id, &invalidation_id) {
            self.consumers.dispatch(&SyncEvent::Invalidated {
                distribution_id: distribution_id.clone(),
                invalidation_id: id.clone(),
            });
        }

        self.transition(DeployState::Done);
        let source = config.source_root.display().to_string();
        let target = config.target.to_string();
        log::info!(
            "Deployed {} to {} ({} uploaded, {} skipped)",
            source,
            target,
            self.status.uploaded,
            self.status.skipped
        );
        self.consumers.dispatch(&SyncEvent::Complete {
            status: self.status,
            source,
            target,
        });

        Ok(DeployReport {
            status: self.status,
            invalidation_id,
        })
    }

    fn transition(&mut self, next: DeployState) {
        log::debug!("Deploy state {} -> {}", self.state, next);
        self.state = next;
    }
}

/// Run a single deploy with the given consumers.
pub async fn deploy(
    options: DeployOptions, store: Arc<dyn ObjectStore>, cdn: Arc<dyn CdnInvalidator>,
    consumers: ConsumerManager,
) -> std::result::Result<DeployReport, DeployError> {
    Deployer::new(store, cdn)
        .with_consumers(consumers)
        .run(options)
        .await
}
