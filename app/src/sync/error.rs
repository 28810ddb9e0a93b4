use storage::StorageError;
use thiserror::Error;

/// Everything that can go wrong during a deploy run.
///
/// Only `RuleEvaluation` is recovered where it happens (the rule is skipped
/// for that file); every other variant ends the run.
#[derive(Error, Debug)]
pub enum DeployError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Cannot enumerate {path}")]
    Enumeration {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid rule pattern '{pattern}': {message}")]
    RuleEvaluation { pattern: String, message: String },

    #[error("Remote check of {key} failed")]
    Probe {
        key: String,
        #[source]
        source: StorageError,
    },

    #[error("Upload of {key} failed")]
    Upload {
        key: String,
        #[source]
        source: StorageError,
    },

    #[error("Invalidation of distribution {distribution_id} failed")]
    Invalidation {
        distribution_id: String,
        #[source]
        source: StorageError,
    },

    #[error("Worker failure: {0}")]
    Worker(String),
}

impl DeployError {
    pub fn configuration(message: impl Into<String>) -> Self {
        DeployError::Configuration(message.into())
    }

    /// Short machine-friendly name of the variant, used in log records.
    pub fn kind(&self) -> &'static str {
        match self {
            DeployError::Configuration(_) => "configuration",
            DeployError::Enumeration { .. } => "enumeration",
            DeployError::RuleEvaluation { .. } => "rule_evaluation",
            DeployError::Probe { .. } => "probe",
            DeployError::Upload { .. } => "upload",
            DeployError::Invalidation { .. } => "invalidation",
            DeployError::Worker(_) => "worker",
        }
    }
}

pub type Result<T> = std::result::Result<T, DeployError>;
