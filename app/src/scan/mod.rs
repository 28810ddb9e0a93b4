use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use storage::file::LocalStorage;

use crate::sync::config::{DeployConfig, SyncRule};
use crate::sync::error::{DeployError, Result};

pub mod filter;
pub mod fingerprint;


pub use filter::{apply_rules, RuleSet};
pub use fingerprint::{content_type, digest};

/// Everything the scheduler needs to know about one local file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDescriptor {
    /// Path segments relative to the source root.
    pub relative_path: Vec<String>,
    pub content: Vec<u8>,
    pub content_type: String,
    pub digest: String,
    pub extra_headers: BTreeMap<String, String>,
    pub extra_metadata: BTreeMap<String, String>,
}

impl FileDescriptor {
    /// Fingerprint `content` and apply both rule sets to its path.
    pub fn describe(
        relative_path: Vec<String>, content: Vec<u8>, header_rules: &RuleSet,
        metadata_rules: &RuleSet,
    ) -> Self {
        let path = relative_path.join("/");
        let file_name = relative_path.last().map(String::as_str).unwrap_or_default();

        Self {
            content_type: content_type(Path::new(file_name)),
            digest: digest(&content),
            extra_headers: header_rules.evaluate(&path),
            extra_metadata: metadata_rules.evaluate(&path),
            relative_path,
            content,
        }
    }

    /// Relative path joined with `/`.
    pub fn path(&self) -> String {
        self.relative_path.join("/")
    }
}

/// Walk `root` and describe every regular file, in sorted path order.
///
/// Blocking; see [`scan`] for the async entry point. Any unreadable
/// directory or file fails the whole enumeration.
pub fn enumerate(
    root: &Path, header_rules: &[SyncRule], metadata_rules: &[SyncRule],
) -> Result<Vec<FileDescriptor>> {
    let header_rules = RuleSet::compile(header_rules);
    let metadata_rules = RuleSet::compile(metadata_rules);
    let local = LocalStorage::new(root);

    let files = local.list_files().map_err(|e| enumeration_error(root, e))?;
    log::debug!("Found {} files under {}", files.len(), root.display());

    files
        .into_iter()
        .map(|file| {
            let content = local.read(&file).map_err(|e| enumeration_error(&file.path, e))?;
            let descriptor =
                FileDescriptor::describe(file.relative_path, content, &header_rules, &metadata_rules);
            log::debug!(
                "Described {} ({}, {})",
                descriptor.path(),
                descriptor.content_type,
                descriptor.digest
            );
            Ok(descriptor)
        })
        .collect()
}

/// Enumerate the configured source root on the blocking pool.
pub async fn scan(config: &DeployConfig) -> Result<Vec<FileDescriptor>> {
    let root: PathBuf = config.source_root.clone();
    let header_rules = config.header_rules.clone();
    let metadata_rules = config.metadata_rules.clone();

    tokio::task::spawn_blocking(move || enumerate(&root, &header_rules, &metadata_rules))
        .await
        .map_err(|e| DeployError::Worker(format!("enumeration task failed: {}", e)))?
}

fn enumeration_error(path: &Path, source: std::io::Error) -> DeployError {
    DeployError::Enumeration {
        path: path.display().to_string(),
        source,
    }
}
