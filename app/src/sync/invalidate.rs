use std::sync::atomic::{AtomicU64, Ordering};
use storage::CdnInvalidator;

use super::error::{DeployError, Result};

/// Every deploy purges the whole distribution.
pub const INVALIDATION_PATHS: &[&str] = &["/*"];

static RUN_SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// A caller reference unique to one run: wall-clock millis plus a
/// process-wide sequence, so two runs in the same millisecond still differ.
pub fn caller_reference() -> String {
    format!(
        "deploy-{}-{}",
        chrono::Utc::now().timestamp_millis(),
        RUN_SEQUENCE.fetch_add(1, Ordering::SeqCst)
    )
}

/// Issue one wildcard invalidation when a distribution is configured.
/// Returns the service's invalidation id, or `None` when there was nothing
/// to do.
pub async fn invalidate(
    cdn: &dyn CdnInvalidator, distribution_id: Option<&str>, caller_reference: &str,
) -> Result<Option<String>> {
    let Some(distribution_id) = distribution_id else {
        log::debug!("No distribution configured, skipping invalidation");
        return Ok(None);
    };

    let paths: Vec<String> = INVALIDATION_PATHS.iter().map(|p| p.to_string()).collect();

    let id = cdn
        .create_invalidation(distribution_id, caller_reference, &paths)
        .await
        .map_err(|source| DeployError::Invalidation {
            distribution_id: distribution_id.to_string(),
            source,
        })?;

    log::info!(
        "Invalidation {} created for distribution {} ({})",
        id,
        distribution_id,
        caller_reference
    );
    Ok(Some(id))
}
