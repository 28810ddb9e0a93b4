use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use storage::BucketTarget;
use utils::app_config::{DeploySettings, RuleSettings};

use super::error::{DeployError, Result};

pub const DEFAULT_ACL: &str = "public-read";
pub const DEFAULT_CONCURRENCY: usize = 10;

/// A glob pattern and the tags merged into every file it matches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncRule {
    pub pattern: String,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
}

impl SyncRule {
    pub fn new<I, K, V>(pattern: &str, tags: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            pattern: pattern.to_string(),
            tags: tags.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

impl From<RuleSettings> for SyncRule {
    fn from(rule: RuleSettings) -> Self {
        Self {
            pattern: rule.pattern,
            tags: rule.tags,
        }
    }
}

/// Unvalidated deploy options, as read from configuration or flags.
#[derive(Debug, Clone, Default)]
pub struct DeployOptions {
    pub source: Option<PathBuf>,
    pub bucket: Option<String>,
    pub acl: Option<String>,
    pub concurrency: Option<usize>,
    pub cache_control: Option<String>,
    pub distribution_id: Option<String>,
    pub header_rules: Vec<SyncRule>,
    pub metadata_rules: Vec<SyncRule>,
}

impl From<DeploySettings> for DeployOptions {
    fn from(settings: DeploySettings) -> Self {
        Self {
            source: settings.source.map(PathBuf::from),
            bucket: settings.bucket,
            acl: settings.acl,
            concurrency: settings.concurrency,
            cache_control: settings.cache_control,
            distribution_id: settings.distribution_id,
            header_rules: settings.header_rules.into_iter().map(SyncRule::from).collect(),
            metadata_rules: settings.metadata_rules.into_iter().map(SyncRule::from).collect(),
        }
    }
}

/// Validated configuration of one run. Immutable once built.
#[derive(Debug, Clone)]
pub struct DeployConfig {
    pub source_root: PathBuf,
    pub target: BucketTarget,
    pub acl: String,
    pub concurrency: usize,
    pub cache_control: Option<String>,
    pub distribution_id: Option<String>,
    pub header_rules: Vec<SyncRule>,
    pub metadata_rules: Vec<SyncRule>,
}

impl DeployConfig {
    /// Check required fields and fill in defaults. Touches neither the file
    /// system nor the network.
    pub fn validate(options: DeployOptions) -> Result<Self> {
        let source_root = options
            .source
            .filter(|p| !p.as_os_str().is_empty())
            .ok_or_else(|| DeployError::configuration("source root is required"))?;

        let bucket = non_blank(options.bucket)
            .ok_or_else(|| DeployError::configuration("bucket identifier is required"))?;
        let target =
            BucketTarget::parse(&bucket).map_err(|e| DeployError::configuration(e.to_string()))?;

        let concurrency = options.concurrency.unwrap_or(DEFAULT_CONCURRENCY);
        if concurrency == 0 {
            return Err(DeployError::configuration("concurrency must be at least 1"));
        }

        Ok(Self {
            source_root,
            target,
            acl: non_blank(options.acl).unwrap_or_else(|| DEFAULT_ACL.to_string()),
            concurrency,
            cache_control: non_blank(options.cache_control),
            distribution_id: non_blank(options.distribution_id),
            header_rules: options.header_rules,
            metadata_rules: options.metadata_rules,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> DeployOptions {
        DeployOptions {
            source: Some(PathBuf::from("public")),
            bucket: Some("site/www".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn applies_defaults() {
        let config = DeployConfig::validate(options()).unwrap();

        assert_eq!(config.acl, DEFAULT_ACL);
        assert_eq!(config.concurrency, DEFAULT_CONCURRENCY);
        assert_eq!(config.target.bucket, "site");
        assert_eq!(config.target.prefix.as_deref(), Some("www"));
        assert_eq!(config.cache_control, None);
        assert_eq!(config.distribution_id, None);
    }

    #[test]
    fn keeps_explicit_values() {
        let config = DeployConfig::validate(DeployOptions {
            acl: Some("private".into()),
            concurrency: Some(3),
            cache_control: Some("max-age=60".into()),
            distribution_id: Some(" E2EXAMPLE ".into()),
            ..options()
        })
        .unwrap();

        assert_eq!(config.acl, "private");
        assert_eq!(config.concurrency, 3);
        assert_eq!(config.cache_control.as_deref(), Some("max-age=60"));
        assert_eq!(config.distribution_id.as_deref(), Some("E2EXAMPLE"));
    }

    #[test]
    fn missing_bucket_is_rejected() {
        let err = DeployConfig::validate(DeployOptions {
            bucket: None,
            ..options()
        })
        .unwrap_err();
        assert!(matches!(err, DeployError::Configuration(_)));

        let err = DeployConfig::validate(DeployOptions {
            bucket: Some("  ".into()),
            ..options()
        })
        .unwrap_err();
        assert!(matches!(err, DeployError::Configuration(_)));
    }

    #[test]
    fn missing_source_is_rejected() {
        let err = DeployConfig::validate(DeployOptions {
            source: None,
            ..options()
        })
        .unwrap_err();
        assert!(matches!(err, DeployError::Configuration(_)));
    }

    #[test]
    fn zero_concurrency_is_rejected() {
        let err = DeployConfig::validate(DeployOptions {
            concurrency: Some(0),
            ..options()
        })
        .unwrap_err();
        assert!(matches!(err, DeployError::Configuration(_)));
    }

    #[test]
    fn converts_settings() {
        let settings = DeploySettings {
            source: Some("dist".into()),
            bucket: Some("site".into()),
            header_rules: vec![RuleSettings {
                pattern: "*.gz".into(),
                tags: [("Content-Encoding".to_string(), "gzip".to_string())].into(),
            }],
            ..Default::default()
        };

        let options = DeployOptions::from(settings);
        assert_eq!(options.source, Some(PathBuf::from("dist")));
        assert_eq!(
            options.header_rules,
            vec![SyncRule::new("*.gz", [("Content-Encoding", "gzip")])]
        );
    }
}
