use config::{Config, Environment, File, FileFormat};
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::RwLock;

use super::error::{Error, Result};

lazy_static! {
    static ref CONFIG: RwLock<Config> = RwLock::new(Config::default());
}

/// Prefix of environment overrides, e.g. `APP_DEPLOY__BUCKET=site/www`.
const ENV_PREFIX: &str = "APP";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    pub level: String,
    /// Log file path; empty means `logs/app.log` next to the executable.
    #[serde(default)]
    pub file: String,
}

/// One `{ pattern, tags }` entry of `deploy.header_rules` / `deploy.metadata_rules`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSettings {
    pub pattern: String,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
}

/// Raw `[deploy]` section. Nothing is validated here.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeploySettings {
    pub source: Option<String>,
    pub bucket: Option<String>,
    pub acl: Option<String>,
    pub concurrency: Option<usize>,
    pub cache_control: Option<String>,
    pub distribution_id: Option<String>,
    #[serde(default)]
    pub header_rules: Vec<RuleSettings>,
    #[serde(default)]
    pub metadata_rules: Vec<RuleSettings>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub log: LogConfig,
    #[serde(default)]
    pub deploy: DeploySettings,
}

impl AppConfig {
    /// Initialize from the embedded defaults plus `APP_*` environment variables.
    pub fn init(default_config: Option<&str>) -> Result<()> {
        let mut builder = Config::builder();

        if let Some(contents) = default_config {
            builder = builder.add_source(File::from_str(contents, FileFormat::Toml));
        }

        builder = builder.add_source(env_source());

        let settings = builder.build()?;
        *CONFIG.write().map_err(|_| Error::new("Config lock poisoned"))? = settings;

        Ok(())
    }

    /// Layer a user TOML file over the current settings. Environment
    /// variables are re-applied on top so they keep precedence.
    pub fn merge_config(config_file: Option<&Path>) -> Result<()> {
        let Some(path) = config_file else {
            return Ok(());
        };

        let mut config = CONFIG.write().map_err(|_| Error::new("Config lock poisoned"))?;
        let merged = Config::builder()
            .add_source(config.clone())
            .add_source(File::from(path).format(FileFormat::Toml).required(true))
            .add_source(env_source())
            .build()?;
        *config = merged;

        Ok(())
    }

    /// Override a single key, e.g. `AppConfig::set("deploy.bucket", "site")`.
    pub fn set(key: &str, value: &str) -> Result<()> {
        let mut config = CONFIG.write().map_err(|_| Error::new("Config lock poisoned"))?;
        let updated = Config::builder()
            .add_source(config.clone())
            .set_override(key, value)?
            .build()?;
        *config = updated;

        Ok(())
    }

    pub fn get<'de, T>(key: &str) -> Result<T>
    where
        T: Deserialize<'de>,
    {
        let config = CONFIG.read().map_err(|_| Error::new("Config lock poisoned"))?;
        Ok(config.get::<T>(key)?)
    }

    pub fn fetch() -> Result<AppConfig> {
        let config = CONFIG.read().map_err(|_| Error::new("Config lock poisoned"))?;
        let app_config: AppConfig = config.clone().try_deserialize()?;
        Ok(app_config)
    }
}

fn env_source() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
}
