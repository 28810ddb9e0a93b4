use std::sync::Arc;

use app::consumer::{ConsumerConfig, ConsumerManager};
use app::sync::{DeployOptions, Deployer};
use storage::{CdnInvalidator, CloudFrontInvalidator, MemoryInvalidator, MemoryStorage, ObjectStore, S3Storage};
use utils::app_config::AppConfig;

use crate::{Backend, DeployArgs};

pub async fn deploy_cmd(args: DeployArgs) -> utils::error::Result<()> {
    apply_overrides(&args)?;

    let settings = AppConfig::fetch()?.deploy;
    let options = DeployOptions::from(settings);
    log::debug!("Deploy options: {:?}", options);

    let (store, cdn) = backends(&args).await;
    let consumers = ConsumerManager::with_config(&ConsumerConfig::default());
    let mut deployer = Deployer::new(store, cdn).with_consumers(consumers);

    match deployer.run(options).await {
        Ok(report) => {
            if let Some(id) = report.invalidation_id {
                log::info!("Invalidation {} submitted", id);
            }
            Ok(())
        }
        Err(err) => Err(utils::error::Error::with_source(
            "Deploy failed",
            Box::new(err),
        )),
    }
}

/// Flags win over the config file and the environment.
fn apply_overrides(args: &DeployArgs) -> utils::error::Result<()> {
    let overrides = [
        ("deploy.source", args.source.clone()),
        ("deploy.bucket", args.bucket.clone()),
        ("deploy.acl", args.acl.clone()),
        ("deploy.concurrency", args.concurrency.map(|n| n.to_string())),
        ("deploy.cache_control", args.cache_control.clone()),
        ("deploy.distribution_id", args.distribution_id.clone()),
    ];

    for (key, value) in overrides {
        if let Some(value) = value {
            AppConfig::set(key, &value)?;
        }
    }

    Ok(())
}

async fn backends(args: &DeployArgs) -> (Arc<dyn ObjectStore>, Arc<dyn CdnInvalidator>) {
    match args.backend {
        Backend::S3 => {
            let sdk_config = storage::load_sdk_config(args.region.clone()).await;
            (
                Arc::new(S3Storage::from_sdk_config(&sdk_config, args.endpoint_url.as_deref())),
                Arc::new(CloudFrontInvalidator::from_sdk_config(&sdk_config)),
            )
        }
        Backend::Memory => {
            log::warn!("Using the in-memory backend; nothing will be uploaded");
            (Arc::new(MemoryStorage::new()), Arc::new(MemoryInvalidator::new()))
        }
    }
}
