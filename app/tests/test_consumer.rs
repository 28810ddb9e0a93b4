use std::fs;
use std::sync::{Arc, Mutex};

use app::consumer::config::ConsumerConfig;
use app::consumer::{Consumer, ConsumerManager};
use app::sync::{deploy, DeployOptions, SyncEvent};
use storage::{MemoryInvalidator, MemoryStorage};
use tempfile::TempDir;
use utils::error::Result;

struct Counter {
    name: &'static str,
    seen: Arc<Mutex<Vec<&'static str>>>,
}

impl Consumer for Counter {
    fn consume(&mut self, event: &SyncEvent) {
        if matches!(event, SyncEvent::Complete { .. }) {
            self.seen.lock().unwrap().push(self.name);
        }
    }

    fn name(&self) -> &'static str {
        self.name
    }
}

#[test]
fn test_consumer_manager_creation() {
    let manager = ConsumerManager::new();
    assert_eq!(manager.get_consumer_count(), 0);

    let manager = ConsumerManager::with_config(&ConsumerConfig::default());
    assert_eq!(manager.get_consumer_count(), 2);

    let manager = ConsumerManager::with_config(&ConsumerConfig::log_only());
    assert_eq!(manager.get_consumer_count(), 1);

    let manager = ConsumerManager::with_config(&ConsumerConfig::new(false, false));
    assert_eq!(manager.get_consumer_count(), 0);
}

#[test]
fn test_dispatch_in_registration_order() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let mut manager = ConsumerManager::new();
    for name in ["first", "second", "third"] {
        manager.add_consumer(Box::new(Counter {
            name,
            seen: seen.clone(),
        }));
    }

    manager.dispatch(&SyncEvent::Started { total: 0 });
    manager.dispatch(&SyncEvent::Complete {
        status: Default::default(),
        source: "public".into(),
        target: "site".into(),
    });

    assert_eq!(*seen.lock().unwrap(), vec!["first", "second", "third"]);
}

#[tokio::test]
async fn test_deploy_with_consumers() -> Result<()> {
    let _ = env_logger::builder().is_test(true).try_init();

    let temp_dir = TempDir::new()?;
    fs::write(temp_dir.path().join("index.html"), "home")?;
    fs::create_dir(temp_dir.path().join("img"))?;
    fs::write(temp_dir.path().join("img").join("logo.png"), [0x89, 0x50])?;

    let seen = Arc::new(Mutex::new(Vec::new()));
    let mut manager = ConsumerManager::with_config(&ConsumerConfig::log_only());
    manager.add_consumer(Box::new(Counter {
        name: "counter",
        seen: seen.clone(),
    }));

    let store = Arc::new(MemoryStorage::new());
    let report = deploy(
        DeployOptions {
            source: Some(temp_dir.path().to_path_buf()),
            bucket: Some("site".into()),
            ..Default::default()
        },
        store.clone(),
        Arc::new(MemoryInvalidator::new()),
        manager,
    )
    .await
    .map_err(|e| utils::error::Error::with_source("deploy failed", Box::new(e)))?;

    assert_eq!(report.status.uploaded, 2);
    assert_eq!(*seen.lock().unwrap(), vec!["counter"]);
    assert_eq!(
        store.object("site", "img/logo.png").map(|o| o.content_type),
        Some("image/png".to_string())
    );

    Ok(())
}
