use std::io::Write;
use std::sync::Mutex;

use utils::app_config::*;

// AppConfig is process-global; serialize the tests that reset it.
static LOCK: Mutex<()> = Mutex::new(());

pub fn initialize() {
    let config_contents = include_str!("resources/test_config.toml");
    AppConfig::init(Some(config_contents)).unwrap();
}

#[test]
fn fetch_config() {
    let _lock = LOCK.lock().unwrap_or_else(|e| e.into_inner());
    initialize();

    let config = AppConfig::fetch().unwrap();

    assert_eq!(config.log.level, "info");
    assert_eq!(config.log.file, "");

    assert_eq!(config.deploy.source.as_deref(), Some("public"));
    assert_eq!(config.deploy.bucket.as_deref(), Some("site-bucket/www"));
    assert_eq!(config.deploy.acl.as_deref(), Some("private"));
    assert_eq!(config.deploy.concurrency, Some(5));
    assert_eq!(config.deploy.cache_control.as_deref(), Some("max-age=300"));
    assert_eq!(config.deploy.distribution_id, None);
}

#[test]
fn rules_keep_order_and_tags() {
    let _lock = LOCK.lock().unwrap_or_else(|e| e.into_inner());
    initialize();

    let deploy = AppConfig::get::<DeploySettings>("deploy").unwrap();

    assert_eq!(deploy.header_rules.len(), 1);
    assert_eq!(deploy.header_rules[0].pattern, "**/*.gz");
    assert_eq!(
        deploy.header_rules[0].tags.get("Content-Encoding").map(String::as_str),
        Some("gzip")
    );
    assert_eq!(deploy.metadata_rules[0].pattern, "*.html");
}

#[test]
fn verify_get() {
    let _lock = LOCK.lock().unwrap_or_else(|e| e.into_inner());
    initialize();

    assert_eq!(AppConfig::get::<String>("log.level").unwrap(), "info");
    assert_eq!(AppConfig::get::<usize>("deploy.concurrency").unwrap(), 5);
    assert_eq!(
        AppConfig::get::<String>("deploy.bucket").unwrap(),
        "site-bucket/www"
    );
    assert!(AppConfig::get::<String>("deploy.distribution_id").is_err());
}

#[test]
fn verify_set() {
    let _lock = LOCK.lock().unwrap_or_else(|e| e.into_inner());
    initialize();

    AppConfig::set("log.level", "debug").unwrap();
    AppConfig::set("deploy.concurrency", "12").unwrap();
    AppConfig::set("deploy.distribution_id", "E2EXAMPLE").unwrap();

    let config = AppConfig::fetch().unwrap();

    assert_eq!(config.log.level, "debug");
    assert_eq!(config.deploy.concurrency, Some(12));
    assert_eq!(config.deploy.distribution_id.as_deref(), Some("E2EXAMPLE"));
    // untouched keys survive the rebuild
    assert_eq!(config.deploy.acl.as_deref(), Some("private"));
}

#[test]
fn merge_user_file() {
    let _lock = LOCK.lock().unwrap_or_else(|e| e.into_inner());
    initialize();

    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    writeln!(file, "[deploy]\nbucket = \"other-bucket\"\nconcurrency = 2").unwrap();

    AppConfig::merge_config(Some(file.path())).unwrap();
    let config = AppConfig::fetch().unwrap();

    assert_eq!(config.deploy.bucket.as_deref(), Some("other-bucket"));
    assert_eq!(config.deploy.concurrency, Some(2));
    assert_eq!(config.deploy.source.as_deref(), Some("public"));
}

#[test]
fn merge_missing_file_fails() {
    let _lock = LOCK.lock().unwrap_or_else(|e| e.into_inner());
    initialize();

    let result = AppConfig::merge_config(Some(std::path::Path::new(
        "/definitely/not/here/deploy.toml",
    )));
    assert!(result.is_err());
}
