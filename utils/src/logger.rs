use slog::o;
use slog::Drain;
use slog::Level;
use slog::LevelFilter;

use std::fs::OpenOptions;
use std::path::PathBuf;

use super::error::Result;
use crate::app_config::{AppConfig, LogConfig};

/// 异步 drain 的通道容量，避免部署时大量 debug 日志丢失
const ASYNC_CHAN_SIZE: usize = 1024;

pub fn setup_logging() -> Result<slog_scope::GlobalLoggerGuard> {
    let guard = slog_scope::set_global_logger(default_root_logger()?);
    slog_stdlog::init()?;

    Ok(guard)
}

pub fn default_root_logger() -> Result<slog::Logger> {
    // 从配置中获取日志级别，配置未初始化时使用默认值
    let log_config = AppConfig::get::<LogConfig>("log").ok();
    let level = log_config
        .as_ref()
        .map(|c| parse_level(&c.level))
        .unwrap_or(Level::Info);

    // stdout 留给进度行，终端日志输出到 stderr
    let term_drain = default_term_drain();
    let file_drain = match default_file_drain(log_config.as_ref()) {
        Ok(drain) => drain,
        Err(_) => default_discard(),
    };

    // Combine terminal and file drains
    let drain = slog::Duplicate(term_drain, file_drain).fuse();
    // 应用日志级别过滤器
    let drain = LevelFilter::new(drain, level).fuse();

    Ok(slog::Logger::root(drain, o!()))
}

/// 从配置值解析日志级别，未知值使用 info
pub fn parse_level(level: &str) -> Level {
    match level.trim().to_ascii_lowercase().as_str() {
        "trace" => Level::Trace,
        "debug" => Level::Debug,
        "info" => Level::Info,
        "warn" | "warning" => Level::Warning,
        "error" => Level::Error,
        _ => Level::Info,
    }
}

fn default_discard() -> slog_async::Async {
    slog_async::Async::new(slog::Discard)
        .chan_size(ASYNC_CHAN_SIZE)
        .build()
}

fn default_term_drain() -> slog_async::Async {
    let plain = slog_term::PlainSyncDecorator::new(std::io::stderr());
    let term = slog_term::FullFormat::new(plain)
        .use_file_location()
        .use_custom_timestamp(slog_term::timestamp_local);

    slog_async::Async::new(term.build().fuse())
        .chan_size(ASYNC_CHAN_SIZE)
        .build()
}

fn default_file_drain(log_config: Option<&LogConfig>) -> Result<slog_async::Async> {
    let log_file = match log_config.map(|c| c.file.trim()) {
        Some(file) if !file.is_empty() => PathBuf::from(file),
        _ => default_log_dir()?.join("app.log"),
    };

    if let Some(parent) = log_file.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file)?;

    let decorator = slog_term::PlainSyncDecorator::new(file);
    let formatter = slog_term::FullFormat::new(decorator)
        .use_file_location()
        .use_custom_timestamp(slog_term::timestamp_local)
        .build()
        .fuse();

    Ok(slog_async::Async::new(formatter)
        .chan_size(ASYNC_CHAN_SIZE)
        .build())
}

/// 可执行文件所在目录下的 logs/，无法获取时使用当前工作目录
fn default_log_dir() -> Result<PathBuf> {
    let mut exe_dir = std::env::current_exe()?;
    exe_dir.pop();

    if !exe_dir.exists() {
        exe_dir = std::env::current_dir()?;
    }

    Ok(exe_dir.join("logs"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_level_accepts_config_values() {
        assert_eq!(parse_level("debug"), Level::Debug);
        assert_eq!(parse_level(" WARN "), Level::Warning);
        assert_eq!(parse_level("error"), Level::Error);
        assert_eq!(parse_level("verbose"), Level::Info);
    }
}
