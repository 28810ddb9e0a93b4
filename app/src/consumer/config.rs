use serde::{Deserialize, Serialize};

/// 消费者配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsumerConfig {
    /// 是否启用控制台消费者（stdout 上的进度行）
    pub enable_console_consumer: bool,
    /// 是否启用日志消费者
    pub enable_log_consumer: bool,
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        Self {
            enable_console_consumer: true,
            enable_log_consumer: true,
        }
    }
}

impl ConsumerConfig {
    /// 创建仅启用日志消费者的配置
    pub fn log_only() -> Self {
        Self {
            enable_console_consumer: false,
            ..Default::default()
        }
    }

    pub fn new(enable_console_consumer: bool, enable_log_consumer: bool) -> Self {
        Self {
            enable_console_consumer,
            enable_log_consumer,
        }
    }
}
