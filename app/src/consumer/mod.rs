//! Consumers of run events: the live console progress line, the log, or
//! anything a caller plugs in.
//!
//! Events are dispatched synchronously from the scheduler's collector loop,
//! so consumers observe them in order and never concurrently.

use crate::sync::status::SyncEvent;

pub mod config;
pub mod console;
pub mod log;

pub use config::ConsumerConfig;
pub use console::ConsoleConsumer;
pub use log::LogConsumer;

/// 消费者 trait - 定义消费者接口
pub trait Consumer: Send {
    fn consume(&mut self, event: &SyncEvent);

    fn name(&self) -> &'static str;
}

/// 消费者管理器 - 管理多个消费者
#[derive(Default)]
pub struct ConsumerManager {
    consumers: Vec<Box<dyn Consumer>>,
}

impl ConsumerManager {
    /// 创建新的消费者管理器（不含任何消费者）
    pub fn new() -> Self {
        Self::default()
    }

    /// 根据配置创建消费者管理器
    pub fn with_config(config: &ConsumerConfig) -> Self {
        let mut manager = Self::new();

        if config.enable_console_consumer {
            manager.add_consumer(Box::new(ConsoleConsumer::new()));
        }
        if config.enable_log_consumer {
            manager.add_consumer(Box::new(LogConsumer));
        }

        manager
    }

    /// 添加消费者
    pub fn add_consumer(&mut self, consumer: Box<dyn Consumer>) {
        ::log::debug!("Registered consumer {}", consumer.name());
        self.consumers.push(consumer);
    }

    /// 获取消费者数量
    pub fn get_consumer_count(&self) -> usize {
        self.consumers.len()
    }

    /// 按注册顺序把事件分发给所有消费者
    pub fn dispatch(&mut self, event: &SyncEvent) {
        for consumer in &mut self.consumers {
            consumer.consume(event);
        }
    }
}
