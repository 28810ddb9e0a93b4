use crate::consumer::Consumer;
use crate::sync::status::SyncEvent;

/// 日志消费者 - 将部署事件记录到日志
pub struct LogConsumer;

impl Consumer for LogConsumer {
    fn consume(&mut self, event: &SyncEvent) {
        match event {
            SyncEvent::Started { total } => {
                log::info!("[LogConsumer] Syncing {} files", total);
            }
            SyncEvent::Progress {
                status,
                action,
                path,
            } => {
                log::debug!(
                    "[LogConsumer] {} {} ({}/{})",
                    action,
                    path,
                    status.completed(),
                    status.total
                );
            }
            SyncEvent::Invalidated {
                distribution_id,
                invalidation_id,
            } => {
                log::info!(
                    "[LogConsumer] Invalidation {} for {}",
                    invalidation_id,
                    distribution_id
                );
            }
            SyncEvent::Complete {
                status,
                source,
                target,
            } => {
                log::info!(
                    "[LogConsumer] Deployed {} to {}: {} uploaded, {} skipped, {} total",
                    source,
                    target,
                    status.uploaded,
                    status.skipped,
                    status.total
                );
            }
            SyncEvent::Failed { status, error } => {
                log::error!(
                    "[LogConsumer] Deploy failed after {} of {} files: {}",
                    status.completed(),
                    status.total,
                    error
                );
            }
        }
    }

    fn name(&self) -> &'static str {
        "log_consumer"
    }
}
