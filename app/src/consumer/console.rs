use std::io::Write;

use crate::consumer::Consumer;
use crate::sync::status::{FileAction, RunStatus, SyncEvent};

/// 控制台消费者 - 原地刷新进度行，结束时打印汇总
pub struct ConsoleConsumer {
    out: Box<dyn Write + Send>,
    /// 当前进度行的宽度，0 表示没有打开的进度行
    line_width: usize,
}

impl Default for ConsoleConsumer {
    fn default() -> Self {
        Self::new()
    }
}

impl ConsoleConsumer {
    pub fn new() -> Self {
        Self::with_writer(Box::new(std::io::stdout()))
    }

    pub fn with_writer(out: Box<dyn Write + Send>) -> Self {
        Self { out, line_width: 0 }
    }

    /// `uploaded 1 | skipped 1 | total 2 | 100.00% | uploaded b.txt`
    pub fn progress_line(status: &RunStatus, action: FileAction, path: &str) -> String {
        format!(
            "uploaded {} | skipped {} | total {} | {:.2}% | {} {}",
            status.uploaded,
            status.skipped,
            status.total,
            status.percent(),
            action,
            path
        )
    }

    fn redraw(&mut self, line: &str) {
        let width = line.chars().count();
        let padding = self.line_width.saturating_sub(width);
        let _ = write!(self.out, "\r{}{}", line, " ".repeat(padding));
        let _ = self.out.flush();
        self.line_width = width;
    }

    /// 保留进度行并换行
    fn close_line(&mut self) {
        if self.line_width > 0 {
            let _ = writeln!(self.out);
            self.line_width = 0;
        }
    }

    fn print_line(&mut self, line: &str) {
        self.close_line();
        let _ = writeln!(self.out, "{}", line);
        let _ = self.out.flush();
    }
}

impl Consumer for ConsoleConsumer {
    fn consume(&mut self, event: &SyncEvent) {
        match event {
            SyncEvent::Started { total } => {
                if *total == 0 {
                    self.print_line("No files to sync");
                }
            }
            SyncEvent::Progress {
                status,
                action,
                path,
            } => {
                let line = Self::progress_line(status, *action, path);
                self.redraw(&line);
            }
            SyncEvent::Invalidated {
                distribution_id,
                invalidation_id,
            } => {
                self.print_line(&format!(
                    "Invalidation {} requested for distribution {}",
                    invalidation_id, distribution_id
                ));
            }
            SyncEvent::Complete { source, target, .. } => {
                self.print_line(&format!("Deployed {} to {}", source, target));
            }
            SyncEvent::Failed { .. } => {
                // 错误信息由调用方输出
                self.close_line();
                let _ = self.out.flush();
            }
        }
    }

    fn name(&self) -> &'static str {
        "console_consumer"
    }
}
