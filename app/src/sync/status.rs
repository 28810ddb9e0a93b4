use std::fmt;

/// Counters of a single run. Owned by whoever drives the run and mutated
/// only by the scheduler's collector loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStatus {
    pub total: usize,
    pub uploaded: usize,
    pub skipped: usize,
}

impl RunStatus {
    pub fn completed(&self) -> usize {
        self.uploaded + self.skipped
    }

    /// Share of settled files, in percent. An empty run is complete.
    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            return 100.0;
        }
        self.completed() as f64 / self.total as f64 * 100.0
    }

    pub fn reset(&mut self, total: usize) {
        *self = RunStatus {
            total,
            ..Default::default()
        };
    }
}

/// What happened to one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileAction {
    Uploaded,
    Skipped,
}

impl fmt::Display for FileAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileAction::Uploaded => write!(f, "uploaded"),
            FileAction::Skipped => write!(f, "skipped"),
        }
    }
}

/// Events emitted to consumers over the course of a run.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncEvent {
    /// Enumeration finished; `total` files will be synced.
    Started { total: usize },
    /// One file settled.
    Progress {
        status: RunStatus,
        action: FileAction,
        path: String,
    },
    Invalidated {
        distribution_id: String,
        invalidation_id: String,
    },
    Complete {
        status: RunStatus,
        source: String,
        target: String,
    },
    Failed { status: RunStatus, error: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_of_settled_files() {
        let status = RunStatus {
            total: 3,
            uploaded: 1,
            skipped: 1,
        };
        assert_eq!(status.completed(), 2);
        assert_eq!(format!("{:.2}", status.percent()), "66.67");
    }

    #[test]
    fn empty_run_is_complete() {
        assert_eq!(RunStatus::default().percent(), 100.0);
    }

    #[test]
    fn reset_clears_counters() {
        let mut status = RunStatus {
            total: 4,
            uploaded: 2,
            skipped: 2,
        };
        status.reset(7);
        assert_eq!(
            status,
            RunStatus {
                total: 7,
                uploaded: 0,
                skipped: 0
            }
        );
    }
}
