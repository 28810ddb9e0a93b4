pub mod consumer;
pub mod scan;
pub mod sync;

/// Most used types, `use app::prelude::*`.
pub mod prelude {
    pub use crate::consumer::{
        ConsoleConsumer, Consumer, ConsumerConfig, ConsumerManager, LogConsumer,
    };
    pub use crate::scan::FileDescriptor;
    pub use crate::sync::{
        deploy, DeployConfig, DeployError, DeployOptions, DeployReport, DeployState, Deployer,
        FileAction, RunStatus, SyncEvent, SyncRule,
    };
}
