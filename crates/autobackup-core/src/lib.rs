pub mod backend;
pub mod config;
pub mod error;
pub mod report;
pub mod task;

// Re-exports
pub use backend::{Archiver, DumpRunner, MessageSink, SyncRunner};
pub use config::{Config, RuntimeConfig, TaskEntry, TelegramConfig};
pub use error::{Error, Result};
pub use report::{NotificationEvent, RunResult, Stage, StageOutcome};
pub use task::{BackupTask, TaskKind};
