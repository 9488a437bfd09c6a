pub mod dispatcher;
pub mod error;
pub mod notifier;
pub mod producer;
pub mod replicator;
pub mod retention;
pub mod runner;

// Re-exports
pub use dispatcher::{BatchReport, Dispatcher};
pub use error::StageError;
pub use notifier::Notifier;
pub use producer::{ArchiveProducer, ArtifactProducer, DumpProducer, Producers};
pub use replicator::Replicator;
pub use retention::{RetentionEnforcer, RetentionReport};
pub use runner::{Backends, TaskRunner};
