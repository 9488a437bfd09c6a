use autobackup_core::Stage;
use thiserror::Error;

/// Failure of one pipeline stage for one task. Never leaves the task runner.
#[derive(Error, Debug)]
#[error("{stage} stage failed for {label}: {source}")]
pub struct StageError {
    pub stage: Stage,
    pub label: String,
    #[source]
    pub source: autobackup_core::Error,
}

impl StageError {
    pub fn new(stage: Stage, label: impl Into<String>, source: autobackup_core::Error) -> Self {
        Self {
            stage,
            label: label.into(),
            source,
        }
    }
}
