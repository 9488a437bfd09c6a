use crate::runner::TaskRunner;
use autobackup_core::{BackupTask, Config, RunResult};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Outcome of one dispatch: every task's stage results.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    pub results: Vec<RunResult>,
    /// Task executions that panicked instead of returning a result.
    pub aborted: usize,
}

impl BatchReport {
    pub fn failed(&self) -> impl Iterator<Item = &RunResult> {
        self.results.iter().filter(|r| !r.is_success())
    }

    pub fn has_failures(&self) -> bool {
        self.aborted > 0 || self.failed().next().is_some()
    }

    pub fn result_for(&self, label: &str) -> Option<&RunResult> {
        self.results.iter().find(|r| r.label == label)
    }
}

/// Fans tasks out to concurrent, independent runner executions and waits
/// for all of them.
#[derive(Clone)]
pub struct Dispatcher {
    runner: Arc<TaskRunner>,
    max_concurrent: usize,
}

impl Dispatcher {
    pub fn new(runner: Arc<TaskRunner>) -> Self {
        Self {
            runner,
            max_concurrent: 0,
        }
    }

    /// Cap on simultaneously running tasks; 0 keeps the fan-out unbounded.
    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = max_concurrent;
        self
    }

    pub async fn dispatch_config(&self, config: &Config) -> BatchReport {
        self.dispatch(config.tasks()).await
    }

    pub async fn dispatch(&self, tasks: Vec<BackupTask>) -> BatchReport {
        let semaphore = self.build_semaphore();
        let total = tasks.len();
        tracing::info!("Dispatching {} backup tasks", total);

        let mut set = JoinSet::new();
        for task in tasks {
            let runner = self.runner.clone();
            let semaphore = semaphore.clone();

            set.spawn(async move {
                // the semaphore is never closed, so acquire cannot fail
                let _permit = match &semaphore {
                    Some(sem) => sem.clone().acquire_owned().await.ok(),
                    None => None,
                };
                runner.run(&task).await
            });
        }

        let mut report = BatchReport::default();
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok(result) => report.results.push(result),
                Err(e) => {
                    tracing::error!("Backup task execution aborted: {}", e);
                    report.aborted += 1;
                }
            }
        }

        tracing::info!(
            "All {} backup tasks finished ({} with failures, {} aborted)",
            total,
            report.failed().count(),
            report.aborted
        );

        report
    }

    fn build_semaphore(&self) -> Option<Arc<Semaphore>> {
        match self.max_concurrent {
            0 => None,
            n => Some(Arc::new(Semaphore::new(n.min(Semaphore::MAX_PERMITS)))),
        }
    }
}
