use crate::error::StageError;
use crate::notifier::Notifier;
use crate::producer::Producers;
use crate::replicator::Replicator;
use crate::retention::RetentionEnforcer;
use autobackup_core::{
    Archiver, BackupTask, DumpRunner, Error, NotificationEvent, RunResult, Stage, StageOutcome,
    SyncRunner,
};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// The external collaborators a runner drives.
#[derive(Clone)]
pub struct Backends {
    pub archiver: Arc<dyn Archiver>,
    pub dumper: Arc<dyn DumpRunner>,
    pub syncer: Arc<dyn SyncRunner>,
}

/// Runs the produce -> retain -> replicate pipeline for one task.
///
/// Every stage runs even when an earlier one failed: retention and
/// replication act on the store's current contents, not on the fresh
/// artifact. Each failed stage yields exactly one notification.
pub struct TaskRunner {
    producers: Producers,
    retention: RetentionEnforcer,
    replicator: Replicator,
    notifier: Notifier,
    stage_timeout: Option<Duration>,
}

impl TaskRunner {
    pub fn new(backends: Backends, notifier: Notifier) -> Self {
        Self {
            producers: Producers::new(backends.archiver, backends.dumper),
            retention: RetentionEnforcer::new(),
            replicator: Replicator::new(backends.syncer),
            notifier,
            stage_timeout: None,
        }
    }

    /// Production applies the limit inside the producer so that an expired
    /// production still removes its reserved artifact.
    pub fn with_stage_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.producers = self.producers.with_deadline(timeout);
        self.stage_timeout = timeout;
        self
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    pub async fn run(&self, task: &BackupTask) -> RunResult {
        let mut result = RunResult::new(&task.label, task.kind);
        tracing::info!(task = %task.label, kind = %task.kind, "Starting backup task");

        let produced = self
            .run_stage(task, Stage::Produce, None, self.producers.produce(task))
            .await;
        if let Ok(artifact) = &produced {
            tracing::info!(task = %task.label, "Created {}", artifact.display());
        }
        self.record(task, &mut result, Stage::Produce, produced.map(|_| ()))
            .await;

        let retained = self
            .run_stage(
                task,
                Stage::Retain,
                self.stage_timeout,
                self.retention.enforce(&task.store_path, task.max_backups),
            )
            .await;
        if let Ok(report) = &retained {
            tracing::info!(
                task = %task.label,
                "Retention kept {} and removed {} entries ({} could not be removed)",
                report.kept,
                report.removed.len(),
                report.failed.len()
            );
        }
        self.record(task, &mut result, Stage::Retain, retained.map(|_| ()))
            .await;

        match &task.remote_destination {
            Some(remote) => {
                let replicated = self
                    .run_stage(
                        task,
                        Stage::Replicate,
                        self.stage_timeout,
                        self.replicator.replicate(&task.store_path, remote),
                    )
                    .await;
                self.record(task, &mut result, Stage::Replicate, replicated)
                    .await;
            }
            None => {
                tracing::debug!(task = %task.label, "No remote destination, skipping replication");
                result.set(Stage::Replicate, StageOutcome::Skipped);
            }
        }

        if result.is_success() {
            tracing::info!(task = %task.label, "Backup task finished");
        } else {
            tracing::error!(
                task = %task.label,
                failures = result.failure_count(),
                "Backup task finished with failures"
            );
        }

        result
    }

    async fn run_stage<T, F>(
        &self,
        task: &BackupTask,
        stage: Stage,
        limit: Option<Duration>,
        fut: F,
    ) -> Result<T, StageError>
    where
        F: Future<Output = autobackup_core::Result<T>>,
    {
        tracing::debug!(task = %task.label, stage = %stage, "Stage started");

        let outcome = match limit {
            Some(limit) => match tokio::time::timeout(limit, fut).await {
                Ok(outcome) => outcome,
                Err(_) => Err(Error::Timeout(limit)),
            },
            None => fut.await,
        };

        outcome.map_err(|e| StageError::new(stage, &task.label, e))
    }

    async fn record(
        &self,
        task: &BackupTask,
        result: &mut RunResult,
        stage: Stage,
        outcome: Result<(), StageError>,
    ) {
        match outcome {
            Ok(()) => result.set(stage, StageOutcome::Succeeded),
            Err(err) => {
                tracing::error!(task = %task.label, stage = %stage, "{}", err);

                let event = NotificationEvent::new(
                    &task.label,
                    task.kind,
                    stage,
                    err.source.to_string(),
                );
                self.notifier.notify(&event).await;
                result.set(stage, StageOutcome::Failed(err.source.to_string()));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::path::Path;

    struct SlowSync;

    #[async_trait]
    impl SyncRunner for SlowSync {
        async fn sync(&self, _local: &Path, _remote: &str) -> autobackup_core::Result<()> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(())
        }
    }

    struct NoopArchiver;

    #[async_trait]
    impl Archiver for NoopArchiver {
        async fn archive(&self, _source: &Path, _dest: &Path) -> autobackup_core::Result<()> {
            Ok(())
        }
    }

    struct NoopDump;

    #[async_trait]
    impl DumpRunner for NoopDump {
        async fn run_dump(&self, _database: &str) -> autobackup_core::Result<Vec<u8>> {
            Ok(b"--".to_vec())
        }
    }

    fn runner() -> TaskRunner {
        TaskRunner::new(
            Backends {
                archiver: Arc::new(NoopArchiver),
                dumper: Arc::new(NoopDump),
                syncer: Arc::new(SlowSync),
            },
            Notifier::disabled(),
        )
    }

    #[tokio::test]
    async fn test_stage_timeout_fails_stage() {
        let dir = tempfile::tempdir().unwrap();
        let task = BackupTask::new(autobackup_core::TaskKind::Database, "shop", "shop", dir.path(), 2)
            .with_remote("remote:shop");

        let result = runner()
            .with_stage_timeout(Some(Duration::from_millis(500)))
            .run(&task)
            .await;

        assert_eq!(result.produce, StageOutcome::Succeeded);
        assert_eq!(result.retain, StageOutcome::Succeeded);
        assert!(matches!(&result.replicate, StageOutcome::Failed(msg) if msg.contains("Timed out")));
    }

    #[tokio::test]
    async fn test_missing_remote_skips_replication() {
        let dir = tempfile::tempdir().unwrap();
        let task = BackupTask::new(autobackup_core::TaskKind::Website, "blog", "/srv/blog", dir.path(), 2);

        let result = runner().run(&task).await;

        assert_eq!(result.replicate, StageOutcome::Skipped);
        assert!(result.is_success());
    }
}
