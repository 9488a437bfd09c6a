use async_trait::async_trait;
use autobackup_core::{Archiver, BackupTask, DumpRunner, Error, Result, TaskKind};
use chrono::{DateTime, Local};
use std::future::Future;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::fs;

/// Upper bound on `-N` suffixes tried when a same-second artifact exists.
const MAX_NAME_SUFFIX: u32 = 1000;

/// Turns one task's source into one timestamped artifact in its store.
#[async_trait]
pub trait ArtifactProducer: Send + Sync {
    async fn produce(&self, task: &BackupTask) -> Result<PathBuf>;
}

/// Website and config-directory tasks: zip the source tree.
pub struct ArchiveProducer {
    archiver: Arc<dyn Archiver>,
    deadline: Option<Duration>,
}

impl ArchiveProducer {
    pub fn new(archiver: Arc<dyn Archiver>) -> Self {
        Self {
            archiver,
            deadline: None,
        }
    }

    pub fn with_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.deadline = deadline;
        self
    }
}

#[async_trait]
impl ArtifactProducer for ArchiveProducer {
    async fn produce(&self, task: &BackupTask) -> Result<PathBuf> {
        let artifact = reserve_artifact(task, Local::now()).await?;

        let archiving = self.archiver.archive(task.source_path(), &artifact);
        let archived = within(self.deadline, archiving).await;

        match archived {
            Ok(()) => Ok(artifact),
            Err(e) => {
                discard_partial(&artifact).await;
                Err(e)
            }
        }
    }
}

/// Database tasks: write the dump tool's stdout into the artifact.
pub struct DumpProducer {
    dumper: Arc<dyn DumpRunner>,
    deadline: Option<Duration>,
}

impl DumpProducer {
    pub fn new(dumper: Arc<dyn DumpRunner>) -> Self {
        Self {
            dumper,
            deadline: None,
        }
    }

    pub fn with_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.deadline = deadline;
        self
    }
}

#[async_trait]
impl ArtifactProducer for DumpProducer {
    async fn produce(&self, task: &BackupTask) -> Result<PathBuf> {
        let artifact = reserve_artifact(task, Local::now()).await?;

        let written = match within(self.deadline, self.dumper.run_dump(&task.source)).await {
            Ok(bytes) => fs::write(&artifact, bytes).await.map_err(Error::from),
            Err(e) => Err(e),
        };

        match written {
            Ok(()) => Ok(artifact),
            Err(e) => {
                discard_partial(&artifact).await;
                Err(e)
            }
        }
    }
}

/// Picks the producer variant for a task kind.
pub struct Producers {
    archive: ArchiveProducer,
    dump: DumpProducer,
}

impl Producers {
    pub fn new(archiver: Arc<dyn Archiver>, dumper: Arc<dyn DumpRunner>) -> Self {
        Self {
            archive: ArchiveProducer::new(archiver),
            dump: DumpProducer::new(dumper),
        }
    }

    /// Bound the backend call of every production. An expired deadline is a
    /// failed production and its reserved artifact is removed.
    pub fn with_deadline(self, deadline: Option<Duration>) -> Self {
        Self {
            archive: self.archive.with_deadline(deadline),
            dump: self.dump.with_deadline(deadline),
        }
    }

    pub fn for_kind(&self, kind: TaskKind) -> &dyn ArtifactProducer {
        match kind {
            TaskKind::Website | TaskKind::ConfigDir => &self.archive,
            TaskKind::Database => &self.dump,
        }
    }

    pub async fn produce(&self, task: &BackupTask) -> Result<PathBuf> {
        self.for_kind(task.kind).produce(task).await
    }
}

/// Create the (empty) artifact file so that concurrent or same-second runs
/// never share a name.
pub async fn reserve_artifact(task: &BackupTask, now: DateTime<Local>) -> Result<PathBuf> {
    fs::create_dir_all(&task.store_path).await?;

    for suffix in 0..MAX_NAME_SUFFIX {
        let name = if suffix == 0 {
            task.artifact_file_name(now)
        } else {
            task.artifact_file_name_with_suffix(now, suffix)
        };
        let path = task.artifact_path(&name);

        match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(_) => return Ok(path),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(e.into()),
        }
    }

    Err(Error::Other(anyhow::anyhow!(
        "no free artifact name for {} in {}",
        task.label,
        task.store_path.display()
    )))
}

async fn within<T, F>(deadline: Option<Duration>, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match deadline {
        Some(limit) => tokio::time::timeout(limit, fut)
            .await
            .unwrap_or(Err(Error::Timeout(limit))),
        None => fut.await,
    }
}

async fn discard_partial(path: &Path) {
    match fs::remove_file(path).await {
        Ok(()) => tracing::debug!("Removed partial artifact {}", path.display()),
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => tracing::warn!("Could not remove partial artifact {}: {}", path.display(), e),
    }
}
