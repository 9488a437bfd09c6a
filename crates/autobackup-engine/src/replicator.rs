use autobackup_core::{Result, SyncRunner};
use std::path::Path;
use std::sync::Arc;

/// Mirrors a store directory to its remote. Every call is a full sync.
#[derive(Clone)]
pub struct Replicator {
    syncer: Arc<dyn SyncRunner>,
}

impl Replicator {
    pub fn new(syncer: Arc<dyn SyncRunner>) -> Self {
        Self { syncer }
    }

    pub async fn replicate(&self, store: &Path, remote: &str) -> Result<()> {
        tracing::info!("Replicating {} to {}", store.display(), remote);
        self.syncer.sync(store, remote).await?;
        tracing::debug!("Replication of {} finished", store.display());
        Ok(())
    }
}
