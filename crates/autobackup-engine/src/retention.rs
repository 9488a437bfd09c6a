use autobackup_core::{Error, Result};
use std::ffi::OsString;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// What one retention pass did to a store directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetentionReport {
    pub kept: usize,
    pub removed: Vec<PathBuf>,
    /// Entries selected for removal that could not be deleted.
    pub failed: Vec<PathBuf>,
}

/// Keeps at most `max_backups` entries in a store directory, newest first.
#[derive(Debug, Clone, Copy, Default)]
pub struct RetentionEnforcer;

impl RetentionEnforcer {
    pub fn new() -> Self {
        Self
    }

    pub async fn enforce(&self, store: &Path, max_backups: usize) -> Result<RetentionReport> {
        let store = store.to_path_buf();
        tokio::task::spawn_blocking(move || enforce(&store, max_backups))
            .await
            .map_err(|e| Error::Other(anyhow::anyhow!("retention worker failed: {}", e)))?
    }
}

struct StoreEntry {
    modified: SystemTime,
    name: OsString,
    path: PathBuf,
    is_dir: bool,
}

/// Delete the oldest entries of `store` until at most `max_backups` remain.
///
/// Entries are ordered by modification time, ties broken by file name. Only
/// a failure to list the directory is an error; individual deletions are
/// best effort and reported in [`RetentionReport::failed`]. A missing store
/// is treated as empty.
pub fn enforce(store: &Path, max_backups: usize) -> Result<RetentionReport> {
    let mut entries = match list_entries(store) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::debug!("Store {} does not exist, nothing to prune", store.display());
            return Ok(RetentionReport::default());
        }
        Err(e) => return Err(e.into()),
    };

    if entries.len() <= max_backups {
        return Ok(RetentionReport {
            kept: entries.len(),
            ..Default::default()
        });
    }

    entries.sort_by(|a, b| a.modified.cmp(&b.modified).then_with(|| a.name.cmp(&b.name)));

    let excess = entries.len() - max_backups;
    let mut report = RetentionReport {
        kept: max_backups,
        ..Default::default()
    };

    for entry in entries.into_iter().take(excess) {
        let removed = if entry.is_dir {
            fs::remove_dir_all(&entry.path)
        } else {
            fs::remove_file(&entry.path)
        };

        match removed {
            Ok(()) => {
                tracing::info!("Removed old backup {}", entry.path.display());
                report.removed.push(entry.path);
            }
            Err(e) => {
                tracing::warn!("Failed to remove old backup {}: {}", entry.path.display(), e);
                report.failed.push(entry.path);
            }
        }
    }

    Ok(report)
}

fn list_entries(store: &Path) -> std::io::Result<Vec<StoreEntry>> {
    let mut entries = Vec::new();

    for entry in fs::read_dir(store)? {
        let entry = entry?;
        // symlink_metadata: a link is pruned as itself, never followed
        let metadata = match entry.path().symlink_metadata() {
            Ok(m) => m,
            Err(e) => {
                tracing::warn!("Skipping {}: {}", entry.path().display(), e);
                continue;
            }
        };

        entries.push(StoreEntry {
            modified: metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH),
            name: entry.file_name(),
            path: entry.path(),
            is_dir: metadata.is_dir(),
        });
    }

    Ok(entries)
}
