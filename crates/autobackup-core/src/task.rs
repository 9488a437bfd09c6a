use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Timestamp layout embedded in artifact file names (second resolution).
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d-%H%M%S";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskKind {
    Website,
    Database,
    ConfigDir,
}

impl TaskKind {
    /// File extension of the artifacts this kind produces.
    pub fn extension(&self) -> &'static str {
        match self {
            TaskKind::Website | TaskKind::ConfigDir => "zip",
            TaskKind::Database => "sql",
        }
    }

    /// Prefix used in failure notifications for the produce stage.
    pub fn backup_title(&self) -> &'static str {
        match self {
            TaskKind::Website => "Website Backup",
            TaskKind::Database => "Database Backup",
            TaskKind::ConfigDir => "Config Backup",
        }
    }
}

impl std::fmt::Display for TaskKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskKind::Website => write!(f, "website"),
            TaskKind::Database => write!(f, "database"),
            TaskKind::ConfigDir => write!(f, "config"),
        }
    }
}

/// One configured unit of backup work. Immutable once built from the config.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupTask {
    pub kind: TaskKind,
    pub label: String,
    /// Directory to archive, or the database identifier for `Database` tasks.
    pub source: String,
    pub store_path: PathBuf,
    pub max_backups: usize,
    pub remote_destination: Option<String>,
}

impl BackupTask {
    pub fn new(
        kind: TaskKind,
        label: impl Into<String>,
        source: impl Into<String>,
        store_path: impl Into<PathBuf>,
        max_backups: usize,
    ) -> Self {
        Self {
            kind,
            label: label.into(),
            source: source.into(),
            store_path: store_path.into(),
            max_backups,
            remote_destination: None,
        }
    }

    pub fn with_remote(mut self, remote: impl Into<String>) -> Self {
        let remote = remote.into();
        self.remote_destination = if remote.trim().is_empty() {
            None
        } else {
            Some(remote)
        };
        self
    }

    /// `<label>-<timestamp>.<ext>` for an artifact created at `now`.
    pub fn artifact_file_name(&self, now: DateTime<Local>) -> String {
        format!(
            "{}-{}.{}",
            self.label,
            now.format(TIMESTAMP_FORMAT),
            self.kind.extension()
        )
    }

    /// Same as [`artifact_file_name`](Self::artifact_file_name) with a
    /// numeric suffix, used when a same-second artifact already exists.
    pub fn artifact_file_name_with_suffix(&self, now: DateTime<Local>, suffix: u32) -> String {
        format!(
            "{}-{}-{}.{}",
            self.label,
            now.format(TIMESTAMP_FORMAT),
            suffix,
            self.kind.extension()
        )
    }

    pub fn artifact_path(&self, file_name: &str) -> PathBuf {
        self.store_path.join(file_name)
    }

    pub fn source_path(&self) -> &Path {
        Path::new(&self.source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_time() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap()
    }

    #[test]
    fn test_artifact_file_name() {
        let task = BackupTask::new(TaskKind::Website, "blog", "/srv/blog", "/backup/blog", 3);
        assert_eq!(task.artifact_file_name(fixed_time()), "blog-20240309-070501.zip");

        let db = BackupTask::new(TaskKind::Database, "shop", "shop", "/backup/shop", 3);
        assert_eq!(db.artifact_file_name(fixed_time()), "shop-20240309-070501.sql");
    }

    #[test]
    fn test_artifact_file_name_with_suffix() {
        let task = BackupTask::new(TaskKind::ConfigDir, "nginx", "/etc/nginx", "/backup/nginx", 3);
        assert_eq!(
            task.artifact_file_name_with_suffix(fixed_time(), 2),
            "nginx-20240309-070501-2.zip"
        );
    }

    #[test]
    fn test_blank_remote_is_none() {
        let task = BackupTask::new(TaskKind::Website, "blog", "/srv/blog", "/backup/blog", 3)
            .with_remote("  ");
        assert!(task.remote_destination.is_none());

        let task = task.with_remote("onedrive:backup/blog");
        assert_eq!(task.remote_destination.as_deref(), Some("onedrive:backup/blog"));
    }

    #[test]
    fn test_kind_titles() {
        assert_eq!(TaskKind::Website.backup_title(), "Website Backup");
        assert_eq!(TaskKind::Database.backup_title(), "Database Backup");
        assert_eq!(TaskKind::ConfigDir.backup_title(), "Config Backup");
        assert_eq!(TaskKind::ConfigDir.to_string(), "config");
    }
}
