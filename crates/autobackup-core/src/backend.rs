//! Interfaces of the external collaborators the backup pipeline drives.
//!
//! The engine only talks to these traits; concrete implementations (zip,
//! `mysqldump`, `rclone`, Telegram) live in their own crates.

use crate::Result;
use async_trait::async_trait;
use std::path::Path;

/// Packs a directory tree into one compressed container file.
#[async_trait]
pub trait Archiver: Send + Sync {
    /// Archive `source_dir` into `dest_file`. The archive is rooted at the
    /// base name of `source_dir`. Any traversal error aborts the archive.
    /// `dest_file` has already been reserved by the caller.
    async fn archive(&self, source_dir: &Path, dest_file: &Path) -> Result<()>;
}

/// Runs an external database dump and hands back its standard output.
#[async_trait]
pub trait DumpRunner: Send + Sync {
    async fn run_dump(&self, database: &str) -> Result<Vec<u8>>;
}

/// One-way mirror of a local directory to a remote destination.
#[async_trait]
pub trait SyncRunner: Send + Sync {
    async fn sync(&self, local_dir: &Path, remote: &str) -> Result<()>;
}

/// Delivers a plain-text notification to a recipient.
#[async_trait]
pub trait MessageSink: Send + Sync {
    async fn send(&self, recipient: i64, text: &str) -> Result<()>;
}
