use crate::error::Result;
use crate::process::{run_command, CommandSpec};
use async_trait::async_trait;
use autobackup_core::SyncRunner;
use std::ffi::OsString;
use std::path::Path;
use tracing::info;

/// Mirrors a directory with `<command> sync <local> <remote>` (rclone style).
#[derive(Debug, Clone)]
pub struct CommandSyncRunner {
    spec: CommandSpec,
}

impl CommandSyncRunner {
    pub fn new(command: &str) -> Result<Self> {
        Ok(Self {
            spec: CommandSpec::parse(command)?,
        })
    }

    pub fn rclone() -> Self {
        Self {
            spec: CommandSpec {
                program: "rclone".to_string(),
                args: Vec::new(),
            },
        }
    }

    pub fn program(&self) -> &str {
        &self.spec.program
    }
}

#[async_trait]
impl SyncRunner for CommandSyncRunner {
    async fn sync(&self, local_dir: &Path, remote: &str) -> autobackup_core::Result<()> {
        info!("Syncing {:?} to {}", local_dir, remote);

        let args: [OsString; 3] = ["sync".into(), local_dir.as_os_str().to_owned(), remote.into()];
        run_command(&self.spec, args).await?;

        Ok(())
    }
}
