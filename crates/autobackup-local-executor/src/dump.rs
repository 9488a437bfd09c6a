use crate::error::Result;
use crate::process::{run_command, CommandSpec};
use async_trait::async_trait;
use autobackup_core::DumpRunner;
use tracing::{info, warn};

/// Dumps a database by running `<command> <database>` and capturing stdout.
#[derive(Debug, Clone)]
pub struct CommandDumpRunner {
    spec: CommandSpec,
}

impl CommandDumpRunner {
    pub fn new(command: &str) -> Result<Self> {
        Ok(Self {
            spec: CommandSpec::parse(command)?,
        })
    }

    pub fn mysqldump() -> Self {
        Self {
            spec: CommandSpec {
                program: "mysqldump".to_string(),
                args: Vec::new(),
            },
        }
    }

    pub fn program(&self) -> &str {
        &self.spec.program
    }
}

#[async_trait]
impl DumpRunner for CommandDumpRunner {
    async fn run_dump(&self, database: &str) -> autobackup_core::Result<Vec<u8>> {
        info!("Dumping database {} with {}", database, self.spec.program);

        let output = run_command(&self.spec, [database]).await?;
        if !output.stderr.is_empty() {
            warn!("{} reported for {}: {}", self.spec.program, database, output.stderr);
        }

        Ok(output.stdout)
    }
}
