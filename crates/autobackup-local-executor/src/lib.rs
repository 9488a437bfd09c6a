mod archiver;
mod dump;
mod error;
mod process;
mod sync;

pub use archiver::{create_zip, ZipArchiver};
pub use dump::CommandDumpRunner;
pub use error::{LocalExecutorError, Result};
pub use process::{run_command, CommandOutput, CommandSpec};
pub use sync::CommandSyncRunner;
