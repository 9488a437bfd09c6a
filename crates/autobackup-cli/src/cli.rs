use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "autobackup")]
#[command(about = "Scheduled backups with retention, remote sync and failure alerts", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short = 'c', long = "config", env = "AUTOBACKUP_CONFIG")]
    pub config: PathBuf,
}
