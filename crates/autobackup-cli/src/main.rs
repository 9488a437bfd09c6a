use anyhow::Result;
use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;
mod commands;

use cli::Cli;

const DEFAULT_LOG_FILTER: &str = "autobackup=info,autobackup_core=info,autobackup_engine=info,\
autobackup_local_executor=info,autobackup_telegram=info";

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Load environment variables
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Parse CLI arguments
    let cli = Cli::parse();

    tracing::info!("Starting autobackup with {}", cli.config.display());

    commands::run(cli).await
}
