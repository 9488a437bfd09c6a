use anyhow::{Context, Result};
use std::process::ExitCode;
use std::sync::Arc;

use crate::cli::Cli;
use autobackup_core::{Config, TelegramConfig};
use autobackup_engine::{Backends, BatchReport, Dispatcher, Notifier, TaskRunner};
use autobackup_local_executor::{CommandDumpRunner, CommandSyncRunner, ZipArchiver};
use autobackup_telegram::TelegramClient;

/// Load the config, run every task once and report the batch outcome.
pub async fn run(cli: Cli) -> Result<ExitCode> {
    let config = Config::load(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;

    let backends = Backends {
        archiver: Arc::new(ZipArchiver::new()),
        dumper: Arc::new(CommandDumpRunner::new(&config.runtime.dump_command)?),
        syncer: Arc::new(CommandSyncRunner::new(&config.runtime.sync_command)?),
    };
    let notifier = build_notifier(&config.telegram).await;

    let runner = TaskRunner::new(backends, notifier)
        .with_stage_timeout(config.runtime.stage_timeout());
    let dispatcher =
        Dispatcher::new(Arc::new(runner)).with_max_concurrent(config.runtime.max_concurrent);

    let report = dispatcher.dispatch_config(&config).await;
    log_summary(&report);

    if batch_failed(&report, config.runtime.fail_on_error) {
        Ok(ExitCode::FAILURE)
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

/// Build the failure notifier. Any problem with the bot leaves a log-only
/// notifier in place instead of stopping the run.
pub async fn build_notifier(telegram: &TelegramConfig) -> Notifier {
    if !telegram.enable {
        tracing::info!("Telegram notifications disabled");
        return Notifier::disabled();
    }

    let client = match TelegramClient::new(telegram.bot_token.clone()) {
        Ok(client) => client,
        Err(e) => {
            tracing::warn!("Cannot create Telegram client, notifications are log-only: {}", e);
            return Notifier::disabled();
        }
    };

    match client.get_me().await {
        Ok(bot) => {
            tracing::info!(
                "Telegram notifications enabled via @{}",
                bot.username.as_deref().unwrap_or(&bot.first_name)
            );
            Notifier::new(Arc::new(client), telegram.chat_id)
        }
        Err(e) => {
            tracing::warn!("Telegram bot rejected, notifications are log-only: {}", e);
            Notifier::disabled()
        }
    }
}

fn log_summary(report: &BatchReport) {
    for result in &report.results {
        if result.is_success() {
            tracing::info!(
                "{} {}: ok (replicate: {:?})",
                result.kind,
                result.label,
                result.replicate
            );
        } else {
            tracing::warn!(
                "{} {}: produce={:?} retain={:?} replicate={:?}",
                result.kind,
                result.label,
                result.produce,
                result.retain,
                result.replicate
            );
        }
    }
}

/// Failures only change the exit status when the config opts in.
fn batch_failed(report: &BatchReport, fail_on_error: bool) -> bool {
    fail_on_error && report.has_failures()
}

#[cfg(test)]
mod tests {
    use super::*;
    use autobackup_core::{RunResult, Stage, StageOutcome, TaskKind};

    fn failed_report() -> BatchReport {
        let mut result = RunResult::new("shop", TaskKind::Database);
        result.set(Stage::Produce, StageOutcome::Failed("exit code 2".to_string()));
        BatchReport {
            results: vec![result],
            aborted: 0,
        }
    }

    #[test]
    fn test_exit_code_policy() {
        assert!(!batch_failed(&failed_report(), false));
        assert!(batch_failed(&failed_report(), true));
        assert!(!batch_failed(&BatchReport::default(), true));
    }

    #[tokio::test]
    async fn test_disabled_telegram() {
        let notifier = build_notifier(&TelegramConfig::default()).await;
        assert!(!notifier.is_enabled());
    }

    #[tokio::test]
    async fn test_invalid_token_degrades_to_log_only() {
        let telegram = TelegramConfig {
            bot_token: "not-a-token".to_string(),
            chat_id: 1,
            enable: true,
        };
        let notifier = build_notifier(&telegram).await;
        assert!(!notifier.is_enabled());
    }

    #[tokio::test]
    async fn test_empty_token_degrades_to_log_only() {
        let telegram = TelegramConfig {
            bot_token: String::new(),
            chat_id: 1,
            enable: true,
        };
        let notifier = build_notifier(&telegram).await;
        assert!(!notifier.is_enabled());
    }
}
