use crate::{BackupTask, Error, Result, TaskKind};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Environment variable that overrides `telegram.BotToken`.
pub const BOT_TOKEN_ENV: &str = "AUTOBACKUP_BOT_TOKEN";

const DEFAULT_DUMP_COMMAND: &str = "mysqldump";
const DEFAULT_SYNC_COMMAND: &str = "rclone";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub telegram: TelegramConfig,

    #[serde(rename = "WebsiteTasks", alias = "websiteTasks", default)]
    pub website_tasks: Vec<TaskEntry>,

    #[serde(rename = "DatabaseTasks", alias = "databaseTasks", default)]
    pub database_tasks: Vec<TaskEntry>,

    #[serde(rename = "ConfigTasks", alias = "configTasks", default)]
    pub config_tasks: Vec<TaskEntry>,

    #[serde(rename = "Runtime", alias = "runtime", default)]
    pub runtime: RuntimeConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TelegramConfig {
    #[serde(rename = "BotToken", alias = "botToken", default)]
    pub bot_token: String,

    #[serde(rename = "ChatID", alias = "chatID", alias = "chatId", default)]
    pub chat_id: i64,

    #[serde(default)]
    pub enable: bool,
}

/// One task record as written in the config file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskEntry {
    #[serde(rename = "Name", alias = "name", default)]
    pub name: String,

    #[serde(rename = "Website", alias = "website", default)]
    pub website: String,

    #[serde(rename = "Database", alias = "database", default)]
    pub database: String,

    #[serde(rename = "BackupSource", alias = "backupSource", default)]
    pub backup_source: String,

    #[serde(rename = "StorePath", alias = "storePath", default)]
    pub store_path: String,

    #[serde(rename = "MaxBackup", alias = "maxBackup", default)]
    pub max_backup: i64,

    #[serde(rename = "OnedrivePath", alias = "onedrivePath", default)]
    pub onedrive_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Upper bound on simultaneously running tasks; 0 means unbounded.
    #[serde(rename = "MaxConcurrent", alias = "maxConcurrent", default)]
    pub max_concurrent: usize,

    #[serde(rename = "StageTimeoutSecs", alias = "stageTimeoutSecs", default)]
    pub stage_timeout_secs: Option<u64>,

    #[serde(rename = "DumpCommand", alias = "dumpCommand", default = "default_dump_command")]
    pub dump_command: String,

    #[serde(rename = "SyncCommand", alias = "syncCommand", default = "default_sync_command")]
    pub sync_command: String,

    #[serde(rename = "FailOnError", alias = "failOnError", default)]
    pub fail_on_error: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            max_concurrent: 0,
            stage_timeout_secs: None,
            dump_command: default_dump_command(),
            sync_command: default_sync_command(),
            fail_on_error: false,
        }
    }
}

impl RuntimeConfig {
    pub fn stage_timeout(&self) -> Option<Duration> {
        self.stage_timeout_secs.map(Duration::from_secs)
    }
}

fn default_dump_command() -> String {
    DEFAULT_DUMP_COMMAND.to_string()
}

fn default_sync_command() -> String {
    DEFAULT_SYNC_COMMAND.to_string()
}

impl Config {
    /// Read, parse and validate the config file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("cannot read config file {}: {}", path.display(), e))
        })?;

        let mut config = Self::parse(&raw)?;
        config.apply_env_overrides();
        config.validate()?;

        tracing::debug!(
            "Loaded config from {} ({} tasks)",
            path.display(),
            config.task_count()
        );

        Ok(config)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let config = Self::parse(raw)?;
        config.validate()?;
        Ok(config)
    }

    fn parse(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).map_err(|e| Error::Config(format!("cannot parse config: {}", e)))
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(token) = std::env::var(BOT_TOKEN_ENV) {
            if !token.trim().is_empty() {
                self.telegram.bot_token = token;
            }
        }
    }

    /// Reject task entries that cannot run. Telegram credentials are not
    /// checked here: a bad bot only disables notifications.
    pub fn validate(&self) -> Result<()> {
        for (kind, entries) in self.entries() {
            for (index, entry) in entries.iter().enumerate() {
                entry
                    .validate(kind)
                    .map_err(|msg| Error::Config(format!("{} task #{}: {}", kind, index + 1, msg)))?;
            }
        }

        Ok(())
    }

    pub fn task_count(&self) -> usize {
        self.website_tasks.len() + self.database_tasks.len() + self.config_tasks.len()
    }

    /// Every configured task: websites, then databases, then config dirs.
    pub fn tasks(&self) -> Vec<BackupTask> {
        self.entries()
            .into_iter()
            .flat_map(|(kind, entries)| entries.iter().map(move |e| e.to_task(kind)))
            .collect()
    }

    fn entries(&self) -> [(TaskKind, &[TaskEntry]); 3] {
        [
            (TaskKind::Website, self.website_tasks.as_slice()),
            (TaskKind::Database, self.database_tasks.as_slice()),
            (TaskKind::ConfigDir, self.config_tasks.as_slice()),
        ]
    }
}

impl TaskEntry {
    pub fn label(&self, kind: TaskKind) -> &str {
        match kind {
            TaskKind::Website => &self.website,
            TaskKind::Database => &self.database,
            TaskKind::ConfigDir => &self.name,
        }
    }

    fn validate(&self, kind: TaskKind) -> std::result::Result<(), String> {
        let field = match kind {
            TaskKind::Website => "Website",
            TaskKind::Database => "Database",
            TaskKind::ConfigDir => "Name",
        };
        let label = self.label(kind).trim();
        if label.is_empty() {
            return Err(format!("{} must not be empty", field));
        }
        // the label becomes the artifact file name inside StorePath
        if label.contains(['/', '\\']) || label == "." || label == ".." {
            return Err(format!("{} must be a plain name, got {:?}", field, label));
        }
        if self.store_path.trim().is_empty() {
            return Err("StorePath must not be empty".to_string());
        }
        if kind != TaskKind::Database && self.backup_source.trim().is_empty() {
            return Err("BackupSource must not be empty".to_string());
        }
        if self.max_backup < 0 {
            return Err(format!("MaxBackup must be >= 0, got {}", self.max_backup));
        }
        Ok(())
    }

    fn to_task(&self, kind: TaskKind) -> BackupTask {
        let source = match kind {
            TaskKind::Database => self.database.clone(),
            TaskKind::Website | TaskKind::ConfigDir => self.backup_source.clone(),
        };
        // validate() has already rejected negative values
        let max_backups = usize::try_from(self.max_backup).unwrap_or(0);

        BackupTask::new(kind, self.label(kind), source, &self.store_path, max_backups)
            .with_remote(&self.onedrive_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "telegram": { "BotToken": "123:abc", "ChatID": 42, "enable": true },
        "WebsiteTasks": [
            { "Website": "blog", "BackupSource": "/srv/blog", "StorePath": "/backup/blog",
              "MaxBackup": 7, "OnedrivePath": "onedrive:blog" }
        ],
        "DatabaseTasks": [
            { "Database": "shop", "StorePath": "/backup/shop", "MaxBackup": 3,
              "OnedrivePath": "onedrive:shop" }
        ],
        "ConfigTasks": [
            { "Name": "nginx", "BackupSource": "/etc/nginx", "StorePath": "/backup/nginx",
              "MaxBackup": 0, "OnedrivePath": "" }
        ]
    }"#;

    #[test]
    fn test_parse_pascal_case_format() {
        let config = Config::from_json(SAMPLE).unwrap();
        assert!(config.telegram.enable);
        assert_eq!(config.telegram.chat_id, 42);
        assert_eq!(config.task_count(), 3);
        assert_eq!(config.runtime.dump_command, "mysqldump");
        assert_eq!(config.runtime.sync_command, "rclone");
        assert_eq!(config.runtime.max_concurrent, 0);
        assert!(config.runtime.stage_timeout().is_none());
    }

    #[test]
    fn test_tasks_are_built_per_kind() {
        let tasks = Config::from_json(SAMPLE).unwrap().tasks();

        assert_eq!(tasks[0].kind, TaskKind::Website);
        assert_eq!(tasks[0].label, "blog");
        assert_eq!(tasks[0].source, "/srv/blog");
        assert_eq!(tasks[0].max_backups, 7);

        assert_eq!(tasks[1].kind, TaskKind::Database);
        assert_eq!(tasks[1].label, "shop");
        assert_eq!(tasks[1].source, "shop");
        assert_eq!(tasks[1].remote_destination.as_deref(), Some("onedrive:shop"));

        assert_eq!(tasks[2].kind, TaskKind::ConfigDir);
        assert_eq!(tasks[2].label, "nginx");
        assert_eq!(tasks[2].max_backups, 0);
        assert!(tasks[2].remote_destination.is_none());
    }

    #[test]
    fn test_camel_case_aliases() {
        let raw = r#"{
            "telegram": { "botToken": "1:x", "chatID": 7, "enable": false },
            "websiteTasks": [
                { "website": "w", "backupSource": "/w", "storePath": "/s", "maxBackup": 2,
                  "onedrivePath": "r:w" }
            ],
            "runtime": { "maxConcurrent": 4, "stageTimeoutSecs": 60, "failOnError": true }
        }"#;
        let config = Config::from_json(raw).unwrap();
        assert_eq!(config.telegram.chat_id, 7);
        assert_eq!(config.website_tasks.len(), 1);
        assert_eq!(config.runtime.max_concurrent, 4);
        assert_eq!(config.runtime.stage_timeout(), Some(Duration::from_secs(60)));
        assert!(config.runtime.fail_on_error);
    }

    #[test]
    fn test_negative_max_backup_rejected() {
        let raw = r#"{ "DatabaseTasks": [
            { "Database": "shop", "StorePath": "/backup/shop", "MaxBackup": -1 }
        ] }"#;
        let err = Config::from_json(raw).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains("MaxBackup"));
    }

    #[test]
    fn test_missing_label_rejected() {
        let raw = r#"{ "ConfigTasks": [
            { "BackupSource": "/etc/nginx", "StorePath": "/backup/nginx", "MaxBackup": 1 }
        ] }"#;
        let err = Config::from_json(raw).unwrap_err();
        assert!(err.to_string().contains("Name must not be empty"));
    }

    #[test]
    fn test_missing_source_rejected_for_archives() {
        let raw = r#"{ "WebsiteTasks": [
            { "Website": "blog", "StorePath": "/backup/blog", "MaxBackup": 1 }
        ] }"#;
        assert!(Config::from_json(raw).is_err());
    }

    #[test]
    fn test_enabled_telegram_without_token_still_loads() {
        let raw = r#"{ "telegram": { "BotToken": "", "ChatID": 1, "enable": true } }"#;
        let config = Config::from_json(raw).unwrap();
        assert!(config.telegram.enable);
        assert!(config.telegram.bot_token.is_empty());
    }

    #[test]
    fn test_label_with_path_separator_rejected() {
        for label in ["../escape", "a/b", "a\\b", ".."] {
            let raw = serde_json::json!({
                "DatabaseTasks": [{ "Database": label, "StorePath": "/backup/db", "MaxBackup": 1 }]
            });
            let err = Config::from_json(&raw.to_string()).unwrap_err();
            assert!(err.to_string().contains("plain name"), "{}: {}", label, err);
        }
    }

    #[test]
    fn test_unparsable_config() {
        let err = Config::from_json("{ not json").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load(dir.path().join("missing.json")).unwrap_err();
        assert!(err.to_string().contains("cannot read config file"));
    }

    #[test]
    fn test_env_token_fills_empty_file_token() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{ "telegram": { "BotToken": "", "ChatID": 5, "enable": true } }"#,
        )
        .unwrap();

        std::env::set_var(BOT_TOKEN_ENV, "123:from-env");
        let loaded = Config::load(&path);
        std::env::remove_var(BOT_TOKEN_ENV);

        let config = loaded.unwrap();
        assert_eq!(config.telegram.bot_token, "123:from-env");
        assert_eq!(config.telegram.chat_id, 5);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, SAMPLE).unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.tasks().len(), 3);
    }
}
