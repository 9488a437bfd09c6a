use crate::TaskKind;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Stage {
    Produce,
    Retain,
    Replicate,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Produce => write!(f, "produce"),
            Stage::Retain => write!(f, "retain"),
            Stage::Replicate => write!(f, "replicate"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum StageOutcome {
    Succeeded,
    Failed(String),
    Skipped,
}

impl StageOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, StageOutcome::Failed(_))
    }
}

/// A failure worth telling the operator about. Built where the failure is
/// observed and consumed right away by the notifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationEvent {
    pub label: String,
    pub kind: TaskKind,
    pub stage: Stage,
    pub message: String,
}

impl NotificationEvent {
    pub fn new(label: impl Into<String>, kind: TaskKind, stage: Stage, message: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            kind,
            stage,
            message: message.into(),
        }
    }

    /// Human readable text sent to the sink.
    pub fn text(&self) -> String {
        let title = match self.stage {
            Stage::Produce => self.kind.backup_title(),
            Stage::Retain => "Retention",
            Stage::Replicate => "Copy to remote",
        };
        format!("{} FAILED: {}\n{}", title, self.label, self.message)
    }
}

/// Stage outcomes of one task execution.
#[derive(Debug, Clone, Serialize)]
pub struct RunResult {
    pub label: String,
    pub kind: TaskKind,
    pub produce: StageOutcome,
    pub retain: StageOutcome,
    pub replicate: StageOutcome,
}

impl RunResult {
    pub fn new(label: impl Into<String>, kind: TaskKind) -> Self {
        Self {
            label: label.into(),
            kind,
            produce: StageOutcome::Skipped,
            retain: StageOutcome::Skipped,
            replicate: StageOutcome::Skipped,
        }
    }

    pub fn outcome(&self, stage: Stage) -> &StageOutcome {
        match stage {
            Stage::Produce => &self.produce,
            Stage::Retain => &self.retain,
            Stage::Replicate => &self.replicate,
        }
    }

    pub fn set(&mut self, stage: Stage, outcome: StageOutcome) {
        match stage {
            Stage::Produce => self.produce = outcome,
            Stage::Retain => self.retain = outcome,
            Stage::Replicate => self.replicate = outcome,
        }
    }

    pub fn failure_count(&self) -> usize {
        [&self.produce, &self.retain, &self.replicate]
            .iter()
            .filter(|o| o.is_failed())
            .count()
    }

    pub fn is_success(&self) -> bool {
        self.failure_count() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notification_text() {
        let event = NotificationEvent::new("shop", TaskKind::Database, Stage::Produce, "exit code 2");
        assert_eq!(event.text(), "Database Backup FAILED: shop\nexit code 2");

        let event = NotificationEvent::new("blog", TaskKind::Website, Stage::Replicate, "boom");
        assert!(event.text().starts_with("Copy to remote FAILED: blog"));

        let event = NotificationEvent::new("nginx", TaskKind::ConfigDir, Stage::Retain, "denied");
        assert!(event.text().starts_with("Retention FAILED: nginx"));
    }

    #[test]
    fn test_run_result_counts_failures() {
        let mut result = RunResult::new("blog", TaskKind::Website);
        assert!(result.is_success());

        result.set(Stage::Produce, StageOutcome::Failed("missing".to_string()));
        result.set(Stage::Retain, StageOutcome::Succeeded);
        result.set(Stage::Replicate, StageOutcome::Failed("offline".to_string()));

        assert_eq!(result.failure_count(), 2);
        assert!(!result.is_success());
        assert_eq!(result.outcome(Stage::Retain), &StageOutcome::Succeeded);
    }
}
