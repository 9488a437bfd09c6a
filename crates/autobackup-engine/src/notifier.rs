use autobackup_core::{MessageSink, NotificationEvent};
use std::sync::Arc;

/// Sends failure reports to one configured recipient.
///
/// Delivery problems are logged and swallowed: reporting must never change
/// the outcome of the task being reported on. A disabled notifier only
/// logs the event.
#[derive(Clone)]
pub struct Notifier {
    sink: Option<Arc<dyn MessageSink>>,
    recipient: i64,
}

impl Notifier {
    pub fn new(sink: Arc<dyn MessageSink>, recipient: i64) -> Self {
        Self {
            sink: Some(sink),
            recipient,
        }
    }

    pub fn disabled() -> Self {
        Self {
            sink: None,
            recipient: 0,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.sink.is_some()
    }

    pub async fn notify(&self, event: &NotificationEvent) {
        let text = event.text();

        let Some(sink) = &self.sink else {
            tracing::warn!(task = %event.label, stage = %event.stage, "Notification (not sent): {}", text);
            return;
        };

        match sink.send(self.recipient, &text).await {
            Ok(()) => {
                tracing::debug!(task = %event.label, stage = %event.stage, "Notification delivered");
            }
            Err(e) => {
                tracing::warn!(
                    task = %event.label,
                    stage = %event.stage,
                    "Failed to deliver notification: {}",
                    e
                );
            }
        }
    }
}

impl std::fmt::Debug for Notifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Notifier")
            .field("enabled", &self.is_enabled())
            .field("recipient", &self.recipient)
            .finish()
    }
}
