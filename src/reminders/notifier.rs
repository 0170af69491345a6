use async_trait::async_trait;

use crate::error::NotifyError;
use crate::models::Reminder;

/// Delivers one reminder to its user. Retries are the notifier's business.
#[async_trait]
pub trait Notifier: Send + Sync + 'static {
    async fn deliver(&self, reminder: &Reminder) -> Result<(), NotifyError>;
}

/// Delivers by logging. Stands in until a push or mail channel is wired up.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn deliver(&self, reminder: &Reminder) -> Result<(), NotifyError> {
        tracing::info!(
            user_id = %reminder.user_id,
            kind = ?reminder.kind,
            "🔔 Notification sent: {}",
            reminder.message
        );
        Ok(())
    }
}
