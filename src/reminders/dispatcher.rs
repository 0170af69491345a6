use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::notifier::Notifier;
use crate::error::PersistenceError;
use crate::store::{ReminderStore, ReminderTx};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub processed: usize,
    pub failed: usize,
    pub swept_at: DateTime<Utc>,
}

/// Deliver every due, undelivered reminder and mark it delivered.
///
/// Each reminder is claimed, delivered, marked and committed in its own
/// transaction, so concurrent sweeps never pick the same reminder and a
/// failure only concerns the reminder at hand. A reminder whose delivery or
/// mark fails stays pending for the next sweep and is not retried within this
/// one. A crash after delivery but before commit redelivers that reminder
/// next time: at-least-once, not exactly-once.
pub async fn sweep_due<S, N>(
    store: &S,
    notifier: &N,
    now: DateTime<Utc>,
) -> Result<SweepReport, PersistenceError>
where
    S: ReminderStore,
    N: Notifier,
{
    let mut processed = 0;
    let mut failed: Vec<Uuid> = Vec::new();

    loop {
        let mut tx = store.begin().await?;
        let Some(reminder) = tx.select_due_undelivered(now, &failed, 1).await?.pop() else {
            break;
        };

        if let Err(err) = notifier.deliver(&reminder).await {
            tracing::warn!(reminder_id = %reminder.id, "⚠️ {}", err);
            failed.push(reminder.id);
            continue;
        }

        let marked = match tx.mark_delivered(reminder.id).await {
            Ok(()) => tx.commit().await,
            Err(err) => Err(err),
        };
        match marked {
            Ok(()) => processed += 1,
            Err(err) => {
                tracing::error!(reminder_id = %reminder.id, "❌ Delivered but not marked: {}", err);
                failed.push(reminder.id);
            }
        }
    }

    if processed + failed.len() > 0 {
        tracing::info!("Processed {} notifications ({} failed)", processed, failed.len());
    }

    Ok(SweepReport { processed, failed: failed.len(), swept_at: now })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NotifyError;
    use crate::models::{Reminder, ReminderKind};
    use crate::reminders::notifier::LogNotifier;
    use crate::store::MemoryStore;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use std::sync::Mutex;
    use uuid::Uuid;

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, day, 0, 0, 0).unwrap()
    }

    fn pending(user_id: Uuid, kind: ReminderKind, scheduled_at: DateTime<Utc>) -> Reminder {
        Reminder {
            id: Uuid::new_v4(),
            user_id,
            kind,
            message: "test".into(),
            scheduled_at,
            delivered: false,
            created_at: at(1),
        }
    }

    async fn seed(store: &MemoryStore, reminders: &[Reminder]) {
        let mut tx = store.begin().await.unwrap();
        for r in reminders {
            tx.insert(r).await.unwrap();
        }
        tx.commit().await.unwrap();
    }

    /// Records what it was asked to deliver; fails for one id.
    #[derive(Default)]
    struct Recording {
        seen: Mutex<Vec<Uuid>>,
        reject: Option<Uuid>,
    }

    #[async_trait]
    impl Notifier for Recording {
        async fn deliver(&self, reminder: &Reminder) -> Result<(), NotifyError> {
            self.seen.lock().unwrap().push(reminder.id);
            if Some(reminder.id) == self.reject {
                return Err(NotifyError("channel closed".into()));
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn delivers_only_due_reminders_once() {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();
        let due = pending(user, ReminderKind::PeriodReminder, at(10));
        let later = pending(user, ReminderKind::OvulationReminder, at(20));
        seed(&store, &[due.clone(), later.clone()]).await;

        let notifier = Recording::default();
        let report = sweep_due(&store, &notifier, at(10)).await.unwrap();
        assert_eq!(report.processed, 1);
        assert_eq!(report.failed, 0);

        let again = sweep_due(&store, &notifier, at(15)).await.unwrap();
        assert_eq!(again.processed, 0);
        assert_eq!(*notifier.seen.lock().unwrap(), vec![due.id]);

        let rows = store.reminders_for(user).await;
        assert!(rows.iter().find(|r| r.id == due.id).unwrap().delivered);
        assert!(!rows.iter().find(|r| r.id == later.id).unwrap().delivered);
    }

    #[tokio::test]
    async fn failed_delivery_stays_pending() {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();
        let ok = pending(user, ReminderKind::PeriodReminder, at(5));
        let bad = pending(user, ReminderKind::OvulationReminder, at(6));
        seed(&store, &[ok.clone(), bad.clone()]).await;

        let notifier = Recording { reject: Some(bad.id), ..Default::default() };
        let report = sweep_due(&store, &notifier, at(7)).await.unwrap();
        assert_eq!((report.processed, report.failed), (1, 1));

        let retry = sweep_due(&store, &LogNotifier, at(7)).await.unwrap();
        assert_eq!(retry.processed, 1);
        assert!(store.list_pending(user).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn mark_failure_keeps_earlier_deliveries() {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();
        let first = pending(user, ReminderKind::PeriodReminder, at(5));
        let second = pending(user, ReminderKind::OvulationReminder, at(6));
        let third = pending(user, ReminderKind::PeriodReminder, at(7));
        seed(&store, &[first.clone(), second.clone(), third.clone()]).await;

        store.fail_marks(&[second.id]);
        let notifier = Recording::default();
        let report = sweep_due(&store, &notifier, at(8)).await.unwrap();
        assert_eq!((report.processed, report.failed), (2, 1));
        assert_eq!(*notifier.seen.lock().unwrap(), vec![first.id, second.id, third.id]);

        store.fail_marks(&[]);
        let retry = Recording::default();
        let report = sweep_due(&store, &retry, at(8)).await.unwrap();
        assert_eq!((report.processed, report.failed), (1, 0));
        assert_eq!(*retry.seen.lock().unwrap(), vec![second.id]);
        assert!(store.list_pending(user).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn concurrent_sweeps_deliver_each_reminder_once() {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();
        let rows: Vec<Reminder> =
            (1..=5).map(|day| pending(user, ReminderKind::PeriodReminder, at(day))).collect();
        seed(&store, &rows).await;

        let a = store.clone();
        let b = store.clone();
        let (ra, rb) = tokio::join!(
            async move { sweep_due(&a, &LogNotifier, at(9)).await.unwrap() },
            async move { sweep_due(&b, &LogNotifier, at(9)).await.unwrap() },
        );
        assert_eq!(ra.processed + rb.processed, 5);
    }
}
