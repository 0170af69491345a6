use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use uuid::Uuid;

use crate::error::{OvulationError, PersistenceError, PredictionError};
use crate::forecast::{OvulationPrediction, PeriodPrediction};
use crate::models::{NotificationPreferences, Reminder, ReminderKind};
use crate::store::{ReminderStore, ReminderTx};

/// The reminders implied by the forecasts and the user's preferences.
///
/// A kind whose forecast failed, or whose reminder would fall before the
/// start of the calendar, is left out. Output is sorted by kind so the
/// same inputs always produce the same set.
pub fn plan_reminders(
    user_id: Uuid,
    period: Result<&PeriodPrediction, &PredictionError>,
    ovulation: Result<&OvulationPrediction, &OvulationError>,
    prefs: &NotificationPreferences,
    now: DateTime<Utc>,
) -> Vec<Reminder> {
    let lead = prefs.reminder_days_before;
    let mut planned = Vec::with_capacity(2);

    if prefs.period_reminder {
        match period {
            Ok(p) => planned.extend(reminder(
                user_id,
                ReminderKind::PeriodReminder,
                format!("Your period is expected {}", days_phrase(lead)),
                p.predicted_date,
                lead,
                now,
            )),
            Err(err) => tracing::debug!(%user_id, "skipping period reminder: {}", err),
        }
    }

    if prefs.ovulation_reminder {
        match ovulation {
            Ok(o) => planned.extend(reminder(
                user_id,
                ReminderKind::OvulationReminder,
                format!("Ovulation is expected {}", days_phrase(lead)),
                o.ovulation_date,
                lead,
                now,
            )),
            Err(err) => tracing::debug!(%user_id, "skipping ovulation reminder: {}", err),
        }
    }

    planned.sort_by_key(|r| r.kind);
    planned
}

/// Midnight UTC, `days_before` days ahead of `target`, or `None` when that
/// day is not representable.
pub fn reminder_time(target: NaiveDate, days_before: u32) -> Option<DateTime<Utc>> {
    let date = target.checked_sub_signed(Duration::days(i64::from(days_before)))?;
    Some(Utc.from_utc_datetime(&date.and_time(NaiveTime::default())))
}

fn reminder(
    user_id: Uuid,
    kind: ReminderKind,
    message: String,
    target: NaiveDate,
    days_before: u32,
    now: DateTime<Utc>,
) -> Option<Reminder> {
    let Some(scheduled_at) = reminder_time(target, days_before) else {
        tracing::debug!(%user_id, ?kind, days_before, "skipping reminder: lead time out of range");
        return None;
    };
    Some(Reminder {
        id: Uuid::new_v4(),
        user_id,
        kind,
        message,
        scheduled_at,
        delivered: false,
        created_at: now,
    })
}

fn days_phrase(days: u32) -> String {
    match days {
        0 => "today".to_string(),
        1 => "in 1 day".to_string(),
        n => format!("in {n} days"),
    }
}

/// Replace every pending reminder of `user_id` with `reminders`, atomically.
///
/// Returns how many pending reminders were removed. On any failure the
/// transaction is dropped uncommitted and the previous set stays in place.
pub async fn replace_pending<S: ReminderStore>(
    store: &S,
    user_id: Uuid,
    reminders: &[Reminder],
) -> Result<u64, PersistenceError> {
    let mut tx = store.begin().await?;
    tx.lock_user(user_id).await?;
    let removed = tx.delete_all_pending(user_id).await?;
    for reminder in reminders {
        tx.insert(reminder).await?;
    }
    tx.commit().await?;
    Ok(removed)
}
