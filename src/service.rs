//! The forecasting service: the operations the HTTP layer calls.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::config::ForecastSettings;
use crate::error::{OvulationError, PredictionError, ServiceError};
use crate::forecast::{self, CycleStatistics, OvulationPrediction, PeriodPrediction};
use crate::models::{CycleRecord, CycleSummary, NotificationPreferences, Reminder};
use crate::reminders::{self, Notifier, SweepReport};
use crate::store::{HistoryStore, ReminderStore, Store};

#[derive(Debug, Clone, Serialize)]
pub struct ScheduleAck {
    pub message: String,
    pub replaced: u64,
    pub scheduled: Vec<Reminder>,
}

pub struct CycleService<S, N> {
    store: S,
    notifier: N,
    settings: ForecastSettings,
}

impl<S: Store, N: Notifier> CycleService<S, N> {
    pub fn new(store: S, notifier: N, settings: ForecastSettings) -> Self {
        Self { store, notifier, settings }
    }

    async fn period_forecast(
        &self,
        user_id: Uuid,
    ) -> Result<Result<PeriodPrediction, PredictionError>, ServiceError> {
        let starts = self
            .store
            .list_recent_cycle_starts(user_id, self.settings.history_window)
            .await?;
        Ok(forecast::predict_next_period(&starts))
    }

    async fn ovulation_forecast(
        &self,
        user_id: Uuid,
        period: Result<&PeriodPrediction, &PredictionError>,
        today: NaiveDate,
    ) -> Result<Result<OvulationPrediction, OvulationError>, ServiceError> {
        let observations = self
            .store
            .list_recent_ovulation_observations(user_id, self.settings.observation_window)
            .await?;
        Ok(forecast::predict_ovulation(period, today, !observations.is_empty()))
    }

    pub async fn predict_next_period(&self, user_id: Uuid) -> Result<PeriodPrediction, ServiceError> {
        Ok(self.period_forecast(user_id).await??)
    }

    pub async fn predict_ovulation(
        &self,
        user_id: Uuid,
        today: NaiveDate,
    ) -> Result<OvulationPrediction, ServiceError> {
        let period = self.period_forecast(user_id).await?;
        Ok(self.ovulation_forecast(user_id, period.as_ref(), today).await??)
    }

    /// Replace the user's pending reminders with the set implied by `prefs`.
    ///
    /// Kinds whose forecast is unavailable are skipped. Only a store failure
    /// is an error, and it leaves the previous set untouched.
    pub async fn setup_notifications(
        &self,
        user_id: Uuid,
        prefs: NotificationPreferences,
        now: DateTime<Utc>,
    ) -> Result<ScheduleAck, ServiceError> {
        let period = self.period_forecast(user_id).await?;
        let ovulation = self
            .ovulation_forecast(user_id, period.as_ref(), now.date_naive())
            .await?;

        let planned = reminders::plan_reminders(
            user_id,
            period.as_ref(),
            ovulation.as_ref(),
            &prefs,
            now,
        );

        let replaced = reminders::replace_pending(&self.store, user_id, &planned)
            .await
            .map_err(|e| {
                tracing::error!(%user_id, "❌ Failed to setup notifications: {}", e);
                e
            })?;

        tracing::info!(%user_id, replaced, scheduled = planned.len(), "Notifications scheduled");

        Ok(ScheduleAck {
            message: "Notifications setup successfully".to_string(),
            replaced,
            scheduled: planned,
        })
    }

    pub async fn pending_notifications(&self, user_id: Uuid) -> Result<Vec<Reminder>, ServiceError> {
        Ok(self.store.list_pending(user_id).await?)
    }

    pub async fn sweep_due_notifications(&self, now: DateTime<Utc>) -> Result<SweepReport, ServiceError> {
        reminders::sweep_due(&self.store, &self.notifier, now)
            .await
            .map_err(|e| {
                tracing::error!("❌ Failed to process notifications: {}", e);
                e.into()
            })
    }

    pub async fn cycle_record(
        &self,
        user_id: Uuid,
        cycle_id: Uuid,
    ) -> Result<Option<CycleRecord>, ServiceError> {
        Ok(self.store.get_cycle(user_id, cycle_id).await?)
    }

    pub async fn cycle_statistics(&self, user_id: Uuid) -> Result<CycleStatistics, ServiceError> {
        let records = self.store.list_cycles(user_id).await?;
        Ok(forecast::summarize(&records)?)
    }

    /// Where `today` falls in the current cycle.
    pub async fn today_summary(
        &self,
        user_id: Uuid,
        today: NaiveDate,
    ) -> Result<CycleSummary, ServiceError> {
        let starts = self
            .store
            .list_recent_cycle_starts(user_id, self.settings.history_window)
            .await?;
        let period = forecast::predict_next_period(&starts)?;
        let ovulation = self.ovulation_forecast(user_id, Ok(&period), today).await??;

        // a successful forecast implies at least two starts
        let last_start = starts[0];
        Ok(CycleSummary {
            cycle_day: (today - last_start).num_days() + 1,
            in_fertile_window: ovulation.fertile_window.contains(today),
            period_expected_in_days: (period.predicted_date - today).num_days(),
            start_date: last_start,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forecast::Confidence;
    use crate::models::ReminderKind;
    use crate::reminders::LogNotifier;
    use crate::store::MemoryStore;
    use chrono::TimeZone;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    async fn service_with(starts: &[&str]) -> (CycleService<MemoryStore, LogNotifier>, Uuid) {
        let store = MemoryStore::new();
        let user_id = Uuid::new_v4();
        for start in starts {
            store
                .add_cycle(CycleRecord {
                    id: Uuid::new_v4(),
                    user_id,
                    start_date: d(start),
                    end_date: None,
                    cycle_length: None,
                    flow_intensity: None,
                    notes: None,
                    created_at: Utc::now(),
                })
                .await;
        }
        (CycleService::new(store, LogNotifier, ForecastSettings::default()), user_id)
    }

    #[tokio::test]
    async fn history_is_read_newest_first_regardless_of_log_order() {
        let (svc, user) = service_with(&["2024-01-05", "2024-03-01", "2024-02-02"]).await;
        let p = svc.predict_next_period(user).await.unwrap();
        assert_eq!(p.predicted_date, d("2024-03-29"));
        assert_eq!(p.confidence, Confidence::High);
    }

    #[tokio::test]
    async fn only_the_history_window_is_used() {
        // an old 40-day gap falls outside the six most recent starts
        let (svc, user) = service_with(&[
            "2023-07-01", "2023-08-10", "2023-09-07", "2023-10-05",
            "2023-11-02", "2023-11-30", "2023-12-28",
        ])
        .await;
        let p = svc.predict_next_period(user).await.unwrap();
        assert_eq!(p.average_cycle_length, 28.0);
        assert_eq!(p.cycles_analyzed, 5);
    }

    #[tokio::test]
    async fn ovulation_failure_is_upstream() {
        let (svc, user) = service_with(&["2024-03-01"]).await;
        let err = svc.predict_ovulation(user, d("2024-03-02")).await.unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Ovulation(OvulationError::UpstreamPredictionFailure(
                PredictionError::InsufficientData { found: 1 }
            ))
        ));
    }

    #[tokio::test]
    async fn today_summary_tracks_cycle_position() {
        let (svc, user) = service_with(&["2024-03-01", "2024-02-02", "2024-01-05"]).await;
        let s = svc.today_summary(user, d("2024-03-12")).await.unwrap();
        assert_eq!(s.cycle_day, 12);
        assert!(s.in_fertile_window);
        assert_eq!(s.period_expected_in_days, 17);
        assert_eq!(s.start_date, d("2024-03-01"));
    }

    #[tokio::test]
    async fn setup_again_replaces_previous_set() {
        let (svc, user) = service_with(&["2024-03-01", "2024-02-02", "2024-01-05"]).await;
        let now = Utc.with_ymd_and_hms(2024, 3, 2, 9, 0, 0).unwrap();
        svc.setup_notifications(user, NotificationPreferences::default(), now).await.unwrap();
        assert_eq!(svc.pending_notifications(user).await.unwrap().len(), 2);

        let off = NotificationPreferences { period_reminder: false, ..Default::default() };
        let ack = svc.setup_notifications(user, off, now).await.unwrap();
        assert_eq!(ack.replaced, 2);
        let pending = svc.pending_notifications(user).await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].kind, ReminderKind::OvulationReminder);
    }
}
