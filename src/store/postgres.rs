use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use super::{HistoryStore, ReminderStore, ReminderTx};
use crate::error::PersistenceError;
use crate::models::{CycleRecord, OvulationObservation, Reminder};

const REMINDER_COLS: &str = "id, user_id, kind, message, scheduled_at, delivered, created_at";

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl HistoryStore for PgStore {
    async fn list_recent_cycle_starts(
        &self,
        user_id: Uuid,
        limit: usize,
    ) -> Result<Vec<NaiveDate>, PersistenceError> {
        let starts = sqlx::query_scalar::<_, NaiveDate>(
            "SELECT start_date FROM cycles WHERE user_id = $1 ORDER BY start_date DESC LIMIT $2",
        )
        .bind(user_id)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;
        Ok(starts)
    }

    async fn list_recent_ovulation_observations(
        &self,
        user_id: Uuid,
        limit: usize,
    ) -> Result<Vec<OvulationObservation>, PersistenceError> {
        let rows = sqlx::query_as::<_, OvulationObservation>(
            r#"
            SELECT id, user_id, date, basal_temp, cervical_fluid, ovulation_test, notes, created_at
            FROM ovulation_observations
            WHERE user_id = $1
            ORDER BY date DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn list_cycles(&self, user_id: Uuid) -> Result<Vec<CycleRecord>, PersistenceError> {
        let rows = sqlx::query_as::<_, CycleRecord>(
            r#"
            SELECT id, user_id, start_date, end_date, cycle_length, flow_intensity, notes, created_at
            FROM cycles
            WHERE user_id = $1
            ORDER BY start_date DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn get_cycle(
        &self,
        user_id: Uuid,
        cycle_id: Uuid,
    ) -> Result<Option<CycleRecord>, PersistenceError> {
        let row = sqlx::query_as::<_, CycleRecord>(
            r#"
            SELECT id, user_id, start_date, end_date, cycle_length, flow_intensity, notes, created_at
            FROM cycles
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(cycle_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }
}

#[async_trait]
impl ReminderStore for PgStore {
    type Tx = PgReminderTx;

    async fn begin(&self) -> Result<PgReminderTx, PersistenceError> {
        Ok(PgReminderTx { tx: self.pool.begin().await? })
    }

    async fn list_pending(&self, user_id: Uuid) -> Result<Vec<Reminder>, PersistenceError> {
        let rows = sqlx::query_as::<_, Reminder>(&format!(
            "SELECT {REMINDER_COLS} FROM reminders
             WHERE user_id = $1 AND delivered = FALSE
             ORDER BY scheduled_at"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}

pub struct PgReminderTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl ReminderTx for PgReminderTx {
    async fn lock_user(&mut self, user_id: Uuid) -> Result<(), PersistenceError> {
        // released automatically at commit or rollback
        sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1::text, 0))")
            .bind(user_id)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn delete_all_pending(&mut self, user_id: Uuid) -> Result<u64, PersistenceError> {
        let result = sqlx::query("DELETE FROM reminders WHERE user_id = $1 AND delivered = FALSE")
            .bind(user_id)
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected())
    }

    async fn insert(&mut self, reminder: &Reminder) -> Result<(), PersistenceError> {
        sqlx::query(&format!(
            "INSERT INTO reminders ({REMINDER_COLS}) VALUES ($1, $2, $3, $4, $5, $6, $7)"
        ))
        .bind(reminder.id)
        .bind(reminder.user_id)
        .bind(reminder.kind)
        .bind(&reminder.message)
        .bind(reminder.scheduled_at)
        .bind(reminder.delivered)
        .bind(reminder.created_at)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn select_due_undelivered(
        &mut self,
        now: DateTime<Utc>,
        skip: &[Uuid],
        limit: usize,
    ) -> Result<Vec<Reminder>, PersistenceError> {
        let rows = sqlx::query_as::<_, Reminder>(&format!(
            "SELECT {REMINDER_COLS} FROM reminders
             WHERE delivered = FALSE AND scheduled_at <= $1 AND NOT (id = ANY($2))
             ORDER BY scheduled_at
             LIMIT $3
             FOR UPDATE SKIP LOCKED"
        ))
        .bind(now)
        .bind(skip)
        .bind(limit as i64)
        .fetch_all(&mut *self.tx)
        .await?;
        Ok(rows)
    }

    async fn mark_delivered(&mut self, reminder_id: Uuid) -> Result<(), PersistenceError> {
        sqlx::query("UPDATE reminders SET delivered = TRUE WHERE id = $1")
            .bind(reminder_id)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn commit(self) -> Result<(), PersistenceError> {
        self.tx.commit().await?;
        Ok(())
    }
}
