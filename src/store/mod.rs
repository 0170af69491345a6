//! Storage seams used by the forecasting service.
//!
//! History is read-only. Reminder mutations go through a [`ReminderTx`], one
//! store transaction: nothing is visible to other callers until
//! [`ReminderTx::commit`], and dropping an uncommitted transaction rolls it
//! back.

mod memory;
mod postgres;

pub use memory::{MemoryStore, MemoryTx};
pub use postgres::{PgReminderTx, PgStore};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::error::PersistenceError;
use crate::models::{CycleRecord, OvulationObservation, Reminder};

#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Cycle starts, most recent first.
    async fn list_recent_cycle_starts(
        &self,
        user_id: Uuid,
        limit: usize,
    ) -> Result<Vec<NaiveDate>, PersistenceError>;

    /// Observations, most recent first.
    async fn list_recent_ovulation_observations(
        &self,
        user_id: Uuid,
        limit: usize,
    ) -> Result<Vec<OvulationObservation>, PersistenceError>;

    /// Every record of the user, most recent first.
    async fn list_cycles(&self, user_id: Uuid) -> Result<Vec<CycleRecord>, PersistenceError>;

    /// One record, only if it belongs to `user_id`.
    async fn get_cycle(
        &self,
        user_id: Uuid,
        cycle_id: Uuid,
    ) -> Result<Option<CycleRecord>, PersistenceError>;
}

#[async_trait]
pub trait ReminderStore: Send + Sync {
    type Tx: ReminderTx;

    async fn begin(&self) -> Result<Self::Tx, PersistenceError>;

    /// Undelivered reminders of one user, earliest first.
    async fn list_pending(&self, user_id: Uuid) -> Result<Vec<Reminder>, PersistenceError>;
}

#[async_trait]
pub trait ReminderTx: Send + Sized {
    /// Serialize against every other transaction that locks the same user,
    /// until this one ends.
    async fn lock_user(&mut self, user_id: Uuid) -> Result<(), PersistenceError>;

    /// Returns the number of rows removed.
    async fn delete_all_pending(&mut self, user_id: Uuid) -> Result<u64, PersistenceError>;

    async fn insert(&mut self, reminder: &Reminder) -> Result<(), PersistenceError>;

    /// Claims up to `limit` due, undelivered rows, earliest first, leaving out
    /// the ids in `skip`. Rows claimed here are skipped by any concurrent
    /// transaction until this one ends.
    async fn select_due_undelivered(
        &mut self,
        now: DateTime<Utc>,
        skip: &[Uuid],
        limit: usize,
    ) -> Result<Vec<Reminder>, PersistenceError>;

    async fn mark_delivered(&mut self, reminder_id: Uuid) -> Result<(), PersistenceError>;

    async fn commit(self) -> Result<(), PersistenceError>;
}

/// Both stores behind one handle, the shape the service needs.
pub trait Store: HistoryStore + ReminderStore + 'static {}

impl<T> Store for T where T: HistoryStore + ReminderStore + 'static {}
