use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as StdMutex};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use super::{HistoryStore, ReminderStore, ReminderTx};
use crate::error::PersistenceError;
use crate::models::{CycleRecord, OvulationObservation, Reminder};

#[derive(Default)]
struct State {
    cycles: HashMap<Uuid, Vec<CycleRecord>>,
    observations: HashMap<Uuid, Vec<OvulationObservation>>,
    reminders: Vec<Reminder>,
}

/// In-process store.
///
/// A transaction holds the whole store lock and works on a copy of the
/// reminder table, so transactions are fully serialized and an uncommitted
/// one leaves no trace.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<State>>,
    fail_inserts: Arc<AtomicBool>,
    fail_marks: Arc<StdMutex<HashSet<Uuid>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_cycle(&self, record: CycleRecord) {
        self.state.lock().await.cycles.entry(record.user_id).or_default().push(record);
    }

    pub async fn add_observation(&self, observation: OvulationObservation) {
        self.state
            .lock()
            .await
            .observations
            .entry(observation.user_id)
            .or_default()
            .push(observation);
    }

    /// Every reminder of the user, delivered or not.
    pub async fn reminders_for(&self, user_id: Uuid) -> Vec<Reminder> {
        let state = self.state.lock().await;
        state.reminders.iter().filter(|r| r.user_id == user_id).cloned().collect()
    }

    /// Make every subsequent insert fail until switched off.
    pub fn fail_inserts(&self, fail: bool) {
        self.fail_inserts.store(fail, Ordering::SeqCst);
    }

    /// Make `mark_delivered` fail for these reminders. An empty slice clears it.
    pub fn fail_marks(&self, reminder_ids: &[Uuid]) {
        if let Ok(mut ids) = self.fail_marks.lock() {
            *ids = reminder_ids.iter().copied().collect();
        }
    }
}

#[async_trait]
impl HistoryStore for MemoryStore {
    async fn list_recent_cycle_starts(
        &self,
        user_id: Uuid,
        limit: usize,
    ) -> Result<Vec<NaiveDate>, PersistenceError> {
        let mut starts: Vec<NaiveDate> = self
            .list_cycles(user_id)
            .await?
            .into_iter()
            .map(|r| r.start_date)
            .collect();
        starts.truncate(limit);
        Ok(starts)
    }

    async fn list_recent_ovulation_observations(
        &self,
        user_id: Uuid,
        limit: usize,
    ) -> Result<Vec<OvulationObservation>, PersistenceError> {
        let state = self.state.lock().await;
        let mut rows = state.observations.get(&user_id).cloned().unwrap_or_default();
        rows.sort_by(|a, b| b.date.cmp(&a.date));
        rows.truncate(limit);
        Ok(rows)
    }

    async fn list_cycles(&self, user_id: Uuid) -> Result<Vec<CycleRecord>, PersistenceError> {
        let state = self.state.lock().await;
        let mut rows = state.cycles.get(&user_id).cloned().unwrap_or_default();
        rows.sort_by(|a, b| b.start_date.cmp(&a.start_date));
        Ok(rows)
    }

    async fn get_cycle(
        &self,
        user_id: Uuid,
        cycle_id: Uuid,
    ) -> Result<Option<CycleRecord>, PersistenceError> {
        let state = self.state.lock().await;
        Ok(state
            .cycles
            .get(&user_id)
            .and_then(|rows| rows.iter().find(|r| r.id == cycle_id))
            .cloned())
    }
}

#[async_trait]
impl ReminderStore for MemoryStore {
    type Tx = MemoryTx;

    async fn begin(&self) -> Result<MemoryTx, PersistenceError> {
        let guard = self.state.clone().lock_owned().await;
        let working = guard.reminders.clone();
        let fail_marks = self.fail_marks.lock().map(|ids| ids.clone()).unwrap_or_default();
        Ok(MemoryTx {
            guard,
            working,
            fail_inserts: self.fail_inserts.load(Ordering::SeqCst),
            fail_marks,
        })
    }

    async fn list_pending(&self, user_id: Uuid) -> Result<Vec<Reminder>, PersistenceError> {
        let state = self.state.lock().await;
        let mut rows: Vec<Reminder> = state
            .reminders
            .iter()
            .filter(|r| r.user_id == user_id && !r.delivered)
            .cloned()
            .collect();
        rows.sort_by_key(|r| r.scheduled_at);
        Ok(rows)
    }
}

pub struct MemoryTx {
    guard: OwnedMutexGuard<State>,
    working: Vec<Reminder>,
    fail_inserts: bool,
    fail_marks: HashSet<Uuid>,
}

#[async_trait]
impl ReminderTx for MemoryTx {
    async fn lock_user(&mut self, _user_id: Uuid) -> Result<(), PersistenceError> {
        // the store lock already covers every user
        Ok(())
    }

    async fn delete_all_pending(&mut self, user_id: Uuid) -> Result<u64, PersistenceError> {
        let before = self.working.len();
        self.working.retain(|r| r.user_id != user_id || r.delivered);
        Ok((before - self.working.len()) as u64)
    }

    async fn insert(&mut self, reminder: &Reminder) -> Result<(), PersistenceError> {
        if self.fail_inserts {
            return Err(PersistenceError::Unavailable("insert rejected".into()));
        }
        self.working.push(reminder.clone());
        Ok(())
    }

    async fn select_due_undelivered(
        &mut self,
        now: DateTime<Utc>,
        skip: &[Uuid],
        limit: usize,
    ) -> Result<Vec<Reminder>, PersistenceError> {
        let mut due: Vec<Reminder> = self
            .working
            .iter()
            .filter(|r| !r.delivered && r.scheduled_at <= now && !skip.contains(&r.id))
            .cloned()
            .collect();
        due.sort_by_key(|r| r.scheduled_at);
        due.truncate(limit);
        Ok(due)
    }

    async fn mark_delivered(&mut self, reminder_id: Uuid) -> Result<(), PersistenceError> {
        if self.fail_marks.contains(&reminder_id) {
            return Err(PersistenceError::Unavailable("update rejected".into()));
        }
        if let Some(row) = self.working.iter_mut().find(|r| r.id == reminder_id) {
            row.delivered = true;
        }
        Ok(())
    }

    async fn commit(self) -> Result<(), PersistenceError> {
        let MemoryTx { mut guard, working, .. } = self;
        guard.reminders = working;
        Ok(())
    }
}
