use serde::{ Serialize, Deserialize };
use uuid::Uuid;
use chrono::{NaiveDate, DateTime, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "flow_intensity", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum FlowIntensity {
    Light,
    Medium,
    Heavy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "cervical_fluid", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CervicalFluid {
    Dry,
    Sticky,
    Creamy,
    Watery,
    EggWhite,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "symptom_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SymptomType {
    Cramps,
    Headache,
    MoodSwing,
    Bloating,
    BreastTenderness,
    Fatigue,
    Nausea,
    Acne,
    BackPain,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "reminder_kind", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ReminderKind {
    PeriodReminder,
    OvulationReminder,
}

/// A logged cycle. Read-only input to forecasting.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CycleRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub cycle_length: Option<i32>,
    pub flow_intensity: Option<FlowIntensity>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct OvulationObservation {
    pub id: Uuid,
    pub user_id: Uuid,
    pub date: NaiveDate,
    pub basal_temp: Option<f64>,
    pub cervical_fluid: Option<CervicalFluid>,
    pub ovulation_test: Option<bool>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct Reminder {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: ReminderKind,
    pub message: String,
    pub scheduled_at: DateTime<Utc>,
    pub delivered: bool,
    pub created_at: DateTime<Utc>,
}

/// Which reminders a user wants and how far ahead of the forecast date.
///
/// Missing fields take their defaults: both reminders on, two days ahead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NotificationPreferences {
    pub period_reminder: bool,
    pub ovulation_reminder: bool,
    pub reminder_days_before: u32,
}

impl Default for NotificationPreferences {
    fn default() -> Self {
        Self {
            period_reminder: true,
            ovulation_reminder: true,
            reminder_days_before: 2,
        }
    }
}

#[derive(Serialize)]
pub struct CycleSummary {
    pub cycle_day: i64,
    pub in_fertile_window: bool,
    pub period_expected_in_days: i64,
    pub start_date: NaiveDate,
}

#[derive(Serialize)]
pub struct SymptomsByDate {
    pub logged_at: NaiveDate,
    pub symptoms: Vec<SymptomType>,
}

#[derive(Serialize, sqlx::FromRow)]
pub struct SymptomLog {
    pub logged_at: NaiveDate,
    pub symptom_type: SymptomType,
    pub severity: Option<i32>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct DeleteSymptomRequest {
    pub user_id: String,
    pub logged_at: String,
    pub symptom_type: SymptomType,
}
