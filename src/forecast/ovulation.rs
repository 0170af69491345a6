use chrono::NaiveDate;
use serde::Serialize;

use super::period::{shift_days, PeriodPrediction};
use super::stats::Confidence;
use crate::error::{OvulationError, PredictionError};

/// Days between ovulation and the following cycle start.
pub const LUTEAL_PHASE_DAYS: i64 = 14;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FertileWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl FertileWindow {
    /// Five days before ovulation through the day after, inclusive.
    pub fn around(ovulation_date: NaiveDate) -> Self {
        Self {
            start: shift_days(ovulation_date, -5),
            end: shift_days(ovulation_date, 1),
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        (self.start..=self.end).contains(&date)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OvulationPrediction {
    pub ovulation_date: NaiveDate,
    pub fertile_window: FertileWindow,
    pub confidence: Confidence,
    /// Negative once the date has passed.
    pub days_until_ovulation: i64,
    /// Whether the user logged observations recently. Informational only:
    /// the forecast does not use them.
    pub observations_logged: bool,
}

pub fn predict_ovulation(
    period: Result<&PeriodPrediction, &PredictionError>,
    today: NaiveDate,
    observations_logged: bool,
) -> Result<OvulationPrediction, OvulationError> {
    let period = period.map_err(|err| OvulationError::UpstreamPredictionFailure(*err))?;
    let ovulation_date = shift_days(period.predicted_date, -LUTEAL_PHASE_DAYS);

    Ok(OvulationPrediction {
        ovulation_date,
        fertile_window: FertileWindow::around(ovulation_date),
        confidence: period.confidence,
        days_until_ovulation: (ovulation_date - today).num_days(),
        observations_logged,
    })
}
