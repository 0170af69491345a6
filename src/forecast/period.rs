use chrono::{Duration, NaiveDate};
use serde::Serialize;

use super::stats::{interval_stats, Confidence, IntervalStats};
use crate::error::PredictionError;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PeriodPrediction {
    pub predicted_date: NaiveDate,
    pub early_date: NaiveDate,
    pub late_date: NaiveDate,
    /// Rounded to one decimal.
    pub average_cycle_length: f64,
    pub confidence: Confidence,
    pub cycles_analyzed: usize,
}

/// Forecast the next start from the latest start and interval statistics.
///
/// The mean is rounded half away from zero (28.5 -> 29). The window half-width
/// is `floor(spread) + 1` days. Dates past the calendar range clamp to
/// `NaiveDate::MIN`/`NaiveDate::MAX`.
pub fn predict_from_stats(last_start: NaiveDate, stats: &IntervalStats) -> PeriodPrediction {
    let predicted_date = shift_days(last_start, stats.mean_interval.round() as i64);
    let margin = stats.spread.floor() as i64 + 1;

    PeriodPrediction {
        predicted_date,
        early_date: shift_days(predicted_date, -margin),
        late_date: shift_days(predicted_date, margin),
        average_cycle_length: (stats.mean_interval * 10.0).round() / 10.0,
        confidence: stats.confidence(),
        cycles_analyzed: stats.sample_count,
    }
}

/// `date` moved by `days`, saturating at the ends of the calendar.
pub(crate) fn shift_days(date: NaiveDate, days: i64) -> NaiveDate {
    match date.checked_add_signed(Duration::days(days)) {
        Some(shifted) => shifted,
        None if days < 0 => NaiveDate::MIN,
        None => NaiveDate::MAX,
    }
}

/// Forecast from starts ordered most recent first.
pub fn predict_next_period(starts: &[NaiveDate]) -> Result<PeriodPrediction, PredictionError> {
    let stats = interval_stats(starts)?;
    // interval_stats guarantees at least two starts
    let last_start = starts[0];
    Ok(predict_from_stats(last_start, &stats))
}
