use chrono::NaiveDate;
use serde::Serialize;

use crate::error::PredictionError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl Confidence {
    /// `< 3` high, `3..7` medium, `>= 7` low.
    pub fn from_spread(spread: f64) -> Self {
        if spread < 3.0 {
            Self::High
        } else if spread < 7.0 {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct IntervalStats {
    pub mean_interval: f64,
    /// Sample standard deviation; 0 with a single interval.
    pub spread: f64,
    pub sample_count: usize,
}

impl IntervalStats {
    pub fn confidence(&self) -> Confidence {
        Confidence::from_spread(self.spread)
    }
}

/// Interval statistics over cycle starts ordered most recent first.
///
/// Non-positive intervals (duplicate or out-of-order starts) are dropped.
pub fn interval_stats(starts: &[NaiveDate]) -> Result<IntervalStats, PredictionError> {
    if starts.len() < 2 {
        return Err(PredictionError::InsufficientData { found: starts.len() });
    }

    let intervals: Vec<f64> = starts
        .windows(2)
        .map(|w| (w[0] - w[1]).num_days())
        .filter(|days| *days > 0)
        .map(|days| days as f64)
        .collect();

    if intervals.is_empty() {
        return Err(PredictionError::NoValidIntervals);
    }

    Ok(IntervalStats {
        mean_interval: mean(&intervals),
        spread: std_deviation(&intervals),
        sample_count: intervals.len(),
    })
}

pub(crate) fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

pub(crate) fn std_deviation(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let avg = mean(values);
    let variance =
        values.iter().map(|v| (v - avg).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}
