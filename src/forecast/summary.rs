use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use super::stats::{mean, std_deviation};
use crate::error::PredictionError;
use crate::models::{CycleRecord, FlowIntensity};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Regularity {
    Regular,
    Irregular,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CycleStatistics {
    pub total_cycles: usize,
    pub average_cycle_length: Option<f64>,
    pub shortest_cycle: Option<i64>,
    pub longest_cycle: Option<i64>,
    pub cycle_regularity: Regularity,
    pub flow_intensity_distribution: BTreeMap<FlowIntensity, usize>,
    pub data_since: NaiveDate,
}

/// Descriptive statistics over every logged record of one user.
///
/// A record's length is its recorded `cycle_length`, falling back to the gap
/// until the next newer start. The newest record without a recorded length
/// has none.
pub fn summarize(records: &[CycleRecord]) -> Result<CycleStatistics, PredictionError> {
    let mut ordered: Vec<&CycleRecord> = records.iter().collect();
    ordered.sort_by_key(|r| r.start_date);

    let Some(oldest) = ordered.first() else {
        return Err(PredictionError::InsufficientData { found: 0 });
    };
    let data_since = oldest.start_date;

    let lengths: Vec<i64> = ordered
        .iter()
        .enumerate()
        .filter_map(|(i, record)| {
            record.cycle_length.map(i64::from).or_else(|| {
                ordered
                    .get(i + 1)
                    .map(|next| (next.start_date - record.start_date).num_days())
            })
        })
        .filter(|len| *len > 0)
        .collect();

    let as_f64: Vec<f64> = lengths.iter().map(|l| *l as f64).collect();
    let cycle_regularity = match as_f64.len() {
        0 | 1 => Regularity::Unknown,
        _ if std_deviation(&as_f64) < 3.0 => Regularity::Regular,
        _ => Regularity::Irregular,
    };

    let mut flow_intensity_distribution = BTreeMap::new();
    for flow in records.iter().filter_map(|r| r.flow_intensity) {
        *flow_intensity_distribution.entry(flow).or_insert(0) += 1;
    }

    Ok(CycleStatistics {
        total_cycles: records.len(),
        average_cycle_length: (!as_f64.is_empty()).then(|| (mean(&as_f64) * 10.0).round() / 10.0),
        shortest_cycle: lengths.iter().copied().min(),
        longest_cycle: lengths.iter().copied().max(),
        cycle_regularity,
        flow_intensity_distribution,
        data_since,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn record(start: &str, length: Option<i32>, flow: Option<FlowIntensity>) -> CycleRecord {
        CycleRecord {
            id: Uuid::new_v4(),
            user_id: Uuid::nil(),
            start_date: NaiveDate::parse_from_str(start, "%Y-%m-%d").unwrap(),
            end_date: None,
            cycle_length: length,
            flow_intensity: flow,
            notes: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn empty_history_is_insufficient() {
        assert_eq!(summarize(&[]), Err(PredictionError::InsufficientData { found: 0 }));
    }

    #[test]
    fn derives_missing_lengths_from_next_start() {
        let records = vec![
            record("2024-03-01", None, Some(FlowIntensity::Heavy)),
            record("2024-01-05", None, Some(FlowIntensity::Medium)),
            record("2024-02-02", Some(29), Some(FlowIntensity::Medium)),
        ];
        let stats = summarize(&records).unwrap();
        assert_eq!(stats.total_cycles, 3);
        // 28 derived, 29 recorded, newest has none
        assert_eq!(stats.shortest_cycle, Some(28));
        assert_eq!(stats.longest_cycle, Some(29));
        assert_eq!(stats.average_cycle_length, Some(28.5));
        assert_eq!(stats.cycle_regularity, Regularity::Regular);
        assert_eq!(stats.data_since, NaiveDate::from_ymd_opt(2024, 1, 5).unwrap());
        assert_eq!(stats.flow_intensity_distribution[&FlowIntensity::Medium], 2);
        assert_eq!(stats.flow_intensity_distribution[&FlowIntensity::Heavy], 1);
        assert!(!stats.flow_intensity_distribution.contains_key(&FlowIntensity::Light));
    }

    #[test]
    fn spread_of_lengths_sets_regularity() {
        let records = vec![
            record("2024-01-01", Some(22), None),
            record("2024-02-01", Some(35), None),
        ];
        assert_eq!(summarize(&records).unwrap().cycle_regularity, Regularity::Irregular);

        let single = vec![record("2024-01-01", None, None)];
        let stats = summarize(&single).unwrap();
        assert_eq!(stats.cycle_regularity, Regularity::Unknown);
        assert_eq!(stats.average_cycle_length, None);
    }
}
