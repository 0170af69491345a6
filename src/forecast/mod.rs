//! Pure forecasting over already-fetched history. Nothing here does I/O.

pub mod ovulation;
pub mod period;
pub mod stats;
pub mod summary;

pub use ovulation::{predict_ovulation, FertileWindow, OvulationPrediction, LUTEAL_PHASE_DAYS};
pub use period::{predict_from_stats, predict_next_period, PeriodPrediction};
pub use stats::{interval_stats, Confidence, IntervalStats};
pub use summary::{summarize, CycleStatistics, Regularity};
