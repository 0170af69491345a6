//! Error types for forecasting, persistence and delivery.

use thiserror::Error;

/// Why a period forecast could not be produced.
///
/// Both variants mean "not enough usable history yet" and are expected outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PredictionError {
    #[error("insufficient data: {found} usable cycle start(s), at least 2 required")]
    InsufficientData { found: usize },

    /// Every interval between adjacent starts was zero or negative.
    #[error("no valid intervals: cycle starts are duplicated or out of order")]
    NoValidIntervals,
}

impl PredictionError {
    pub fn message(&self) -> &'static str {
        match self {
            Self::InsufficientData { .. } => "Please log at least 2 cycles for predictions",
            Self::NoValidIntervals => "Please ensure your cycle data is complete",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum OvulationError {
    #[error("ovulation forecast unavailable: {0}")]
    UpstreamPredictionFailure(#[from] PredictionError),
}

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Error)]
#[error("delivery failed: {0}")]
pub struct NotifyError(pub String);

/// Everything the service surface can return.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Prediction(#[from] PredictionError),

    #[error(transparent)]
    Ovulation(#[from] OvulationError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

impl ServiceError {
    /// Only store failures are worth retrying; the rest need more history.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Persistence(_))
    }
}
