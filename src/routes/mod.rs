pub mod cycle;
pub mod cycle_stats;
pub mod notifications;
pub mod ovulation;
pub mod predictions;
pub mod symptoms;

use std::sync::Arc;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::error::{OvulationError, ServiceError};
use crate::reminders::Notifier;
use crate::service::CycleService;
use crate::store::Store;

pub type SharedService<S, N> = Arc<CycleService<S, N>>;

#[derive(Deserialize)]
pub struct UserQuery {
    pub user_id: Uuid,
}

#[derive(Deserialize)]
pub struct PageQuery {
    pub user_id: Uuid,
    #[serde(default)]
    pub skip: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    100
}

/// Routes backed by the forecasting service, independent of the database driver.
pub fn service_routes<S: Store, N: Notifier>(service: SharedService<S, N>) -> Router {
    Router::new()
        .merge(cycle::summary_routes(service.clone()))
        .merge(cycle_stats::routes(service.clone()))
        .merge(predictions::routes(service.clone()))
        .merge(notifications::routes(service))
}

pub struct ApiError(pub ServiceError);

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, message) = match &self.0 {
            ServiceError::Prediction(e)
            | ServiceError::Ovulation(OvulationError::UpstreamPredictionFailure(e)) => {
                (StatusCode::UNPROCESSABLE_ENTITY, self.0.to_string(), e.message())
            }
            ServiceError::Persistence(e) => {
                tracing::error!("❌ DB error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "storage unavailable".to_string(),
                    "Please try again later",
                )
            }
        };
        (status, Json(json!({ "error": error, "message": message }))).into_response()
    }
}

/// Log an insert failure the way every logging route does and map it to 422.
pub(crate) fn insert_failed(e: sqlx::Error) -> StatusCode {
    if let Some(db_err) = e.as_database_error() {
        tracing::error!("❌ DB insert failed: {}", db_err.message());

        if let Some(code) = db_err.code() {
            tracing::info!("ℹ️ SQLSTATE code: {}", code);
        }

        if let Some(constraint) = db_err.constraint() {
            tracing::info!("🔒 Constraint violated: {}", constraint);
        }
    } else {
        tracing::error!("❌ Unknown DB error: {}", e);
    }

    StatusCode::UNPROCESSABLE_ENTITY
}

pub(crate) fn query_failed(e: sqlx::Error) -> StatusCode {
    tracing::error!("❌ DB error: {:?}", e);
    StatusCode::INTERNAL_SERVER_ERROR
}
