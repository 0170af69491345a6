use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use chrono::Utc;

use super::{ApiError, SharedService, UserQuery};
use crate::forecast::{OvulationPrediction, PeriodPrediction};
use crate::reminders::Notifier;
use crate::store::Store;

pub fn routes<S: Store, N: Notifier>(service: SharedService<S, N>) -> Router {
    Router::new()
        .route("/predictions/next-period", get(next_period::<S, N>))
        .route("/predictions/ovulation", get(ovulation::<S, N>))
        .with_state(service)
}

async fn next_period<S: Store, N: Notifier>(
    State(service): State<SharedService<S, N>>,
    Query(query): Query<UserQuery>,
) -> Result<Json<PeriodPrediction>, ApiError> {
    Ok(Json(service.predict_next_period(query.user_id).await?))
}

async fn ovulation<S: Store, N: Notifier>(
    State(service): State<SharedService<S, N>>,
    Query(query): Query<UserQuery>,
) -> Result<Json<OvulationPrediction>, ApiError> {
    let today = Utc::now().date_naive();
    Ok(Json(service.predict_ovulation(query.user_id, today).await?))
}
