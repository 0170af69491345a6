use axum::{
    extract::{Query, State},
    response::Json,
    routing::get,
    Router,
};

use super::{ApiError, SharedService, UserQuery};
use crate::forecast::CycleStatistics;
use crate::reminders::Notifier;
use crate::store::Store;

pub async fn get_cycle_stats<S: Store, N: Notifier>(
    State(service): State<SharedService<S, N>>,
    Query(query): Query<UserQuery>,
) -> Result<Json<CycleStatistics>, ApiError> {
    let stats = service.cycle_statistics(query.user_id).await?;
    Ok(Json(stats))
}

pub fn routes<S: Store, N: Notifier>(service: SharedService<S, N>) -> Router {
    Router::new()
        .route("/cycle-stats", get(get_cycle_stats::<S, N>))
        .with_state(service)
}
