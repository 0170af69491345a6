use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;

use super::{ApiError, SharedService, UserQuery};
use crate::models::{NotificationPreferences, Reminder};
use crate::reminders::{Notifier, SweepReport};
use crate::service::ScheduleAck;
use crate::store::Store;

pub fn routes<S: Store, N: Notifier>(service: SharedService<S, N>) -> Router {
    Router::new()
        .route("/notifications", get(list_pending::<S, N>))
        .route("/notifications/setup", post(setup::<S, N>))
        // hit by cron
        .route("/notifications/check", get(check::<S, N>))
        .with_state(service)
}

async fn setup<S: Store, N: Notifier>(
    State(service): State<SharedService<S, N>>,
    Query(query): Query<UserQuery>,
    Json(prefs): Json<NotificationPreferences>,
) -> Result<Json<ScheduleAck>, ApiError> {
    let ack = service.setup_notifications(query.user_id, prefs, Utc::now()).await?;
    Ok(Json(ack))
}

async fn list_pending<S: Store, N: Notifier>(
    State(service): State<SharedService<S, N>>,
    Query(query): Query<UserQuery>,
) -> Result<Json<Vec<Reminder>>, ApiError> {
    Ok(Json(service.pending_notifications(query.user_id).await?))
}

async fn check<S: Store, N: Notifier>(
    State(service): State<SharedService<S, N>>,
) -> Result<Json<SweepReport>, ApiError> {
    Ok(Json(service.sweep_due_notifications(Utc::now()).await?))
}
