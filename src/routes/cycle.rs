use axum::{Router, routing::{get, post}, Json, extract::{Path, State, Query}, response::{IntoResponse, Response}};
use sqlx::PgPool;
use uuid::Uuid;
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use crate::models::{CycleRecord, CycleSummary, FlowIntensity};
use crate::reminders::Notifier;
use crate::store::Store;
use super::{insert_failed, query_failed, ApiError, PageQuery, SharedService, UserQuery};
use axum::http::StatusCode;

#[derive(Deserialize)]
pub struct NewCycle {
    pub user_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub cycle_length: Option<i32>,
    pub flow_intensity: Option<FlowIntensity>,
    pub notes: Option<String>,
}

pub fn routes(pool: PgPool) -> Router {
    Router::new()
        .route("/cycles", post(create_cycle).get(list_cycles))
        .with_state(pool)
}

pub fn summary_routes<S: Store, N: Notifier>(service: SharedService<S, N>) -> Router {
    Router::new()
        .route("/cycle", get(get_cycle_summary::<S, N>))
        .route("/cycles/:cycle_id", get(get_cycle::<S, N>))
        .with_state(service)
}

async fn create_cycle(
    State(pool): State<PgPool>,
    Json(body): Json<NewCycle>,
) -> Result<(StatusCode, Json<CycleRecord>), (StatusCode, String)> {
    if body.end_date.is_some_and(|end| end < body.start_date) {
        return Err((StatusCode::BAD_REQUEST, "end_date is before start_date".into()));
    }
    if body.cycle_length.is_some_and(|len| len <= 0) {
        return Err((StatusCode::BAD_REQUEST, "cycle_length must be positive".into()));
    }

    let record = sqlx::query_as::<_, CycleRecord>(
        r#"
        INSERT INTO cycles (id, user_id, start_date, end_date, cycle_length, flow_intensity, notes)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING id, user_id, start_date, end_date, cycle_length, flow_intensity, notes, created_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(body.user_id)
    .bind(body.start_date)
    .bind(body.end_date)
    .bind(body.cycle_length)
    .bind(body.flow_intensity)
    .bind(body.notes)
    .fetch_one(&pool)
    .await
    .map_err(|e| (insert_failed(e), "Could not log cycle".into()))?;

    Ok((StatusCode::CREATED, Json(record)))
}

async fn list_cycles(
    State(pool): State<PgPool>,
    Query(params): Query<PageQuery>,
) -> Result<Json<Vec<CycleRecord>>, StatusCode> {
    let cycles = sqlx::query_as::<_, CycleRecord>(
        r#"
        SELECT id, user_id, start_date, end_date, cycle_length, flow_intensity, notes, created_at
        FROM cycles
        WHERE user_id = $1
        ORDER BY start_date DESC
        OFFSET $2 LIMIT $3
        "#,
    )
    .bind(params.user_id)
    .bind(params.skip.max(0))
    .bind(params.limit.clamp(1, 500))
    .fetch_all(&pool)
    .await
    .map_err(query_failed)?;

    Ok(Json(cycles))
}

async fn get_cycle<S: Store, N: Notifier>(
    State(service): State<SharedService<S, N>>,
    Path(cycle_id): Path<Uuid>,
    Query(params): Query<UserQuery>,
) -> Result<Json<CycleRecord>, Response> {
    match service.cycle_record(params.user_id, cycle_id).await {
        Ok(Some(record)) => Ok(Json(record)),
        Ok(None) => Err((StatusCode::NOT_FOUND, "Cycle not found").into_response()),
        Err(e) => Err(ApiError(e).into_response()),
    }
}

async fn get_cycle_summary<S: Store, N: Notifier>(
    State(service): State<SharedService<S, N>>,
    Query(params): Query<UserQuery>,
) -> Result<Json<CycleSummary>, ApiError> {
    let today = Utc::now().date_naive();
    let summary = service.today_summary(params.user_id, today).await?;
    Ok(Json(summary))
}
