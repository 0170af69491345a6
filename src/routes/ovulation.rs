use axum::{
    Router,
    routing::post,
    extract::{State, Query},
    Json,
    http::StatusCode,
};
use chrono::NaiveDate;
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;
use crate::models::{CervicalFluid, OvulationObservation};
use super::{insert_failed, query_failed, PageQuery};

#[derive(Deserialize)]
pub struct NewObservation {
    pub user_id: Uuid,
    pub date: NaiveDate,
    pub basal_temp: Option<f64>,
    pub cervical_fluid: Option<CervicalFluid>,
    pub ovulation_test: Option<bool>,
    pub notes: Option<String>,
}

pub fn routes(pool: PgPool) -> Router {
    Router::new()
        .route("/ovulation", post(log_observation).get(list_observations))
        .with_state(pool)
}

async fn log_observation(
    State(pool): State<PgPool>,
    Json(body): Json<NewObservation>,
) -> Result<(StatusCode, Json<OvulationObservation>), StatusCode> {
    let observation = sqlx::query_as::<_, OvulationObservation>(
        r#"
        INSERT INTO ovulation_observations (id, user_id, date, basal_temp, cervical_fluid, ovulation_test, notes)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING id, user_id, date, basal_temp, cervical_fluid, ovulation_test, notes, created_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(body.user_id)
    .bind(body.date)
    .bind(body.basal_temp)
    .bind(body.cervical_fluid)
    .bind(body.ovulation_test)
    .bind(body.notes)
    .fetch_one(&pool)
    .await
    .map_err(insert_failed)?;

    Ok((StatusCode::CREATED, Json(observation)))
}

async fn list_observations(
    State(pool): State<PgPool>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Vec<OvulationObservation>>, StatusCode> {
    let rows = sqlx::query_as::<_, OvulationObservation>(
        r#"
        SELECT id, user_id, date, basal_temp, cervical_fluid, ovulation_test, notes, created_at
        FROM ovulation_observations
        WHERE user_id = $1
        ORDER BY date DESC
        OFFSET $2 LIMIT $3
        "#,
    )
    .bind(query.user_id)
    .bind(query.skip.max(0))
    .bind(query.limit.clamp(1, 500))
    .fetch_all(&pool)
    .await
    .map_err(query_failed)?;

    Ok(Json(rows))
}
