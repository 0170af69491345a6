use axum::{
    Router,
    routing::{get, post, delete},
    extract::{State, Query},
    Json,
    http::StatusCode,
};
use chrono::NaiveDate;
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;
use std::collections::BTreeMap;
use crate::models::{ SymptomsByDate, SymptomLog, SymptomType, DeleteSymptomRequest };
use super::{insert_failed, query_failed, UserQuery};

#[derive(Deserialize)]
pub struct NewSymptom {
    pub user_id: Uuid,
    pub logged_at: NaiveDate,
    pub symptom_type: SymptomType,
    pub severity: Option<i32>,
    pub notes: Option<String>,
}

pub fn routes(pool: PgPool) -> Router {
    Router::new()
        .route("/symptom", post(log_symptom))        // create
        .route("/symptom", delete(delete_symptom))   // toggle-delete
        .route("/symptoms", get(get_symptoms_grouped))
        .route("/symptom/all", get(get_symptoms_flat))
        .with_state(pool)
}

fn valid_severity(severity: Option<i32>) -> bool {
    severity.map_or(true, |s| (1..=10).contains(&s))
}

async fn delete_symptom(
    State(pool): State<PgPool>,
    Json(payload): Json<DeleteSymptomRequest>,
) -> Result<StatusCode, (StatusCode, String)> {
    let user_id = match Uuid::parse_str(&payload.user_id) {
        Ok(uuid) => uuid,
        Err(_) => return Err((StatusCode::BAD_REQUEST, "Invalid user_id UUID".into())),
    };

    let logged_at = match NaiveDate::parse_from_str(&payload.logged_at, "%Y-%m-%d") {
        Ok(date) => date,
        Err(_) => return Err((StatusCode::BAD_REQUEST, "Invalid date format (expected YYYY-MM-DD)".into())),
    };

    let result = sqlx::query(
        "DELETE FROM symptom_logs WHERE user_id = $1 AND logged_at = $2 AND symptom_type = $3",
    )
    .bind(user_id)
    .bind(logged_at)
    .bind(payload.symptom_type)
    .execute(&pool)
    .await;

    match result {
        Ok(r) if r.rows_affected() > 0 => Ok(StatusCode::NO_CONTENT),
        Ok(_) => Err((StatusCode::NOT_FOUND, "No symptom found".into())),
        Err(e) => Err((query_failed(e), "DB error".into())),
    }
}

async fn get_symptoms_flat(
    State(pool): State<PgPool>,
    Query(query): Query<UserQuery>,
) -> Result<Json<Vec<SymptomLog>>, StatusCode> {
    let logs = sqlx::query_as::<_, SymptomLog>(
        r#"
        SELECT logged_at, symptom_type, severity, notes
        FROM symptom_logs
        WHERE user_id = $1
        ORDER BY logged_at DESC
        "#,
    )
    .bind(query.user_id)
    .fetch_all(&pool)
    .await
    .map_err(query_failed)?;

    Ok(Json(logs))
}

async fn log_symptom(
    State(pool): State<PgPool>,
    Json(body): Json<NewSymptom>,
) -> Result<StatusCode, (StatusCode, String)> {
    if !valid_severity(body.severity) {
        return Err((StatusCode::BAD_REQUEST, "severity must be between 1 and 10".into()));
    }

    sqlx::query(
        "INSERT INTO symptom_logs (id, user_id, logged_at, symptom_type, severity, notes) VALUES ($1, $2, $3, $4, $5, $6)",
    )
    .bind(Uuid::new_v4())
    .bind(body.user_id)
    .bind(body.logged_at)
    .bind(body.symptom_type)
    .bind(body.severity)
    .bind(body.notes)
    .execute(&pool)
    .await
    .map_err(|e| (insert_failed(e), "Could not log symptom".into()))?;

    Ok(StatusCode::CREATED)
}

async fn get_symptoms_grouped(
    State(pool): State<PgPool>,
    Query(query): Query<UserQuery>,
) -> Result<Json<Vec<SymptomsByDate>>, StatusCode> {
    let rows = sqlx::query_as::<_, (NaiveDate, SymptomType)>(
        r#"
        SELECT logged_at, symptom_type
        FROM symptom_logs
        WHERE user_id = $1
        ORDER BY logged_at DESC
        "#,
    )
    .bind(query.user_id)
    .fetch_all(&pool)
    .await
    .map_err(query_failed)?;

    Ok(Json(group_by_date(rows)))
}

/// Newest date first, symptoms in logged order within a date.
fn group_by_date(rows: Vec<(NaiveDate, SymptomType)>) -> Vec<SymptomsByDate> {
    let mut map = BTreeMap::<NaiveDate, Vec<SymptomType>>::new();
    for (logged_at, symptom_type) in rows {
        map.entry(logged_at)
            .or_default()
            .push(symptom_type);
    }

    map.into_iter()
        .rev()
        .map(|(logged_at, symptoms)| SymptomsByDate { logged_at, symptoms })
        .collect()
}
