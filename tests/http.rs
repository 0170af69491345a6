use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use chrono::{Duration, NaiveDate, Utc};
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use cyclecast_backend::config::ForecastSettings;
use cyclecast_backend::models::CycleRecord;
use cyclecast_backend::reminders::LogNotifier;
use cyclecast_backend::routes;
use cyclecast_backend::service::CycleService;
use cyclecast_backend::store::MemoryStore;

async fn app_with(starts: &[NaiveDate]) -> (Router, Uuid) {
    let store = MemoryStore::new();
    let user_id = Uuid::new_v4();
    for start in starts {
        store
            .add_cycle(CycleRecord {
                id: Uuid::new_v4(),
                user_id,
                start_date: *start,
                end_date: None,
                cycle_length: Some(28),
                flow_intensity: None,
                notes: None,
                created_at: Utc::now(),
            })
            .await;
    }
    let service = Arc::new(CycleService::new(store, LogNotifier, ForecastSettings::default()));
    (routes::service_routes(service), user_id)
}

/// Three regular starts ending `days_ago` days before today.
fn recent_starts(days_ago: i64) -> Vec<NaiveDate> {
    let last = Utc::now().date_naive() - Duration::days(days_ago);
    vec![last, last - Duration::days(28), last - Duration::days(56)]
}

async fn send(app: Router, method: &str, uri: String, body: Option<&str>) -> (StatusCode, Value) {
    let mut req = Request::builder().method(method).uri(uri);
    if body.is_some() {
        req = req.header("content-type", "application/json");
    }
    let req = req.body(Body::from(body.unwrap_or("").to_owned())).unwrap();

    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

#[tokio::test]
async fn next_period_returns_forecast() {
    let starts = recent_starts(3);
    let (app, user) = app_with(&starts).await;

    let (status, body) = send(app, "GET", format!("/predictions/next-period?user_id={user}"), None).await;
    assert_eq!(status, StatusCode::OK);
    let expected = (starts[0] + Duration::days(28)).to_string();
    assert_eq!(body["predicted_date"], expected.as_str());
    assert_eq!(body["confidence"], "high");
    assert_eq!(body["cycles_analyzed"], 2);
}

#[tokio::test]
async fn insufficient_history_is_unprocessable() {
    let (app, user) = app_with(&recent_starts(3)[..1]).await;

    let (status, body) = send(app, "GET", format!("/predictions/ovulation?user_id={user}"), None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["message"], "Please log at least 2 cycles for predictions");
}

#[tokio::test]
async fn setup_then_list_pending() {
    let (app, user) = app_with(&recent_starts(3)).await;

    let (status, ack) = send(
        app.clone(),
        "POST",
        format!("/notifications/setup?user_id={user}"),
        Some(r#"{"ovulation_reminder": false, "reminder_days_before": 3}"#),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ack["scheduled"].as_array().unwrap().len(), 1);

    let (status, pending) = send(app, "GET", format!("/notifications?user_id={user}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(pending[0]["kind"], "period_reminder");
    assert_eq!(pending[0]["message"], "Your period is expected in 3 days");
}

#[tokio::test]
async fn huge_lead_time_is_accepted_without_reminders() {
    let (app, user) = app_with(&recent_starts(3)).await;

    let (status, ack) = send(
        app,
        "POST",
        format!("/notifications/setup?user_id={user}"),
        Some(r#"{"reminder_days_before": 4000000000}"#),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ack["scheduled"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn check_sweeps_due_reminders() {
    // next start is due in 5 days; a 10-day lead puts the reminder in the past
    let (app, user) = app_with(&recent_starts(23)).await;
    send(
        app.clone(),
        "POST",
        format!("/notifications/setup?user_id={user}"),
        Some(r#"{"ovulation_reminder": false, "reminder_days_before": 10}"#),
    )
    .await;

    let (status, report) = send(app.clone(), "GET", "/notifications/check".into(), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["processed"], 1);

    let (_, report) = send(app, "GET", "/notifications/check".into(), None).await;
    assert_eq!(report["processed"], 0);
}

#[tokio::test]
async fn cycle_stats_and_today_summary() {
    let (app, user) = app_with(&recent_starts(3)).await;

    let (status, stats) = send(app.clone(), "GET", format!("/cycle-stats?user_id={user}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["total_cycles"], 3);
    assert_eq!(stats["cycle_regularity"], "regular");

    let (status, summary) = send(app, "GET", format!("/cycle?user_id={user}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["cycle_day"], 4);
    assert_eq!(summary["period_expected_in_days"], 25);
    assert_eq!(summary["in_fertile_window"], false);
}

#[tokio::test]
async fn single_cycle_is_scoped_to_its_owner() {
    let store = MemoryStore::new();
    let owner = Uuid::new_v4();
    let cycle_id = Uuid::new_v4();
    store
        .add_cycle(CycleRecord {
            id: cycle_id,
            user_id: owner,
            start_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 3, 5),
            cycle_length: Some(28),
            flow_intensity: None,
            notes: Some("light cramps".into()),
            created_at: Utc::now(),
        })
        .await;
    let service = Arc::new(CycleService::new(store, LogNotifier, ForecastSettings::default()));
    let app = routes::service_routes(service);

    let (status, body) = send(app.clone(), "GET", format!("/cycles/{cycle_id}?user_id={owner}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], cycle_id.to_string().as_str());
    assert_eq!(body["start_date"], "2024-03-01");
    assert_eq!(body["notes"], "light cramps");

    let stranger = Uuid::new_v4();
    let (status, _) = send(app.clone(), "GET", format!("/cycles/{cycle_id}?user_id={stranger}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let missing = Uuid::new_v4();
    let (status, _) = send(app, "GET", format!("/cycles/{missing}?user_id={owner}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
