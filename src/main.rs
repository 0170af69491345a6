use axum::{routing::get, Router};
use dotenvy::dotenv;
use sqlx::postgres::PgPoolOptions;
use std::{sync::Arc, time::Duration};
use tracing_subscriber::EnvFilter;
use anyhow::Result;
use chrono::Utc;

use cyclecast_backend::{
    config::Config,
    reminders::LogNotifier,
    routes::{self, SharedService},
    service::CycleService,
    store::PgStore,
};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env()?;
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.database_url)
        .await?;

    sqlx::migrate!().run(&pool).await?;

    let service = Arc::new(CycleService::new(
        PgStore::new(pool.clone()),
        LogNotifier,
        config.forecast,
    ));

    if let Some(period) = config.sweep_interval {
        spawn_sweeper(service.clone(), period);
    }

    let app = Router::new()
        .merge(routes::cycle::routes(pool.clone()))
        .merge(routes::symptoms::routes(pool.clone()))
        .merge(routes::ovulation::routes(pool.clone()))
        .merge(routes::service_routes(service))
        .route("/health", get(|| async { "✅ Backend up" }));

    tracing::info!("🧠 Server running at {}", config.bind_addr);

    axum::serve(
        tokio::net::TcpListener::bind(config.bind_addr).await?,
        app.into_make_service(),
    )
    .await?;

    Ok(())
}

fn spawn_sweeper(service: SharedService<PgStore, LogNotifier>, period: Duration) {
    tracing::info!("⏰ Notification sweep every {:?}", period);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        loop {
            interval.tick().await;
            match service.sweep_due_notifications(Utc::now()).await {
                Ok(report) if report.failed > 0 => {
                    tracing::warn!("⚠️ {} notifications left pending for the next sweep", report.failed);
                }
                Ok(_) => {}
                Err(e) => tracing::debug!("Sweep skipped: {}", e),
            }
        }
    });
}
