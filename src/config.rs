use std::{env, net::SocketAddr, str::FromStr, time::Duration};

use anyhow::{Context, Result};

/// How much history a forecast looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForecastSettings {
    /// Most recent cycle starts fed to the statistics.
    pub history_window: usize,
    /// Recent observations checked for the ovulation annotation.
    pub observation_window: usize,
}

impl Default for ForecastSettings {
    fn default() -> Self {
        Self { history_window: 6, observation_window: 3 }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub max_connections: u32,
    pub forecast: ForecastSettings,
    /// In-process sweep period; `None` leaves sweeping to the cron endpoint.
    pub sweep_interval: Option<Duration>,
}

impl Config {
    /// Read from the environment. Call `dotenvy::dotenv()` first for `.env` support.
    pub fn from_env() -> Result<Self> {
        let defaults = ForecastSettings::default();
        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            bind_addr: parse_or("BIND_ADDR", SocketAddr::from(([0, 0, 0, 0], 3050)))?,
            max_connections: parse_or("DB_MAX_CONNECTIONS", 5)?,
            forecast: ForecastSettings {
                history_window: parse_or("HISTORY_WINDOW", defaults.history_window)?,
                observation_window: parse_or("OBSERVATION_WINDOW", defaults.observation_window)?,
            },
            sweep_interval: parse_opt::<u64>("SWEEP_INTERVAL_SECS")?
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs),
        })
    }
}

fn parse_opt<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .with_context(|| format!("invalid value for {key}: {raw:?}")),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(e) => Err(e).with_context(|| format!("unreadable {key}")),
    }
}

fn parse_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    Ok(parse_opt(key)?.unwrap_or(default))
}
