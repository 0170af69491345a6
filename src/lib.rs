//! Cycle logging, forecasting and reminder scheduling backend.
//!
//! The forecasting core lives in [`forecast`] and [`reminders`]; [`service`]
//! ties it to storage, and [`routes`] exposes it over HTTP.

pub mod config;
pub mod error;
pub mod forecast;
pub mod models;
pub mod reminders;
pub mod routes;
pub mod service;
pub mod store;
