pub mod analytics;
pub mod api;
pub mod client;
pub mod config;
pub mod db;
pub mod errors;
pub mod metrics;
pub mod models;
pub mod services;

use crate::config::AppConfig;
use crate::db::JournalStore;

#[derive(Clone)]
pub struct AppState {
    pub store: JournalStore,
    pub config: AppConfig,
    pub metrics_handle: metrics_exporter_prometheus::PrometheusHandle,
}
