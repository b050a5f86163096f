mod health;
mod metrics;

use crate::server::AppState;
use axum::{routing::get, Router};
use std::sync::Arc;

/// Scrape endpoint plus the fixed service routes
pub fn exporter(metrics_path: &str) -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health::health_check))
        .route(metrics_path, get(metrics::scrape))
}

async fn root() -> &'static str {
    "docker-exporter"
}
