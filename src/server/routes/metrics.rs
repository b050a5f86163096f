use crate::metrics::CONTENT_TYPE;
use crate::server::middleware::ErrorResponse;
use crate::server::AppState;
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::error;

/// Scrape handler: whatever the latest collection pass wrote
pub async fn scrape(State(state): State<Arc<AppState>>) -> Response {
    match state.metrics.render() {
        Ok(body) => ([(header::CONTENT_TYPE, CONTENT_TYPE)], body).into_response(),
        Err(e) => {
            error!(error = %e, "Failed to render metrics");
            ErrorResponse::new(StatusCode::INTERNAL_SERVER_ERROR, "Failed to render metrics")
                .into_response()
        }
    }
}
