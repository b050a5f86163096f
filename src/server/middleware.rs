use crate::config::is_ip_allowed;
use crate::server::AppState;
use axum::{
    extract::{ConnectInfo, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json, Router,
};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tower::ServiceBuilder;
use tower_http::{compression::CompressionLayer, trace::TraceLayer};
use tracing::{debug, warn};

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
}

impl ErrorResponse {
    pub fn new(code: StatusCode, message: &str) -> (StatusCode, Json<Self>) {
        (
            code,
            Json(Self {
                error: message.to_string(),
                code: code.as_u16(),
            }),
        )
    }
}

pub fn apply(router: Router<Arc<AppState>>) -> Router<Arc<AppState>> {
    router.layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CompressionLayer::new()),
    )
}

/// Network isolation middleware - checks if request IP is in allowed networks
pub async fn network_isolation(
    State(state): State<Arc<AppState>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    request: Request,
    next: Next,
) -> Response {
    if !state.config.server.isolation_mode {
        return next.run(request).await;
    }

    let client_ip = addr.ip();

    if is_ip_allowed(&client_ip, &state.config.server.allowed_networks) {
        next.run(request).await
    } else {
        log_suspicious_request(
            &client_ip.to_string(),
            request.method().as_str(),
            request.uri().path(),
            "network_violation",
        );

        ErrorResponse::new(StatusCode::FORBIDDEN, "Access denied: unauthorized network")
            .into_response()
    }
}

/// Request timing middleware
pub async fn request_timing(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    let response = next.run(request).await;

    let duration = start.elapsed();
    let status = response.status();

    // Scrapes arrive every few seconds; keep them out of the default log level
    debug!(
        method = %method,
        path = %path,
        status = %status.as_u16(),
        duration_ms = %duration.as_millis(),
        "Request completed"
    );

    response
}

/// Log rejected requests to a separate target for security analysis
fn log_suspicious_request(ip: &str, method: &str, path: &str, reason: &str) {
    warn!(
        target: "suspicious",
        ip = %ip,
        method = %method,
        path = %path,
        reason = %reason,
        "Suspicious request detected"
    );
}
