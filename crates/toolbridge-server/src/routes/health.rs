//! `/healthz`, `/health`, and `/metrics`.

use std::time::Instant;

use axum::Json;
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Redirect, Response};
use serde::Serialize;

use crate::server::AppState;

/// Liveness body.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Always `true` while serving.
    pub ok: bool,
    /// Crate version.
    pub version: &'static str,
    /// Registered SSE subscribers.
    pub subscribers: usize,
    /// Seconds since startup.
    pub uptime_secs: u64,
}

/// Build a health response from live counters.
pub fn health_check(start_time: Instant, subscribers: usize) -> HealthResponse {
    HealthResponse {
        ok: true,
        version: env!("CARGO_PKG_VERSION"),
        subscribers,
        uptime_secs: start_time.elapsed().as_secs(),
    }
}

/// `GET /healthz`
pub async fn healthz(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(health_check(state.start_time, state.hub.subscriber_count()))
}

/// `GET /health` → 307 to `/healthz`.
pub async fn redirect() -> Redirect {
    Redirect::temporary("/healthz")
}

/// `GET /metrics` in Prometheus text format.
pub async fn metrics(State(state): State<AppState>) -> Response {
    match &state.metrics {
        Some(handle) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            handle.render(),
        )
            .into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}
