//! `POST /invoke`.

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use toolbridge_core::InvocationRequest;
use tracing::debug;

use crate::server::AppState;

/// Parse `{tool, args, stream_id?}`, dispatch, and answer with the payload or
/// the structured error body.
pub async fn invoke(State(state): State<AppState>, body: Bytes) -> Response {
    let request: InvocationRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(e) => {
            debug!(error = %e, "rejected malformed invoke body");
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "ok": false, "error": format!("Invalid request body: {e}") })),
            )
                .into_response();
        }
    };

    match state.dispatcher.invoke(request).await {
        Ok(payload) => (StatusCode::OK, Json(payload)).into_response(),
        Err(err) => {
            let status =
                StatusCode::from_u16(err.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            (status, Json(err.to_body())).into_response()
        }
    }
}
