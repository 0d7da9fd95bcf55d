//! Minimal MCP JSON-RPC endpoint at `POST /mcp/`.
//!
//! Supports `initialize`, `tools/list`, and `tools/call`. Calls go through
//! the same [`Dispatcher`](crate::dispatch::Dispatcher) as `/invoke`, so they
//! are validated, guarded, and broadcast identically.

use std::time::Instant;

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::Deserialize;
use serde_json::{Map, Value, json};
use toolbridge_core::{BridgeError, InvocationRequest};

use crate::dispatch::audit;
use crate::server::AppState;

/// MCP protocol revision reported by `initialize`.
pub const PROTOCOL_VERSION: &str = "2024-11-05";

const PARSE_ERROR: i64 = -32700;
const INVALID_REQUEST: i64 = -32600;
const METHOD_NOT_FOUND: i64 = -32601;
const INVALID_PARAMS: i64 = -32602;

#[derive(Debug, Deserialize)]
struct RpcRequest {
    #[serde(default)]
    id: Value,
    method: String,
    #[serde(default)]
    params: Value,
}

#[derive(Debug, Deserialize)]
struct CallParams {
    name: String,
    #[serde(default)]
    arguments: Option<Map<String, Value>>,
}

fn ok(id: &Value, result: Value) -> Value {
    json!({ "jsonrpc": "2.0", "id": id, "result": result })
}

fn err(id: &Value, code: i64, message: impl Into<String>, data: Option<Value>) -> Value {
    let mut error = json!({ "code": code, "message": message.into() });
    if let Some(data) = data {
        error["data"] = data;
    }
    json!({ "jsonrpc": "2.0", "id": id, "error": error })
}

/// Random session id: 5 bytes, base64url, upper-cased.
fn new_session_id() -> String {
    let bytes: [u8; 5] = rand::random();
    URL_SAFE_NO_PAD.encode(bytes).to_uppercase()
}

/// `POST /mcp/`
pub async fn rpc(State(state): State<AppState>, body: Bytes) -> Json<Value> {
    let started = Instant::now();
    let raw: Value = match serde_json::from_slice(&body) {
        Ok(raw) => raw,
        Err(e) => {
            audit("mcp.parse_error", None, "parse_error", started.elapsed());
            return Json(err(&Value::Null, PARSE_ERROR, format!("Parse error: {e}"), None));
        }
    };
    let id = raw.get("id").cloned().unwrap_or(Value::Null);
    let request: RpcRequest = match serde_json::from_value(raw) {
        Ok(request) => request,
        Err(e) => {
            audit("mcp.invalid_request", None, "invalid_request", started.elapsed());
            return Json(err(&id, INVALID_REQUEST, format!("Invalid Request: {e}"), None));
        }
    };

    let (response, tool, outcome) = match request.method.as_str() {
        "initialize" => (
            ok(
                &request.id,
                json!({
                    "session_id": new_session_id(),
                    "protocolVersion": PROTOCOL_VERSION,
                    "serverInfo": { "name": "toolbridge", "version": env!("CARGO_PKG_VERSION") },
                    "capabilities": { "tools": {} },
                }),
            ),
            None,
            "ok",
        ),
        "tools/list" => (
            ok(
                &request.id,
                json!({ "tools": state.dispatcher.registry().manifest()["tools"] }),
            ),
            None,
            "ok",
        ),
        "tools/call" => match serde_json::from_value::<CallParams>(request.params.clone()) {
            Ok(params) => {
                let (response, outcome) = call_tool(&state, &request.id, &params).await;
                (response, Some(params.name), outcome)
            }
            Err(e) => (
                err(&request.id, INVALID_PARAMS, format!("Invalid params: {e}"), None),
                None,
                "invalid_params",
            ),
        },
        _ => (
            err(&request.id, METHOD_NOT_FOUND, "Method not found", None),
            None,
            "method_not_found",
        ),
    };

    audit(&request.method, tool.as_deref(), outcome, started.elapsed());
    Json(response)
}

async fn call_tool(state: &AppState, id: &Value, params: &CallParams) -> (Value, &'static str) {
    let mut invocation =
        InvocationRequest::new(params.name.clone(), params.arguments.clone().unwrap_or_default());
    if let Some(correlation) = id.as_str().map(str::to_owned).or_else(|| id.as_i64().map(|n| n.to_string())) {
        invocation = invocation.with_correlation_id(correlation);
    }

    match state.dispatcher.invoke(invocation).await {
        Ok(payload) => {
            let text = serde_json::to_string(&payload).unwrap_or_default();
            (
                ok(
                    id,
                    json!({
                        "content": [{ "type": "text", "text": text }],
                        "structuredContent": payload,
                        "isError": false,
                    }),
                ),
                "ok",
            )
        }
        Err(BridgeError::UnknownTool { tool }) => (
            err(id, METHOD_NOT_FOUND, format!("Unknown tool: {tool}"), None),
            "unknown_tool",
        ),
        Err(e @ BridgeError::Validation { .. }) => {
            let body = e.to_body();
            (
                err(id, INVALID_PARAMS, e.to_string(), body.get("errors").cloned()),
                "validation_error",
            )
        }
        Err(e) => (
            ok(
                id,
                json!({
                    "content": [{ "type": "text", "text": e.to_string() }],
                    "structuredContent": e.to_body(),
                    "isError": true,
                }),
            ),
            e.kind().as_str(),
        ),
    }
}

/// Any other method on `/mcp` or `/mcp/`.
pub async fn use_post() -> Response {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(json!({ "error": "Use POST /mcp/" })),
    )
        .into_response()
}
