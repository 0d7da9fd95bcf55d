//! Upstream response normalization.

use serde_json::Value;

use crate::errors::ToolError;
use crate::traits::UpstreamResponse;

/// Return the body of a 2xx response, or an upstream error naming `service`.
pub fn expect_success(service: &str, response: UpstreamResponse) -> Result<Value, ToolError> {
    if response.is_success() {
        return Ok(response.body);
    }
    let detail = error_detail(&response.body);
    let message = match detail {
        Some(detail) => format!("{service} responded with {}: {detail}", response.status),
        None => format!("{service} responded with {}", response.status),
    };
    Err(ToolError::Upstream {
        message,
        status: Some(response.status),
        body: (!response.body.is_null()).then_some(response.body),
    })
}

/// Best-effort human message from common error body shapes.
fn error_detail(body: &Value) -> Option<String> {
    match body {
        Value::String(s) if !s.is_empty() => Some(s.chars().take(200).collect()),
        Value::Object(map) => map
            .get("message")
            .and_then(Value::as_str)
            .or_else(|| map.get("error").and_then(|e| e.get("message").and_then(Value::as_str)))
            .or_else(|| map.get("error").and_then(Value::as_str))
            .map(str::to_owned),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn resp(status: u16, body: Value) -> UpstreamResponse {
        UpstreamResponse { status, body }
    }

    #[test]
    fn success_passes_body_through() {
        let body = expect_success("GitHub", resp(200, json!({"id": 1}))).unwrap();
        assert_eq!(body["id"], 1);
    }

    #[test]
    fn failure_carries_status_and_message() {
        let err = expect_success("GitHub", resp(404, json!({"message": "Not Found"}))).unwrap_err();
        match err {
            ToolError::Upstream {
                message,
                status,
                body,
            } => {
                assert_eq!(message, "GitHub responded with 404: Not Found");
                assert_eq!(status, Some(404));
                assert_eq!(body.unwrap()["message"], "Not Found");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn nested_error_message_extracted() {
        let err = expect_success(
            "OpenAI",
            resp(401, json!({"error": {"message": "bad key", "type": "auth"}})),
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "OpenAI responded with 401: bad key");
    }

    #[test]
    fn empty_body_omitted() {
        let err = expect_success("Docker", resp(500, Value::Null)).unwrap_err();
        assert!(matches!(err, ToolError::Upstream { body: None, .. }));
        assert_eq!(err.to_string(), "Docker responded with 500");
    }
}
