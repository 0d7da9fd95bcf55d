//! Tool descriptor types.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Static description of one registered tool.
///
/// Serialized as one entry of the manifest sent to stream subscribers and
/// returned by MCP `tools/list`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    /// Unique tool name (e.g. `github.getRepo`).
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// JSON Schema (`type: object`) for the tool's arguments.
    pub input_schema: Value,
    /// Whether the tool changes external state and is gated by the write guard.
    #[serde(default)]
    pub mutating: bool,
}

impl ToolDescriptor {
    /// Names of the fields listed as required by the input schema.
    pub fn required_fields(&self) -> Vec<&str> {
        self.input_schema
            .get("required")
            .and_then(Value::as_array)
            .map(|fields| fields.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }
}

/// One argument that failed schema validation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// Offending field, dotted for nested values (`"$"` for the root).
    pub field: String,
    /// Constraint that was violated.
    pub message: String,
}

impl FieldError {
    /// Create a field error.
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn required_fields_from_schema() {
        let desc = ToolDescriptor {
            name: "discord.sendMessage".into(),
            description: "Send a message".into(),
            input_schema: json!({
                "type": "object",
                "properties": {"content": {"type": "string"}},
                "required": ["content"]
            }),
            mutating: true,
        };
        assert_eq!(desc.required_fields(), vec!["content"]);
    }

    #[test]
    fn required_fields_empty_when_absent() {
        let desc = ToolDescriptor {
            name: "ping".into(),
            description: "Return pong".into(),
            input_schema: json!({"type": "object", "properties": {}}),
            mutating: false,
        };
        assert!(desc.required_fields().is_empty());
    }

    #[test]
    fn mutating_defaults_to_false_when_missing() {
        let desc: ToolDescriptor = serde_json::from_value(json!({
            "name": "ping",
            "description": "Return pong",
            "input_schema": {"type": "object"}
        }))
        .unwrap();
        assert!(!desc.mutating);
    }

    #[test]
    fn field_error_serializes_flat() {
        let err = FieldError::new("content", "\"content\" is a required property");
        let v = serde_json::to_value(&err).unwrap();
        assert_eq!(v["field"], "content");
        assert!(v["message"].as_str().unwrap().contains("required"));
    }
}
