//! Builder for tool descriptors and their JSON Schema.

use serde_json::{Map, Value};
use toolbridge_core::ToolDescriptor;

/// Fluent builder for [`ToolDescriptor`]s.
///
/// ```ignore
/// ToolSchemaBuilder::new("github.getRepo", "Fetch repository metadata")
///     .required_property("owner", json!({"type": "string"}))
///     .required_property("repo", json!({"type": "string"}))
///     .build()
/// ```
pub struct ToolSchemaBuilder {
    name: String,
    description: String,
    properties: Map<String, Value>,
    required: Vec<String>,
    mutating: bool,
}

impl ToolSchemaBuilder {
    /// Create a new builder with the given tool name and description.
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            properties: Map::new(),
            required: Vec::new(),
            mutating: false,
        }
    }

    /// Add an optional property.
    #[must_use]
    pub fn property(mut self, name: &str, schema: Value) -> Self {
        let _ = self.properties.insert(name.into(), schema);
        self
    }

    /// Add a required property.
    #[must_use]
    pub fn required_property(mut self, name: &str, schema: Value) -> Self {
        let _ = self.properties.insert(name.into(), schema);
        self.required.push(name.into());
        self
    }

    /// Mark the tool as mutating external state.
    #[must_use]
    pub fn mutating(mut self) -> Self {
        self.mutating = true;
        self
    }

    /// Build the final descriptor.
    pub fn build(self) -> ToolDescriptor {
        let mut schema = Map::new();
        let _ = schema.insert("type".into(), Value::String("object".into()));
        let _ = schema.insert("properties".into(), Value::Object(self.properties));
        if !self.required.is_empty() {
            let required = self.required.into_iter().map(Value::String).collect();
            let _ = schema.insert("required".into(), Value::Array(required));
        }
        ToolDescriptor {
            name: self.name,
            description: self.description,
            input_schema: Value::Object(schema),
            mutating: self.mutating,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_schema() {
        let desc = ToolSchemaBuilder::new("ping", "Return pong").build();
        assert_eq!(desc.name, "ping");
        assert_eq!(
            desc.input_schema,
            json!({"type": "object", "properties": {}})
        );
        assert!(!desc.mutating);
    }

    #[test]
    fn required_property_in_both_properties_and_required() {
        let desc = ToolSchemaBuilder::new("T", "D")
            .required_property("content", json!({"type": "string"}))
            .property("channel_id", json!({"type": "string"}))
            .build();
        assert!(desc.input_schema["properties"].get("content").is_some());
        assert!(desc.input_schema["properties"].get("channel_id").is_some());
        assert_eq!(desc.required_fields(), vec!["content"]);
    }

    #[test]
    fn required_order_preserved() {
        let desc = ToolSchemaBuilder::new("T", "D")
            .required_property("owner", json!({"type": "string"}))
            .property("state", json!({"type": "string"}))
            .required_property("repo", json!({"type": "string"}))
            .build();
        assert_eq!(desc.required_fields(), vec!["owner", "repo"]);
    }

    #[test]
    fn mutating_flag_set() {
        let desc = ToolSchemaBuilder::new("T", "D").mutating().build();
        assert!(desc.mutating);
    }
}
