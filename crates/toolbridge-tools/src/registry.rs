//! Tool registry: the immutable index of every tool the bridge serves.
//!
//! Built once at startup through [`ToolRegistryBuilder`], which compiles each
//! input schema and rejects duplicate names. The frozen [`ToolRegistry`] is
//! shared behind an `Arc` and read concurrently without locking.

use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::{Value, json};
use toolbridge_core::ToolDescriptor;
use tracing::debug;

use crate::errors::RegistryError;
use crate::traits::ToolHandler;
use crate::validator::ArgumentValidator;

/// One registry entry: descriptor, compiled validator, and handler.
pub struct RegisteredTool {
    descriptor: ToolDescriptor,
    validator: ArgumentValidator,
    handler: Arc<dyn ToolHandler>,
}

impl RegisteredTool {
    /// Static description of the tool.
    pub fn descriptor(&self) -> &ToolDescriptor {
        &self.descriptor
    }

    /// Compiled input schema.
    pub fn validator(&self) -> &ArgumentValidator {
        &self.validator
    }

    /// The handler.
    pub fn handler(&self) -> &Arc<dyn ToolHandler> {
        &self.handler
    }
}

/// Collects handlers before freezing them into a [`ToolRegistry`].
#[derive(Default)]
pub struct ToolRegistryBuilder {
    tools: IndexMap<String, RegisteredTool>,
}

impl ToolRegistryBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler, compiling its schema.
    pub fn register(&mut self, handler: Arc<dyn ToolHandler>) -> Result<&mut Self, RegistryError> {
        let descriptor = handler.descriptor();
        if self.tools.contains_key(&descriptor.name) {
            return Err(RegistryError::Duplicate {
                name: descriptor.name,
            });
        }
        let validator = ArgumentValidator::compile(&descriptor.input_schema).map_err(|message| {
            RegistryError::InvalidSchema {
                name: descriptor.name.clone(),
                message,
            }
        })?;
        debug!(tool_name = %descriptor.name, mutating = descriptor.mutating, "tool registered");
        let _ = self.tools.insert(
            descriptor.name.clone(),
            RegisteredTool {
                descriptor,
                validator,
                handler,
            },
        );
        Ok(self)
    }

    /// Freeze the registry and compute its manifest.
    pub fn build(self) -> ToolRegistry {
        let descriptors: Vec<&ToolDescriptor> = self.tools.values().map(|t| &t.descriptor).collect();
        let manifest = json!({ "tools": descriptors });
        ToolRegistry {
            tools: self.tools,
            manifest,
        }
    }
}

/// Immutable name → tool mapping in registration order.
pub struct ToolRegistry {
    tools: IndexMap<String, RegisteredTool>,
    manifest: Value,
}

impl ToolRegistry {
    /// Start building a registry.
    pub fn builder() -> ToolRegistryBuilder {
        ToolRegistryBuilder::new()
    }

    /// Look up a tool by name.
    pub fn lookup(&self, name: &str) -> Option<&RegisteredTool> {
        self.tools.get(name)
    }

    /// Descriptors in registration order.
    pub fn list(&self) -> Vec<&ToolDescriptor> {
        self.tools.values().map(|t| &t.descriptor).collect()
    }

    /// `{"tools": [descriptor, ...]}`, computed once at build time.
    pub fn manifest(&self) -> &Value {
        &self.manifest
    }

    /// Tool names in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(String::as_str).collect()
    }

    /// Number of registered tools.
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Whether a tool with the given name is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use serde_json::{Map, json};

    use super::*;
    use crate::errors::ToolError;
    use crate::schema::ToolSchemaBuilder;
    use crate::traits::ToolContext;

    /// Minimal stub handler for registry tests.
    struct StubTool {
        name: &'static str,
        schema: Option<Value>,
    }

    impl StubTool {
        fn new(name: &'static str) -> Arc<dyn ToolHandler> {
            Arc::new(Self { name, schema: None })
        }
    }

    #[async_trait]
    impl ToolHandler for StubTool {
        fn descriptor(&self) -> ToolDescriptor {
            let mut desc = ToolSchemaBuilder::new(self.name, format!("Stub {}", self.name))
                .required_property("x", json!({"type": "string"}))
                .build();
            if let Some(schema) = &self.schema {
                desc.input_schema = schema.clone();
            }
            desc
        }

        async fn invoke(
            &self,
            args: Map<String, Value>,
            _ctx: &ToolContext,
        ) -> Result<Value, ToolError> {
            Ok(Value::Object(args))
        }
    }

    fn build(names: &[&'static str]) -> ToolRegistry {
        let mut builder = ToolRegistry::builder();
        for name in names {
            let _ = builder.register(StubTool::new(name)).unwrap();
        }
        builder.build()
    }

    #[test]
    fn lookup_registered_tool() {
        let reg = build(&["a", "b"]);
        let entry = reg.lookup("a").unwrap();
        assert_eq!(entry.descriptor().name, "a");
        assert!(reg.lookup("missing").is_none());
    }

    #[test]
    fn list_preserves_registration_order() {
        let reg = build(&["zeta", "alpha", "mid"]);
        let names: Vec<_> = reg.list().iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["zeta", "alpha", "mid"]);
        assert_eq!(reg.names(), vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn duplicate_name_rejected() {
        let mut builder = ToolRegistry::builder();
        let _ = builder.register(StubTool::new("dup")).unwrap();
        let err = builder.register(StubTool::new("dup")).err().unwrap();
        assert!(matches!(err, RegistryError::Duplicate { name } if name == "dup"));
    }

    #[test]
    fn invalid_schema_rejected() {
        let mut builder = ToolRegistry::builder();
        let bad = Arc::new(StubTool {
            name: "bad",
            schema: Some(json!({"type": 12})),
        });
        let err = builder.register(bad).err().unwrap();
        assert!(matches!(err, RegistryError::InvalidSchema { .. }));
    }

    #[test]
    fn manifest_lists_descriptors_in_order() {
        let reg = build(&["b", "a"]);
        let tools = reg.manifest()["tools"].as_array().unwrap();
        assert_eq!(tools.len(), 2);
        assert_eq!(tools[0]["name"], "b");
        assert_eq!(tools[1]["name"], "a");
        assert_eq!(tools[0]["input_schema"]["type"], "object");
        assert_eq!(tools[0]["mutating"], false);
    }

    #[test]
    fn entries_carry_compiled_validator() {
        let reg = build(&["a"]);
        let entry = reg.lookup("a").unwrap();
        assert!(entry.validator().validate(Map::new()).is_err());
    }

    #[test]
    fn empty_registry() {
        let reg = ToolRegistry::builder().build();
        assert!(reg.is_empty());
        assert_eq!(reg.len(), 0);
        assert_eq!(reg.manifest(), &json!({"tools": []}));
        assert!(!reg.contains("a"));
    }
}
