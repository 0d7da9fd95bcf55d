//! Compiled argument validation.
//!
//! Each tool's input schema is compiled once when the registry is built and
//! reused for every call. Validation is pure: it never touches the handler.

use jsonschema::JSONSchema;
use jsonschema::error::{ValidationError, ValidationErrorKind};
use serde_json::{Map, Value};
use toolbridge_core::FieldError;

/// A compiled input schema.
pub struct ArgumentValidator {
    compiled: JSONSchema,
    /// Declared property names when unknown fields should be stripped.
    known_fields: Option<Vec<String>>,
}

impl std::fmt::Debug for ArgumentValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArgumentValidator")
            .field("known_fields", &self.known_fields)
            .finish_non_exhaustive()
    }
}

impl ArgumentValidator {
    /// Compile `schema`. Returns the compiler message on failure.
    pub fn compile(schema: &Value) -> Result<Self, String> {
        let compiled = JSONSchema::compile(schema).map_err(|error| error.to_string())?;

        // Unknown fields are dropped unless the schema opts into extras.
        let allows_extra = schema.get("additionalProperties") == Some(&Value::Bool(true));
        let known_fields = match schema.get("properties").and_then(Value::as_object) {
            Some(props) if !allows_extra => Some(props.keys().cloned().collect()),
            _ => None,
        };

        Ok(Self {
            compiled,
            known_fields,
        })
    }

    /// Validate `args`, returning the normalized mapping or every violation.
    pub fn validate(&self, args: Map<String, Value>) -> Result<Map<String, Value>, Vec<FieldError>> {
        let mut instance = Value::Object(args);
        if let Err(errors) = self.compiled.validate(&instance) {
            return Err(errors.map(|error| field_error(&error)).collect());
        }

        let mut args = instance
            .as_object_mut()
            .map(std::mem::take)
            .unwrap_or_default();
        if let Some(known) = &self.known_fields {
            args.retain(|key, _| known.iter().any(|k| k == key));
        }
        Ok(args)
    }
}

fn field_error(error: &ValidationError<'_>) -> FieldError {
    let field = match &error.kind {
        ValidationErrorKind::Required { property } => property
            .as_str()
            .map_or_else(|| property.to_string(), str::to_owned),
        _ => {
            let path = error.instance_path.to_string();
            let path = path.trim_start_matches('/');
            if path.is_empty() {
                "$".to_string()
            } else {
                path.replace('/', ".")
            }
        }
    };
    FieldError::new(field, error.to_string())
}
