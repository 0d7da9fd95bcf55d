//! Typed extraction from validated argument maps.
//!
//! Arguments have already passed the tool's schema, so these helpers only
//! convert; a mismatch still surfaces as [`ToolError::InvalidArgument`]
//! rather than a panic.

use serde_json::{Map, Value};

use crate::errors::ToolError;

/// Extract a required, non-empty string.
pub fn required_str<'a>(args: &'a Map<String, Value>, field: &str) -> Result<&'a str, ToolError> {
    match args.get(field) {
        Some(Value::String(s)) if !s.is_empty() => Ok(s),
        Some(Value::String(_) | Value::Null) | None => Err(ToolError::InvalidArgument {
            field: field.into(),
            message: "is required".into(),
        }),
        Some(_) => Err(ToolError::InvalidArgument {
            field: field.into(),
            message: "expected a string".into(),
        }),
    }
}

/// Extract an optional non-empty string.
pub fn optional_str<'a>(args: &'a Map<String, Value>, field: &str) -> Option<&'a str> {
    args.get(field)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

/// Extract an optional unsigned integer.
pub fn optional_u64(args: &Map<String, Value>, field: &str) -> Option<u64> {
    args.get(field).and_then(Value::as_u64)
}

/// Extract an optional boolean.
pub fn optional_bool(args: &Map<String, Value>, field: &str) -> Option<bool> {
    args.get(field).and_then(Value::as_bool)
}

/// Extract an optional array of strings, skipping non-string items.
pub fn optional_strings(args: &Map<String, Value>, field: &str) -> Option<Vec<String>> {
    args.get(field).and_then(Value::as_array).map(|items| {
        items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_owned)
            .collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn args(v: Value) -> Map<String, Value> {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn required_str_present() {
        let a = args(json!({"owner": "rust-lang"}));
        assert_eq!(required_str(&a, "owner").unwrap(), "rust-lang");
    }

    #[test]
    fn required_str_missing_or_empty() {
        let a = args(json!({"owner": ""}));
        assert!(matches!(
            required_str(&a, "owner"),
            Err(ToolError::InvalidArgument { field, .. }) if field == "owner"
        ));
        assert!(required_str(&a, "repo").is_err());
    }

    #[test]
    fn required_str_wrong_type() {
        let a = args(json!({"owner": 5}));
        let err = required_str(&a, "owner").unwrap_err();
        assert!(err.to_string().contains("expected a string"));
    }

    #[test]
    fn optional_helpers() {
        let a = args(json!({"s": "x", "e": "", "n": 3, "b": true, "list": ["a", 1, "b"]}));
        assert_eq!(optional_str(&a, "s"), Some("x"));
        assert_eq!(optional_str(&a, "e"), None);
        assert_eq!(optional_u64(&a, "n"), Some(3));
        assert_eq!(optional_bool(&a, "b"), Some(true));
        assert_eq!(
            optional_strings(&a, "list"),
            Some(vec!["a".to_string(), "b".to_string()])
        );
        assert_eq!(optional_strings(&a, "missing"), None);
    }
}
