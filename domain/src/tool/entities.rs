//! Tool domain entities
//!
//! A [`ToolDescriptor`] is the metadata half of a tool: the name clients
//! call it by, a human description, and a JSON-Schema-shaped input schema.
//! The executable half lives behind the application layer's `ToolHandler`
//! port. [`ToolDescriptor::validate`] enforces the catalogue rules:
//!
//! | Field | Rule |
//! |-------|------|
//! | `name` | `^[a-z0-9][a-z0-9_]{2,49}$` |
//! | `description` | 10–500 characters |
//! | `input_schema` | JSON object; root `type`, if present, is a JSON-Schema type |

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use thiserror::Error;

static TOOL_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9][a-z0-9_]{2,49}$").unwrap());

pub const MIN_DESCRIPTION_LEN: usize = 10;
pub const MAX_DESCRIPTION_LEN: usize = 500;

/// JSON-Schema root types accepted for a tool's input schema.
pub const SCHEMA_ROOT_TYPES: &[&str] = &[
    "object", "array", "string", "number", "integer", "boolean", "null",
];

/// Reasons a descriptor is rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ToolDescriptorError {
    #[error("invalid tool name '{0}': must match ^[a-z0-9][a-z0-9_]{{2,49}}$")]
    InvalidName(String),

    #[error("invalid description for tool '{name}': length {length} is outside 10..=500")]
    InvalidDescription { name: String, length: usize },

    #[error("invalid input schema for tool '{name}': {reason}")]
    InvalidSchema { name: String, reason: String },
}

/// Metadata describing a callable tool, in the shape `tools/list` returns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub input_schema: serde_json::Value,
}

impl ToolDescriptor {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        input_schema: serde_json::Value,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema,
        }
    }

    /// Check name, description and schema against the catalogue rules.
    pub fn validate(&self) -> Result<(), ToolDescriptorError> {
        validate_tool_name(&self.name)?;

        let length = self.description.chars().count();
        if !(MIN_DESCRIPTION_LEN..=MAX_DESCRIPTION_LEN).contains(&length) {
            return Err(ToolDescriptorError::InvalidDescription {
                name: self.name.clone(),
                length,
            });
        }

        validate_input_schema(&self.name, &self.input_schema)
    }
}

/// Validate a tool name on its own.
pub fn validate_tool_name(name: &str) -> Result<(), ToolDescriptorError> {
    if TOOL_NAME.is_match(name) {
        Ok(())
    } else {
        Err(ToolDescriptorError::InvalidName(name.to_string()))
    }
}

fn validate_input_schema(name: &str, schema: &serde_json::Value) -> Result<(), ToolDescriptorError> {
    let invalid = |reason: String| ToolDescriptorError::InvalidSchema {
        name: name.to_string(),
        reason,
    };

    let Some(object) = schema.as_object() else {
        return Err(invalid("schema must be a JSON object".to_string()));
    };

    match object.get("type") {
        None => Ok(()),
        Some(serde_json::Value::String(kind)) if SCHEMA_ROOT_TYPES.contains(&kind.as_str()) => {
            Ok(())
        }
        Some(serde_json::Value::String(kind)) => {
            Err(invalid(format!("unsupported root type '{}'", kind)))
        }
        Some(_) => Err(invalid("root 'type' must be a string".to_string())),
    }
}

/// Convenience constructor for the common `{"type":"object", ...}` schema.
pub fn object_schema(
    properties: serde_json::Value,
    required: &[&str],
) -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn descriptor(name: &str) -> ToolDescriptor {
        ToolDescriptor::new(name, "A perfectly fine description", json!({"type": "object"}))
    }

    #[test]
    fn test_valid_names() {
        for name in ["hello", "health_check", "abc", "0day", "linode_instance_list"] {
            assert!(validate_tool_name(name).is_ok(), "{} should be valid", name);
        }
        let longest = format!("a{}", "b".repeat(49));
        assert!(validate_tool_name(&longest).is_ok());
    }

    #[test]
    fn test_invalid_names() {
        let too_long = format!("a{}", "b".repeat(50));
        for name in [
            "ab",
            "_hello",
            "Hello",
            "hello world",
            "hello-world",
            "",
            too_long.as_str(),
        ] {
            assert!(validate_tool_name(name).is_err(), "{} should be invalid", name);
        }
    }

    #[test]
    fn test_description_bounds() {
        let mut d = descriptor("hello");
        d.description = "too short".to_string();
        assert!(matches!(
            d.validate(),
            Err(ToolDescriptorError::InvalidDescription { length: 9, .. })
        ));

        d.description = "x".repeat(10);
        assert!(d.validate().is_ok());

        d.description = "x".repeat(500);
        assert!(d.validate().is_ok());

        d.description = "x".repeat(501);
        assert!(d.validate().is_err());
    }

    #[test]
    fn test_schema_rules() {
        let mut d = descriptor("hello");
        d.input_schema = json!({});
        assert!(d.validate().is_ok());

        d.input_schema = json!({"type": "tuple"});
        assert!(matches!(
            d.validate(),
            Err(ToolDescriptorError::InvalidSchema { .. })
        ));

        d.input_schema = json!({"type": 3});
        assert!(d.validate().is_err());

        d.input_schema = json!(["object"]);
        assert!(d.validate().is_err());
    }

    #[test]
    fn test_wire_shape() {
        let d = descriptor("hello");
        let value = serde_json::to_value(&d).unwrap();
        assert_eq!(value["name"], "hello");
        assert!(value.get("inputSchema").is_some());
        assert!(value.get("input_schema").is_none());
    }

    #[test]
    fn test_object_schema_helper() {
        let schema = object_schema(json!({"name": {"type": "string"}}), &["name"]);
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["required"][0], "name");
    }
}
