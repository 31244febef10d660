//! # Schema Engine Errors

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A schema or keyword could not be registered.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaConflict {
    /// The underlying compiler rejected the schema (bad `$ref`, invalid
    /// regex, wrong keyword shape).
    #[error("schema '{schema}' failed to compile: {reason}")]
    Compile { schema: String, reason: String },

    /// The schema is not a JSON object or boolean.
    #[error("schema '{schema}' is not a valid schema document: {reason}")]
    InvalidSchema { schema: String, reason: String },

    /// A keyword was registered after a schema using it was compiled.
    #[error("keyword '{keyword}' is already used by compiled schema '{schema}'")]
    KeywordInUse { keyword: String, schema: String },

    /// The keyword name belongs to the standard vocabulary.
    #[error("keyword '{0}' is reserved")]
    ReservedKeyword(String),

    /// A keyword with this name is already registered.
    #[error("keyword '{0}' is already registered")]
    DuplicateKeyword(String),
}

/// One failed constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldError {
    /// JSON Pointer to the offending value in the validated data.
    pub instance_path: String,
    /// JSON Pointer to the constraint within the schema.
    pub schema_path: String,
    /// Keyword that failed (`type`, `required`, `validModel`, ...).
    pub keyword: String,
    /// Missing property name, for `required` failures.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub property: Option<String>,
    /// Human-readable description, after `errorMessage` substitution.
    pub message: String,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.instance_path.is_empty() {
            write!(f, "  (root): {}", self.message)
        } else {
            write!(f, "  {}: {}", self.instance_path, self.message)
        }
    }
}

/// Data failed validation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct ValidationFailure {
    /// All field messages joined with `", "`.
    pub message: String,
    pub errors: Vec<FieldError>,
}

impl ValidationFailure {
    /// A failure that is not tied to any field, e.g. an unknown schema name.
    pub fn general(message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            errors: vec![FieldError {
                instance_path: String::new(),
                schema_path: String::new(),
                keyword: "schema".to_string(),
                property: None,
                message: message.clone(),
            }],
            message,
        }
    }

    /// Render every field error on its own line.
    pub fn details(&self) -> String {
        self.errors
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_error_display_marks_root() {
        let e = FieldError {
            instance_path: String::new(),
            schema_path: "/required".into(),
            keyword: "required".into(),
            property: Some("name".into()),
            message: "name is required".into(),
        };
        assert_eq!(e.to_string(), "  (root): name is required");
        let nested = FieldError {
            instance_path: "/age".into(),
            ..e
        };
        assert_eq!(nested.to_string(), "  /age: name is required");
    }

    #[test]
    fn general_failure_has_one_error() {
        let f = ValidationFailure::general("no schema registered under 'X'");
        assert_eq!(f.to_string(), "no schema registered under 'X'");
        assert_eq!(f.errors.len(), 1);
        assert_eq!(f.errors[0].keyword, "schema");
    }

    #[test]
    fn field_error_serializes_camel_case() {
        let e = FieldError {
            instance_path: "/a".into(),
            schema_path: "/properties/a/type".into(),
            keyword: "type".into(),
            property: None,
            message: "bad".into(),
        };
        let v = serde_json::to_value(&e).unwrap();
        assert_eq!(v["instancePath"], "/a");
        assert!(v.get("property").is_none());
    }
}
