//! # Document Entities
//!
//! Serde forms of the entities the document model stores. Field names are
//! camelCase on the wire (`statusCode`, `modelName`, `requestBody`).

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use sea_core::{path, HttpMethod};

fn is_false(b: &bool) -> bool {
    !*b
}

/// A server entry. Uniqueness key: `url`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Server {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub overwrite: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Server {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            description: None,
            overwrite: false,
            extra: Map::new(),
        }
    }
}

/// A tag. Uniqueness key: `name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub overwrite: bool,
}

impl Tag {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: Some(description.into()),
            overwrite: false,
        }
    }
}

/// A named object schema published under `components.schemas`.
/// Uniqueness key: `name`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Model {
    pub name: String,
    pub properties: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<Value>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub overwrite: bool,
    /// Any other schema keywords (`type`, `additionalProperties`, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Model {
    /// The model as a JSON Schema: bookkeeping fields removed, `type`
    /// defaulted to `object`. `errorMessage` is kept only when requested.
    pub fn to_schema(&self, with_messages: bool) -> Value {
        let mut schema = Map::new();
        schema.insert("type".into(), Value::String("object".into()));
        for (k, v) in &self.extra {
            schema.insert(k.clone(), v.clone());
        }
        schema.insert("properties".into(), Value::Object(self.properties.clone()));
        if let Some(required) = &self.required {
            schema.insert(
                "required".into(),
                Value::Array(required.iter().cloned().map(Value::String).collect()),
            );
        }
        if with_messages {
            if let Some(messages) = &self.error_message {
                schema.insert("errorMessage".into(), messages.clone());
            }
        }
        Value::Object(schema)
    }
}

/// One documented response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseSpec {
    pub status_code: u16,
    pub model_name: String,
    pub description: String,
}

impl ResponseSpec {
    pub fn new(
        status_code: u16,
        model_name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            status_code,
            model_name: model_name.into(),
            description: description.into(),
        }
    }
}

/// Where a parameter is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterLocation {
    Query,
    Path,
    Header,
}

/// A declared request parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    #[serde(rename = "in")]
    pub location: ParameterLocation,
    pub name: String,
    #[serde(default)]
    pub required: bool,
    pub description: String,
    pub schema: Value,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Parameter {
    pub fn new(
        location: ParameterLocation,
        name: impl Into<String>,
        description: impl Into<String>,
        schema: Value,
    ) -> Self {
        Self {
            location,
            name: name.into(),
            required: false,
            description: description.into(),
            schema,
            extra: Map::new(),
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// A declared JSON request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestBody {
    pub model_name: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A documented operation. Uniqueness key: normalized `path` plus
/// lower-case `method`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathDef {
    pub path: String,
    pub method: HttpMethod,
    pub summary: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    pub responses: Vec<ResponseSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Vec<Parameter>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_body: Option<RequestBody>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub overwrite: bool,
    /// Other operation fields (`operationId`, `deprecated`, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PathDef {
    pub fn key(&self) -> PathKey {
        PathKey::new(&self.path, self.method)
    }
}

/// Uniqueness key of a path or route.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PathKey {
    pub path: String,
    pub method: HttpMethod,
}

impl PathKey {
    pub fn new(raw_path: &str, method: HttpMethod) -> Self {
        Self {
            path: path::normalize(raw_path),
            method,
        }
    }
}

impl std::fmt::Display for PathKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.method.as_str().to_uppercase(), self.path)
    }
}

pub const DEFAULT_EXPLORER_PATH: &str = "/swagger-ui";

fn default_explorer_path() -> String {
    DEFAULT_EXPLORER_PATH.to_string()
}

/// Settings the document model is created from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentDefinition {
    /// URL the explorer issues requests against, without trailing slash.
    pub base_url: String,
    /// Where the explorer is mounted.
    #[serde(default = "default_explorer_path")]
    pub explorer_path: String,
    /// Directory holding the explorer's static assets.
    pub public_dir: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl DocumentDefinition {
    pub fn new(base_url: impl Into<String>, public_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_url: base_url.into(),
            explorer_path: default_explorer_path(),
            public_dir: public_dir.into(),
            title: None,
            description: None,
            version: None,
        }
    }
}
