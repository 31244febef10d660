//! # Service Definition
//!
//! The bootstrap configuration: service name, application directory,
//! declared products, and optional transport and document metadata.
//!
//! A definition is read from YAML or JSON, adjusted by environment
//! overrides, validated against the `Service` schema (which coerces
//! `port: "3000"` to `3000`), and only then deserialised into
//! [`ServiceDefinition`].
//!
//! | Variable   | Overrides                                  |
//! |------------|--------------------------------------------|
//! | `HOST`     | `transport.host`                           |
//! | `PORT`     | `transport.port`                           |
//! | `PRODUCTS` | `products`, comma separated                |

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use sea_schema::SchemaEngine;

use crate::error::BootstrapError;
use crate::schemas::SERVICE;

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 3000;

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceDefinition {
    pub name: String,
    pub app_dir: PathBuf,
    pub products: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transport: Option<TransportDefinition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document: Option<DocumentMeta>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransportDefinition {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub middleware: MiddlewareStack,
}

impl Default for TransportDefinition {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            middleware: MiddlewareStack::default(),
        }
    }
}

/// Named middleware run around every request (`before`) or only around
/// matched routes (`after`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MiddlewareStack {
    #[serde(default)]
    pub before: Vec<MiddlewareSpec>,
    #[serde(default)]
    pub after: Vec<MiddlewareSpec>,
}

/// `"cors"` or `{ name: "bodyLimit", params: 1024 }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MiddlewareSpec {
    Name(String),
    Configured {
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        params: Option<Value>,
    },
}

impl MiddlewareSpec {
    pub fn name(&self) -> &str {
        match self {
            Self::Name(name) | Self::Configured { name, .. } => name,
        }
    }

    pub fn params(&self) -> Option<&Value> {
        match self {
            Self::Name(_) => None,
            Self::Configured { params, .. } => params.as_ref(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl ServiceDefinition {
    /// Read a definition file. A relative `appDir` is resolved against the
    /// file's directory.
    pub fn read(path: &Path) -> Result<Value, BootstrapError> {
        let mut value = read_literal(path)?;
        if let Some(dir) = value.get("appDir").and_then(Value::as_str) {
            let dir = PathBuf::from(dir);
            if dir.is_relative() {
                let base = path.parent().unwrap_or_else(|| Path::new("."));
                value["appDir"] = json!(base.join(dir).to_string_lossy());
            }
        }
        Ok(value)
    }

    /// Validate a raw definition and convert it to its typed form.
    pub fn from_value(engine: &SchemaEngine, mut value: Value) -> Result<Self, BootstrapError> {
        tracing::debug!(definition = %value, "validating service definition");
        engine.check(SERVICE, &mut value, &())?;
        serde_json::from_value(value).map_err(BootstrapError::Definition)
    }

    /// Base URL the explorer issues requests against.
    pub fn base_url(&self) -> String {
        let transport = self.transport.clone().unwrap_or_default();
        format!("http://{}:{}", transport.host, transport.port)
    }
}

/// Apply `HOST`, `PORT` and `PRODUCTS` from `lookup` to a raw definition.
pub fn apply_env_overrides<F>(value: &mut Value, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let Some(root) = value.as_object_mut() else {
        return;
    };
    for (var, field) in [("HOST", "host"), ("PORT", "port")] {
        if let Some(v) = lookup(var) {
            let transport = root
                .entry("transport")
                .or_insert_with(|| Value::Object(Map::new()));
            if let Some(t) = transport.as_object_mut() {
                tracing::debug!(variable = var, "definition override from environment");
                t.insert(field.to_string(), Value::String(v));
            }
        }
    }
    if let Some(v) = lookup("PRODUCTS") {
        let products: Vec<Value> = v
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(|p| Value::String(p.to_string()))
            .collect();
        root.insert("products".to_string(), Value::Array(products));
    }
}

/// Parse a YAML or JSON file into a JSON value.
pub(crate) fn read_literal(path: &Path) -> Result<Value, BootstrapError> {
    let text = fs::read_to_string(path).map_err(|source| BootstrapError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_yaml::from_str(&text).map_err(|source| BootstrapError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schemas;

    fn engine() -> SchemaEngine {
        let mut engine = SchemaEngine::default();
        engine.add_schema(schemas::service(), SERVICE).unwrap();
        engine
    }

    fn raw(app_dir: &Path) -> Value {
        json!({
            "name": "shop",
            "appDir": app_dir.to_string_lossy(),
            "products": ["widgets"],
            "transport": {"host": "localhost", "port": "4000", "middleware": {"before": ["cors", {"name": "bodyLimit", "params": 1024}]}}
        })
    }

    #[test]
    fn definition_is_coerced_and_typed() {
        let dir = tempfile::tempdir().unwrap();
        let def = ServiceDefinition::from_value(&engine(), raw(dir.path())).unwrap();
        let transport = def.transport.clone().unwrap();
        assert_eq!(transport.port, 4000);
        assert_eq!(transport.middleware.before[0].name(), "cors");
        assert_eq!(transport.middleware.before[1].params(), Some(&json!(1024)));
        assert_eq!(def.base_url(), "http://localhost:4000");
    }

    #[test]
    fn missing_app_dir_is_rejected() {
        let mut value = raw(Path::new("/definitely/not/here"));
        value["transport"]["port"] = json!(4000);
        let err = ServiceDefinition::from_value(&engine(), value).unwrap_err();
        let BootstrapError::Validation(failure) = err else {
            panic!("expected a validation failure");
        };
        assert!(failure.message.contains("must exist"), "{}", failure.message);
    }

    #[test]
    fn port_out_of_range_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut value = raw(dir.path());
        value["transport"]["port"] = json!(80);
        assert!(ServiceDefinition::from_value(&engine(), value).is_err());
    }

    #[test]
    fn unknown_middleware_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut value = raw(dir.path());
        value["transport"]["middleware"]["before"] = json!(["bodyParser"]);
        assert!(ServiceDefinition::from_value(&engine(), value).is_err());
    }

    #[test]
    fn products_need_at_least_one_entry() {
        let dir = tempfile::tempdir().unwrap();
        let mut value = raw(dir.path());
        value["products"] = json!([]);
        assert!(ServiceDefinition::from_value(&engine(), value).is_err());
    }

    #[test]
    fn environment_overrides_transport_and_products() {
        let mut value = json!({"name": "shop", "appDir": ".", "products": ["a"]});
        apply_env_overrides(&mut value, |var| match var {
            "PORT" => Some("5000".into()),
            "PRODUCTS" => Some("widgets, gadgets".into()),
            _ => None,
        });
        assert_eq!(value["transport"]["port"], "5000");
        assert!(value["transport"].get("host").is_none());
        assert_eq!(value["products"], json!(["widgets", "gadgets"]));
    }

    #[test]
    fn relative_app_dir_follows_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("service.yaml");
        fs::write(&file, "name: shop\nappDir: app\nproducts: [widgets]\n").unwrap();
        let value = ServiceDefinition::read(&file).unwrap();
        let expected = dir.path().join("app");
        assert_eq!(value["appDir"], json!(expected.to_string_lossy()));
        assert_eq!(value["products"], json!(["widgets"]));
    }
}
