//! # Layer Contributions
//!
//! Each layer (core, application, product) contributes routes in code and
//! document literals (models, tags, servers) either in code or from a
//! `document.yaml`, `document.yml` or `document.json` file in the layer's
//! directory. A layer without such a file contributes nothing; a file
//! that exists but does not parse aborts the bootstrap.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::Value;

use sea_docs::{DocumentModel, Model, Server, Tag};
use sea_routes::Route;
use sea_schema::SchemaEngine;

use crate::definition::read_literal;
use crate::error::BootstrapError;

const DOCUMENT_FILES: [&str; 3] = ["document.yaml", "document.yml", "document.json"];

/// Document literals, kept untyped so they are validated with their
/// schema messages before being typed.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DocumentLiterals {
    #[serde(default)]
    pub models: Vec<Value>,
    #[serde(default)]
    pub tags: Vec<Value>,
    #[serde(default)]
    pub servers: Vec<Value>,
}

impl DocumentLiterals {
    pub fn is_empty(&self) -> bool {
        self.models.is_empty() && self.tags.is_empty() && self.servers.is_empty()
    }

    pub fn extend(&mut self, other: DocumentLiterals) {
        self.models.extend(other.models);
        self.tags.extend(other.tags);
        self.servers.extend(other.servers);
    }

    /// Push the literals into `document`: models first, since tags and
    /// servers never reference them but paths do.
    pub fn apply(
        self,
        engine: &mut SchemaEngine,
        document: &mut DocumentModel,
    ) -> Result<(), BootstrapError> {
        if !self.models.is_empty() {
            document.add_models(engine, Value::Array(self.models))?;
        }
        if !self.tags.is_empty() {
            document.add_tags(engine, Value::Array(self.tags))?;
        }
        if !self.servers.is_empty() {
            document.add_servers(engine, Value::Array(self.servers))?;
        }
        Ok(())
    }
}

/// Everything one layer contributes.
#[derive(Debug, Clone, Default)]
pub struct LayerContribution {
    pub routes: Vec<Route>,
    pub document: DocumentLiterals,
}

impl LayerContribution {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(mut self, route: Route) -> Self {
        self.routes.push(route);
        self
    }

    pub fn routes<I: IntoIterator<Item = Route>>(mut self, routes: I) -> Self {
        self.routes.extend(routes);
        self
    }

    pub fn model(mut self, model: &Model) -> Result<Self, BootstrapError> {
        self.document.models.push(to_literal(model)?);
        Ok(self)
    }

    pub fn tag(mut self, tag: &Tag) -> Result<Self, BootstrapError> {
        self.document.tags.push(to_literal(tag)?);
        Ok(self)
    }

    pub fn server(mut self, server: &Server) -> Result<Self, BootstrapError> {
        self.document.servers.push(to_literal(server)?);
        Ok(self)
    }

    /// Add raw model literals (one object or a list).
    pub fn model_literals(mut self, literals: Value) -> Self {
        match literals {
            Value::Array(list) => self.document.models.extend(list),
            other => self.document.models.push(other),
        }
        self
    }
}

fn to_literal<T: serde::Serialize>(item: &T) -> Result<Value, BootstrapError> {
    serde_json::to_value(item).map_err(BootstrapError::Definition)
}

/// The document file of a layer directory, if present.
pub fn document_file(dir: &Path) -> Option<PathBuf> {
    DOCUMENT_FILES
        .iter()
        .map(|name| dir.join(name))
        .find(|p| p.is_file())
}

/// Load the document literals of the layer at `dir`.
///
/// Returns `Ok(None)` when the layer has no document file.
pub fn load_optional_document(dir: &Path) -> Result<Option<DocumentLiterals>, BootstrapError> {
    let Some(path) = document_file(dir) else {
        tracing::debug!(dir = %dir.display(), "layer has no document file");
        return Ok(None);
    };
    let value = read_literal(&path)?;
    if value.is_null() {
        return Ok(Some(DocumentLiterals::default()));
    }
    let literals: DocumentLiterals = serde_json::from_value(value).map_err(|e| {
        BootstrapError::Parse {
            path: path.clone(),
            source: serde::de::Error::custom(e),
        }
    })?;
    tracing::info!(
        path = %path.display(),
        models = literals.models.len(),
        tags = literals.tags.len(),
        servers = literals.servers.len(),
        "loaded layer document"
    );
    Ok(Some(literals))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn absent_layer_contributes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(load_optional_document(dir.path()).unwrap(), None);
    }

    #[test]
    fn yaml_layer_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("document.yaml"),
            "models:\n  - name: OkResponse\n    properties:\n      ok: {type: boolean}\ntags:\n  - name: widgets\n    description: Widget operations\n",
        )
        .unwrap();
        let literals = load_optional_document(dir.path()).unwrap().unwrap();
        assert_eq!(literals.models.len(), 1);
        assert_eq!(literals.tags[0]["name"], "widgets");
        assert!(literals.servers.is_empty());
    }

    #[test]
    fn json_layer_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("document.json"),
            r#"{"servers": [{"url": "http://localhost:3000"}]}"#,
        )
        .unwrap();
        let literals = load_optional_document(dir.path()).unwrap().unwrap();
        assert_eq!(literals.servers.len(), 1);
    }

    #[test]
    fn merged_literals_are_empty_only_when_every_part_is() {
        let mut merged = DocumentLiterals::default();
        assert!(merged.is_empty());
        merged.extend(DocumentLiterals::default());
        assert!(merged.is_empty());
        merged.extend(DocumentLiterals {
            tags: vec![serde_json::json!({"name": "widgets"})],
            ..DocumentLiterals::default()
        });
        assert!(!merged.is_empty());
    }

    #[test]
    fn malformed_layer_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("document.yml"), "models: [unclosed").unwrap();
        assert!(matches!(
            load_optional_document(dir.path()),
            Err(BootstrapError::Parse { .. })
        ));
    }

    #[test]
    fn wrongly_shaped_layer_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("document.yaml"), "models: 3\n").unwrap();
        assert!(load_optional_document(dir.path()).is_err());
    }
}
