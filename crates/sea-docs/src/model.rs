//! # Document Model
//!
//! Mutable collections of servers, tags, models and paths. Every mutator
//! validates each item through the schema engine, enforces the item's
//! uniqueness key, and only commits when the whole batch is accepted.
//!
//! Paths are special in two ways: uniqueness is checked by the
//! `uniquePath` keyword during validation, so the failure carries the
//! schema's message, and the collection is normally a projection of the
//! route registry installed with [`DocumentModel::sync_paths`].

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use sea_core::HttpMethod;
use sea_schema::{Catalog, SchemaConflict, SchemaEngine};

use crate::error::{DocumentError, EntityKind};
use crate::explorer::ExplorerConfig;
use crate::keywords;
use crate::render;
use crate::schemas;
use crate::types::{DocumentDefinition, Model, PathDef, PathKey, Server, Tag};

#[derive(Debug, Clone)]
pub struct DocumentModel {
    definition: DocumentDefinition,
    explorer: ExplorerConfig,
    servers: Vec<Server>,
    tags: Vec<Tag>,
    models: Vec<Model>,
    paths: Vec<PathDef>,
}

impl DocumentModel {
    /// Register the document keywords and entity schemas with `engine`.
    /// Keywords already present are kept.
    pub fn register(engine: &mut SchemaEngine) -> Result<(), SchemaConflict> {
        for (name, definition) in keywords::all() {
            if !engine.has_keyword(name) {
                engine.add_keyword(name, definition)?;
            }
        }
        for (name, schema) in schemas::all() {
            engine.add_schema(schema, name)?;
        }
        Ok(())
    }

    /// Validate `definition` against the `Document` schema and create an
    /// empty model. [`register`](Self::register) must have run on `engine`.
    pub fn new(
        engine: &SchemaEngine,
        definition: DocumentDefinition,
    ) -> Result<Self, DocumentError> {
        let definition: DocumentDefinition =
            validated(engine, schemas::DOCUMENT, EntityKind::Document, &definition, &())?;
        let explorer = ExplorerConfig::new(
            &definition.explorer_path,
            definition.public_dir.clone(),
            &definition.base_url,
        );
        Ok(Self {
            definition,
            explorer,
            servers: Vec::new(),
            tags: Vec::new(),
            models: Vec::new(),
            paths: Vec::new(),
        })
    }

    pub fn definition(&self) -> &DocumentDefinition {
        &self.definition
    }

    pub fn explorer(&self) -> &ExplorerConfig {
        &self.explorer
    }

    /// Title shown by the rendered document and the explorer.
    pub fn title(&self) -> &str {
        self.definition
            .title
            .as_deref()
            .unwrap_or(render::DEFAULT_TITLE)
    }

    pub fn servers(&self) -> &[Server] {
        &self.servers
    }

    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    pub fn models(&self) -> &[Model] {
        &self.models
    }

    pub fn model(&self, name: &str) -> Option<&Model> {
        self.models.iter().find(|m| m.name == name)
    }

    pub fn paths(&self) -> &[PathDef] {
        &self.paths
    }

    /// Add one model (object) or several (array).
    ///
    /// Reinstalls the document schema in `engine` before committing, so a
    /// model whose schema does not compile leaves the collection unchanged.
    pub fn add_models(
        &mut self,
        engine: &mut SchemaEngine,
        items: Value,
    ) -> Result<(), DocumentError> {
        let mut staged = self.models.clone();
        for mut item in into_items(items) {
            engine.check(schemas::MODEL, &mut item, &*self)?;
            let model: Model = from_item(EntityKind::Model, item)?;
            upsert(&mut staged, model, EntityKind::Model, |m| m.name.clone(), |m| m.overwrite)?;
        }
        engine.install_document_schema(&render::component_schema(&staged))?;
        self.models = staged;
        Ok(())
    }

    pub fn add_model(
        &mut self,
        engine: &mut SchemaEngine,
        model: &Model,
    ) -> Result<(), DocumentError> {
        self.add_models(engine, to_item(EntityKind::Model, model)?)
    }

    /// Add one tag (object) or several (array).
    pub fn add_tags(&mut self, engine: &SchemaEngine, items: Value) -> Result<(), DocumentError> {
        let mut staged = self.tags.clone();
        for mut item in into_items(items) {
            engine.check(schemas::TAG, &mut item, &*self)?;
            let tag: Tag = from_item(EntityKind::Tag, item)?;
            upsert(&mut staged, tag, EntityKind::Tag, |t| t.name.clone(), |t| t.overwrite)?;
        }
        self.tags = staged;
        Ok(())
    }

    pub fn add_tag(&mut self, engine: &SchemaEngine, tag: &Tag) -> Result<(), DocumentError> {
        self.add_tags(engine, to_item(EntityKind::Tag, tag)?)
    }

    /// Add one server (object) or several (array).
    pub fn add_servers(
        &mut self,
        engine: &SchemaEngine,
        items: Value,
    ) -> Result<(), DocumentError> {
        let mut staged = self.servers.clone();
        for mut item in into_items(items) {
            engine.check(schemas::SERVER, &mut item, &*self)?;
            let server: Server = from_item(EntityKind::Server, item)?;
            upsert(&mut staged, server, EntityKind::Server, |s| s.url.clone(), |s| s.overwrite)?;
        }
        self.servers = staged;
        Ok(())
    }

    pub fn add_server(
        &mut self,
        engine: &SchemaEngine,
        server: &Server,
    ) -> Result<(), DocumentError> {
        self.add_servers(engine, to_item(EntityKind::Server, server)?)
    }

    /// Add one path (object) or several (array).
    ///
    /// Every response and the request body must name a registered model,
    /// one response must be a `200`, and `(path, method)` must be new
    /// unless the item sets `overwrite`, in which case it replaces the
    /// existing entry in place.
    pub fn add_paths(&mut self, engine: &SchemaEngine, items: Value) -> Result<(), DocumentError> {
        let mut staged = self.paths.clone();
        for mut item in into_items(items) {
            lowercase_method(&mut item);
            let excluded = if item.get("overwrite").and_then(Value::as_bool) == Some(true) {
                raw_key(&item)
            } else {
                None
            };
            let view = PathView {
                models: &self.models,
                paths: &staged,
                excluded: excluded.as_ref(),
            };
            engine.check(schemas::PATH, &mut item, &view)?;

            let def: PathDef = from_item(EntityKind::Path, item)?;
            let key = def.key();
            match staged.iter().position(|p| p.key() == key) {
                Some(i) => {
                    tracing::info!(path = %key, index = i, "overwriting path");
                    staged[i] = def;
                }
                None => {
                    tracing::debug!(path = %key, "adding path");
                    staged.push(def);
                }
            }
        }
        self.paths = staged;
        Ok(())
    }

    pub fn add_path(&mut self, engine: &SchemaEngine, path: &PathDef) -> Result<(), DocumentError> {
        self.add_paths(engine, to_item(EntityKind::Path, path)?)
    }

    /// Replace the path collection with `paths`, typically the route
    /// registry's projection. On failure the previous collection is kept.
    pub fn sync_paths(
        &mut self,
        engine: &SchemaEngine,
        paths: &[PathDef],
    ) -> Result<(), DocumentError> {
        let items = paths
            .iter()
            .map(|p| to_item(EntityKind::Path, p))
            .collect::<Result<Vec<_>, _>>()?;
        let previous = std::mem::take(&mut self.paths);
        if let Err(e) = self.add_paths(engine, Value::Array(items)) {
            self.paths = previous;
            return Err(e);
        }
        Ok(())
    }

    /// The OpenAPI document.
    pub fn render(&self) -> Value {
        render::document(self)
    }

    /// `{"components": {"schemas": ...}}` mirroring the model collection,
    /// with `errorMessage` declarations kept for validation.
    pub fn derive_component_schema(&self) -> Value {
        render::component_schema(&self.models)
    }
}

impl Catalog for DocumentModel {
    fn contains_model(&self, name: &str) -> bool {
        self.models.iter().any(|m| m.name == name)
    }

    fn contains_path(&self, path: &str, method: &str) -> bool {
        self.paths
            .iter()
            .any(|p| p.key().path == path && p.method.as_str() == method)
    }
}

/// Catalog seen while a batch of paths is validated: committed models,
/// staged paths, minus the key an overwriting item replaces.
struct PathView<'a> {
    models: &'a [Model],
    paths: &'a [PathDef],
    excluded: Option<&'a PathKey>,
}

impl Catalog for PathView<'_> {
    fn contains_model(&self, name: &str) -> bool {
        self.models.iter().any(|m| m.name == name)
    }

    fn contains_path(&self, path: &str, method: &str) -> bool {
        if let Some(excluded) = self.excluded {
            if excluded.path == path && excluded.method.as_str() == method {
                return false;
            }
        }
        self.paths.iter().any(|p| {
            let key = p.key();
            key.path == path && key.method.as_str() == method
        })
    }
}

fn into_items(items: Value) -> Vec<Value> {
    match items {
        Value::Array(list) => list,
        single => vec![single],
    }
}

fn lowercase_method(item: &mut Value) {
    if let Some(method) = item.get_mut("method") {
        if let Some(m) = method.as_str() {
            *method = Value::String(m.to_ascii_lowercase());
        }
    }
}

fn raw_key(item: &Value) -> Option<PathKey> {
    let path = item.get("path")?.as_str()?;
    let method: HttpMethod = item.get("method")?.as_str()?.parse().ok()?;
    Some(PathKey::new(path, method))
}

fn upsert<T>(
    staged: &mut Vec<T>,
    item: T,
    kind: EntityKind,
    key: impl Fn(&T) -> String,
    overwrite: impl Fn(&T) -> bool,
) -> Result<(), DocumentError> {
    let k = key(&item);
    match staged.iter().position(|existing| key(existing) == k) {
        Some(i) if overwrite(&item) => {
            tracing::info!(kind = %kind, key = %k, index = i, "overwriting entity");
            staged[i] = item;
        }
        Some(_) => return Err(DocumentError::DuplicateEntity { kind, key: k }),
        None => {
            tracing::debug!(kind = %kind, key = %k, "adding entity");
            staged.push(item);
        }
    }
    Ok(())
}

fn to_item<T: Serialize>(kind: EntityKind, item: &T) -> Result<Value, DocumentError> {
    serde_json::to_value(item).map_err(|e| DocumentError::Malformed {
        kind,
        reason: e.to_string(),
    })
}

fn from_item<T: DeserializeOwned>(kind: EntityKind, item: Value) -> Result<T, DocumentError> {
    serde_json::from_value(item).map_err(|e| DocumentError::Malformed {
        kind,
        reason: e.to_string(),
    })
}

fn validated<T: Serialize + DeserializeOwned>(
    engine: &SchemaEngine,
    schema: &str,
    kind: EntityKind,
    item: &T,
    catalog: &dyn Catalog,
) -> Result<T, DocumentError> {
    let mut raw = to_item(kind, item)?;
    engine.check(schema, &mut raw, catalog)?;
    from_item(kind, raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn setup() -> (SchemaEngine, DocumentModel) {
        let mut engine = SchemaEngine::default();
        DocumentModel::register(&mut engine).unwrap();
        let doc = DocumentModel::new(
            &engine,
            DocumentDefinition::new("http://localhost:3000", "/tmp/public/docs"),
        )
        .unwrap();
        (engine, doc)
    }

    fn ok_model() -> Value {
        json!({"name": "OkResponse", "properties": {"ok": {"type": "boolean"}}})
    }

    fn ok_path(path: &str) -> Value {
        json!({
            "path": path,
            "method": "GET",
            "summary": "Say ok",
            "responses": [{"statusCode": 200, "modelName": "OkResponse", "description": "All good"}]
        })
    }

    #[test]
    fn invalid_definition_is_rejected() {
        let mut engine = SchemaEngine::default();
        DocumentModel::register(&mut engine).unwrap();
        let err =
            DocumentModel::new(&engine, DocumentDefinition::new("ftp://x", "/tmp")).unwrap_err();
        match err {
            DocumentError::Validation(f) => {
                assert_eq!(f.message, "Base URL ftp://x should be in correct URL format.")
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn duplicate_models_need_overwrite_even_at_index_zero() {
        let (mut engine, mut doc) = setup();
        doc.add_models(&mut engine, ok_model()).unwrap();
        let err = doc.add_models(&mut engine, ok_model()).unwrap_err();
        assert!(matches!(
            err,
            DocumentError::DuplicateEntity { kind: EntityKind::Model, .. }
        ));

        let mut replacement = ok_model();
        replacement["overwrite"] = json!(true);
        replacement["properties"] = json!({"ok": {"type": "string"}});
        doc.add_models(&mut engine, replacement).unwrap();
        assert_eq!(doc.models().len(), 1);
        assert_eq!(doc.models()[0].properties["ok"]["type"], "string");
    }

    #[test]
    fn model_batches_are_atomic() {
        let (mut engine, mut doc) = setup();
        let batch = json!([ok_model(), {"name": "No"}]);
        assert!(doc.add_models(&mut engine, batch).is_err());
        assert!(doc.models().is_empty());
        assert!(!engine.has_document_model("OkResponse"));
    }

    #[test]
    fn models_feed_the_document_schema() {
        let (mut engine, mut doc) = setup();
        doc.add_models(
            &mut engine,
            json!({
                "name": "Person",
                "properties": {"age": {"type": "number"}},
                "required": ["age"],
                "errorMessage": {"required": {"age": "Age is required."}, "properties": {}}
            }),
        )
        .unwrap();
        let mut data = json!({"age": "42"});
        engine
            .check_against_document("components/schemas/Person", &mut data, &doc)
            .unwrap();
        assert_eq!(data, json!({"age": 42}));
        let err = engine
            .check_against_document("Person", &mut json!({}), &doc)
            .unwrap_err();
        assert_eq!(err.message, "Age is required.");
    }

    #[test]
    fn paths_require_known_models() {
        let (mut engine, mut doc) = setup();
        let err = doc.add_paths(&engine, ok_path("/x")).unwrap_err();
        match err {
            DocumentError::Validation(f) => {
                assert!(f.errors.iter().any(|e| e.keyword == "validModel"));
                let expected = "Response model OkResponse of path /x must be a valid model.";
                assert!(f.message.contains(expected), "{}", f.message);
            }
            other => panic!("unexpected {other:?}"),
        }
        doc.add_models(&mut engine, ok_model()).unwrap();
        doc.add_paths(&engine, ok_path("/x")).unwrap();
        assert_eq!(doc.paths()[0].method, HttpMethod::Get);
    }

    #[test]
    fn paths_need_a_200_response() {
        let (mut engine, mut doc) = setup();
        doc.add_models(&mut engine, ok_model()).unwrap();
        let mut path = ok_path("/x");
        path["responses"][0]["statusCode"] = json!(201);
        let err = doc.add_paths(&engine, path).unwrap_err();
        assert!(err.to_string().contains("Path /x must declare a 200 response."), "{err}");
    }

    #[test]
    fn duplicate_paths_fail_through_unique_path() {
        let (mut engine, mut doc) = setup();
        doc.add_models(&mut engine, ok_model()).unwrap();
        doc.add_paths(&engine, ok_path("/x/:id")).unwrap();

        let err = doc.add_paths(&engine, ok_path("/x/{id}/")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Combination path /x/{id}/ and method get already exists."
        );

        let within_batch = json!([ok_path("/y"), ok_path("/y")]);
        assert!(doc.add_paths(&engine, within_batch).is_err());
        assert_eq!(doc.paths().len(), 1);

        let mut replacement = ok_path("/x/:id");
        replacement["overwrite"] = json!(true);
        replacement["summary"] = json!("Say ok again");
        doc.add_paths(&engine, replacement).unwrap();
        assert_eq!(doc.paths().len(), 1);
        assert_eq!(doc.paths()[0].summary, "Say ok again");
    }

    #[test]
    fn tags_and_servers_are_keyed() {
        let (engine, mut doc) = setup();
        doc.add_tags(&engine, json!([{"name": "system", "description": "System routes"}]))
            .unwrap();
        let err = doc
            .add_tags(&engine, json!({"name": "system", "description": "Again here"}))
            .unwrap_err();
        assert!(matches!(err, DocumentError::DuplicateEntity { kind: EntityKind::Tag, .. }));
        doc.add_tags(
            &engine,
            json!({"name": "system", "description": "Replaced", "overwrite": true}),
        )
        .unwrap();
        assert_eq!(doc.tags()[0].description.as_deref(), Some("Replaced"));

        doc.add_servers(&engine, json!({"url": "https://api.example.com"})).unwrap();
        assert!(doc.add_servers(&engine, json!({"url": "https://api.example.com"})).is_err());
        assert!(doc.add_servers(&engine, json!({"url": "not a url"})).is_err());
    }

    #[test]
    fn sync_paths_replaces_collection() {
        let (mut engine, mut doc) = setup();
        doc.add_models(&mut engine, ok_model()).unwrap();
        doc.add_paths(&engine, ok_path("/old")).unwrap();

        let fresh: PathDef = serde_json::from_value(ok_path("/new")).unwrap();
        doc.sync_paths(&engine, &[fresh.clone()]).unwrap();
        assert_eq!(doc.paths().len(), 1);
        assert_eq!(doc.paths()[0].path, "/new");

        let mut broken = fresh;
        broken.responses[0].model_name = "Missing".into();
        assert!(doc.sync_paths(&engine, &[broken]).is_err());
        assert_eq!(doc.paths()[0].path, "/new");
    }

    #[test]
    fn render_shapes_the_document() {
        let (mut engine, mut doc) = setup();
        doc.add_models(&mut engine, ok_model()).unwrap();
        doc.add_models(
            &mut engine,
            json!({"name": "Item", "properties": {"size": {"type": "string"}}}),
        )
        .unwrap();
        doc.add_paths(
            &engine,
            json!({
                "path": "/id/:id",
                "method": "post",
                "summary": "Update item",
                "tags": ["items"],
                "parameters": [{"in": "path", "name": "id", "required": true, "description": "Item id", "schema": {"type": "integer"}}],
                "requestBody": {"modelName": "Item", "required": true},
                "responses": [{"statusCode": 200, "modelName": "OkResponse", "description": "Updated"}]
            }),
        )
        .unwrap();

        let rendered = doc.render();
        assert_eq!(rendered["openapi"], "3.0.1");
        assert_eq!(rendered["info"]["title"], "SEA App");
        assert_eq!(rendered["servers"], json!([{"url": "http://localhost:3000/"}]));

        let op = &rendered["paths"]["/id/{id}"]["post"];
        assert_eq!(op["summary"], "Update item");
        assert_eq!(
            op["responses"]["200"],
            json!({
                "description": "Updated",
                "content": {"application/json": {"schema": {"$ref": "#/components/schemas/OkResponse"}}}
            })
        );
        assert_eq!(
            op["requestBody"]["content"]["application/json"]["schema"]["$ref"],
            "#/components/schemas/Item"
        );
        assert_eq!(op["requestBody"]["required"], true);
        assert!(op["requestBody"].get("modelName").is_none());
        assert_eq!(op["parameters"][0]["in"], "path");

        assert_eq!(
            rendered["components"]["schemas"]["OkResponse"],
            json!({"type": "object", "properties": {"ok": {"type": "boolean"}}})
        );
        assert_eq!(doc.render(), rendered);
    }

    #[test]
    fn derived_schema_keeps_messages() {
        let (mut engine, mut doc) = setup();
        doc.add_models(
            &mut engine,
            json!({
                "name": "Person",
                "properties": {"age": {"type": "number"}},
                "errorMessage": {"required": {}, "properties": {"age": "Bad age."}}
            }),
        )
        .unwrap();
        let derived = doc.derive_component_schema();
        assert_eq!(
            derived["components"]["schemas"]["Person"]["errorMessage"]["properties"]["age"],
            "Bad age."
        );
        assert!(derived["components"]["schemas"]["Person"].get("name").is_none());
    }
}
