//! # Schema Engine
//!
//! Named schemas are registered with [`SchemaEngine::add_schema`], which
//! stamps `$id = sea://schemas/<name>` onto the schema and compiles it
//! immediately. Schemas reference each other as
//! `sea://schemas/<name>#/pointer` (or the relative `<name>#/pointer`).
//!
//! The document schema installed by the document model gets its own slot:
//! [`SchemaEngine::install_document_schema`] compiles one validator per
//! component model so that
//! [`validate_against_document`](SchemaEngine::validate_against_document)
//! resolves by model name.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use jsonschema::error::ValidationErrorKind;
use jsonschema::{ValidationOptions, Validator};
use parking_lot::Mutex;
use serde_json::{json, Value};

use crate::builtin;
use crate::error::{FieldError, SchemaConflict, ValidationFailure};
use crate::keyword::{Catalog, KeywordDefinition};
use crate::messages;
use crate::normalize::normalize;
use crate::resolve::{Resolver, Retriever};
use crate::walk::{uses_keyword, Walk};

/// `$id` prefix of every named schema.
pub const SCHEMA_URI_PREFIX: &str = "sea://schemas/";

const DOCUMENT_URI_PREFIX: &str = "sea://document/";

/// Keywords owned by the JSON Schema vocabulary or the engine itself.
const RESERVED_KEYWORDS: &[&str] = &[
    "$id", "$schema", "$ref", "$defs", "$anchor", "$dynamicRef", "$dynamicAnchor",
    "$vocabulary", "$comment", "definitions", "type", "enum", "const", "properties",
    "patternProperties", "additionalProperties", "propertyNames", "required",
    "dependentRequired", "dependentSchemas", "minProperties", "maxProperties", "items",
    "prefixItems", "contains", "minContains", "maxContains", "minItems", "maxItems",
    "uniqueItems", "unevaluatedItems", "unevaluatedProperties", "minLength", "maxLength",
    "pattern", "format", "minimum", "maximum", "exclusiveMinimum", "exclusiveMaximum",
    "multipleOf", "allOf", "anyOf", "oneOf", "not", "if", "then", "else", "title",
    "description", "default", "examples", "deprecated", "readOnly", "writeOnly",
    "contentEncoding", "contentMediaType", "contentSchema", "errorMessage", "components",
];

/// What a failed [`SchemaEngine::validate`] does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailureMode {
    /// Return `Err(ValidationFailure)`.
    #[default]
    Throw,
    /// Return `Ok(false)` and keep the errors for
    /// [`SchemaEngine::errors_text`].
    Boolean,
}

/// A compiled validator together with the schema it was built from.
pub struct CompiledSchema {
    source: Value,
    validator: Validator,
}

impl CompiledSchema {
    pub fn source(&self) -> &Value {
        &self.source
    }
}

impl fmt::Debug for CompiledSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledSchema")
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Default)]
struct DocumentSchema {
    models: HashMap<String, CompiledSchema>,
}

/// Named-schema registry and validator.
pub struct SchemaEngine {
    mode: FailureMode,
    keywords: HashMap<String, KeywordDefinition>,
    sources: BTreeMap<String, Value>,
    compiled: HashMap<String, CompiledSchema>,
    document: DocumentSchema,
    last_failure: Mutex<Option<ValidationFailure>>,
}

impl fmt::Debug for SchemaEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keywords: Vec<&String> = self.keywords.keys().collect();
        keywords.sort();
        f.debug_struct("SchemaEngine")
            .field("mode", &self.mode)
            .field("keywords", &keywords)
            .field("schemas", &self.sources.keys().collect::<Vec<_>>())
            .field("document_models", &self.document.models.len())
            .finish()
    }
}

impl Default for SchemaEngine {
    fn default() -> Self {
        Self::new(FailureMode::Throw)
    }
}

impl SchemaEngine {
    /// Create an engine with the built-in keywords registered.
    pub fn new(mode: FailureMode) -> Self {
        let keywords = builtin::all()
            .into_iter()
            .map(|(name, def)| (name.to_string(), def))
            .collect();
        Self {
            mode,
            keywords,
            sources: BTreeMap::new(),
            compiled: HashMap::new(),
            document: DocumentSchema::default(),
            last_failure: Mutex::new(None),
        }
    }

    pub fn mode(&self) -> FailureMode {
        self.mode
    }

    /// Register a custom keyword.
    ///
    /// # Errors
    ///
    /// [`SchemaConflict::ReservedKeyword`] for standard vocabulary names,
    /// [`SchemaConflict::DuplicateKeyword`] when already registered, and
    /// [`SchemaConflict::KeywordInUse`] when a compiled schema already uses
    /// the name.
    pub fn add_keyword(
        &mut self,
        name: &str,
        definition: KeywordDefinition,
    ) -> Result<(), SchemaConflict> {
        if RESERVED_KEYWORDS.contains(&name) {
            return Err(SchemaConflict::ReservedKeyword(name.to_string()));
        }
        if self.keywords.contains_key(name) {
            return Err(SchemaConflict::DuplicateKeyword(name.to_string()));
        }
        if let Some(schema) = self
            .sources
            .iter()
            .find(|(_, source)| uses_keyword(source, name))
            .map(|(schema, _)| schema.clone())
        {
            return Err(SchemaConflict::KeywordInUse {
                keyword: name.to_string(),
                schema,
            });
        }
        tracing::debug!(keyword = %name, errors = definition.errors(), "registered keyword");
        self.keywords.insert(name.to_string(), definition);
        Ok(())
    }

    pub fn has_keyword(&self, name: &str) -> bool {
        self.keywords.contains_key(name)
    }

    /// Register or replace the schema `name`.
    ///
    /// Replacement recompiles every registered schema, since any of them
    /// may reference the replaced one. On failure the registry is left as
    /// it was.
    ///
    /// # Errors
    ///
    /// [`SchemaConflict::Compile`] when the schema, or a schema depending
    /// on it, fails to compile.
    pub fn add_schema(&mut self, mut schema: Value, name: &str) -> Result<(), SchemaConflict> {
        let Some(map) = schema.as_object_mut() else {
            return Err(SchemaConflict::InvalidSchema {
                schema: name.to_string(),
                reason: "expected a JSON object".to_string(),
            });
        };
        map.insert(
            "$id".to_string(),
            Value::String(format!("{SCHEMA_URI_PREFIX}{name}")),
        );

        let mut sources = self.sources.clone();
        let replacing = sources.insert(name.to_string(), schema).is_some();

        let compiled = if replacing {
            let mut all = HashMap::new();
            for (n, s) in &sources {
                all.insert(n.clone(), compile_with(n, s, &sources)?);
            }
            all
        } else {
            let mut all = std::mem::take(&mut self.compiled);
            match compile_with(name, &sources[name], &sources) {
                Ok(c) => {
                    all.insert(name.to_string(), c);
                }
                Err(e) => {
                    self.compiled = all;
                    return Err(e);
                }
            }
            all
        };

        tracing::debug!(schema = %name, replacing, "registered schema");
        self.sources = sources;
        self.compiled = compiled;
        Ok(())
    }

    pub fn has_schema(&self, name: &str) -> bool {
        self.sources.contains_key(name)
    }

    /// Registered schema source, with its `$id` stamped.
    pub fn schema(&self, name: &str) -> Option<&Value> {
        self.sources.get(name)
    }

    /// Compile an anonymous schema against the current registry.
    pub fn compile(&self, schema: &Value) -> Result<CompiledSchema, SchemaConflict> {
        compile_with("(anonymous)", schema, &self.sources)
    }

    /// Replace the document-wide schema.
    ///
    /// `document` must carry `components.schemas`; every entry becomes
    /// resolvable by name through
    /// [`validate_against_document`](Self::validate_against_document).
    pub fn install_document_schema(&mut self, document: &Value) -> Result<(), SchemaConflict> {
        let components = document
            .get("components")
            .cloned()
            .unwrap_or_else(|| json!({"schemas": {}}));
        let names: Vec<String> = components
            .get("schemas")
            .and_then(Value::as_object)
            .map(|m| m.keys().cloned().collect())
            .unwrap_or_default();

        let mut models = HashMap::with_capacity(names.len());
        for name in names {
            let wrapper = json!({
                "$id": format!("{DOCUMENT_URI_PREFIX}{name}"),
                "$ref": format!("#/components/schemas/{}", escape_pointer(&name)),
                "components": components,
            });
            let compiled = compile_with(&format!("document/{name}"), &wrapper, &self.sources)?;
            models.insert(name, compiled);
        }
        tracing::debug!(models = models.len(), "installed document schema");
        self.document = DocumentSchema { models };
        Ok(())
    }

    /// Validate `data` in place against the schema registered as `name`.
    ///
    /// Returns `Ok(true)` on success. On failure, [`FailureMode::Throw`]
    /// returns the [`ValidationFailure`] and [`FailureMode::Boolean`]
    /// returns `Ok(false)`.
    pub fn validate(
        &self,
        name: &str,
        data: &mut Value,
        catalog: &dyn Catalog,
    ) -> Result<bool, ValidationFailure> {
        let outcome = self.check(name, data, catalog);
        self.settle(outcome)
    }

    /// Like [`validate`](Self::validate) but always fails with an error.
    pub fn check(
        &self,
        name: &str,
        data: &mut Value,
        catalog: &dyn Catalog,
    ) -> Result<(), ValidationFailure> {
        let compiled = self.compiled.get(name).ok_or_else(|| {
            ValidationFailure::general(format!("no schema registered under '{name}'"))
        })?;
        self.run(compiled, data, catalog)
    }

    /// Validate against a component model of the document schema.
    ///
    /// `pointer` may be `components/schemas/<Name>`,
    /// `#/components/schemas/<Name>` or the bare model name.
    pub fn validate_against_document(
        &self,
        pointer: &str,
        data: &mut Value,
        catalog: &dyn Catalog,
    ) -> Result<bool, ValidationFailure> {
        let outcome = self.check_against_document(pointer, data, catalog);
        self.settle(outcome)
    }

    /// Like [`validate_against_document`](Self::validate_against_document)
    /// but always fails with an error.
    pub fn check_against_document(
        &self,
        pointer: &str,
        data: &mut Value,
        catalog: &dyn Catalog,
    ) -> Result<(), ValidationFailure> {
        let name = model_name(pointer);
        let compiled = self.document.models.get(name).ok_or_else(|| {
            ValidationFailure::general(format!("model '{name}' is not documented"))
        })?;
        self.run(compiled, data, catalog)
    }

    /// `true` when the document schema resolves `name`.
    pub fn has_document_model(&self, name: &str) -> bool {
        self.document.models.contains_key(model_name(name))
    }

    /// Validate against an anonymous compiled schema; always fails with an
    /// error.
    pub fn check_compiled(
        &self,
        compiled: &CompiledSchema,
        data: &mut Value,
        catalog: &dyn Catalog,
    ) -> Result<(), ValidationFailure> {
        self.run(compiled, data, catalog)
    }

    /// Aggregated message of the last failed [`FailureMode::Boolean`]
    /// validation, or `"No errors"`.
    pub fn errors_text(&self) -> String {
        self.last_failure
            .lock()
            .as_ref()
            .map(|f| f.message.clone())
            .unwrap_or_else(|| "No errors".to_string())
    }

    /// Field errors of the last failed [`FailureMode::Boolean`] validation.
    pub fn last_errors(&self) -> Vec<FieldError> {
        self.last_failure
            .lock()
            .as_ref()
            .map(|f| f.errors.clone())
            .unwrap_or_default()
    }

    fn settle(&self, outcome: Result<(), ValidationFailure>) -> Result<bool, ValidationFailure> {
        match (outcome, self.mode) {
            (Ok(()), FailureMode::Boolean) => {
                *self.last_failure.lock() = None;
                Ok(true)
            }
            (Ok(()), FailureMode::Throw) => Ok(true),
            (Err(failure), FailureMode::Boolean) => {
                *self.last_failure.lock() = Some(failure);
                Ok(false)
            }
            (Err(failure), FailureMode::Throw) => Err(failure),
        }
    }

    fn run(
        &self,
        compiled: &CompiledSchema,
        data: &mut Value,
        catalog: &dyn Catalog,
    ) -> Result<(), ValidationFailure> {
        let resolver = Resolver::new(&self.sources);
        let doc = &compiled.source;
        normalize(&resolver, doc, doc, data, true, 0);

        let data: &Value = data;
        let mut errors: Vec<FieldError> = compiled
            .validator
            .iter_errors(data)
            .map(|e| {
                let schema_path = e.schema_path.to_string();
                let keyword = schema_path
                    .rsplit('/')
                    .next()
                    .unwrap_or_default()
                    .to_string();
                let property = match &e.kind {
                    ValidationErrorKind::Required { property } => {
                        property.as_str().map(String::from)
                    }
                    _ => None,
                };
                FieldError {
                    instance_path: e.instance_path.to_string(),
                    schema_path,
                    keyword,
                    property,
                    message: e.to_string(),
                }
            })
            .collect();

        let mut walk = Walk::new(&resolver, &self.keywords, catalog, data);
        walk.run(doc);
        errors.append(&mut walk.errors);

        if errors.is_empty() {
            return Ok(());
        }

        let resolved = messages::apply(walk.declarations, errors, data);
        let message = resolved
            .iter()
            .map(|r| {
                if r.templated || r.error.instance_path.is_empty() {
                    r.error.message.clone()
                } else {
                    format!("{}: {}", r.error.instance_path, r.error.message)
                }
            })
            .collect::<Vec<_>>()
            .join(", ");
        Err(ValidationFailure {
            message,
            errors: resolved.into_iter().map(|r| r.error).collect(),
        })
    }
}

fn options(sources: &BTreeMap<String, Value>) -> ValidationOptions {
    let mut opts = jsonschema::options();
    opts.with_draft(jsonschema::Draft::Draft202012);
    opts.with_retriever(Retriever::new(sources));
    opts
}

fn compile_with(
    name: &str,
    schema: &Value,
    sources: &BTreeMap<String, Value>,
) -> Result<CompiledSchema, SchemaConflict> {
    if !schema.is_object() && !schema.is_boolean() {
        return Err(SchemaConflict::InvalidSchema {
            schema: name.to_string(),
            reason: "expected a JSON object or boolean".to_string(),
        });
    }
    let validator = options(sources)
        .build(schema)
        .map_err(|e| SchemaConflict::Compile {
            schema: name.to_string(),
            reason: e.to_string(),
        })?;
    Ok(CompiledSchema {
        source: schema.clone(),
        validator,
    })
}

fn model_name(pointer: &str) -> &str {
    let trimmed = pointer.trim_start_matches('#').trim_start_matches('/');
    trimmed.strip_prefix("components/schemas/").unwrap_or(trimmed)
}

fn escape_pointer(segment: &str) -> String {
    segment.replace('~', "~0").replace('/', "~1")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Models(Vec<&'static str>);

    impl Catalog for Models {
        fn contains_model(&self, name: &str) -> bool {
            self.0.contains(&name)
        }
        fn contains_path(&self, _path: &str, _method: &str) -> bool {
            false
        }
    }

    fn person() -> Value {
        json!({
            "type": "object",
            "required": ["name"],
            "properties": {
                "name": {"type": "string", "minLength": 2},
                "age": {"type": "number"}
            },
            "errorMessage": {
                "required": {"name": "Person must have a name."},
                "properties": {"age": "Age of ${/name} must be a number."}
            }
        })
    }

    #[test]
    fn coercion_mutates_in_place() {
        let mut engine = SchemaEngine::default();
        engine
            .add_schema(json!({"properties": {"age": {"type": "number"}}}), "Age")
            .unwrap();
        let mut data = json!({"age": "42"});
        assert!(engine.validate("Age", &mut data, &()).unwrap());
        assert_eq!(data, json!({"age": 42}));
    }

    #[test]
    fn undeclared_properties_are_removed() {
        let mut engine = SchemaEngine::default();
        engine.add_schema(person(), "Person").unwrap();
        let mut data = json!({"name": "Ann", "extra": true});
        engine.check("Person", &mut data, &()).unwrap();
        assert_eq!(data, json!({"name": "Ann"}));
    }

    #[test]
    fn throw_mode_carries_templated_messages() {
        let mut engine = SchemaEngine::default();
        engine.add_schema(person(), "Person").unwrap();

        let mut data = json!({"age": 3});
        let failure = engine.validate("Person", &mut data, &()).unwrap_err();
        assert_eq!(failure.message, "Person must have a name.");
        assert_eq!(failure.errors[0].keyword, "required");
        assert_eq!(failure.errors[0].property.as_deref(), Some("name"));

        let mut data = json!({"name": "Bo", "age": "old"});
        let failure = engine.validate("Person", &mut data, &()).unwrap_err();
        assert_eq!(failure.message, "Age of Bo must be a number.");
        assert_eq!(failure.errors[0].instance_path, "/age");
    }

    #[test]
    fn unmapped_errors_are_prefixed_with_location() {
        let mut engine = SchemaEngine::default();
        engine.add_schema(person(), "Person").unwrap();
        let mut data = json!({"name": "A"});
        let failure = engine.check("Person", &mut data, &()).unwrap_err();
        assert!(failure.message.starts_with("/name: "), "{}", failure.message);
    }

    #[test]
    fn boolean_mode_uses_side_channel() {
        let mut engine = SchemaEngine::new(FailureMode::Boolean);
        engine.add_schema(person(), "Person").unwrap();
        assert_eq!(engine.errors_text(), "No errors");

        let mut data = json!({});
        assert!(!engine.validate("Person", &mut data, &()).unwrap());
        assert_eq!(engine.errors_text(), "Person must have a name.");
        assert_eq!(engine.last_errors().len(), 1);

        let mut data = json!({"name": "Cy"});
        assert!(engine.validate("Person", &mut data, &()).unwrap());
        assert_eq!(engine.errors_text(), "No errors");
    }

    #[test]
    fn unknown_schema_is_a_validation_failure() {
        let engine = SchemaEngine::default();
        let err = engine.check("Nope", &mut json!({}), &()).unwrap_err();
        assert!(err.message.contains("Nope"));
    }

    #[test]
    fn cross_schema_references_resolve() {
        let mut engine = SchemaEngine::default();
        engine.add_schema(person(), "Person").unwrap();
        engine
            .add_schema(
                json!({
                    "type": "object",
                    "properties": {"owner": {"$ref": "sea://schemas/Person"}}
                }),
                "Pet",
            )
            .unwrap();
        let mut data = json!({"owner": {"name": "Di", "age": "9", "x": 1}});
        engine.check("Pet", &mut data, &()).unwrap();
        assert_eq!(data, json!({"owner": {"name": "Di", "age": 9}}));

        let mut data = json!({"owner": {}});
        let failure = engine.check("Pet", &mut data, &()).unwrap_err();
        assert_eq!(failure.message, "Person must have a name.");
    }

    #[test]
    fn unresolvable_reference_is_a_conflict() {
        let mut engine = SchemaEngine::default();
        let err = engine
            .add_schema(json!({"$ref": "sea://schemas/Missing"}), "Broken")
            .unwrap_err();
        assert!(matches!(err, SchemaConflict::Compile { .. }));
        assert!(!engine.has_schema("Broken"));
    }

    #[test]
    fn replacing_a_schema_takes_effect() {
        let mut engine = SchemaEngine::default();
        engine
            .add_schema(json!({"type": "string"}), "Value")
            .unwrap();
        engine
            .add_schema(json!({"properties": {"v": {"$ref": "Value"}}}), "Holder")
            .unwrap();
        assert!(engine.check("Holder", &mut json!({"v": "s"}), &()).is_ok());

        engine
            .add_schema(json!({"type": "boolean"}), "Value")
            .unwrap();
        assert!(engine.check("Value", &mut json!("s"), &()).is_err());
        assert!(engine.check("Holder", &mut json!({"v": "s"}), &()).is_err());
    }

    #[test]
    fn keywords_must_precede_their_schemas() {
        let mut engine = SchemaEngine::default();
        engine
            .add_schema(json!({"properties": {"m": {"knownModel": true}}}), "Uses")
            .unwrap();
        let err = engine
            .add_keyword(
                "knownModel",
                KeywordDefinition::new(true, |i, c| {
                    i.data.as_str().map(|n| c.contains_model(n)).unwrap_or(false)
                }),
            )
            .unwrap_err();
        assert!(matches!(err, SchemaConflict::KeywordInUse { .. }));
    }

    #[test]
    fn reserved_and_duplicate_keywords_are_rejected() {
        let mut engine = SchemaEngine::default();
        let kw = || KeywordDefinition::new(true, |_, _| true);
        assert!(matches!(
            engine.add_keyword("type", kw()),
            Err(SchemaConflict::ReservedKeyword(_))
        ));
        assert!(matches!(
            engine.add_keyword(builtin::FILE, kw()),
            Err(SchemaConflict::DuplicateKeyword(_))
        ));
    }

    #[test]
    fn keywords_consult_the_catalog() {
        let mut engine = SchemaEngine::default();
        engine
            .add_keyword(
                "knownModel",
                KeywordDefinition::new(true, |i, c| {
                    i.data.as_str().map(|n| c.contains_model(n)).unwrap_or(false)
                }),
            )
            .unwrap();
        engine
            .add_schema(
                json!({
                    "properties": {"m": {"type": "string", "knownModel": true}},
                    "errorMessage": {"properties": {"m": "${/m} is not a model."}}
                }),
                "Ref",
            )
            .unwrap();
        let catalog = Models(vec!["Widget"]);
        assert!(engine.check("Ref", &mut json!({"m": "Widget"}), &catalog).is_ok());
        let err = engine
            .check("Ref", &mut json!({"m": "Gadget"}), &catalog)
            .unwrap_err();
        assert_eq!(err.message, "Gadget is not a model.");
        assert_eq!(err.errors[0].keyword, "knownModel");
    }

    #[test]
    fn status_code_keyword_is_builtin() {
        let mut engine = SchemaEngine::default();
        engine
            .add_schema(
                json!({"properties": {"code": {"type": "number", "validStatusCode": true}}}),
                "Code",
            )
            .unwrap();
        assert!(engine.check("Code", &mut json!({"code": "201"}), &()).is_ok());
        assert!(engine.check("Code", &mut json!({"code": 299}), &()).is_err());
    }

    #[test]
    fn document_models_resolve_by_name() {
        let mut engine = SchemaEngine::default();
        let document = json!({"components": {"schemas": {
            "Item": {
                "type": "object",
                "required": ["size"],
                "properties": {
                    "size": {"type": "string", "enum": ["S", "M", "L"]},
                    "tag": {"$ref": "#/components/schemas/Tag"}
                }
            },
            "Tag": {"type": "object", "properties": {"label": {"type": "string"}}}
        }}});
        engine.install_document_schema(&document).unwrap();
        assert!(engine.has_document_model("Item"));

        for pointer in ["components/schemas/Item", "#/components/schemas/Item", "Item"] {
            let mut data = json!({"size": "M", "tag": {"label": "x", "drop": 1}});
            engine.check_against_document(pointer, &mut data, &()).unwrap();
            assert_eq!(data, json!({"size": "M", "tag": {"label": "x"}}));
        }

        let err = engine
            .check_against_document("Item", &mut json!({"size": "XL"}), &())
            .unwrap_err();
        assert_eq!(err.errors[0].instance_path, "/size");

        let err = engine
            .check_against_document("Missing", &mut json!({}), &())
            .unwrap_err();
        assert!(err.message.contains("Missing"));
    }

    #[test]
    fn anonymous_schemas_compile_against_registry() {
        let mut engine = SchemaEngine::default();
        engine.add_schema(json!({"type": "integer"}), "Id").unwrap();
        let compiled = engine
            .compile(&json!({
                "type": "object",
                "required": ["id"],
                "properties": {"id": {"$ref": "sea://schemas/Id"}}
            }))
            .unwrap();
        let mut data = json!({"id": "7"});
        engine.check_compiled(&compiled, &mut data, &()).unwrap();
        assert_eq!(data, json!({"id": 7}));
        assert!(engine.check_compiled(&compiled, &mut json!({}), &()).is_err());
    }
}
