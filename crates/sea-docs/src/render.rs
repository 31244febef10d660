//! OpenAPI rendering.
//!
//! `paths` keys use `{name}` placeholders; each response and the request
//! body reference their model as `#/components/schemas/<modelName>` under
//! an `application/json` content envelope.

use serde_json::{json, Map, Value};

use sea_core::path::to_openapi_template;

use crate::model::DocumentModel;
use crate::types::{Model, PathDef, RequestBody, ResponseSpec};

pub const OPENAPI_VERSION: &str = "3.0.1";
pub const DEFAULT_TITLE: &str = "SEA App";
pub const DEFAULT_DESCRIPTION: &str = "Example SEA App";
pub const JSON_CONTENT: &str = "application/json";

pub(crate) fn document(model: &DocumentModel) -> Value {
    let definition = model.definition();
    json!({
        "openapi": OPENAPI_VERSION,
        "info": {
            "title": model.title(),
            "description": definition.description.as_deref().unwrap_or(DEFAULT_DESCRIPTION),
            "version": definition.version.as_deref().unwrap_or(env!("CARGO_PKG_VERSION")),
        },
        "servers": servers(model),
        "tags": tags(model),
        "paths": paths(model.paths()),
        "components": {
            "schemas": schemas(model.models(), false),
        },
    })
}

pub(crate) fn component_schema(models: &[Model]) -> Value {
    json!({"components": {"schemas": schemas(models, true)}})
}

fn schemas(models: &[Model], with_messages: bool) -> Value {
    let map: Map<String, Value> = models
        .iter()
        .map(|m| (m.name.clone(), m.to_schema(with_messages)))
        .collect();
    Value::Object(map)
}

fn servers(model: &DocumentModel) -> Value {
    if model.servers().is_empty() {
        return json!([{"url": format!("{}/", model.definition().base_url.trim_end_matches('/'))}]);
    }
    model
        .servers()
        .iter()
        .map(|s| {
            let mut entry = s.extra.clone();
            entry.insert("url".into(), Value::String(s.url.clone()));
            if let Some(d) = &s.description {
                entry.insert("description".into(), Value::String(d.clone()));
            }
            Value::Object(entry)
        })
        .collect()
}

fn tags(model: &DocumentModel) -> Value {
    model
        .tags()
        .iter()
        .map(|t| match &t.description {
            Some(d) => json!({"name": t.name, "description": d}),
            None => json!({"name": t.name}),
        })
        .collect()
}

fn paths(defs: &[PathDef]) -> Value {
    let mut out = Map::new();
    for def in defs {
        let entry = out
            .entry(to_openapi_template(&def.path))
            .or_insert_with(|| Value::Object(Map::new()));
        if let Value::Object(methods) = entry {
            methods.insert(def.method.as_str().to_string(), operation(def));
        }
    }
    Value::Object(out)
}

fn operation(def: &PathDef) -> Value {
    let mut op = Map::new();
    op.insert("summary".into(), Value::String(def.summary.clone()));
    if !def.tags.is_empty() {
        op.insert("tags".into(), json!(def.tags));
    }
    for (k, v) in &def.extra {
        op.insert(k.clone(), v.clone());
    }
    if let Some(parameters) = &def.parameters {
        op.insert(
            "parameters".into(),
            serde_json::to_value(parameters).unwrap_or(Value::Array(Vec::new())),
        );
    }
    if let Some(body) = &def.request_body {
        op.insert("requestBody".into(), request_body(body));
    }
    op.insert("responses".into(), responses(&def.responses));
    Value::Object(op)
}

fn responses(responses: &[ResponseSpec]) -> Value {
    let map: Map<String, Value> = responses
        .iter()
        .map(|r| {
            (
                r.status_code.to_string(),
                json!({
                    "description": r.description,
                    "content": content(&r.model_name),
                }),
            )
        })
        .collect();
    Value::Object(map)
}

fn request_body(body: &RequestBody) -> Value {
    let mut out = Map::new();
    if let Some(d) = &body.description {
        out.insert("description".into(), Value::String(d.clone()));
    }
    out.insert("required".into(), Value::Bool(body.required));
    out.insert("content".into(), content(&body.model_name));
    Value::Object(out)
}

fn content(model_name: &str) -> Value {
    json!({
        JSON_CONTENT: {
            "schema": {"$ref": format!("#/components/schemas/{model_name}")}
        }
    })
}
