//! # Validation Guards
//!
//! Request-time checks generated from a route's declared parameters and
//! request body. Each guard runs as route middleware before the handler.
//! A failing guard short-circuits with a [`ForwardedError`] carrying the
//! raw request data as payload.
//!
//! Guards only read the schema engine and the catalog. Both are frozen
//! once the router is bound, so guards run concurrently without locking.

use std::collections::HashMap;
use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::extract::{FromRequestParts, Path, Query, Request};
use axum::http::request::Parts;
use axum::http::{header, HeaderValue};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::routing::MethodRouter;
use serde_json::{json, Map, Value};

use sea_docs::{Parameter, ParameterLocation, RequestBody};
use sea_schema::{Catalog, CompiledSchema, SchemaConflict, SchemaEngine, ValidationFailure};

use crate::forward::ForwardedError;
use crate::route::wrap;

/// Largest request body a body guard buffers.
pub const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

// ── Validated parameters ────────────────────────────────────────────────────

/// Parameter values after validation and coercion, keyed by name.
///
/// Inserted into the request extensions by parameter guards. A route
/// with an integer `id` path parameter sees `id` as a JSON number here.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidatedParameters(pub HashMap<String, Value>);

impl ValidatedParameters {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }
}

impl<S: Send + Sync> FromRequestParts<S> for ValidatedParameters {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<ValidatedParameters>()
            .cloned()
            .unwrap_or_default())
    }
}

// ── Factory ─────────────────────────────────────────────────────────────────

/// Builds guards against a frozen engine and catalog.
#[derive(Clone)]
pub struct GuardFactory {
    engine: Arc<SchemaEngine>,
    catalog: Arc<dyn Catalog>,
}

impl GuardFactory {
    pub fn new(engine: Arc<SchemaEngine>, catalog: Arc<dyn Catalog>) -> Self {
        Self { engine, catalog }
    }

    pub fn engine(&self) -> &Arc<SchemaEngine> {
        &self.engine
    }

    /// Compile the guard for one declared parameter.
    pub fn parameter(&self, parameter: &Parameter) -> Result<ParameterGuard, SchemaConflict> {
        let name = &parameter.name;
        let required = if parameter.required {
            Some(self.engine.compile(&json!({
                "type": "object",
                "required": [name],
                "properties": {name: parameter.schema},
                "errorMessage": {
                    "required": {name: format!("Parameter {name} is required.")}
                }
            }))?)
        } else {
            None
        };
        let value = self.engine.compile(&json!({
            "type": "object",
            "properties": {name: parameter.schema}
        }))?;
        Ok(ParameterGuard {
            parameter: parameter.clone(),
            required,
            value,
            engine: Arc::clone(&self.engine),
            catalog: Arc::clone(&self.catalog),
        })
    }

    /// Compile the guard for a declared request body.
    pub fn body(&self, body: &RequestBody) -> Result<BodyGuard, SchemaConflict> {
        let model = &body.model_name;
        let required = if body.required {
            Some(self.engine.compile(&json!({
                "type": "object",
                "required": [model],
                "errorMessage": {
                    "required": {model: format!("Request body {model} is required.")}
                }
            }))?)
        } else {
            None
        };
        Ok(BodyGuard {
            model: model.clone(),
            required,
            engine: Arc::clone(&self.engine),
            catalog: Arc::clone(&self.catalog),
        })
    }
}

impl std::fmt::Debug for GuardFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GuardFactory")
            .field("engine", &self.engine)
            .finish_non_exhaustive()
    }
}

// ── Parameter guard ─────────────────────────────────────────────────────────

pub struct ParameterGuard {
    parameter: Parameter,
    required: Option<CompiledSchema>,
    value: CompiledSchema,
    engine: Arc<SchemaEngine>,
    catalog: Arc<dyn Catalog>,
}

impl std::fmt::Debug for ParameterGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParameterGuard")
            .field("parameter", &self.parameter)
            .field("required", &self.required.is_some())
            .finish_non_exhaustive()
    }
}

impl ParameterGuard {
    pub fn parameter(&self) -> &Parameter {
        &self.parameter
    }

    /// Check a raw parameter value. Returns the coerced value when one was
    /// present and non-empty.
    pub fn check(&self, raw: Option<&str>) -> Result<Option<Value>, ValidationFailure> {
        let name = &self.parameter.name;
        let mut data = Map::new();
        if let Some(raw) = raw {
            data.insert(name.clone(), Value::String(raw.to_string()));
        }

        if let Some(required) = &self.required {
            let mut presence = Value::Object(data.clone());
            self.engine
                .check_compiled(required, &mut presence, self.catalog.as_ref())?;
        }

        match raw {
            Some(raw) if !raw.is_empty() => {
                let mut data = Value::Object(data);
                self.engine
                    .check_compiled(&self.value, &mut data, self.catalog.as_ref())?;
                Ok(data.get(name).cloned())
            }
            _ => Ok(None),
        }
    }

    pub(crate) fn layer(self: Arc<Self>, router: MethodRouter) -> MethodRouter {
        wrap(router, move |request: Request, next: Next| {
            let guard = Arc::clone(&self);
            async move { guard.run(request, next).await }
        })
    }

    async fn run(&self, request: Request, next: Next) -> Response {
        let (mut parts, body) = request.into_parts();
        let source = self.source(&mut parts).await;
        let raw = self.lookup(&source);

        match self.check(raw.as_deref()) {
            Ok(value) => {
                if let Some(value) = value {
                    let mut validated = parts
                        .extensions
                        .remove::<ValidatedParameters>()
                        .unwrap_or_default();
                    validated.0.insert(self.parameter.name.clone(), value);
                    parts.extensions.insert(validated);
                }
                next.run(Request::from_parts(parts, body)).await
            }
            Err(failure) => {
                tracing::debug!(
                    path = %parts.uri.path(),
                    parameter = %self.parameter.name,
                    location = ?self.parameter.location,
                    error = %failure,
                    fields = ?failure.errors,
                    "parameter rejected"
                );
                let payload = Value::Object(
                    source
                        .into_iter()
                        .map(|(k, v)| (k, Value::String(v)))
                        .collect(),
                );
                ForwardedError::from(failure)
                    .with_payload(payload)
                    .into_response()
            }
        }
    }

    /// Every raw parameter of the guarded location.
    async fn source(&self, parts: &mut Parts) -> HashMap<String, String> {
        match self.parameter.location {
            ParameterLocation::Path => {
                <Path<HashMap<String, String>> as FromRequestParts<()>>::from_request_parts(
                    parts,
                    &(),
                )
                .await
                .map(|Path(params)| params)
                .unwrap_or_default()
            }
            ParameterLocation::Query => Query::<HashMap<String, String>>::try_from_uri(&parts.uri)
                .map(|Query(params)| params)
                .unwrap_or_default(),
            ParameterLocation::Header => parts
                .headers
                .iter()
                .filter_map(|(name, value)| {
                    value
                        .to_str()
                        .ok()
                        .map(|v| (name.as_str().to_string(), v.to_string()))
                })
                .collect(),
        }
    }

    fn lookup(&self, source: &HashMap<String, String>) -> Option<String> {
        match self.parameter.location {
            ParameterLocation::Header => source.get(&self.parameter.name.to_lowercase()).cloned(),
            _ => source.get(&self.parameter.name).cloned(),
        }
    }
}

// ── Body guard ──────────────────────────────────────────────────────────────

pub struct BodyGuard {
    model: String,
    required: Option<CompiledSchema>,
    engine: Arc<SchemaEngine>,
    catalog: Arc<dyn Catalog>,
}

impl std::fmt::Debug for BodyGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BodyGuard")
            .field("model", &self.model)
            .field("required", &self.required.is_some())
            .finish_non_exhaustive()
    }
}

impl BodyGuard {
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Check a parsed body. Returns the body after coercion and stripping.
    pub fn check(&self, body: Option<Value>) -> Result<Option<Value>, ValidationFailure> {
        if let Some(required) = &self.required {
            let mut presence = Map::new();
            if let Some(body) = &body {
                presence.insert(self.model.clone(), body.clone());
            }
            let mut presence = Value::Object(presence);
            self.engine
                .check_compiled(required, &mut presence, self.catalog.as_ref())?;
        }

        match body {
            Some(mut body) if !is_empty(&body) => {
                self.engine
                    .check_against_document(&self.model, &mut body, self.catalog.as_ref())?;
                Ok(Some(body))
            }
            other => Ok(other),
        }
    }

    pub(crate) fn layer(self: Arc<Self>, router: MethodRouter) -> MethodRouter {
        wrap(router, move |request: Request, next: Next| {
            let guard = Arc::clone(&self);
            async move { guard.run(request, next).await }
        })
    }

    async fn run(&self, request: Request, next: Next) -> Response {
        let (mut parts, body) = request.into_parts();
        let bytes = match to_bytes(body, MAX_BODY_BYTES).await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::debug!(path = %parts.uri.path(), error = %e, "request body unreadable");
                return ForwardedError::malformed().into_response();
            }
        };

        let parsed = if bytes.is_empty() {
            None
        } else {
            match serde_json::from_slice::<Value>(&bytes) {
                Ok(value) => Some(value),
                Err(e) => {
                    tracing::debug!(
                        path = %parts.uri.path(),
                        error = %e,
                        "request body is not JSON"
                    );
                    let text = String::from_utf8_lossy(&bytes).into_owned();
                    return ForwardedError::malformed()
                        .with_payload(Value::String(text))
                        .into_response();
                }
            }
        };
        let payload = parsed.clone().unwrap_or(Value::Null);

        match self.check(parsed) {
            Ok(Some(body)) => match serde_json::to_vec(&body) {
                Ok(encoded) => {
                    parts.headers.remove(header::CONTENT_LENGTH);
                    parts
                        .headers
                        .insert(header::CONTENT_LENGTH, HeaderValue::from(encoded.len()));
                    next.run(Request::from_parts(parts, Body::from(encoded))).await
                }
                Err(e) => {
                    tracing::error!(
                        path = %parts.uri.path(),
                        error = %e,
                        "re-encoding request body failed"
                    );
                    ForwardedError::server_error().into_response()
                }
            },
            Ok(None) => next.run(Request::from_parts(parts, Body::from(bytes))).await,
            Err(failure) => {
                tracing::debug!(
                    path = %parts.uri.path(),
                    model = %self.model,
                    error = %failure,
                    fields = ?failure.errors,
                    "request body rejected"
                );
                ForwardedError::from(failure)
                    .with_payload(payload)
                    .into_response()
            }
        }
    }
}

/// `null`, `""`, `{}` and `[]` count as no body.
fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Object(m) => m.is_empty(),
        Value::Array(a) => a.is_empty(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_docs::{DocumentDefinition, DocumentModel};

    struct Models(Vec<&'static str>);

    impl Catalog for Models {
        fn contains_model(&self, name: &str) -> bool {
            self.0.contains(&name)
        }

        fn contains_path(&self, _path: &str, _method: &str) -> bool {
            false
        }
    }

    fn factory() -> GuardFactory {
        let mut engine = SchemaEngine::default();
        DocumentModel::register(&mut engine).unwrap();
        let mut document = DocumentModel::new(
            &engine,
            DocumentDefinition::new("http://localhost:3000", "public"),
        )
        .unwrap();
        document
            .add_models(
                &mut engine,
                json!({
                    "name": "Shirt",
                    "properties": {
                        "size": {"type": "string", "enum": ["S", "M", "L"]},
                        "qty": {"type": "integer"}
                    },
                    "required": ["size"]
                }),
            )
            .unwrap();
        GuardFactory::new(Arc::new(engine), Arc::new(Models(vec!["Shirt"])))
    }

    fn id_parameter() -> Parameter {
        Parameter::new(
            ParameterLocation::Path,
            "id",
            "Identifier",
            json!({"type": "integer"}),
        )
        .required()
    }

    #[test]
    fn required_parameter_is_coerced() {
        let guard = factory().parameter(&id_parameter()).unwrap();
        assert_eq!(guard.check(Some("1")).unwrap(), Some(json!(1)));
    }

    #[test]
    fn required_parameter_rejects_wrong_type() {
        let guard = factory().parameter(&id_parameter()).unwrap();
        assert!(guard.check(Some("xxx")).is_err());
    }

    #[test]
    fn missing_required_parameter_uses_message() {
        let guard = factory().parameter(&id_parameter()).unwrap();
        let err = guard.check(None).unwrap_err();
        assert!(err.message.contains("Parameter id is required."), "{}", err.message);
    }

    #[test]
    fn optional_parameter_may_be_absent_or_empty() {
        let param = Parameter::new(
            ParameterLocation::Query,
            "page",
            "Page number",
            json!({"type": "integer"}),
        );
        let guard = factory().parameter(&param).unwrap();
        assert_eq!(guard.check(None).unwrap(), None);
        assert_eq!(guard.check(Some("")).unwrap(), None);
        assert!(guard.check(Some("two")).is_err());
    }

    #[test]
    fn body_is_validated_against_model() {
        let body = RequestBody {
            model_name: "Shirt".into(),
            required: true,
            description: None,
        };
        let guard = factory().body(&body).unwrap();

        let ok = guard
            .check(Some(json!({"size": "M", "qty": "2"})))
            .unwrap()
            .unwrap();
        assert_eq!(ok["qty"], 2);

        assert!(guard.check(Some(json!({"size": "XL"}))).is_err());
        assert!(guard.check(None).is_err());
    }

    #[test]
    fn optional_empty_body_passes() {
        let body = RequestBody {
            model_name: "Shirt".into(),
            required: false,
            description: None,
        };
        let guard = factory().body(&body).unwrap();
        assert_eq!(guard.check(None).unwrap(), None);
        assert_eq!(guard.check(Some(json!({}))).unwrap(), Some(json!({})));
    }
}
