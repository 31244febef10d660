//! # Transport Middleware
//!
//! Maps the definition's middleware identifiers onto tower layers.
//!
//! | Identifier    | Layer                                             |
//! |---------------|---------------------------------------------------|
//! | `compression` | gzip response compression                         |
//! | `cors`        | CORS; `params` may list allowed origins           |
//! | `helmet`      | security response headers                         |
//! | `log`         | request tracing spans                             |
//! | `bodyLimit`   | request body cap in bytes (`params`)              |
//!
//! `before` middleware wraps every request including unmatched ones.
//! `after` middleware is a route layer: it only runs for matched routes,
//! after routing.

use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::Request;
use axum::http::{header, HeaderName, HeaderValue};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::routing::Route;
use axum::Router;
use serde_json::Value;
use tower::{Layer, Service};
use tower_http::compression::CompressionLayer;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use sea_routes::guard::MAX_BODY_BYTES;

use crate::definition::MiddlewareSpec;
use crate::error::BootstrapError;

/// Where a middleware sits relative to routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Before,
    After,
}

impl Stage {
    fn apply<L>(self, router: Router, layer: L) -> Router
    where
        L: Layer<Route> + Clone + Send + Sync + 'static,
        L::Service: Service<Request> + Clone + Send + Sync + 'static,
        <L::Service as Service<Request>>::Response: IntoResponse + 'static,
        <L::Service as Service<Request>>::Error: Into<Infallible> + 'static,
        <L::Service as Service<Request>>::Future: Send + 'static,
    {
        match self {
            Self::Before => router.layer(layer),
            Self::After => router.route_layer(layer),
        }
    }
}

/// A transport middleware: a named built-in or a function supplied in
/// code.
#[derive(Clone)]
pub enum TransportMiddleware {
    Builtin(MiddlewareSpec),
    Custom(Arc<dyn Fn(Router, Stage) -> Router + Send + Sync>),
}

impl TransportMiddleware {
    /// Wrap an `async fn(Request, Next) -> Response` style function.
    pub fn from_fn<F, Fut>(f: F) -> Self
    where
        F: Fn(Request, Next) -> Fut + Clone + Send + Sync + 'static,
        Fut: std::future::Future<Output = Response> + Send + 'static,
    {
        Self::Custom(Arc::new(move |router, stage| {
            stage.apply(router, axum::middleware::from_fn::<F, (Request,)>(f.clone()))
        }))
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Builtin(spec) => spec.name(),
            Self::Custom(_) => "custom",
        }
    }
}

impl std::fmt::Debug for TransportMiddleware {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Builtin(spec) => f.debug_tuple("Builtin").field(spec).finish(),
            Self::Custom(_) => f.write_str("Custom"),
        }
    }
}

impl From<MiddlewareSpec> for TransportMiddleware {
    fn from(spec: MiddlewareSpec) -> Self {
        Self::Builtin(spec)
    }
}

/// Apply `stack` to `router` so the first entry runs first.
pub fn apply_stack(
    mut router: Router,
    stage: Stage,
    stack: &[TransportMiddleware],
) -> Result<Router, BootstrapError> {
    for middleware in stack.iter().rev() {
        tracing::debug!(
            middleware = middleware.name(),
            stage = ?stage,
            "mounting transport middleware"
        );
        router = match middleware {
            TransportMiddleware::Builtin(spec) => apply_builtin(router, stage, spec)?,
            TransportMiddleware::Custom(f) => f(router, stage),
        };
    }
    Ok(router)
}

fn apply_builtin(
    router: Router,
    stage: Stage,
    spec: &MiddlewareSpec,
) -> Result<Router, BootstrapError> {
    let router = match spec.name() {
        "compression" => stage.apply(router, CompressionLayer::new()),
        "cors" => stage.apply(router, cors(spec)?),
        "helmet" => helmet(router, stage),
        "log" => stage.apply(router, TraceLayer::new_for_http()),
        "bodyLimit" => stage.apply(router, RequestBodyLimitLayer::new(body_limit(spec)?)),
        other => return Err(BootstrapError::UnknownMiddleware(other.to_string())),
    };
    Ok(router)
}

fn cors(spec: &MiddlewareSpec) -> Result<CorsLayer, BootstrapError> {
    let origins: Vec<&str> = match spec.params() {
        None => return Ok(CorsLayer::permissive()),
        Some(Value::String(origin)) => vec![origin.as_str()],
        Some(Value::Array(list)) => list.iter().filter_map(Value::as_str).collect(),
        Some(Value::Object(map)) => match map.get("origin") {
            Some(Value::String(origin)) => vec![origin.as_str()],
            Some(Value::Array(list)) => list.iter().filter_map(Value::as_str).collect(),
            _ => return Ok(CorsLayer::permissive()),
        },
        Some(other) => {
            return Err(BootstrapError::MiddlewareParams {
                name: spec.name().to_string(),
                reason: format!("expected origins, got {other}"),
            })
        }
    };
    if origins.contains(&"*") {
        return Ok(CorsLayer::permissive());
    }
    let origins = origins
        .into_iter()
        .map(|o| {
            HeaderValue::from_str(o).map_err(|e| BootstrapError::MiddlewareParams {
                name: spec.name().to_string(),
                reason: format!("origin {o}: {e}"),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(tower_http::cors::Any)
        .allow_headers(tower_http::cors::Any))
}

fn body_limit(spec: &MiddlewareSpec) -> Result<usize, BootstrapError> {
    match spec.params() {
        None => Ok(MAX_BODY_BYTES),
        Some(Value::Number(n)) => n
            .as_u64()
            .and_then(|n| usize::try_from(n).ok())
            .ok_or_else(|| BootstrapError::MiddlewareParams {
                name: spec.name().to_string(),
                reason: format!("expected a byte count, got {n}"),
            }),
        Some(other) => Err(BootstrapError::MiddlewareParams {
            name: spec.name().to_string(),
            reason: format!("expected a byte count, got {other}"),
        }),
    }
}

fn security_headers() -> [(HeaderName, &'static str); 8] {
    [
        (header::X_CONTENT_TYPE_OPTIONS, "nosniff"),
        (header::X_FRAME_OPTIONS, "SAMEORIGIN"),
        (header::X_XSS_PROTECTION, "0"),
        (header::STRICT_TRANSPORT_SECURITY, "max-age=15552000; includeSubDomains"),
        (header::REFERRER_POLICY, "no-referrer"),
        (header::X_DNS_PREFETCH_CONTROL, "off"),
        (HeaderName::from_static("x-download-options"), "noopen"),
        (HeaderName::from_static("x-permitted-cross-domain-policies"), "none"),
    ]
}

fn helmet(mut router: Router, stage: Stage) -> Router {
    for (name, value) in security_headers() {
        router = stage.apply(
            router,
            SetResponseHeaderLayer::if_not_present(name, HeaderValue::from_static(value)),
        );
    }
    router
}
