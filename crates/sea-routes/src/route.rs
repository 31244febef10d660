//! # Routes
//!
//! A [`Route`] pairs documentation metadata (summary, tags, parameters,
//! request body, responses) with an axum handler and per-route middleware.
//! Handlers and middleware are type-erased behind `Arc` so routes can be
//! cloned, stored in the registry and bound to a router later.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use axum::extract::Request;
use axum::handler::Handler;
use axum::middleware::Next;
use axum::response::Response;
use axum::routing::{MethodFilter, MethodRouter};
use serde_json::{json, Value};

use sea_core::HttpMethod;
use sea_docs::{Parameter, RequestBody, ResponseSpec};

/// A handler ready to be mounted for one method.
#[derive(Clone)]
pub struct RouteHandler(Arc<dyn Fn(MethodFilter) -> MethodRouter + Send + Sync>);

impl RouteHandler {
    pub fn new<H, T>(handler: H) -> Self
    where
        H: Handler<T, ()> + Sync,
        T: 'static,
    {
        Self(Arc::new(move |filter| axum::routing::on(filter, handler.clone())))
    }

    pub(crate) fn mount(&self, method: HttpMethod) -> MethodRouter {
        (self.0)(method_filter(method))
    }
}

impl fmt::Debug for RouteHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RouteHandler")
    }
}

/// Middleware run for one route before its guards and handler.
#[derive(Clone)]
pub struct RouteMiddleware(Arc<dyn Fn(MethodRouter) -> MethodRouter + Send + Sync>);

impl RouteMiddleware {
    /// Wrap an `async fn(Request, Next) -> Response` style function.
    pub fn from_fn<F, Fut>(f: F) -> Self
    where
        F: Fn(Request, Next) -> Fut + Clone + Send + Sync + 'static,
        Fut: Future<Output = Response> + Send + 'static,
    {
        Self(Arc::new(move |router| wrap(router, f.clone())))
    }

    /// Wrap an arbitrary transformation of the method router, e.g. to add a
    /// tower layer.
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(MethodRouter) -> MethodRouter + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub(crate) fn apply(&self, router: MethodRouter) -> MethodRouter {
        (self.0)(router)
    }
}

impl fmt::Debug for RouteMiddleware {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RouteMiddleware")
    }
}

pub(crate) fn wrap<F, Fut>(router: MethodRouter, f: F) -> MethodRouter
where
    F: Fn(Request, Next) -> Fut + Clone + Send + Sync + 'static,
    Fut: Future<Output = Response> + Send + 'static,
{
    router.layer(axum::middleware::from_fn::<F, (Request,)>(f))
}

/// How a route's final path is computed.
#[derive(Clone)]
pub enum Prefix {
    /// Prepended to the route's original (pre-namespace) path.
    Static(String),
    /// Computes the final path from the route. `None`, or a value without a
    /// leading slash, is rejected.
    Rewrite(Arc<dyn Fn(&Route) -> Option<String> + Send + Sync>),
}

impl Prefix {
    pub fn rewrite<F>(f: F) -> Self
    where
        F: Fn(&Route) -> Option<String> + Send + Sync + 'static,
    {
        Self::Rewrite(Arc::new(f))
    }
}

impl fmt::Debug for Prefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static(p) => f.debug_tuple("Static").field(p).finish(),
            Self::Rewrite(_) => f.write_str("Rewrite"),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Route {
    pub method: HttpMethod,
    pub path: String,
    /// Path before a layer namespace was applied.
    pub original_path: Option<String>,
    pub summary: String,
    pub tags: Vec<String>,
    pub middleware: Vec<RouteMiddleware>,
    pub handler: RouteHandler,
    pub parameters: Option<Vec<Parameter>>,
    pub request_body: Option<RequestBody>,
    pub responses: Vec<ResponseSpec>,
    pub overwrite: bool,
    pub prefix: Option<Prefix>,
}

impl Route {
    pub fn new(
        method: HttpMethod,
        path: impl Into<String>,
        summary: impl Into<String>,
        handler: RouteHandler,
    ) -> Self {
        Self {
            method,
            path: path.into(),
            original_path: None,
            summary: summary.into(),
            tags: Vec::new(),
            middleware: Vec::new(),
            handler,
            parameters: None,
            request_body: None,
            responses: Vec::new(),
            overwrite: false,
            prefix: None,
        }
    }

    pub fn get<H, T>(path: impl Into<String>, summary: impl Into<String>, handler: H) -> Self
    where
        H: Handler<T, ()> + Sync,
        T: 'static,
    {
        Self::new(HttpMethod::Get, path, summary, RouteHandler::new(handler))
    }

    pub fn post<H, T>(path: impl Into<String>, summary: impl Into<String>, handler: H) -> Self
    where
        H: Handler<T, ()> + Sync,
        T: 'static,
    {
        Self::new(HttpMethod::Post, path, summary, RouteHandler::new(handler))
    }

    pub fn put<H, T>(path: impl Into<String>, summary: impl Into<String>, handler: H) -> Self
    where
        H: Handler<T, ()> + Sync,
        T: 'static,
    {
        Self::new(HttpMethod::Put, path, summary, RouteHandler::new(handler))
    }

    pub fn delete<H, T>(path: impl Into<String>, summary: impl Into<String>, handler: H) -> Self
    where
        H: Handler<T, ()> + Sync,
        T: 'static,
    {
        Self::new(HttpMethod::Delete, path, summary, RouteHandler::new(handler))
    }

    pub fn response(
        mut self,
        status_code: u16,
        model_name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        self.responses
            .push(ResponseSpec::new(status_code, model_name, description));
        self
    }

    pub fn parameter(mut self, parameter: Parameter) -> Self {
        self.parameters.get_or_insert_with(Vec::new).push(parameter);
        self
    }

    pub fn request_body(mut self, model_name: impl Into<String>, required: bool) -> Self {
        self.request_body = Some(RequestBody {
            model_name: model_name.into(),
            required,
            description: None,
        });
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn middleware(mut self, middleware: RouteMiddleware) -> Self {
        self.middleware.push(middleware);
        self
    }

    pub fn overwrite(mut self) -> Self {
        self.overwrite = true;
        self
    }

    pub fn prefix(mut self, prefix: Prefix) -> Self {
        self.prefix = Some(prefix);
        self
    }

    /// The JSON shape validated against the `Route` schema. Handlers and
    /// middleware are checked by the type system and left out.
    pub fn shape(&self) -> Value {
        let mut shape = json!({
            "method": self.method.as_str(),
            "path": self.path,
            "summary": self.summary,
            "tags": self.tags,
            "overwrite": self.overwrite,
            "responses": self.responses,
        });
        if let Some(original) = &self.original_path {
            shape["originalPath"] = json!(original);
        }
        if let Some(Prefix::Static(p)) = &self.prefix {
            shape["prefix"] = json!(p);
        }
        if let Some(parameters) = &self.parameters {
            shape["parameters"] = json!(parameters);
        }
        if let Some(body) = &self.request_body {
            shape["requestBody"] = json!(body);
        }
        shape
    }
}

fn method_filter(method: HttpMethod) -> MethodFilter {
    match method {
        HttpMethod::Get => MethodFilter::GET,
        HttpMethod::Post => MethodFilter::POST,
        HttpMethod::Put => MethodFilter::PUT,
        HttpMethod::Delete => MethodFilter::DELETE,
    }
}
