//! # Route Registry
//!
//! The ordered, de-duplicated list of accepted routes. Layers register in
//! a fixed order (core, application, one batch per product) and conflicts
//! across layers follow the same rule as conflicts within one: a route
//! whose `(method, path)` key is taken only replaces the earlier route
//! when it sets `overwrite`, and the replacement keeps the earlier
//! route's position.
//!
//! The registry is the source of truth for documented paths:
//! [`RouteRegistry::project_to_paths`] yields the [`PathDef`]s the
//! document model is synchronised with, in registration order.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use axum::routing::MethodRouter;
use axum::Router;
use serde_json::Map;

use sea_core::path;
use sea_docs::{PathDef, PathKey};
use sea_schema::{Catalog, SchemaEngine};

use crate::error::RouteError;
use crate::guard::GuardFactory;
use crate::route::{Prefix, Route};
use crate::schema::ROUTE;

/// Which layer a batch of routes comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Layer {
    Core,
    App,
    /// Routes of the named product, namespaced under `/<name>`.
    Product(String),
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Core => f.write_str("core"),
            Self::App => f.write_str("app"),
            Self::Product(name) => write!(f, "product {name}"),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RouteRegistry {
    routes: Vec<Route>,
}

impl RouteRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn get(&self, key: &PathKey) -> Option<&Route> {
        self.routes.iter().find(|r| &route_key(r) == key)
    }

    /// Register `routes` in order.
    ///
    /// Each route's shape is validated against the `Route` schema, its
    /// final path is resolved from its prefix, and its key is checked
    /// against the routes accepted so far. The batch is all-or-nothing.
    ///
    /// # Errors
    ///
    /// [`RouteError::Validation`] for a malformed route or an unknown
    /// response model, [`RouteError::InvalidPrefix`] when a prefix does not
    /// produce a path, [`RouteError::InvalidPath`] when the resolved path
    /// cannot be mounted, and [`RouteError::DuplicateRoute`] for a taken key
    /// without `overwrite`.
    pub fn register<I>(
        &mut self,
        engine: &SchemaEngine,
        catalog: &dyn Catalog,
        routes: I,
    ) -> Result<(), RouteError>
    where
        I: IntoIterator<Item = Route>,
    {
        let mut staged = self.routes.clone();
        for mut route in routes {
            let mut shape = route.shape();
            engine.check(ROUTE, &mut shape, catalog)?;

            route.path = resolve_path(&route)?;
            if let Err(source) = path::check_template(&route.path) {
                return Err(RouteError::InvalidPath {
                    method: route.method,
                    path: route.path,
                    source,
                });
            }
            let key = route_key(&route);

            match staged.iter().position(|r| route_key(r) == key) {
                Some(index) if route.overwrite => {
                    tracing::info!(route = %key, "replacing route");
                    staged[index] = route;
                }
                Some(_) => {
                    return Err(RouteError::DuplicateRoute {
                        method: route.method,
                        path: route.path,
                    });
                }
                None => {
                    tracing::info!(route = %key, "registered route");
                    staged.push(route);
                }
            }
        }
        self.routes = staged;
        Ok(())
    }

    /// Register one layer's routes. Product routes are namespaced under
    /// `/<product>` and keep their declared path as `original_path`.
    pub fn register_layer<I>(
        &mut self,
        engine: &SchemaEngine,
        catalog: &dyn Catalog,
        layer: &Layer,
        routes: I,
    ) -> Result<(), RouteError>
    where
        I: IntoIterator<Item = Route>,
    {
        tracing::debug!(layer = %layer, "registering layer routes");
        match layer {
            Layer::Core | Layer::App => self.register(engine, catalog, routes),
            Layer::Product(name) => {
                let namespace = format!("/{name}");
                let routes = routes.into_iter().map(|mut route| {
                    let declared = std::mem::take(&mut route.path);
                    route.path = path::join_namespace(&namespace, &declared);
                    route.original_path = Some(declared);
                    route
                });
                self.register(engine, catalog, routes)
            }
        }
    }

    /// Documentation view of every route, in registration order.
    pub fn project_to_paths(&self) -> Vec<PathDef> {
        self.routes
            .iter()
            .map(|r| PathDef {
                path: r.path.clone(),
                method: r.method,
                summary: r.summary.clone(),
                tags: r.tags.clone(),
                responses: r.responses.clone(),
                parameters: r.parameters.clone(),
                request_body: r.request_body.clone(),
                overwrite: false,
                extra: Map::new(),
            })
            .collect()
    }

    /// Build the request router. Each route runs its middleware, then its
    /// body guard, then its parameter guards in declaration order, then
    /// its handler.
    ///
    /// # Errors
    ///
    /// [`RouteError::AmbiguousPath`] when two paths differ only in
    /// placeholder names, and [`RouteError::Schema`] when a guard schema
    /// fails to compile.
    pub fn bind(&self, guards: &GuardFactory) -> Result<Router, RouteError> {
        check_ambiguity(&self.routes)?;

        let mut grouped: Vec<(String, Vec<MethodRouter>)> = Vec::new();
        for route in &self.routes {
            let method_router = bind_route(route, guards)?;
            let template = path::normalize(&route.path);
            match grouped.iter_mut().find(|(p, _)| *p == template) {
                Some((_, routers)) => routers.push(method_router),
                None => grouped.push((template, vec![method_router])),
            }
        }

        let mut router = Router::new();
        for (template, routers) in grouped {
            if let Some(method_router) = routers.into_iter().reduce(MethodRouter::merge) {
                router = router.route(&template, method_router);
            }
        }
        Ok(router)
    }
}

fn route_key(route: &Route) -> PathKey {
    PathKey::new(&route.path, route.method)
}

fn resolve_path(route: &Route) -> Result<String, RouteError> {
    match &route.prefix {
        None => Ok(route.path.clone()),
        Some(Prefix::Static(prefix)) => {
            let declared = route.original_path.as_deref().unwrap_or(&route.path);
            Ok(path::join_namespace(prefix, declared))
        }
        Some(Prefix::Rewrite(rewrite)) => match rewrite(route) {
            Some(resolved) if path::is_route_path(&resolved) => Ok(resolved),
            _ => Err(RouteError::InvalidPrefix {
                method: route.method,
                path: route.path.clone(),
            }),
        },
    }
}

fn bind_route(route: &Route, guards: &GuardFactory) -> Result<MethodRouter, RouteError> {
    let mut method_router = route.handler.mount(route.method);

    if let Some(parameters) = &route.parameters {
        for parameter in parameters.iter().rev() {
            let guard = Arc::new(guards.parameter(parameter)?);
            method_router = guard.layer(method_router);
        }
    }
    if let Some(body) = &route.request_body {
        let guard = Arc::new(guards.body(body)?);
        method_router = guard.layer(method_router);
    }
    for middleware in route.middleware.iter().rev() {
        method_router = middleware.apply(method_router);
    }
    Ok(method_router)
}

/// The request router matches placeholders by position, so `/a/{id}` and
/// `/a/{name}` would collide there even though their keys differ.
fn check_ambiguity(routes: &[Route]) -> Result<(), RouteError> {
    let mut seen: HashMap<String, String> = HashMap::new();
    for route in routes {
        let template = path::normalize(&route.path);
        let shape = erase_placeholders(&template);
        match seen.get(&shape) {
            Some(existing) if *existing != template => {
                return Err(RouteError::AmbiguousPath {
                    path: template,
                    existing: existing.clone(),
                });
            }
            Some(_) => {}
            None => {
                seen.insert(shape, template);
            }
        }
    }
    Ok(())
}

fn erase_placeholders(template: &str) -> String {
    template
        .split('/')
        .map(|segment| {
            if segment.starts_with('{') && segment.ends_with('}') {
                "{}"
            } else {
                segment
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}
