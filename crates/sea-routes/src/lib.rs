//! # sea-routes — Layered Route Registry
//!
//! Routes contributed by the core, application and product layers are
//! validated against the `Route` schema, prefixed, de-duplicated and kept
//! in registration order by [`RouteRegistry`]. Binding the registry
//! produces an axum [`Router`](axum::Router) where every route runs its
//! middleware, then the request guards generated from its declared body
//! and parameters, then its handler.
//!
//! Guards and handlers report failure through [`ForwardedError`], which
//! renders as `{status, message, payload?}`.

pub mod error;
pub mod forward;
pub mod guard;
pub mod registry;
pub mod route;
pub mod schema;

pub use error::RouteError;
pub use forward::ForwardedError;
pub use guard::{BodyGuard, GuardFactory, ParameterGuard, ValidatedParameters};
pub use registry::{Layer, RouteRegistry};
pub use route::{Prefix, Route, RouteHandler, RouteMiddleware};
