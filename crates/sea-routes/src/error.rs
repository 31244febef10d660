//! # Route Registry Errors

use sea_core::{CoreError, HttpMethod};
use sea_schema::{SchemaConflict, ValidationFailure};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RouteError {
    /// `(method, path)` is already registered and the new route does not
    /// set `overwrite`.
    #[error("Route {method} {path} already exists. Use overwrite if you intentionally do it.")]
    DuplicateRoute { method: HttpMethod, path: String },

    /// A prefix function returned nothing, or something that is not a
    /// leading-slash path.
    #[error("prefix of route {method} {path} did not produce a path")]
    InvalidPrefix { method: HttpMethod, path: String },

    /// The resolved path is not a template the request router can mount.
    #[error("route {method} {path} cannot be mounted: {source}")]
    InvalidPath {
        method: HttpMethod,
        path: String,
        #[source]
        source: CoreError,
    },

    /// Two routes place differently named placeholders at the same
    /// position, which the request router cannot tell apart.
    #[error(
        "route {path} conflicts with {existing}: \
         placeholders at the same position must share a name"
    )]
    AmbiguousPath { path: String, existing: String },

    /// The route shape failed the `Route` schema.
    #[error("{0}")]
    Validation(#[from] ValidationFailure),

    /// A guard schema failed to compile.
    #[error("guard schema rejected: {0}")]
    Schema(#[from] SchemaConflict),
}
